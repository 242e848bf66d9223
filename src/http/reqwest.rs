use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::error::LLMError;

use super::{
    DynHttpTransport, HttpBodyStream, HttpRequest, HttpResponse, HttpStreamResponse, HttpTransport,
};

const LOG_TARGET: &str = "llm_gateway::http";
const DEFAULT_USER_AGENT: &str = concat!("llm-gateway/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`HttpTransport`] over a shared `reqwest::Client`.
///
/// The per-request timeout comes from [`HttpRequest::timeout`]; the client itself only
/// bounds connection setup.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps a preconfigured client, e.g. one with a proxy or custom root certificates.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Client with rustls, a connect timeout and the crate's user agent.
    pub fn default_client() -> Result<Self, LLMError> {
        reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map(Self::new)
            .map_err(|err| LLMError::transport(format!("failed to create reqwest client: {err}")))
    }

    async fn execute(&self, request: HttpRequest) -> Result<reqwest::Response, LLMError> {
        let headers = header_map(&request.headers)?;
        let mut builder = self
            .client
            .post(&request.url)
            .headers(headers)
            .body(request.body);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(map_reqwest_error)?;
        tracing::trace!(
            target: LOG_TARGET,
            url = %request.url,
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response head received"
        );
        Ok(response)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, LLMError> {
        let response = self.execute(request).await?;
        let status = response.status().as_u16();
        let headers = response_headers(response.headers());
        let body = response.bytes().await.map_err(map_reqwest_error)?.to_vec();
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, LLMError> {
        let response = self.execute(request).await?;
        let status = response.status().as_u16();
        let headers = response_headers(response.headers());
        let body: HttpBodyStream = Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(map_reqwest_error)),
        );
        Ok(HttpStreamResponse {
            status,
            headers,
            body,
        })
    }
}

/// Shared reqwest transport used when no transport option is given.
pub fn default_dyn_transport() -> Result<DynHttpTransport, LLMError> {
    Ok(Arc::new(ReqwestTransport::default_client()?))
}

fn header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, LLMError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| LLMError::transport(format!("invalid header name {name:?}: {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| LLMError::transport(format!("invalid value for header {name}: {err}")))?;
        map.insert(name, value);
    }
    if !map.contains_key(USER_AGENT) {
        map.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    }
    Ok(map)
}

/// Lower-cased header names; repeated headers are joined with `", "`.
fn response_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map: HashMap<String, String> = HashMap::with_capacity(headers.keys_len());
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        map.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    map
}

fn map_reqwest_error(err: reqwest::Error) -> LLMError {
    let kind = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_body() || err.is_decode() {
        "failed to read response body"
    } else {
        "request failed"
    };
    LLMError::transport(format!("{kind}: {err}"))
}
