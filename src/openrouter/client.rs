use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Instrument, Span};

use crate::error::LLMError;
use crate::http::reqwest::default_dyn_transport;
use crate::http::{DynHttpTransport, HttpBodyStream, HttpRequest, HttpStreamResponse};

use super::error::{embedded_error, parse_openrouter_error};
use super::retry::backoff_delay;
use super::stream::OpenRouterChatStream;
use super::types::{
    OpenRouterChatRequest, OpenRouterChatResponse, OpenRouterEmbeddingRequest,
    OpenRouterEmbeddingResponse,
};
use super::{DEFAULT_BASE_URL, PROVIDER};

const LOG_TARGET: &str = "llm_gateway::openrouter";

/// Constructor options for [`OpenRouterClient`].
pub enum OpenRouterOption {
    ApiKey(String),
    BaseUrl(String),
    Timeout(Duration),
    MaxRetries(u32),
    /// Extra headers, merged key by key.
    Headers(HashMap<String, String>),
    /// Log request and response bodies at `debug` level.
    Debug(bool),
    /// `HTTP-Referer` attribution header.
    Referer(String),
    /// `X-Title` attribution header.
    Title(String),
    ForwardedFor(String),
    /// Span every HTTP exchange is recorded under.
    Logger(Span),
    Transport(DynHttpTransport),
}

/// Thin OpenRouter API client.
///
/// Cloning is cheap; clones share settings and transport.
#[derive(Clone)]
pub struct OpenRouterClient {
    inner: Arc<Settings>,
}

struct Settings {
    transport: DynHttpTransport,
    base_url: String,
    api_key: String,
    timeout: Option<Duration>,
    max_retries: u32,
    headers: HashMap<String, String>,
    debug: bool,
    span: Option<Span>,
}

impl OpenRouterClient {
    /// Builds a client from options applied in order.
    ///
    /// Defaults: base URL [`DEFAULT_BASE_URL`], no request timeout, no retries, and a
    /// reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns [`LLMError::InvalidConfig`] for an empty API key or headers that are not
    /// valid HTTP, and [`LLMError::Transport`] when the default transport cannot be
    /// created.
    pub fn new(options: impl IntoIterator<Item = OpenRouterOption>) -> Result<Self, LLMError> {
        let mut api_key = String::new();
        let mut base_url = DEFAULT_BASE_URL.to_string();
        let mut timeout = None;
        let mut max_retries = 0;
        let mut headers = HashMap::new();
        let mut debug = false;
        let mut span = None;
        let mut transport = None;

        for option in options {
            match option {
                OpenRouterOption::ApiKey(key) => api_key = key,
                OpenRouterOption::BaseUrl(url) => base_url = url,
                OpenRouterOption::Timeout(value) => timeout = Some(value),
                OpenRouterOption::MaxRetries(value) => max_retries = value,
                OpenRouterOption::Headers(extra) => headers.extend(extra),
                OpenRouterOption::Debug(value) => debug = value,
                OpenRouterOption::Referer(value) => {
                    headers.insert("HTTP-Referer".to_string(), value);
                }
                OpenRouterOption::Title(value) => {
                    headers.insert("X-Title".to_string(), value);
                }
                OpenRouterOption::ForwardedFor(value) => {
                    headers.insert("X-Forwarded-For".to_string(), value);
                }
                OpenRouterOption::Logger(value) => span = Some(value),
                OpenRouterOption::Transport(value) => transport = Some(value),
            }
        }

        if api_key.trim().is_empty() {
            return Err(LLMError::InvalidConfig {
                field: "api_key".to_string(),
                reason: "OpenRouter requires an API key".to_string(),
            });
        }
        for (name, value) in &headers {
            let valid_name = !name.is_empty()
                && name
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b"-_!#$%&'*+.^`|~".contains(&b));
            if !valid_name || value.bytes().any(|b| b == b'\r' || b == b'\n') {
                return Err(LLMError::InvalidConfig {
                    field: "headers".to_string(),
                    reason: format!("invalid header {name:?}"),
                });
            }
        }
        let transport = match transport {
            Some(transport) => transport,
            None => default_dyn_transport()?,
        };

        Ok(Self {
            inner: Arc::new(Settings {
                transport,
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
                timeout,
                max_retries,
                headers,
                debug,
                span,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn max_retries(&self) -> u32 {
        self.inner.max_retries
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.inner.timeout
    }

    /// `POST /chat/completions` with `stream: false`.
    pub async fn chat_completion(
        &self,
        request: &OpenRouterChatRequest,
    ) -> Result<OpenRouterChatResponse, LLMError> {
        let http = self.build_request("chat/completions", request, Some(false))?;
        let (status, body) = self
            .retrying(|| {
                let transport = self.inner.transport.clone();
                let http = http.clone();
                async move {
                    let response = transport.send(http).await?;
                    let text = response.clone().into_string()?;
                    if response.is_success() {
                        Ok((response.status, text))
                    } else {
                        Err(parse_openrouter_error(response.status, &response.headers, &text))
                    }
                }
            })
            .instrument(self.span())
            .await?;
        self.log_body("chat completion response", &body);
        let response: OpenRouterChatResponse = parse_body(&body)?;
        match &response.error {
            Some(error) if response.choices.is_empty() => Err(embedded_error(Some(status), error)),
            _ => Ok(response),
        }
    }

    /// `POST /chat/completions` with `stream: true`.
    ///
    /// Only establishing the stream is retried; errors while reading it are returned
    /// by [`OpenRouterChatStream::recv`].
    pub async fn chat_completion_stream(
        &self,
        request: &OpenRouterChatRequest,
    ) -> Result<OpenRouterChatStream, LLMError> {
        let http = self.build_request("chat/completions", request, Some(true))?;
        let response: HttpStreamResponse = self
            .retrying(|| {
                let transport = self.inner.transport.clone();
                let http = http.clone();
                async move {
                    let response = transport.send_stream(http).await?;
                    if (200..300).contains(&response.status) {
                        Ok(response)
                    } else {
                        let text = collect_stream_text(response.body).await?;
                        Err(parse_openrouter_error(response.status, &response.headers, &text))
                    }
                }
            })
            .instrument(self.span())
            .await?;
        Ok(OpenRouterChatStream::new(response.body))
    }

    /// `POST /embeddings`.
    pub async fn create_embeddings(
        &self,
        request: &OpenRouterEmbeddingRequest,
    ) -> Result<OpenRouterEmbeddingResponse, LLMError> {
        let http = self.build_request("embeddings", request, None)?;
        let (status, body) = self
            .retrying(|| {
                let transport = self.inner.transport.clone();
                let http = http.clone();
                async move {
                    let response = transport.send(http).await?;
                    let text = response.clone().into_string()?;
                    if response.is_success() {
                        Ok((response.status, text))
                    } else {
                        Err(parse_openrouter_error(response.status, &response.headers, &text))
                    }
                }
            })
            .instrument(self.span())
            .await?;
        self.log_body("embeddings response", &body);
        let response: OpenRouterEmbeddingResponse = parse_body(&body)?;
        match &response.error {
            Some(error) if response.data.is_empty() => Err(embedded_error(Some(status), error)),
            _ => Ok(response),
        }
    }

    fn span(&self) -> Span {
        self.inner.span.clone().unwrap_or_else(Span::current)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    fn build_headers(&self) -> HashMap<String, String> {
        let mut headers = self.inner.headers.clone();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.inner.api_key),
        );
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    fn build_request<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        stream: Option<bool>,
    ) -> Result<HttpRequest, LLMError> {
        let mut value = serde_json::to_value(body).map_err(|err| {
            LLMError::invalid_request("request", format!("failed to serialize request: {err}"))
        })?;
        if let (Some(stream), Some(object)) = (stream, value.as_object_mut()) {
            object.insert("stream".to_string(), serde_json::Value::Bool(stream));
        }
        let payload = serde_json::to_vec(&value).map_err(|err| {
            LLMError::invalid_request("request", format!("failed to serialize request: {err}"))
        })?;
        let url = self.endpoint(path);
        if self.inner.debug {
            tracing::debug!(target: LOG_TARGET, %url, body = %value, "openrouter request");
        }
        Ok(HttpRequest::post_json(url, payload)
            .with_headers(self.build_headers())
            .with_timeout(self.inner.timeout))
    }

    async fn retrying<T, F, Fut>(&self, mut attempt_once: F) -> Result<T, LLMError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LLMError>>,
    {
        let mut attempt = 0;
        loop {
            let err = match attempt_once().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if attempt >= self.inner.max_retries || !err.is_retryable() {
                return Err(err);
            }
            let delay = backoff_delay(&err, attempt);
            tracing::warn!(
                target: LOG_TARGET,
                attempt = attempt + 1,
                max_retries = self.inner.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying openrouter request"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn log_body(&self, what: &str, body: &str) {
        if self.inner.debug {
            tracing::debug!(target: LOG_TARGET, body, "openrouter {what}");
        }
    }
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, LLMError> {
    serde_json::from_str(text).map_err(|err| LLMError::Provider {
        provider: PROVIDER,
        message: format!("failed to parse OpenRouter response: {err}"),
        status: None,
    })
}

async fn collect_stream_text(mut body: HttpBodyStream) -> Result<String, LLMError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = body.next().await {
        bytes.extend_from_slice(&chunk?);
    }
    String::from_utf8(bytes).map_err(|err| LLMError::Provider {
        provider: PROVIDER,
        message: format!("failed to decode stream error body: {err}"),
        status: None,
    })
}
