//! Client configuration.
//!
//! A [`ClientConfig`] starts from [`ClientConfig::default`] and is changed by a list of
//! [`ClientOption`]s applied in order. Scalar options overwrite earlier values, header
//! options merge key by key.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::Span;

use crate::http::DynHttpTransport;
use crate::provider::ProviderKind;

/// Per-request timeout used when no option overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Retry budget forwarded to the backend when no option overrides it.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

pub use crate::openrouter::DEFAULT_BASE_URL;

/// Resolved client settings. Built once per client.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    /// Empty means the backend default.
    pub base_url: String,
    /// Zero disables the per-request timeout.
    pub timeout: Duration,
    pub max_retries: Option<u32>,
    pub headers: HashMap<String, String>,
    pub debug: bool,
    /// Span the backend records its HTTP exchanges under.
    pub logger: Option<Span>,
    pub referer: String,
    pub title: String,
    pub forwarded_for: String,
    /// Replaces the default reqwest transport.
    pub transport: Option<DynHttpTransport>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::new(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: Some(DEFAULT_MAX_RETRIES),
            headers: HashMap::new(),
            debug: false,
            logger: None,
            referer: String::new(),
            title: String::new(),
            forwarded_for: String::new(),
            transport: None,
        }
    }
}

impl ClientConfig {
    /// Defaults with `options` applied in order.
    pub fn from_options(options: impl IntoIterator<Item = ClientOption>) -> Self {
        let mut config = Self::default();
        for option in options {
            option.apply(&mut config);
        }
        config
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            ""
        } else {
            "<redacted>"
        };
        f.debug_struct("ClientConfig")
            .field("api_key", &api_key)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("debug", &self.debug)
            .field("logger", &self.logger)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .field("forwarded_for", &self.forwarded_for)
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .finish()
    }
}

/// One configuration change.
#[derive(Clone)]
pub enum ClientOption {
    /// Bearer token for the backend.
    ApiKey(String),
    /// Backend root, e.g. a proxy in front of OpenRouter.
    BaseUrl(String),
    /// Per-request timeout.
    Timeout(Duration),
    /// Retries the backend attempts on transport errors, 429 and 5xx.
    MaxRetries(u32),
    /// Merged into the existing headers; same-named entries are replaced.
    Headers(HashMap<String, String>),
    /// Log request and response bodies at `debug` level.
    Debug(bool),
    /// `HTTP-Referer` attribution header.
    Referer(String),
    /// `X-Title` attribution header.
    Title(String),
    /// `X-Forwarded-For` header.
    ForwardedFor(String),
    /// Span the backend's HTTP exchanges are recorded under.
    Logger(Span),
    /// Custom HTTP transport, mostly for tests.
    Transport(DynHttpTransport),
}

impl ClientOption {
    pub fn apply(self, config: &mut ClientConfig) {
        match self {
            Self::ApiKey(key) => config.api_key = key,
            Self::BaseUrl(url) => config.base_url = url,
            Self::Timeout(timeout) => config.timeout = timeout,
            Self::MaxRetries(retries) => config.max_retries = Some(retries),
            Self::Headers(headers) => config.headers.extend(headers),
            Self::Debug(debug) => config.debug = debug,
            Self::Referer(referer) => config.referer = referer,
            Self::Title(title) => config.title = title,
            Self::ForwardedFor(address) => config.forwarded_for = address,
            Self::Logger(span) => config.logger = Some(span),
            Self::Transport(transport) => config.transport = Some(transport),
        }
    }
}

impl fmt::Debug for ClientOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::BaseUrl(url) => f.debug_tuple("BaseUrl").field(url).finish(),
            Self::Timeout(timeout) => f.debug_tuple("Timeout").field(timeout).finish(),
            Self::MaxRetries(retries) => f.debug_tuple("MaxRetries").field(retries).finish(),
            Self::Headers(headers) => f.debug_tuple("Headers").field(headers).finish(),
            Self::Debug(debug) => f.debug_tuple("Debug").field(debug).finish(),
            Self::Referer(referer) => f.debug_tuple("Referer").field(referer).finish(),
            Self::Title(title) => f.debug_tuple("Title").field(title).finish(),
            Self::ForwardedFor(address) => f.debug_tuple("ForwardedFor").field(address).finish(),
            Self::Logger(span) => f.debug_tuple("Logger").field(span).finish(),
            Self::Transport(_) => f.write_str("Transport(..)"),
        }
    }
}

/// Sets the API key.
pub fn with_api_key(key: impl Into<String>) -> ClientOption {
    ClientOption::ApiKey(key.into())
}

/// Overrides the backend base URL.
pub fn with_base_url(url: impl Into<String>) -> ClientOption {
    ClientOption::BaseUrl(url.into())
}

/// Sets the per-request timeout.
pub fn with_timeout(timeout: Duration) -> ClientOption {
    ClientOption::Timeout(timeout)
}

/// Sets the backend retry budget.
pub fn with_max_retries(retries: u32) -> ClientOption {
    ClientOption::MaxRetries(retries)
}

/// Extra headers sent with every request.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use llm_gateway::config::{ClientConfig, with_headers};
///
/// let config = ClientConfig::from_options([
///     with_headers(HashMap::from([("X-A".to_string(), "1".to_string())])),
///     with_headers(HashMap::from([("X-B".to_string(), "2".to_string())])),
/// ]);
/// assert_eq!(config.headers.len(), 2);
/// ```
pub fn with_headers(headers: HashMap<String, String>) -> ClientOption {
    ClientOption::Headers(headers)
}

/// Toggles request and response body logging.
pub fn with_debug(debug: bool) -> ClientOption {
    ClientOption::Debug(debug)
}

/// Sets the `HTTP-Referer` header OpenRouter uses for app attribution.
pub fn with_referer(referer: impl Into<String>) -> ClientOption {
    ClientOption::Referer(referer.into())
}

/// Sets the `X-Title` header OpenRouter uses for app attribution.
pub fn with_title(title: impl Into<String>) -> ClientOption {
    ClientOption::Title(title.into())
}

/// Sets the `X-Forwarded-For` header.
pub fn with_forwarded_for(address: impl Into<String>) -> ClientOption {
    ClientOption::ForwardedFor(address.into())
}

/// Records backend HTTP exchanges under `span`.
pub fn with_logger(span: Span) -> ClientOption {
    ClientOption::Logger(span)
}

/// Replaces the default reqwest transport.
pub fn with_transport(transport: DynHttpTransport) -> ClientOption {
    ClientOption::Transport(transport)
}

/// Serializable client description, e.g. loaded from a JSON or TOML file.
///
/// # Examples
///
/// ```
/// use llm_gateway::config::ProviderConfig;
/// use llm_gateway::provider::ProviderKind;
///
/// let config: ProviderConfig = serde_json::from_str(
///     r#"{"provider": "openrouter", "api_key": "sk-or-...", "title": "My App"}"#,
/// )
/// .unwrap();
/// assert_eq!(config.provider, ProviderKind::OpenRouter);
/// assert_eq!(config.to_options().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarded_for: Option<String>,
}

impl ProviderConfig {
    /// Options equivalent to the fields that are set.
    pub fn to_options(&self) -> Vec<ClientOption> {
        let mut options = Vec::new();
        if !self.api_key.is_empty() {
            options.push(with_api_key(self.api_key.clone()));
        }
        if let Some(url) = &self.base_url {
            options.push(with_base_url(url.clone()));
        }
        if let Some(secs) = self.timeout_secs {
            options.push(with_timeout(Duration::from_secs(secs)));
        }
        if let Some(retries) = self.max_retries {
            options.push(with_max_retries(retries));
        }
        if !self.headers.is_empty() {
            options.push(with_headers(self.headers.clone()));
        }
        if self.debug {
            options.push(with_debug(true));
        }
        if let Some(referer) = &self.referer {
            options.push(with_referer(referer.clone()));
        }
        if let Some(title) = &self.title {
            options.push(with_title(title.clone()));
        }
        if let Some(address) = &self.forwarded_for {
            options.push(with_forwarded_for(address.clone()));
        }
        options
    }
}
