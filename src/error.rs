use std::time::Duration;

use thiserror::Error;

/// Broad classification of an [`LLMError`].
///
/// Use [`LLMError::is`] for "is this class of error" checks and
/// [`LLMError::matches`] when a specific instance is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownProvider,
    InvalidRequest,
    Transport,
    Auth,
    RateLimit,
    InvalidConfig,
    StreamClosed,
    Provider,
}

/// Raised by [`crate::client::Client::new`] when the provider tag is not supported.
///
/// A template with an empty `provider` matches every instance of this error, a
/// non-empty template only matches the same tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("llm: unknown provider {provider:?}")]
pub struct UnknownProviderError {
    /// Provider tag that was rejected.
    pub provider: String,
}

impl UnknownProviderError {
    /// Error for the rejected provider tag; an empty tag is the family template.
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }

    /// Matches against a family template (empty tag) or a specific tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_gateway::error::UnknownProviderError;
    ///
    /// let err = UnknownProviderError::new("acme");
    /// assert!(err.matches(&UnknownProviderError::new("")));
    /// assert!(err.matches(&UnknownProviderError::new("acme")));
    /// assert!(!err.matches(&UnknownProviderError::new("other")));
    /// ```
    pub fn matches(&self, template: &UnknownProviderError) -> bool {
        template.provider.is_empty() || template.provider == self.provider
    }
}

/// Pre-flight request validation failure, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("llm: {field}: {message}")]
pub struct ValidationError {
    /// Name of the request field that failed validation.
    pub field: String,
    /// Short description of the failure.
    pub message: String,
}

impl ValidationError {
    /// Failure for `field` with a short `message`, e.g. `("model", "cannot be empty")`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Aggregates every failure mode exposed by the client.
///
/// Backend and transport failures are returned exactly as the backend produced them,
/// so callers can match on the variant to decide whether to retry or surface the
/// message to the user.
#[derive(Debug, Error)]
pub enum LLMError {
    /// The requested provider is not supported.
    #[error(transparent)]
    UnknownProvider(#[from] UnknownProviderError),
    /// The request failed pre-flight validation. Never sent to the backend.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Represents transport-layer or networking failures.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// Reports invalid or missing credentials.
    #[error("auth failure: {message}")]
    Auth { message: String },
    /// Indicates that the provider throttled the request.
    #[error("rate limited: {message}")]
    RateLimit {
        /// Raw message returned by the upstream provider.
        message: String,
        /// Optional wait duration suggested by the provider before retrying.
        retry_after: Option<Duration>,
    },
    /// Raised when building the backend from configuration fails.
    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig {
        /// Name of the configuration field that failed validation.
        field: String,
        /// Additional context explaining why the field is invalid.
        reason: String,
    },
    /// Signals a read on a stream whose backend handle was already released.
    #[error("stream closed: {message}")]
    StreamClosed { message: String },
    /// Wraps provider-defined errors that cannot be normalized.
    #[error("provider {provider} error: {message}")]
    Provider {
        /// Name of the provider, such as `openrouter`.
        provider: &'static str,
        /// Human-readable error message returned by the provider.
        message: String,
        /// HTTP status, when the error came from a non-2xx response.
        status: Option<u16>,
    },
}

impl LLMError {
    /// Creates an [`LLMError::Transport`] from a textual description.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_gateway::error::LLMError;
    ///
    /// let err = LLMError::transport("dns lookup failed");
    /// assert!(matches!(err, LLMError::Transport { .. }));
    /// ```
    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an [`LLMError::Provider`] without an HTTP status.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_gateway::error::LLMError;
    ///
    /// let err = LLMError::provider("openrouter", "bad JSON payload");
    /// assert!(matches!(err, LLMError::Provider { provider: "openrouter", .. }));
    /// ```
    pub fn provider<T: Into<String>>(provider: &'static str, message: T) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
            status: None,
        }
    }

    /// Shorthand for `LLMError::Validation(ValidationError::new(field, message))`.
    pub fn invalid_request(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::new(field, message))
    }

    /// Broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownProvider(_) => ErrorKind::UnknownProvider,
            Self::Validation(_) => ErrorKind::InvalidRequest,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            Self::StreamClosed { .. } => ErrorKind::StreamClosed,
            Self::Provider { .. } => ErrorKind::Provider,
        }
    }

    /// Category check, e.g. `err.is(ErrorKind::InvalidRequest)`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// True for every validation failure, whatever its field or message.
    pub fn is_invalid_request(&self) -> bool {
        self.is(ErrorKind::InvalidRequest)
    }

    /// Instance check against a template error.
    ///
    /// Unknown-provider errors follow [`UnknownProviderError::matches`]; validation
    /// errors require the same field and message. Other variants only need to share
    /// the template's kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_gateway::error::LLMError;
    ///
    /// let err = LLMError::invalid_request("model", "cannot be empty");
    /// assert!(err.is_invalid_request());
    /// assert!(err.matches(&LLMError::invalid_request("model", "cannot be empty")));
    /// assert!(!err.matches(&LLMError::invalid_request("messages", "cannot be empty")));
    /// ```
    pub fn matches(&self, template: &LLMError) -> bool {
        match (self, template) {
            (Self::UnknownProvider(err), Self::UnknownProvider(tpl)) => err.matches(tpl),
            (Self::Validation(err), Self::Validation(tpl)) => err == tpl,
            _ => self.kind() == template.kind(),
        }
    }

    /// Returns the validation payload when this is an invalid-request error.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }

    /// Whether the backend may succeed if the same request is sent again.
    pub(crate) fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::RateLimit { .. } => true,
            Self::Provider {
                status: Some(status),
                ..
            } => *status >= 500,
            _ => false,
        }
    }
}
