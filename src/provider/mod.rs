use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use futures_core::Stream;
use serde::{Deserialize, Serialize};

use crate::error::{LLMError, UnknownProviderError};
use crate::types::{ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse, StreamChunk};

pub mod mock;
pub mod openrouter;
pub mod stream;

pub use stream::{StreamItem, StreamReader};

/// Push-style alias for [`StreamReader::into_stream`].
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, LLMError>> + Send>>;

/// Chat capability of a client.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Sends a request and waits for the complete response.
    async fn create(&self, request: ChatRequest) -> Result<ChatResponse, LLMError>;

    /// Sends a request and returns a reader over incremental chunks.
    async fn create_stream(&self, request: ChatRequest) -> Result<StreamReader, LLMError>;
}

/// Embeddings capability of a client.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn create(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, LLMError>;
}

pub type DynChatProvider = Arc<dyn ChatProvider>;
pub type DynEmbeddingProvider = Arc<dyn EmbeddingProvider>;

/// Supported backends.
///
/// # Examples
///
/// ```
/// use llm_gateway::provider::ProviderKind;
///
/// assert_eq!("openrouter".parse::<ProviderKind>(), Ok(ProviderKind::OpenRouter));
/// assert!("acme".parse::<ProviderKind>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "openrouter")]
    OpenRouter,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenRouter => "openrouter",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = UnknownProviderError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "openrouter" => Ok(Self::OpenRouter),
            other => Err(UnknownProviderError::new(other)),
        }
    }
}
