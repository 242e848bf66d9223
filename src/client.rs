use std::sync::Arc;

use crate::config::{ClientConfig, ClientOption, ProviderConfig};
use crate::error::LLMError;
use crate::openrouter::OpenRouterClient;
use crate::provider::openrouter::{OpenRouterChat, OpenRouterEmbeddings, build_openrouter_options};
use crate::provider::{
    ChatProvider, DynChatProvider, DynEmbeddingProvider, EmbeddingProvider, ProviderKind,
};

/// Entry point: one chat and one embeddings capability over the same backend.
///
/// # Examples
///
/// ```
/// use llm_gateway::client::Client;
/// use llm_gateway::config::with_api_key;
/// use llm_gateway::error::UnknownProviderError;
///
/// let err = Client::new("unknown-provider", [with_api_key("k")]).err().unwrap();
/// assert!(err.matches(&UnknownProviderError::new("").into()));
/// ```
#[derive(Clone)]
pub struct Client {
    chat: DynChatProvider,
    embeddings: DynEmbeddingProvider,
}

impl Client {
    /// Builds a client for the provider named by `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`LLMError::UnknownProvider`] for an unsupported tag, and the backend's
    /// construction error (for example [`LLMError::InvalidConfig`] without an API key).
    pub fn new(
        provider: impl AsRef<str>,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> Result<Self, LLMError> {
        let kind = provider.as_ref().parse::<ProviderKind>()?;
        Self::with_provider(kind, options)
    }

    pub fn with_provider(
        kind: ProviderKind,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> Result<Self, LLMError> {
        let config = ClientConfig::from_options(options);
        match kind {
            ProviderKind::OpenRouter => {
                let backend = OpenRouterClient::new(build_openrouter_options(config))?;
                Ok(Self::from_parts(
                    Arc::new(OpenRouterChat::new(backend.clone())),
                    Arc::new(OpenRouterEmbeddings::new(backend)),
                ))
            }
        }
    }

    /// Builds a client from a deserialized configuration record.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, LLMError> {
        Self::with_provider(config.provider, config.to_options())
    }

    /// Assembles a client from arbitrary capability implementations.
    pub fn from_parts(chat: DynChatProvider, embeddings: DynEmbeddingProvider) -> Self {
        Self { chat, embeddings }
    }

    pub fn chat(&self) -> &dyn ChatProvider {
        self.chat.as_ref()
    }

    pub fn embeddings(&self) -> &dyn EmbeddingProvider {
        self.embeddings.as_ref()
    }

    /// Shared handle to the chat capability.
    pub fn chat_handle(&self) -> DynChatProvider {
        Arc::clone(&self.chat)
    }

    /// Shared handle to the embeddings capability.
    pub fn embeddings_handle(&self) -> DynEmbeddingProvider {
        Arc::clone(&self.embeddings)
    }
}
