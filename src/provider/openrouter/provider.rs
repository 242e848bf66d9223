use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::error::LLMError;
use crate::openrouter::{OpenRouterClient, OpenRouterOption};
use crate::provider::stream::StreamReader;
use crate::provider::{ChatProvider, EmbeddingProvider};
use crate::types::{ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse};
use crate::validation::{validate_chat_request, validate_embedding_request};

use super::request::{convert_chat_request, convert_embedding_request};
use super::response::{convert_chat_response, convert_embedding_response};
use super::stream::BackendStream;

const LOG_TARGET: &str = "llm_gateway::openrouter";

/// Chat capability backed by OpenRouter.
#[derive(Clone)]
pub struct OpenRouterChat {
    client: OpenRouterClient,
}

impl OpenRouterChat {
    pub fn new(client: OpenRouterClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatProvider for OpenRouterChat {
    async fn create(&self, request: ChatRequest) -> Result<ChatResponse, LLMError> {
        validate_chat_request(Some(&request))?;
        tracing::debug!(
            target: LOG_TARGET,
            model = %request.model,
            messages = request.messages.len(),
            "chat completion"
        );
        let wire = convert_chat_request(&request);
        let response = self.client.chat_completion(&wire).await?;
        Ok(convert_chat_response(response))
    }

    async fn create_stream(&self, request: ChatRequest) -> Result<StreamReader, LLMError> {
        validate_chat_request(Some(&request))?;
        tracing::debug!(
            target: LOG_TARGET,
            model = %request.model,
            messages = request.messages.len(),
            "streaming chat completion"
        );
        let wire = convert_chat_request(&request);
        let stream = self.client.chat_completion_stream(&wire).await?;
        Ok(StreamReader::Backend(BackendStream::new(stream)))
    }
}

/// Embeddings capability backed by OpenRouter.
#[derive(Clone)]
pub struct OpenRouterEmbeddings {
    client: OpenRouterClient,
}

impl OpenRouterEmbeddings {
    pub fn new(client: OpenRouterClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenRouterEmbeddings {
    async fn create(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, LLMError> {
        validate_embedding_request(Some(&request))?;
        tracing::debug!(target: LOG_TARGET, model = %request.model, "embeddings");
        let wire = convert_embedding_request(&request);
        let response = self.client.create_embeddings(&wire).await?;
        Ok(convert_embedding_response(response))
    }
}

/// Backend options for the fields of `config` that were explicitly set.
///
/// Empty strings, a zero timeout, an unset retry count, empty headers and
/// `debug == false` are left to the backend defaults.
pub fn build_openrouter_options(config: ClientConfig) -> Vec<OpenRouterOption> {
    let mut options = Vec::new();
    if !config.api_key.is_empty() {
        options.push(OpenRouterOption::ApiKey(config.api_key));
    }
    if !config.base_url.is_empty() {
        options.push(OpenRouterOption::BaseUrl(config.base_url));
    }
    if !config.timeout.is_zero() {
        options.push(OpenRouterOption::Timeout(config.timeout));
    }
    if let Some(retries) = config.max_retries {
        options.push(OpenRouterOption::MaxRetries(retries));
    }
    if !config.headers.is_empty() {
        options.push(OpenRouterOption::Headers(config.headers));
    }
    if config.debug {
        options.push(OpenRouterOption::Debug(true));
    }
    if let Some(span) = config.logger {
        options.push(OpenRouterOption::Logger(span));
    }
    if !config.referer.is_empty() {
        options.push(OpenRouterOption::Referer(config.referer));
    }
    if !config.title.is_empty() {
        options.push(OpenRouterOption::Title(config.title));
    }
    if !config.forwarded_for.is_empty() {
        options.push(OpenRouterOption::ForwardedFor(config.forwarded_for));
    }
    if let Some(transport) = config.transport {
        options.push(OpenRouterOption::Transport(transport));
    }
    options
}
