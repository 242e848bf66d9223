//! In-memory providers for tests that should not touch the network.
//!
//! Each mock answers with a fixed response unless a closure overrides it.
//!
//! ```
//! # use std::sync::Arc;
//! # use llm_gateway::client::Client;
//! # use llm_gateway::provider::mock::{MockChatProvider, MockEmbeddingProvider};
//! # use llm_gateway::types::{ChatRequest, Message};
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let client = Client::from_parts(
//!     Arc::new(MockChatProvider::new()),
//!     Arc::new(MockEmbeddingProvider::new()),
//! );
//! let request = ChatRequest::new("any", vec![Message::text("user", "hi")]);
//! let response = client.chat().create(request).await.unwrap();
//! assert_eq!(response.first_text(), Some("mock"));
//! # });
//! ```

use async_trait::async_trait;

use crate::error::LLMError;
use crate::types::{
    ChatRequest, ChatResponse, Choice, EmbeddingData, EmbeddingRequest, EmbeddingResponse,
    Message, role,
};

use super::stream::StreamReader;
use super::{ChatProvider, EmbeddingProvider};

type CreateFn = Box<dyn Fn(ChatRequest) -> Result<ChatResponse, LLMError> + Send + Sync>;
type CreateStreamFn = Box<dyn Fn(ChatRequest) -> Result<StreamReader, LLMError> + Send + Sync>;
type EmbedFn = Box<dyn Fn(EmbeddingRequest) -> Result<EmbeddingResponse, LLMError> + Send + Sync>;

#[derive(Default)]
pub struct MockChatProvider {
    create: Option<CreateFn>,
    create_stream: Option<CreateStreamFn>,
}

impl MockChatProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_create<F>(mut self, f: F) -> Self
    where
        F: Fn(ChatRequest) -> Result<ChatResponse, LLMError> + Send + Sync + 'static,
    {
        self.create = Some(Box::new(f));
        self
    }

    pub fn with_create_stream<F>(mut self, f: F) -> Self
    where
        F: Fn(ChatRequest) -> Result<StreamReader, LLMError> + Send + Sync + 'static,
    {
        self.create_stream = Some(Box::new(f));
        self
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn create(&self, request: ChatRequest) -> Result<ChatResponse, LLMError> {
        match &self.create {
            Some(create) => create(request),
            None => Ok(ChatResponse {
                id: "mock".to_string(),
                model: request.model,
                choices: vec![Choice {
                    index: 0,
                    message: Some(Message::text(role::ASSISTANT, "mock")),
                    finish_reason: Some("stop".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }),
        }
    }

    async fn create_stream(&self, request: ChatRequest) -> Result<StreamReader, LLMError> {
        match &self.create_stream {
            Some(create_stream) => create_stream(request),
            None => Ok(StreamReader::noop()),
        }
    }
}

#[derive(Default)]
pub struct MockEmbeddingProvider {
    create: Option<EmbedFn>,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_create<F>(mut self, f: F) -> Self
    where
        F: Fn(EmbeddingRequest) -> Result<EmbeddingResponse, LLMError> + Send + Sync + 'static,
    {
        self.create = Some(Box::new(f));
        self
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn create(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, LLMError> {
        match &self.create {
            Some(create) => create(request),
            None => Ok(EmbeddingResponse {
                data: vec![EmbeddingData {
                    object: "embedding".to_string(),
                    embedding: vec![0.1],
                    index: 0,
                }],
                usage: None,
            }),
        }
    }
}
