//! Provider-agnostic LLM chat and embeddings client.
//!
//! Callers work with the types in [`types`] and the capabilities exposed by
//! [`client::Client`]; the OpenRouter backend in [`openrouter`] performs the network
//! calls.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod openrouter;
pub mod provider;
pub mod stream;
pub mod types;
pub mod validation;

pub use client::Client;
pub use config::ClientOption;
pub use error::{ErrorKind, LLMError, UnknownProviderError, ValidationError};
pub use provider::{
    ChatProvider, ChatStream, EmbeddingProvider, ProviderKind, StreamItem, StreamReader,
};
pub use types::*;
