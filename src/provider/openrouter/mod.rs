//! OpenRouter implementation of the chat and embeddings capabilities.

mod provider;
pub mod request;
pub mod response;
mod stream;

pub use provider::{OpenRouterChat, OpenRouterEmbeddings, build_openrouter_options};
pub use stream::BackendStream;
