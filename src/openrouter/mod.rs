//! OpenRouter backend.
//!
//! [`OpenRouterClient`] speaks the OpenRouter wire format defined in [`types`] and
//! knows nothing about the domain model; [`crate::provider::openrouter`] translates
//! between the two.

mod client;
mod error;
mod retry;
pub mod stream;
pub mod types;

pub use client::{OpenRouterClient, OpenRouterOption};
pub use stream::{OpenRouterChatStream, StreamRecv};

/// Public OpenRouter API root.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub(crate) const PROVIDER: &str = "openrouter";
