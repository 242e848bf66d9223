//! Pre-flight checks run before a request reaches the backend.
//!
//! Only structural emptiness is checked. Message contents and embedding input
//! elements are left for the backend to judge.

use crate::error::ValidationError;
use crate::types::{ChatRequest, EmbeddingInput, EmbeddingRequest};

/// Checks that a chat request is present and names a model and at least one message.
///
/// # Errors
///
/// | field | message |
/// |---|---|
/// | `request` | `cannot be nil` |
/// | `model` | `cannot be empty` |
/// | `messages` | `cannot be empty` |
///
/// # Examples
///
/// ```
/// use llm_gateway::error::ValidationError;
/// use llm_gateway::types::{ChatRequest, Message};
/// use llm_gateway::validation::validate_chat_request;
///
/// let request = ChatRequest::new("", vec![Message::text("user", "hi")]);
/// assert_eq!(
///     validate_chat_request(Some(&request)),
///     Err(ValidationError::new("model", "cannot be empty"))
/// );
/// ```
pub fn validate_chat_request(request: Option<&ChatRequest>) -> Result<(), ValidationError> {
    let request = request.ok_or_else(|| ValidationError::new("request", "cannot be nil"))?;
    if request.model.is_empty() {
        return Err(ValidationError::new("model", "cannot be empty"));
    }
    if request.messages.is_empty() {
        return Err(ValidationError::new("messages", "cannot be empty"));
    }
    Ok(())
}

/// Checks that an embedding request is present, names a model and carries non-empty input.
///
/// # Errors
///
/// | field | message |
/// |---|---|
/// | `request` | `cannot be nil` |
/// | `model` | `cannot be empty` |
/// | `input` | `cannot be nil` |
/// | `input` | `cannot be empty string` |
/// | `input` | `cannot be empty slice` (text batch or value list) |
pub fn validate_embedding_request(
    request: Option<&EmbeddingRequest>,
) -> Result<(), ValidationError> {
    let request = request.ok_or_else(|| ValidationError::new("request", "cannot be nil"))?;
    if request.model.is_empty() {
        return Err(ValidationError::new("model", "cannot be empty"));
    }
    match &request.input {
        None => Err(ValidationError::new("input", "cannot be nil")),
        Some(EmbeddingInput::Text(text)) if text.is_empty() => {
            Err(ValidationError::new("input", "cannot be empty string"))
        }
        Some(EmbeddingInput::TextBatch(batch)) if batch.is_empty() => {
            Err(ValidationError::new("input", "cannot be empty slice"))
        }
        Some(EmbeddingInput::Values(values)) if values.is_empty() => {
            Err(ValidationError::new("input", "cannot be empty slice"))
        }
        Some(_) => Ok(()),
    }
}
