use futures_util::StreamExt;

use crate::error::LLMError;
use crate::http::HttpBodyStream;
use crate::stream::{SseDecoder, SseEvent};

use super::PROVIDER;
use super::error::embedded_error;
use super::types::OpenRouterStreamChunk;

/// Result of one [`OpenRouterChatStream::recv`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamRecv {
    /// A chunk; more may follow.
    Chunk(OpenRouterStreamChunk),
    /// The body ended right after this chunk, without a `[DONE]` marker.
    Last(OpenRouterStreamChunk),
    /// End of stream.
    Eof,
}

/// Server-sent `/chat/completions` stream.
pub struct OpenRouterChatStream {
    decoder: Option<SseDecoder>,
    finished: bool,
}

impl OpenRouterChatStream {
    pub(crate) fn new(body: HttpBodyStream) -> Self {
        Self {
            decoder: Some(SseDecoder::new(body, PROVIDER)),
            finished: false,
        }
    }

    /// Reads the next chunk.
    ///
    /// # Errors
    ///
    /// Returns [`LLMError::StreamClosed`] after [`OpenRouterChatStream::close`], transport
    /// errors from the body, and [`LLMError::Provider`] for unparsable chunks or
    /// mid-stream errors that are not tied to a choice.
    pub async fn recv(&mut self) -> Result<StreamRecv, LLMError> {
        let Some(decoder) = self.decoder.as_mut() else {
            return Err(LLMError::StreamClosed {
                message: "recv on a closed openrouter stream".to_string(),
            });
        };
        if self.finished {
            return Ok(StreamRecv::Eof);
        }

        match decoder.next().await {
            None | Some(Ok(SseEvent::Done)) => {
                self.finished = true;
                Ok(StreamRecv::Eof)
            }
            Some(Err(err)) => Err(err),
            Some(Ok(SseEvent::Data(data))) => {
                let chunk = parse_chunk(&data)?;
                if decoder.body_closed() && decoder.is_drained() {
                    self.finished = true;
                    Ok(StreamRecv::Last(chunk))
                } else {
                    Ok(StreamRecv::Chunk(chunk))
                }
            }
        }
    }

    /// Releases the HTTP body.
    ///
    /// # Errors
    ///
    /// Returns [`LLMError::StreamClosed`] when the stream was already closed.
    pub fn close(&mut self) -> Result<(), LLMError> {
        match self.decoder.take() {
            Some(_) => Ok(()),
            None => Err(LLMError::StreamClosed {
                message: "openrouter stream already closed".to_string(),
            }),
        }
    }
}

fn parse_chunk(data: &str) -> Result<OpenRouterStreamChunk, LLMError> {
    let chunk: OpenRouterStreamChunk =
        serde_json::from_str(data).map_err(|err| LLMError::Provider {
            provider: PROVIDER,
            message: format!("failed to parse stream chunk: {err}"),
            status: None,
        })?;
    match &chunk.error {
        Some(error) if chunk.choices.is_empty() => Err(embedded_error(None, error)),
        _ => Ok(chunk),
    }
}
