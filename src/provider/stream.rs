//! Pull-based reader over streamed chat chunks.

use futures_util::stream;

use crate::error::LLMError;
use crate::types::StreamChunk;

use super::ChatStream;
use super::openrouter::BackendStream;

/// Result of one [`StreamReader::next`] pull.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    /// A chunk; the stream continues.
    Chunk(StreamChunk),
    /// The final chunk. The stream ended with this pull.
    Last(StreamChunk),
    /// The stream ended and carries no more data.
    End,
}

impl StreamItem {
    /// Borrowed payload of a `Chunk` or `Last` item.
    pub fn chunk(&self) -> Option<&StreamChunk> {
        match self {
            Self::Chunk(chunk) | Self::Last(chunk) => Some(chunk),
            Self::End => None,
        }
    }

    /// Owned payload of a `Chunk` or `Last` item.
    pub fn into_chunk(self) -> Option<StreamChunk> {
        match self {
            Self::Chunk(chunk) | Self::Last(chunk) => Some(chunk),
            Self::End => None,
        }
    }

    /// True for [`StreamItem::Last`] and [`StreamItem::End`].
    pub fn is_end(&self) -> bool {
        !matches!(self, Self::Chunk(_))
    }
}

/// Streamed chat completion.
///
/// Pull with [`StreamReader::next`] until an item reports [`StreamItem::is_end`],
/// then [`StreamReader::close`]. Once the end was reached every further pull returns
/// [`StreamItem::End`].
///
/// # Examples
///
/// ```
/// # use llm_gateway::provider::stream::{StreamItem, StreamReader};
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut reader = StreamReader::noop();
/// assert_eq!(reader.next().await.unwrap(), StreamItem::End);
/// reader.close();
/// # });
/// ```
pub enum StreamReader {
    Backend(BackendStream),
    /// Ends immediately. Returned by test doubles.
    NoOp,
}

impl StreamReader {
    /// Reader that is already at its end.
    pub fn noop() -> Self {
        Self::NoOp
    }

    /// Pulls the next item.
    ///
    /// # Errors
    ///
    /// Backend failures are returned unchanged.
    pub async fn next(&mut self) -> Result<StreamItem, LLMError> {
        match self {
            Self::Backend(stream) => stream.next().await,
            Self::NoOp => Ok(StreamItem::End),
        }
    }

    /// Releases the underlying connection. Never fails and may be called repeatedly.
    pub fn close(&mut self) {
        if let Self::Backend(stream) = self {
            stream.close();
        }
    }

    /// Converts the reader into a [`futures_core::Stream`] of chunks.
    ///
    /// The stream ends after the final chunk or the first error, closing the reader.
    pub fn into_stream(self) -> ChatStream {
        Box::pin(stream::unfold(Some(self), |reader| async move {
            let mut reader = reader?;
            match reader.next().await {
                Ok(StreamItem::Chunk(chunk)) => Some((Ok(chunk), Some(reader))),
                Ok(StreamItem::Last(chunk)) => {
                    reader.close();
                    Some((Ok(chunk), None))
                }
                Ok(StreamItem::End) => {
                    reader.close();
                    None
                }
                Err(err) => {
                    reader.close();
                    Some((Err(err), None))
                }
            }
        }))
    }
}

impl From<BackendStream> for StreamReader {
    fn from(stream: BackendStream) -> Self {
        Self::Backend(stream)
    }
}
