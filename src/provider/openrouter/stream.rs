use crate::error::LLMError;
use crate::openrouter::{OpenRouterChatStream, StreamRecv};
use crate::provider::stream::StreamItem;

use super::response::convert_stream_chunk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    /// The backend reported end-of-stream.
    Exhausted,
    Closed,
}

/// Adapts an [`OpenRouterChatStream`] to the pull protocol of
/// [`crate::provider::stream::StreamReader`].
///
/// Once end-of-stream has been seen, or after [`BackendStream::close`], every pull
/// yields [`StreamItem::End`].
pub struct BackendStream {
    inner: Option<OpenRouterChatStream>,
    state: State,
}

impl BackendStream {
    pub fn new(inner: OpenRouterChatStream) -> Self {
        Self {
            inner: Some(inner),
            state: State::Open,
        }
    }

    pub async fn next(&mut self) -> Result<StreamItem, LLMError> {
        if self.state != State::Open {
            return Ok(StreamItem::End);
        }
        let Some(inner) = self.inner.as_mut() else {
            return Ok(StreamItem::End);
        };

        match inner.recv().await? {
            StreamRecv::Chunk(chunk) => Ok(StreamItem::Chunk(convert_stream_chunk(chunk))),
            StreamRecv::Last(chunk) => {
                self.state = State::Exhausted;
                Ok(StreamItem::Last(convert_stream_chunk(chunk)))
            }
            StreamRecv::Eof => {
                self.state = State::Exhausted;
                Ok(StreamItem::End)
            }
        }
    }

    /// Releases the backend stream. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.state = State::Closed;
        if let Some(mut inner) = self.inner.take() {
            if let Err(err) = inner.close() {
                tracing::debug!(
                    target: "llm_gateway::openrouter",
                    error = %err,
                    "ignoring error while closing stream"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    fn backend(chunks: Vec<&str>) -> BackendStream {
        let body = chunks
            .into_iter()
            .map(|chunk| Ok(chunk.as_bytes().to_vec()))
            .collect::<Vec<Result<Vec<u8>, LLMError>>>();
        BackendStream::new(OpenRouterChatStream::new(Box::pin(stream::iter(body))))
    }

    const HELLO: &str = concat!(
        "data: {\"id\":\"gen-1\",",
        "\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hello\"}}]}\n\n"
    );

    #[tokio::test]
    async fn end_is_sticky_after_done() {
        let mut stream = backend(vec![HELLO, "data: [DONE]\n\n"]);

        let first = stream.next().await.expect("chunk");
        let delta = first.chunk().and_then(|chunk| chunk.choices[0].delta.clone());
        assert_eq!(delta.and_then(|d| d.as_text().map(str::to_string)).as_deref(), Some("Hello"));

        for _ in 0..3 {
            assert!(matches!(stream.next().await, Ok(StreamItem::End)));
        }
    }

    #[tokio::test]
    async fn trailing_chunk_is_delivered_once_with_end() {
        let tail = HELLO.trim_end_matches('\n');
        let mut stream = backend(vec![tail]);

        match stream.next().await.expect("last") {
            StreamItem::Last(chunk) => assert_eq!(chunk.id, "gen-1"),
            other => panic!("unexpected item: {other:?}"),
        }
        assert!(matches!(stream.next().await, Ok(StreamItem::End)));
        assert!(matches!(stream.next().await, Ok(StreamItem::End)));
    }

    #[tokio::test]
    async fn backend_errors_pass_through_unchanged() {
        let mut stream = backend(vec!["data: {not json}\n\n"]);
        match stream.next().await {
            Err(LLMError::Provider { provider, .. }) => assert_eq!(provider, "openrouter"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_is_idempotent_and_ends_the_stream() {
        let mut stream = backend(vec![HELLO, "data: [DONE]\n\n"]);
        stream.close();
        stream.close();
        assert!(matches!(stream.next().await, Ok(StreamItem::End)));
    }

    #[tokio::test]
    async fn backend_close_error_is_swallowed() {
        let body = stream::empty::<Result<Vec<u8>, LLMError>>();
        let mut inner = OpenRouterChatStream::new(Box::pin(body));
        inner.close().expect("first close");
        let mut stream = BackendStream::new(inner);

        stream.close();
        assert!(matches!(stream.next().await, Ok(StreamItem::End)));
    }
}
