use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::LLMError;

use super::PROVIDER;
use super::retry::retry_after_from_headers;
use super::types::OpenRouterChoiceError;

/// Maps a non-2xx OpenRouter response to an [`LLMError`].
pub(crate) fn parse_openrouter_error(
    status: u16,
    headers: &HashMap<String, String>,
    body: &str,
) -> LLMError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<InnerError>,
    }
    #[derive(Deserialize)]
    struct InnerError {
        message: Option<String>,
        #[serde(default)]
        metadata: Option<Value>,
    }

    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: Some(error),
        }) => {
            let mut message = error.message.unwrap_or_else(|| "unknown error".to_string());
            if let Some(raw) = error
                .metadata
                .as_ref()
                .and_then(|meta| meta.get("raw"))
                .and_then(Value::as_str)
            {
                message = format!("{message} ({raw})");
            }
            message
        }
        _ => format!("status {status}: {body}"),
    };

    match status {
        401 | 403 => LLMError::Auth { message },
        429 => LLMError::RateLimit {
            message,
            retry_after: retry_after_from_headers(headers),
        },
        _ => LLMError::Provider {
            provider: PROVIDER,
            message,
            status: Some(status),
        },
    }
}

/// Maps a top-level `error` object that arrived in a body the transport accepted.
///
/// `status` is the HTTP status of the response; it is `None` for stream chunks.
pub(crate) fn embedded_error(status: Option<u16>, error: &OpenRouterChoiceError) -> LLMError {
    LLMError::Provider {
        provider: PROVIDER,
        message: format!("error {}: {}", error.code, error.message),
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn maps_auth_errors() {
        let err = parse_openrouter_error(
            401,
            &HashMap::new(),
            r#"{"error":{"code":401,"message":"No auth credentials found"}}"#,
        );
        match err {
            LLMError::Auth { message } => assert_eq!(message, "No auth credentials found"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn maps_rate_limit_with_retry_after() {
        let headers = HashMap::from([("retry-after".to_string(), "2".to_string())]);
        let err = parse_openrouter_error(
            429,
            &headers,
            concat!(
                r#"{"error":{"code":429,"message":"Rate limit exceeded","#,
                r#""metadata":{"raw":"upstream busy"}}}"#
            ),
        );
        match err {
            LLMError::RateLimit {
                message,
                retry_after,
            } => {
                assert_eq!(message, "Rate limit exceeded (upstream busy)");
                assert_eq!(retry_after, Some(Duration::from_secs(2)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn keeps_status_for_other_failures() {
        let err = parse_openrouter_error(502, &HashMap::new(), "<html>bad gateway</html>");
        match err {
            LLMError::Provider {
                provider,
                message,
                status,
            } => {
                assert_eq!(provider, "openrouter");
                assert_eq!(status, Some(502));
                assert!(message.contains("bad gateway"), "message: {message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn embedded_error_keeps_code_and_status() {
        let err = embedded_error(
            Some(200),
            &OpenRouterChoiceError {
                code: 502,
                message: "upstream provider failed".to_string(),
            },
        );
        match err {
            LLMError::Provider {
                provider,
                message,
                status,
            } => {
                assert_eq!(provider, "openrouter");
                assert_eq!(status, Some(200));
                assert_eq!(message, "error 502: upstream provider failed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
