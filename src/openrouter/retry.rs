use std::collections::HashMap;
use std::time::Duration;

use crate::error::LLMError;

const BASE_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);
/// Ceiling for a server-supplied `Retry-After`.
pub(crate) const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Extracts the `Retry-After` header (in seconds) if present.
///
/// HTTP-date values are ignored; OpenRouter and its upstreams send the numeric form.
pub(crate) fn retry_after_from_headers(headers: &HashMap<String, String>) -> Option<Duration> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("retry-after"))
        .and_then(|(_, value)| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Delay before retry number `attempt + 1`.
///
/// A provider-suggested wait wins, bounded by [`MAX_RETRY_AFTER`]; otherwise the delay
/// doubles per attempt, capped.
pub(crate) fn backoff_delay(err: &LLMError, attempt: u32) -> Duration {
    if let LLMError::RateLimit {
        retry_after: Some(wait),
        ..
    } = err
    {
        return (*wait).min(MAX_RETRY_AFTER);
    }
    BASE_BACKOFF
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(MAX_BACKOFF)
}
