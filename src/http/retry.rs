//! Retry policy for reachability probes.

use reqwest::StatusCode;

/// Maximum number of attempts per probed URL.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Responses that will not change on retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonRetryableError {
    /// HTTP 429, or a 403 carrying a rate-limit message
    RateLimitExceeded,
    /// HTTP 401
    AuthenticationFailed,
    /// HTTP 403 without a rate-limit message
    Forbidden,
    /// HTTP 404 or 410
    NotFound(u16),
    /// Any other 4xx
    ClientError(u16),
}

impl std::fmt::Display for NonRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonRetryableError::RateLimitExceeded => write!(
                f,
                "rate limit exceeded; try again later or set GITHUB_TOKEN"
            ),
            NonRetryableError::AuthenticationFailed => {
                write!(f, "authentication required (HTTP 401)")
            }
            NonRetryableError::Forbidden => write!(f, "access forbidden (HTTP 403)"),
            NonRetryableError::NotFound(status) => write!(f, "not found (HTTP {})", status),
            NonRetryableError::ClientError(status) => {
                write!(f, "request rejected (HTTP {})", status)
            }
        }
    }
}

impl std::error::Error for NonRetryableError {}

/// Classify a response status.
///
/// `Ok(())` means the status is either a success or worth retrying (5xx);
/// `Err` carries the reason a retry would not help.
pub fn classify_status(status: StatusCode, body_hint: &str) -> Result<(), NonRetryableError> {
    match status {
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed),
        StatusCode::FORBIDDEN if body_hint.to_lowercase().contains("rate limit") => {
            Err(NonRetryableError::RateLimitExceeded)
        }
        StatusCode::FORBIDDEN => Err(NonRetryableError::Forbidden),
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimitExceeded),
        StatusCode::NOT_FOUND | StatusCode::GONE => {
            Err(NonRetryableError::NotFound(status.as_u16()))
        }
        s if s.is_client_error() => Err(NonRetryableError::ClientError(s.as_u16())),
        _ => Ok(()),
    }
}

/// Whether an error from a probe attempt is worth another try.
pub fn is_retryable_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<NonRetryableError>().is_none()
}
