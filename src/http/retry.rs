//! Classification of download failures into retryable and final ones.

use reqwest::StatusCode;

/// Attempts per download, including the first one.
pub const MAX_RETRIES: usize = 3;

/// Pause between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// A failure that another attempt cannot fix.
#[derive(Debug, thiserror::Error)]
pub enum NonRetryableError {
    #[error("Authentication required to download {0}")]
    AuthenticationFailed(String),
    #[error("Access to {0} is forbidden")]
    Forbidden(String),
    #[error("Archive not found: {0}")]
    NotFound(String),
    #[error("Too many requests to {0}, try again later")]
    RateLimited(String),
    #[error("Request for {url} failed with HTTP {status}")]
    ClientError { url: String, status: u16 },
}

/// `Ok(())` when the request may succeed on another attempt.
///
/// Server errors and transport failures are retried. Client errors are not.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        return Ok(());
    };
    let url = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "<unknown>".to_string());

    match status {
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed(url)),
        StatusCode::FORBIDDEN => Err(NonRetryableError::Forbidden(url)),
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(url)),
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimited(url)),
        s if s.is_client_error() => Err(NonRetryableError::ClientError {
            url,
            status: s.as_u16(),
        }),
        _ => Ok(()),
    }
}

/// Map an `error_for_status()` failure to the error the retry loop sees.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}
