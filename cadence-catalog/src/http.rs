//! HTTP status and transport error classification shared by providers.

use cadence_core::{CatalogError, Provider};

/// Longest body excerpt carried into error messages.
const BODY_SNIPPET_LEN: usize = 200;

/// Maps a non-success response to the engine's failure taxonomy.
///
/// 401 means the bearer token died mid-transfer; 429 is a rate budget
/// violation the caller should back off from. YouTube reports daily quota
/// exhaustion as 403 with "quota" somewhere in the body, which is terminal
/// for the whole transfer; any other 403 is treated as transient since the
/// providers also use it for flaky permission checks. Remaining 4xx codes
/// are invalid requests and not worth retrying.
pub fn classify_status(provider: Provider, status: u16, body: &str) -> CatalogError {
    match status {
        401 => CatalogError::AuthExpired {
            provider: provider.to_string(),
        },
        429 => CatalogError::RateLimited {
            provider: provider.to_string(),
        },
        403 if provider == Provider::Youtube && body.to_lowercase().contains("quota") => {
            CatalogError::QuotaExceeded {
                provider: provider.to_string(),
                reason: snippet(body),
            }
        }
        403 => CatalogError::Transient {
            reason: format!("{provider} returned 403: {}", snippet(body)),
        },
        code if code >= 500 => CatalogError::Transient {
            reason: format!("{provider} returned {code}: {}", snippet(body)),
        },
        code => CatalogError::InvalidData {
            reason: format!("{provider} rejected request with {code}: {}", snippet(body)),
        },
    }
}

/// Network-level failures (DNS, connect, timeout) are always retryable.
pub fn transport_error(provider: Provider, error: &reqwest::Error) -> CatalogError {
    CatalogError::Transient {
        reason: format!("{provider} request failed: {error}"),
    }
}

/// Body decode failures after a 2xx status.
pub fn decode_error(provider: Provider, error: &reqwest::Error) -> CatalogError {
    CatalogError::Parse {
        reason: format!("{provider} response could not be decoded: {error}"),
    }
}

/// Passes a successful response through, classifying anything else.
pub async fn check_response(
    provider: Provider,
    response: reqwest::Response,
) -> Result<reqwest::Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(provider, status.as_u16(), &body))
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no body".to_string();
    }
    trimmed.chars().take(BODY_SNIPPET_LEN).collect()
}
