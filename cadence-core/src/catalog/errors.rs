//! Error taxonomy for catalog operations.
//!
//! The retry policy and the orchestrator key their decisions off these
//! variants: rate limiting and transient failures are retried, auth expiry
//! and quota exhaustion abort the whole transfer, invalid data skips the
//! single item.

use thiserror::Error;

/// Errors that can occur when talking to a catalog provider.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Credential no longer valid; re-authentication is the caller's job.
    #[error("Authentication expired for {provider}")]
    AuthExpired {
        /// Provider that rejected the credential
        provider: String,
    },

    /// Provider throttled the request (HTTP 429-equivalent).
    #[error("Rate limited by {provider}")]
    RateLimited {
        /// Provider that throttled the request
        provider: String,
    },

    /// Provider write quota exhausted (HTTP 403-equivalent indicating quota,
    /// not permission). Fatal for the entire transfer.
    #[error("Quota exceeded on {provider}: {reason}")]
    QuotaExceeded {
        /// Provider whose quota ran out
        provider: String,
        /// Human-readable quota condition
        reason: String,
    },

    /// Network failure or provider-side 5xx; worth retrying.
    #[error("Transient error: {reason}")]
    Transient {
        /// What went wrong
        reason: String,
    },

    /// Item or response missing required fields; the single item is skipped.
    #[error("Invalid data: {reason}")]
    InvalidData {
        /// Which field or shape was wrong
        reason: String,
    },

    /// Response body could not be decoded.
    #[error("Parse error: {reason}")]
    Parse {
        /// Why decoding failed
        reason: String,
    },
}

impl CatalogError {
    /// Whether the retry policy should attempt this operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CatalogError::RateLimited { .. }
                | CatalogError::Transient { .. }
                | CatalogError::Parse { .. }
        )
    }

    /// Whether this error must abort the entire transfer rather than skip
    /// the current item or collection.
    pub fn is_fatal_for_transfer(&self) -> bool {
        matches!(
            self,
            CatalogError::QuotaExceeded { .. } | CatalogError::AuthExpired { .. }
        )
    }
}
