//! Centralized configuration for Cadence.
//!
//! All tunable parameters are defined here to avoid hard-coded values
//! scattered throughout the codebase. Defaults mirror the quota posture of
//! the two supported providers: Spotify tolerates ~10 req/s, YouTube's
//! quota accounting is far stricter.

use std::time::Duration;

use crate::catalog::Provider;

/// Central configuration for all Cadence components.
#[derive(Debug, Clone, Default)]
pub struct CadenceConfig {
    pub spotify: ProviderLimits,
    pub youtube: ProviderLimits,
    pub retry: RetryConfig,
    pub matching: MatchingConfig,
}

impl CadenceConfig {
    /// Limits for the given provider.
    pub fn limits(&self, provider: Provider) -> &ProviderLimits {
        match provider {
            Provider::Spotify => &self.spotify,
            Provider::Youtube => &self.youtube,
        }
    }
}

/// Per-provider rate budget and pagination ceilings.
#[derive(Debug, Clone)]
pub struct ProviderLimits {
    /// Token bucket capacity (requests per refill interval)
    pub rate_capacity: u32,
    /// Token bucket refill interval
    pub refill_interval: Duration,
    /// Maximum pages drained when listing collections
    pub collection_page_ceiling: u32,
    /// Maximum pages drained when listing a collection's items
    pub item_page_ceiling: u32,
}

impl Default for ProviderLimits {
    fn default() -> Self {
        Self {
            rate_capacity: 10,
            refill_interval: Duration::from_millis(1000),
            collection_page_ceiling: 50,
            item_page_ceiling: 50,
        }
    }
}

impl ProviderLimits {
    /// Spotify posture: ~10 req/s, deep pagination allowed.
    pub fn spotify() -> Self {
        Self::default()
    }

    /// YouTube posture: ~5 req/s and a shallower playlist-listing ceiling,
    /// since every page costs quota units.
    pub fn youtube() -> Self {
        Self {
            rate_capacity: 5,
            refill_interval: Duration::from_millis(1000),
            collection_page_ceiling: 20,
            item_page_ceiling: 50,
        }
    }
}

/// Exponential backoff settings applied around remote calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retry attempts after the initial call
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt, no jitter
    pub initial_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

/// Cross-catalog matching thresholds.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Minimum similarity score for a confident match; lower-scoring top
    /// results are still accepted but flagged with a warning
    pub confidence_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.4,
        }
    }
}

impl CadenceConfig {
    /// Configuration with provider-appropriate defaults for both catalogs.
    pub fn with_provider_defaults() -> Self {
        Self {
            spotify: ProviderLimits::spotify(),
            youtube: ProviderLimits::youtube(),
            ..Self::default()
        }
    }
}
