//! Cadence Core - Transfer orchestration and cross-catalog matching
//!
//! Provides the engine that copies music collections between streaming
//! catalog providers: rate-limited pagination of source listings, heuristic
//! matching against the destination's search index, batched writes, and an
//! ordered progress event stream for incremental consumption.

pub mod catalog;
pub mod config;
pub mod matching;
pub mod net;
pub mod tracing_setup;
pub mod transfer;

// Re-export main types for convenient access
pub use catalog::{
    AccessToken, CatalogError, CatalogItem, Collection, CollectionRef, DestCatalog, Provider,
    SearchHit, SourceCatalog,
};
pub use config::CadenceConfig;
pub use matching::{Matcher, score};
pub use net::{Page, Paginator, RateLimiter, RetryPolicy};
pub use transfer::{
    CancelToken, EventDecoder, Severity, TransferContext, TransferEvent, TransferRequest,
    TransferStream, TransferSummary, spawn_transfer,
};

/// Convenience type alias for Results with CatalogError.
pub type Result<T> = std::result::Result<T, CatalogError>;
