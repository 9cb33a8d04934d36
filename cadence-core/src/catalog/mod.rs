//! Catalog provider contracts.
//!
//! The engine depends only on these traits; concrete HTTP bindings live in
//! the `cadence-catalog` crate and are injected at process start.

use async_trait::async_trait;

pub mod errors;
pub mod types;

pub use errors::CatalogError;
pub use types::{AccessToken, CatalogItem, Collection, CollectionRef, Provider, SearchHit};

/// Collection id for the liked/saved-tracks pseudo-collection.
///
/// Providers expose saved tracks under this well-known id; the orchestrator
/// names the resulting destination collection accordingly.
pub const LIKED_COLLECTION_ID: &str = "liked_songs";

/// Read side of a catalog provider.
///
/// Implementations paginate internally under their own rate budget; callers
/// receive complete in-memory sequences.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Which provider this catalog speaks for.
    fn provider(&self) -> Provider;

    /// Lists the user's collections (playlists), fully drained.
    ///
    /// # Errors
    /// - `CatalogError::AuthExpired` - Credential rejected by the provider
    /// - `CatalogError::RateLimited` - Provider throttled the listing
    /// - `CatalogError::Transient` - Network or provider-side failure
    async fn list_collections(&self, token: &AccessToken) -> Result<Vec<Collection>, CatalogError>;

    /// Lists all items of one collection, fully drained and in order.
    ///
    /// The id [`LIKED_COLLECTION_ID`] selects the liked-tracks
    /// pseudo-collection. Entries the provider reports as null are dropped
    /// silently, not surfaced as failures.
    ///
    /// # Errors
    /// - `CatalogError::AuthExpired` - Credential rejected by the provider
    /// - `CatalogError::RateLimited` - Provider throttled the listing
    /// - `CatalogError::Transient` - Network or provider-side failure
    async fn list_items(
        &self,
        token: &AccessToken,
        collection_id: &str,
    ) -> Result<Vec<CatalogItem>, CatalogError>;
}

/// Write side of a catalog provider.
///
/// Single remote calls; the orchestrator wraps each of them in the shared
/// rate limiter and retry policy.
#[async_trait]
pub trait DestCatalog: Send + Sync {
    /// Which provider this catalog speaks for.
    fn provider(&self) -> Provider;

    /// Maximum number of item references accepted by one `add_items` call.
    ///
    /// Bulk-capable providers return their batch ceiling (e.g. 100);
    /// providers without bulk-add return 1.
    fn max_batch_size(&self) -> usize;

    /// Searches the destination index, best hits first. Callers use the top
    /// hit only.
    ///
    /// # Errors
    /// - `CatalogError::AuthExpired` - Credential rejected by the provider
    /// - `CatalogError::RateLimited` - Provider throttled the search
    /// - `CatalogError::Transient` - Network or provider-side failure
    async fn search(
        &self,
        token: &AccessToken,
        query: &str,
    ) -> Result<Vec<SearchHit>, CatalogError>;

    /// Creates a new (private) collection and returns its reference.
    ///
    /// # Errors
    /// - `CatalogError::AuthExpired` - Credential rejected by the provider
    /// - `CatalogError::QuotaExceeded` - Provider write quota exhausted
    /// - `CatalogError::Transient` - Network or provider-side failure
    async fn create_collection(
        &self,
        token: &AccessToken,
        name: &str,
        description: &str,
    ) -> Result<CollectionRef, CatalogError>;

    /// Adds item references to a collection. `item_refs` must not exceed
    /// [`max_batch_size`](DestCatalog::max_batch_size).
    ///
    /// # Errors
    /// - `CatalogError::QuotaExceeded` - Provider write quota exhausted
    /// - `CatalogError::RateLimited` - Provider throttled the write
    /// - `CatalogError::Transient` - Network or provider-side failure
    async fn add_items(
        &self,
        token: &AccessToken,
        collection: &CollectionRef,
        item_refs: &[String],
    ) -> Result<(), CatalogError>;
}
