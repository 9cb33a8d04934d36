//! Scripted in-memory catalogs for pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::catalog::{
    AccessToken, CatalogError, CatalogItem, Collection, CollectionRef, DestCatalog, Provider,
    SearchHit, SourceCatalog,
};

/// Failure a mock injects; fresh `CatalogError` per call since errors are
/// not `Clone`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FailKind {
    Transient,
    RateLimited,
    AuthExpired,
    Quota,
}

impl FailKind {
    pub(crate) fn to_error(self, provider: Provider) -> CatalogError {
        match self {
            FailKind::Transient => CatalogError::Transient {
                reason: "scripted transient failure".to_string(),
            },
            FailKind::RateLimited => CatalogError::RateLimited {
                provider: provider.to_string(),
            },
            FailKind::AuthExpired => CatalogError::AuthExpired {
                provider: provider.to_string(),
            },
            FailKind::Quota => CatalogError::QuotaExceeded {
                provider: provider.to_string(),
                reason: "scripted quota exhaustion".to_string(),
            },
        }
    }
}

pub(crate) fn item(id: &str, name: &str, artist: &str) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        display_name: name.to_string(),
        primary_artist: (!artist.is_empty()).then(|| artist.to_string()),
        raw: serde_json::Value::Null,
    }
}

/// Source catalog backed by fixed collections, with per-collection fetch
/// failure injection.
pub(crate) struct MockSource {
    provider: Provider,
    collections: Vec<Collection>,
    items: HashMap<String, Vec<CatalogItem>>,
    failing: HashMap<String, FailKind>,
}

impl MockSource {
    pub(crate) fn new(provider: Provider) -> Self {
        Self {
            provider,
            collections: Vec::new(),
            items: HashMap::new(),
            failing: HashMap::new(),
        }
    }

    pub(crate) fn with_collection(mut self, id: &str, name: &str, items: Vec<CatalogItem>) -> Self {
        self.collections.push(Collection {
            id: id.to_string(),
            name: name.to_string(),
            item_count: Some(items.len() as u64),
        });
        self.items.insert(id.to_string(), items);
        self
    }

    /// Items for the liked-songs pseudo-collection, which never appears in
    /// the collection listing.
    pub(crate) fn with_liked(mut self, items: Vec<CatalogItem>) -> Self {
        self.items
            .insert(crate::catalog::LIKED_COLLECTION_ID.to_string(), items);
        self
    }

    pub(crate) fn failing_fetch(mut self, id: &str, kind: FailKind) -> Self {
        self.failing.insert(id.to_string(), kind);
        self
    }
}

#[async_trait]
impl SourceCatalog for MockSource {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn list_collections(
        &self,
        _token: &AccessToken,
    ) -> Result<Vec<Collection>, CatalogError> {
        Ok(self.collections.clone())
    }

    async fn list_items(
        &self,
        _token: &AccessToken,
        collection_id: &str,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        if let Some(kind) = self.failing.get(collection_id) {
            return Err(kind.to_error(self.provider));
        }
        self.items
            .get(collection_id)
            .cloned()
            .ok_or_else(|| CatalogError::InvalidData {
                reason: format!("unknown collection {collection_id}"),
            })
    }
}

/// Destination catalog with scripted search hits and write failures,
/// recording every call it sees.
pub(crate) struct MockDest {
    provider: Provider,
    batch_size: usize,
    hits: HashMap<String, SearchHit>,
    failing_searches: HashMap<String, FailKind>,
    create_failure: Option<FailKind>,
    add_failures: HashMap<usize, FailKind>,
    add_calls: AtomicUsize,
    pub(crate) searches: Mutex<Vec<String>>,
    pub(crate) created: Mutex<Vec<String>>,
    pub(crate) added: Mutex<Vec<Vec<String>>>,
}

impl MockDest {
    pub(crate) fn new(provider: Provider, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size,
            hits: HashMap::new(),
            failing_searches: HashMap::new(),
            create_failure: None,
            add_failures: HashMap::new(),
            add_calls: AtomicUsize::new(0),
            searches: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            added: Mutex::new(Vec::new()),
        }
    }

    /// Scripts the top hit for an exact query string.
    pub(crate) fn with_hit(mut self, query: &str, ref_id: &str, title: &str) -> Self {
        self.hits.insert(
            query.to_string(),
            SearchHit {
                ref_id: ref_id.to_string(),
                title: title.to_string(),
                artist: None,
            },
        );
        self
    }

    /// Makes every search for the query fail.
    pub(crate) fn failing_search(mut self, query: &str, kind: FailKind) -> Self {
        self.failing_searches.insert(query.to_string(), kind);
        self
    }

    pub(crate) fn failing_create(mut self, kind: FailKind) -> Self {
        self.create_failure = Some(kind);
        self
    }

    /// Fails the nth `add_items` invocation, counting retries.
    pub(crate) fn failing_add(mut self, call_index: usize, kind: FailKind) -> Self {
        self.add_failures.insert(call_index, kind);
        self
    }
}

#[async_trait]
impl DestCatalog for MockDest {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn max_batch_size(&self) -> usize {
        self.batch_size
    }

    async fn search(
        &self,
        _token: &AccessToken,
        query: &str,
    ) -> Result<Vec<SearchHit>, CatalogError> {
        self.searches.lock().unwrap().push(query.to_string());
        if let Some(kind) = self.failing_searches.get(query) {
            return Err(kind.to_error(self.provider));
        }
        Ok(self.hits.get(query).cloned().into_iter().collect())
    }

    async fn create_collection(
        &self,
        _token: &AccessToken,
        name: &str,
        _description: &str,
    ) -> Result<CollectionRef, CatalogError> {
        if let Some(kind) = self.create_failure {
            return Err(kind.to_error(self.provider));
        }
        let mut created = self.created.lock().unwrap();
        created.push(name.to_string());
        Ok(CollectionRef(format!("dest-{}", created.len())))
    }

    async fn add_items(
        &self,
        _token: &AccessToken,
        _collection: &CollectionRef,
        item_refs: &[String],
    ) -> Result<(), CatalogError> {
        let call = self.add_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = self.add_failures.get(&call) {
            return Err(kind.to_error(self.provider));
        }
        self.added.lock().unwrap().push(item_refs.to_vec());
        Ok(())
    }
}
