//! In-memory catalog for demo mode and tests.
//!
//! Serves a fixed, deterministic music library so the whole transfer flow
//! can be exercised without credentials or external API calls.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use cadence_core::catalog::LIKED_COLLECTION_ID;
use cadence_core::matching::score;
use cadence_core::{
    AccessToken, CatalogError, CatalogItem, Collection, CollectionRef, DestCatalog, Provider,
    SearchHit, SourceCatalog,
};

const MAX_BATCH: usize = 100;

/// Catalog backed by process memory, usable as source and destination.
///
/// Search ranks the demo library with the same similarity scorer the
/// matcher uses, so demo transfers produce realistic confidence values.
#[derive(Debug)]
pub struct MemoryCatalog {
    provider: Provider,
    collections: Vec<Collection>,
    items: HashMap<String, Vec<CatalogItem>>,
    library: Vec<CatalogItem>,
    created: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryCatalog {
    /// Demo catalog for the given provider, pre-seeded with a small
    /// library of well-known tracks.
    pub fn demo(provider: Provider) -> Self {
        let library = demo_library(provider);
        let playlist: Vec<CatalogItem> = library.iter().take(4).cloned().collect();
        let liked: Vec<CatalogItem> = library.iter().skip(4).cloned().collect();

        let collections = vec![Collection {
            id: format!("{provider}-demo-mix"),
            name: "Demo Mix".to_string(),
            item_count: Some(playlist.len() as u64),
        }];
        let mut items = HashMap::new();
        items.insert(format!("{provider}-demo-mix"), playlist);
        items.insert(LIKED_COLLECTION_ID.to_string(), liked);

        Self {
            provider,
            collections,
            items,
            library,
            created: Mutex::new(HashMap::new()),
        }
    }

    /// Empty catalog seeded with explicit collections, for tests.
    pub fn with_collections(
        provider: Provider,
        collections: Vec<(Collection, Vec<CatalogItem>)>,
    ) -> Self {
        let mut listing = Vec::new();
        let mut items = HashMap::new();
        let mut library = Vec::new();
        for (collection, collection_items) in collections {
            library.extend(collection_items.iter().cloned());
            items.insert(collection.id.clone(), collection_items);
            listing.push(collection);
        }
        Self {
            provider,
            collections: listing,
            items,
            library,
            created: Mutex::new(HashMap::new()),
        }
    }

    /// Item references written to a created collection, by name.
    pub fn written_items(&self, name: &str) -> Option<Vec<String>> {
        self.created.lock().ok()?.get(name).cloned()
    }

    fn locked_created(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<String>>>, CatalogError> {
        self.created.lock().map_err(|_| CatalogError::Transient {
            reason: "demo catalog state poisoned".to_string(),
        })
    }
}

fn demo_library(provider: Provider) -> Vec<CatalogItem> {
    let tracks = [
        ("Bohemian Rhapsody", "Queen"),
        ("Take Five", "The Dave Brubeck Quartet"),
        ("So What", "Miles Davis"),
        ("Clair de Lune", "Claude Debussy"),
        ("Superstition", "Stevie Wonder"),
        ("Heroes", "David Bowie"),
    ];
    tracks
        .iter()
        .enumerate()
        .map(|(index, (title, artist))| CatalogItem {
            id: format!("{provider}-track-{}", index + 1),
            display_name: title.to_string(),
            primary_artist: Some(artist.to_string()),
            raw: json!({ "title": title, "artist": artist, "demo": true }),
        })
        .collect()
}

#[async_trait]
impl SourceCatalog for MemoryCatalog {
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
        self.items
            .get(collection_id)
            .cloned()
            .ok_or_else(|| CatalogError::InvalidData {
                reason: format!("unknown collection {collection_id}"),
            })
    }
}

#[async_trait]
impl DestCatalog for MemoryCatalog {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn max_batch_size(&self) -> usize {
        MAX_BATCH
    }

    async fn search(
        &self,
        _token: &AccessToken,
        query: &str,
    ) -> Result<Vec<SearchHit>, CatalogError> {
        let best = self
            .library
            .iter()
            .max_by(|a, b| {
                score(&a.display_name, query)
                    .total_cmp(&score(&b.display_name, query))
            })
            .map(|item| SearchHit {
                ref_id: item.id.clone(),
                title: item.display_name.clone(),
                artist: item.primary_artist.clone(),
            });
        Ok(best.into_iter().collect())
    }

    async fn create_collection(
        &self,
        _token: &AccessToken,
        name: &str,
        _description: &str,
    ) -> Result<CollectionRef, CatalogError> {
        let mut created = self.locked_created()?;
        created.entry(name.to_string()).or_default();
        Ok(CollectionRef(name.to_string()))
    }

    async fn add_items(
        &self,
        _token: &AccessToken,
        collection: &CollectionRef,
        item_refs: &[String],
    ) -> Result<(), CatalogError> {
        let mut created = self.locked_created()?;
        let entries = created
            .get_mut(&collection.0)
            .ok_or_else(|| CatalogError::InvalidData {
                reason: format!("unknown destination collection {}", collection.0),
            })?;
        entries.extend(item_refs.iter().cloned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> AccessToken {
        AccessToken::new("demo")
    }

    #[tokio::test]
    async fn demo_catalog_lists_a_mix_and_liked_songs() {
        let catalog = MemoryCatalog::demo(Provider::Spotify);

        let collections = catalog.list_collections(&token()).await.unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].name, "Demo Mix");

        let mix = catalog
            .list_items(&token(), &collections[0].id)
            .await
            .unwrap();
        let liked = catalog
            .list_items(&token(), LIKED_COLLECTION_ID)
            .await
            .unwrap();
        assert!(!mix.is_empty());
        assert!(!liked.is_empty());
    }

    #[tokio::test]
    async fn search_returns_the_best_scoring_track() {
        let catalog = MemoryCatalog::demo(Provider::Youtube);

        let hits = catalog
            .search(&token(), "Bohemian Rhapsody")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Bohemian Rhapsody");
    }

    #[tokio::test]
    async fn writes_accumulate_under_the_created_collection() {
        let catalog = MemoryCatalog::demo(Provider::Youtube);

        let created = catalog
            .create_collection(&token(), "My Transfer", "desc")
            .await
            .unwrap();
        catalog
            .add_items(&token(), &created, &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        catalog
            .add_items(&token(), &created, &["c".to_string()])
            .await
            .unwrap();

        assert_eq!(
            catalog.written_items("My Transfer"),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[tokio::test]
    async fn adding_to_an_unknown_collection_is_invalid() {
        let catalog = MemoryCatalog::demo(Provider::Youtube);
        let result = catalog
            .add_items(&token(), &CollectionRef("nope".to_string()), &["a".to_string()])
            .await;
        assert!(matches!(result, Err(CatalogError::InvalidData { .. })));
    }
}
