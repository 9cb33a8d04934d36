//! Destination-catalog match resolution for source items.

use std::sync::Arc;

use crate::catalog::{AccessToken, CatalogError, CatalogItem, DestCatalog};
use crate::config::MatchingConfig;
use crate::net::{RateLimiter, RetryPolicy};

use super::similarity::{normalize, score};

/// A resolved destination counterpart for one source item.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub item: CatalogItem,
    /// Provider-native reference usable by `DestCatalog::add_items`.
    pub destination_ref: String,
    /// Similarity of the accepted hit's title to the source title, in [0, 1].
    pub confidence: f64,
    /// Set when the match was accepted below the confidence threshold
    /// without artist corroboration. Surfaced to the caller, never fatal.
    pub warning: Option<String>,
}

impl MatchCandidate {
    /// Candidate for the same-provider clone path, where the source item's
    /// own reference is valid at the destination and no search happens.
    pub fn structural_clone(item: &CatalogItem) -> Self {
        Self {
            item: item.clone(),
            destination_ref: item.id.clone(),
            confidence: 1.0,
            warning: None,
        }
    }
}

/// Resolves source items against a destination catalog's search endpoint.
///
/// Issues exactly one search per item (the top hit is the only candidate)
/// and accepts it when the title similarity clears the threshold or the
/// destination artist contains the source artist. Searches run under the
/// destination's rate budget and the shared retry policy.
#[derive(Debug, Clone)]
pub struct Matcher {
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    confidence_threshold: f64,
}

impl Matcher {
    pub fn new(limiter: Arc<RateLimiter>, retry: RetryPolicy, config: &MatchingConfig) -> Self {
        Self {
            limiter,
            retry,
            confidence_threshold: config.confidence_threshold,
        }
    }

    /// Finds the destination counterpart for one source item.
    ///
    /// Returns `Ok(None)` when the search comes back empty; the caller
    /// counts the item as failed and moves on.
    ///
    /// # Errors
    ///
    /// - `CatalogError::InvalidData` - the item has no display name to
    ///   search with
    /// - the search's final error once the retry budget is exhausted
    pub async fn match_item(
        &self,
        dest: &dyn DestCatalog,
        token: &AccessToken,
        item: &CatalogItem,
    ) -> Result<Option<MatchCandidate>, CatalogError> {
        if item.display_name.trim().is_empty() {
            return Err(CatalogError::InvalidData {
                reason: format!("item {} has no display name to search with", item.id),
            });
        }

        let artist = item.primary_artist.as_deref().unwrap_or("").trim();
        let query = if artist.is_empty() {
            item.display_name.clone()
        } else {
            format!("{artist} {}", item.display_name)
        };

        self.limiter.acquire().await;
        let hits = self.retry.run(|| dest.search(token, &query)).await?;

        let Some(top) = hits.into_iter().next() else {
            tracing::debug!(item = %item.display_name, "destination search returned no hits");
            return Ok(None);
        };

        let confidence = score(&top.title, &item.display_name);
        let artist_corroborated = {
            let source_artist = normalize(artist);
            !source_artist.is_empty()
                && top
                    .artist
                    .as_deref()
                    .is_some_and(|hit_artist| normalize(hit_artist).contains(&source_artist))
        };

        let warning = if confidence > self.confidence_threshold || artist_corroborated {
            None
        } else {
            Some(format!(
                "Low confidence match for '{}' (score {confidence:.2})",
                item.display_name
            ))
        };

        Ok(Some(MatchCandidate {
            item: item.clone(),
            destination_ref: top.ref_id,
            confidence,
            warning,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::catalog::{CollectionRef, Provider, SearchHit};

    use super::*;

    /// Destination catalog whose search always returns the same scripted
    /// hits, recording each query it sees.
    struct ScriptedDest {
        hits: Vec<SearchHit>,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedDest {
        fn returning(hits: Vec<SearchHit>) -> Self {
            Self {
                hits,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DestCatalog for ScriptedDest {
        fn provider(&self) -> Provider {
            Provider::Youtube
        }

        fn max_batch_size(&self) -> usize {
            1
        }

        async fn search(
            &self,
            _token: &AccessToken,
            query: &str,
        ) -> Result<Vec<SearchHit>, CatalogError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.hits.clone())
        }

        async fn create_collection(
            &self,
            _token: &AccessToken,
            _name: &str,
            _description: &str,
        ) -> Result<CollectionRef, CatalogError> {
            unimplemented!("not exercised by matcher tests")
        }

        async fn add_items(
            &self,
            _token: &AccessToken,
            _collection: &CollectionRef,
            _item_refs: &[String],
        ) -> Result<(), CatalogError> {
            unimplemented!("not exercised by matcher tests")
        }
    }

    fn matcher() -> Matcher {
        Matcher::new(
            Arc::new(RateLimiter::new("test", 1000, Duration::from_millis(1000))),
            RetryPolicy::new(0, Duration::from_millis(1)),
            &MatchingConfig::default(),
        )
    }

    fn item(name: &str, artist: Option<&str>) -> CatalogItem {
        CatalogItem {
            id: "src-1".to_string(),
            display_name: name.to_string(),
            primary_artist: artist.map(str::to_string),
            raw: serde_json::Value::Null,
        }
    }

    fn hit(ref_id: &str, title: &str, artist: Option<&str>) -> SearchHit {
        SearchHit {
            ref_id: ref_id.to_string(),
            title: title.to_string(),
            artist: artist.map(str::to_string),
        }
    }

    fn token() -> AccessToken {
        AccessToken::new("test-token")
    }

    #[tokio::test]
    async fn confident_title_match_carries_no_warning() {
        let dest = ScriptedDest::returning(vec![hit(
            "vid-1",
            "Bohemian Rhapsody (Official Video)",
            Some("QueenVEVO"),
        )]);

        let candidate = matcher()
            .match_item(&dest, &token(), &item("Bohemian Rhapsody", Some("Queen")))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(candidate.destination_ref, "vid-1");
        assert!(candidate.confidence > 0.9);
        assert!(candidate.warning.is_none());
    }

    #[tokio::test]
    async fn query_prefixes_artist_when_present() {
        let dest = ScriptedDest::returning(vec![hit("vid-1", "Yesterday", None)]);

        matcher()
            .match_item(&dest, &token(), &item("Yesterday", Some("The Beatles")))
            .await
            .unwrap();

        assert_eq!(
            *dest.queries.lock().unwrap(),
            vec!["The Beatles Yesterday".to_string()]
        );
    }

    #[tokio::test]
    async fn missing_artist_searches_by_title_only() {
        let dest = ScriptedDest::returning(vec![hit("vid-1", "Yesterday", None)]);

        matcher()
            .match_item(&dest, &token(), &item("Yesterday", None))
            .await
            .unwrap();

        assert_eq!(*dest.queries.lock().unwrap(), vec!["Yesterday".to_string()]);
    }

    #[tokio::test]
    async fn low_confidence_without_corroboration_is_flagged() {
        let dest = ScriptedDest::returning(vec![hit(
            "vid-1",
            "completely unrelated upload",
            Some("SomeChannel"),
        )]);

        let candidate = matcher()
            .match_item(&dest, &token(), &item("Bohemian Rhapsody", Some("Queen")))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(candidate.destination_ref, "vid-1");
        assert!(candidate.confidence <= 0.4);
        assert!(candidate.warning.is_some());
    }

    #[tokio::test]
    async fn artist_substring_corroborates_low_title_score() {
        let dest = ScriptedDest::returning(vec![hit(
            "vid-1",
            "Live at Wembley pt. 2",
            Some("Queen Official"),
        )]);

        let candidate = matcher()
            .match_item(&dest, &token(), &item("Bohemian Rhapsody", Some("Queen")))
            .await
            .unwrap()
            .unwrap();

        assert!(candidate.confidence <= 0.4);
        assert!(candidate.warning.is_none());
    }

    #[tokio::test]
    async fn absent_source_artist_never_corroborates() {
        // Substring containment is trivially true for an empty artist, so a
        // source item with no artist must not silently upgrade a weak hit.
        let dest = ScriptedDest::returning(vec![hit(
            "vid-1",
            "completely unrelated upload",
            Some("SomeChannel"),
        )]);

        let candidate = matcher()
            .match_item(&dest, &token(), &item("Bohemian Rhapsody", None))
            .await
            .unwrap()
            .unwrap();

        assert!(candidate.confidence <= 0.4);
        assert!(candidate.warning.is_some());
    }

    #[tokio::test]
    async fn empty_search_results_yield_no_candidate() {
        let dest = ScriptedDest::returning(vec![]);

        let candidate = matcher()
            .match_item(&dest, &token(), &item("Obscure B-Side", Some("Nobody")))
            .await
            .unwrap();

        assert!(candidate.is_none());
    }

    #[tokio::test]
    async fn blank_display_name_is_invalid_data() {
        let dest = ScriptedDest::returning(vec![]);

        let result = matcher().match_item(&dest, &token(), &item("  ", None)).await;

        assert!(matches!(result, Err(CatalogError::InvalidData { .. })));
        assert!(dest.queries.lock().unwrap().is_empty());
    }

    #[test]
    fn structural_clone_reuses_source_reference() {
        let source = item("Bohemian Rhapsody", Some("Queen"));
        let candidate = MatchCandidate::structural_clone(&source);

        assert_eq!(candidate.destination_ref, "src-1");
        assert_eq!(candidate.confidence, 1.0);
        assert!(candidate.warning.is_none());
    }
}
