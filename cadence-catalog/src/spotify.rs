//! Spotify-style catalog provider.
//!
//! Reads playlists and liked songs through cursor pagination on `next`
//! URLs, and writes through user-scoped playlist creation plus batched
//! track additions (up to 100 URIs per call).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use cadence_core::catalog::LIKED_COLLECTION_ID;
use cadence_core::config::CadenceConfig;
use cadence_core::{
    AccessToken, CatalogError, CatalogItem, Collection, CollectionRef, DestCatalog, Page,
    Paginator, Provider, RateLimiter, RetryPolicy, SearchHit, SourceCatalog,
};

use crate::http::{check_response, decode_error, transport_error};

const DEFAULT_BASE_URL: &str = "https://api.spotify.com/v1";
const PAGE_SIZE: u32 = 50;
const MAX_BATCH: usize = 100;

/// Spotify catalog, usable as both transfer source and destination.
///
/// Listing endpoints run behind the shared rate limiter and retry policy;
/// write and search calls rely on the engine's own guards, since it owns
/// the pacing of those phases.
#[derive(Debug)]
pub struct SpotifyCatalog {
    client: reqwest::Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    collection_page_ceiling: u32,
    item_page_ceiling: u32,
}

#[derive(Debug, Deserialize)]
struct PlaylistPage {
    items: Vec<Option<PlaylistEntry>>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    id: String,
    name: String,
    tracks: Option<TrackTotals>,
}

#[derive(Debug, Deserialize)]
struct TrackTotals {
    total: u64,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    items: Vec<Option<TrackEntry>>,
    next: Option<String>,
}

/// Saved/playlist track wrapper; `track` is null for tracks removed from
/// the catalog after they were added.
#[derive(Debug, Deserialize)]
struct TrackEntry {
    track: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    uri: String,
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: SearchTracks,
}

#[derive(Debug, Deserialize)]
struct SearchTracks {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPlaylist {
    id: String,
}

impl SpotifyCatalog {
    pub fn new(limiter: Arc<RateLimiter>, config: &CadenceConfig) -> Self {
        Self::with_base_url(limiter, config, DEFAULT_BASE_URL.to_string())
    }

    /// Custom base URL, for tests and API-compatible deployments.
    pub fn with_base_url(
        limiter: Arc<RateLimiter>,
        config: &CadenceConfig,
        base_url: String,
    ) -> Self {
        let limits = config.limits(Provider::Spotify);
        Self {
            client: reqwest::Client::new(),
            base_url,
            limiter,
            retry: RetryPolicy::from_config(&config.retry),
            collection_page_ceiling: limits.collection_page_ceiling,
            item_page_ceiling: limits.item_page_ceiling,
        }
    }

    fn paginator(&self, max_pages: u32) -> Paginator {
        Paginator::new(self.limiter.clone(), self.retry.clone(), max_pages)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        token: &AccessToken,
    ) -> Result<T, CatalogError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| transport_error(Provider::Spotify, &e))?;
        check_response(Provider::Spotify, response)
            .await?
            .json()
            .await
            .map_err(|e| decode_error(Provider::Spotify, &e))
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        token: &AccessToken,
        body: &serde_json::Value,
    ) -> Result<T, CatalogError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(token.secret())
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(Provider::Spotify, &e))?;
        check_response(Provider::Spotify, response)
            .await?
            .json()
            .await
            .map_err(|e| decode_error(Provider::Spotify, &e))
    }

    fn items_url(&self, collection_id: &str) -> String {
        if collection_id == LIKED_COLLECTION_ID {
            format!("{}/me/tracks?limit={PAGE_SIZE}", self.base_url)
        } else {
            format!(
                "{}/playlists/{collection_id}/tracks?limit={PAGE_SIZE}",
                self.base_url
            )
        }
    }
}

/// Converts one raw track payload, or `None` when the payload is missing
/// the fields a transfer needs (treated like a null entry).
fn item_from_track(raw: serde_json::Value) -> Option<CatalogItem> {
    let track: SpotifyTrack = serde_json::from_value(raw.clone()).ok()?;
    Some(CatalogItem {
        id: track.uri,
        display_name: track.name,
        primary_artist: track.artists.into_iter().next().map(|artist| artist.name),
        raw,
    })
}

fn hit_from_track(raw: &serde_json::Value) -> Option<SearchHit> {
    let track: SpotifyTrack = serde_json::from_value(raw.clone()).ok()?;
    Some(SearchHit {
        ref_id: track.uri,
        title: track.name,
        artist: track.artists.into_iter().next().map(|artist| artist.name),
    })
}

#[async_trait]
impl SourceCatalog for SpotifyCatalog {
    fn provider(&self) -> Provider {
        Provider::Spotify
    }

    async fn list_collections(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<Collection>, CatalogError> {
        let first_url = format!("{}/me/playlists?limit={PAGE_SIZE}", self.base_url);
        self.paginator(self.collection_page_ceiling)
            .drain(|cursor| {
                let url = cursor.unwrap_or_else(|| first_url.clone());
                async move {
                    let page: PlaylistPage = self.get_json(&url, token).await?;
                    Ok(Page {
                        items: page
                            .items
                            .into_iter()
                            .map(|entry| {
                                entry.map(|playlist| Collection {
                                    id: playlist.id,
                                    name: playlist.name,
                                    item_count: playlist.tracks.map(|tracks| tracks.total),
                                })
                            })
                            .collect(),
                        next_cursor: page.next,
                    })
                }
            })
            .await
    }

    async fn list_items(
        &self,
        token: &AccessToken,
        collection_id: &str,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let first_url = self.items_url(collection_id);
        self.paginator(self.item_page_ceiling)
            .drain(|cursor| {
                let url = cursor.unwrap_or_else(|| first_url.clone());
                async move {
                    let page: TrackPage = self.get_json(&url, token).await?;
                    Ok(Page {
                        items: page
                            .items
                            .into_iter()
                            .map(|entry| {
                                entry
                                    .and_then(|wrapper| wrapper.track)
                                    .and_then(item_from_track)
                            })
                            .collect(),
                        next_cursor: page.next,
                    })
                }
            })
            .await
    }
}

#[async_trait]
impl DestCatalog for SpotifyCatalog {
    fn provider(&self) -> Provider {
        Provider::Spotify
    }

    fn max_batch_size(&self) -> usize {
        MAX_BATCH
    }

    async fn search(
        &self,
        token: &AccessToken,
        query: &str,
    ) -> Result<Vec<SearchHit>, CatalogError> {
        let url = format!(
            "{}/search?q={}&type=track&limit=1",
            self.base_url,
            urlencoding::encode(query)
        );
        let response: SearchResponse = self.get_json(&url, token).await?;
        Ok(response
            .tracks
            .items
            .iter()
            .filter_map(hit_from_track)
            .collect())
    }

    async fn create_collection(
        &self,
        token: &AccessToken,
        name: &str,
        description: &str,
    ) -> Result<CollectionRef, CatalogError> {
        let profile: UserProfile = self.get_json(&format!("{}/me", self.base_url), token).await?;

        let url = format!("{}/users/{}/playlists", self.base_url, profile.id);
        let body = json!({
            "name": name,
            "description": description,
            "public": false,
        });
        let created: CreatedPlaylist = self.post_json(&url, token, &body).await?;
        tracing::info!(playlist_id = %created.id, name, "created destination playlist");
        Ok(CollectionRef(created.id))
    }

    async fn add_items(
        &self,
        token: &AccessToken,
        collection: &CollectionRef,
        item_refs: &[String],
    ) -> Result<(), CatalogError> {
        if item_refs.len() > MAX_BATCH {
            return Err(CatalogError::InvalidData {
                reason: format!("batch of {} exceeds the {MAX_BATCH} URI limit", item_refs.len()),
            });
        }
        let url = format!("{}/playlists/{}/tracks", self.base_url, collection.0);
        let body = json!({ "uris": item_refs });
        let _: serde_json::Value = self.post_json(&url, token, &body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_value(uri: &str, name: &str, artist: Option<&str>) -> serde_json::Value {
        let artists: Vec<serde_json::Value> =
            artist.map(|a| json!({ "name": a })).into_iter().collect();
        json!({ "uri": uri, "name": name, "artists": artists })
    }

    #[test]
    fn track_payloads_convert_to_items() {
        let raw = track_value("spotify:track:1", "Alpha", Some("Ann"));
        let item = item_from_track(raw.clone()).unwrap();

        assert_eq!(item.id, "spotify:track:1");
        assert_eq!(item.display_name, "Alpha");
        assert_eq!(item.primary_artist.as_deref(), Some("Ann"));
        assert_eq!(item.raw, raw);
    }

    #[test]
    fn artistless_tracks_still_convert() {
        let item = item_from_track(track_value("spotify:track:2", "Beta", None)).unwrap();
        assert!(item.primary_artist.is_none());
    }

    #[test]
    fn malformed_track_payloads_are_dropped() {
        assert!(item_from_track(json!({ "name": "no uri" })).is_none());
        assert!(item_from_track(serde_json::Value::Null).is_none());
    }

    #[test]
    fn track_pages_deserialize_with_null_entries() {
        let body = json!({
            "items": [
                { "track": track_value("spotify:track:1", "Alpha", Some("Ann")) },
                null,
                { "track": null },
            ],
            "next": "https://api.example.com/page-2",
        });

        let page: TrackPage = serde_json::from_value(body).unwrap();
        assert_eq!(page.items.len(), 3);
        assert!(page.items[1].is_none());
        assert_eq!(page.next.as_deref(), Some("https://api.example.com/page-2"));
    }

    #[test]
    fn search_hits_come_from_the_top_track() {
        let response: SearchResponse = serde_json::from_value(json!({
            "tracks": { "items": [track_value("spotify:track:9", "Gamma", Some("Cleo"))] }
        }))
        .unwrap();

        let hits: Vec<SearchHit> = response.tracks.items.iter().filter_map(hit_from_track).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ref_id, "spotify:track:9");
        assert_eq!(hits[0].artist.as_deref(), Some("Cleo"));
    }
}
