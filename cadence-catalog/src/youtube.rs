//! YouTube-style catalog provider.
//!
//! Reads playlists through `pageToken` pagination under a strict quota
//! posture, and writes one video per call since the API has no batch
//! insert. Daily quota exhaustion surfaces as a terminal error.

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

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const PAGE_SIZE: u32 = 50;

/// The user's built-in liked-videos playlist.
const LIKED_PLAYLIST_ID: &str = "LL";

/// Placeholder titles YouTube substitutes for unavailable videos.
const UNAVAILABLE_TITLES: [&str; 2] = ["Deleted video", "Private video"];

/// YouTube catalog, usable as both transfer source and destination.
#[derive(Debug)]
pub struct YouTubeCatalog {
    client: reqwest::Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    collection_page_ceiling: u32,
    item_page_ceiling: u32,
}

#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    items: Vec<serde_json::Value>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistResource {
    id: String,
    snippet: PlaylistSnippet,
    #[serde(rename = "contentDetails")]
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
struct PlaylistSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(rename = "itemCount")]
    item_count: u64,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemResource {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemSnippet {
    title: String,
    #[serde(rename = "videoOwnerChannelTitle")]
    video_owner_channel_title: Option<String>,
    #[serde(rename = "resourceId")]
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    #[serde(rename = "videoId")]
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResource {
    id: SearchResourceId,
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
struct SearchResourceId {
    #[serde(rename = "videoId")]
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    title: String,
    #[serde(rename = "channelTitle")]
    channel_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedPlaylist {
    id: String,
}

impl YouTubeCatalog {
    pub fn new(limiter: Arc<RateLimiter>, config: &CadenceConfig) -> Self {
        Self::with_base_url(limiter, config, DEFAULT_BASE_URL.to_string())
    }

    /// Custom base URL, for tests and API-compatible deployments.
    pub fn with_base_url(
        limiter: Arc<RateLimiter>,
        config: &CadenceConfig,
        base_url: String,
    ) -> Self {
        let limits = config.limits(Provider::Youtube);
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
            .map_err(|e| transport_error(Provider::Youtube, &e))?;
        check_response(Provider::Youtube, response)
            .await?
            .json()
            .await
            .map_err(|e| decode_error(Provider::Youtube, &e))
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
            .map_err(|e| transport_error(Provider::Youtube, &e))?;
        check_response(Provider::Youtube, response)
            .await?
            .json()
            .await
            .map_err(|e| decode_error(Provider::Youtube, &e))
    }

    fn with_page_token(url: String, cursor: Option<String>) -> String {
        match cursor {
            Some(token) => format!("{url}&pageToken={}", urlencoding::encode(&token)),
            None => url,
        }
    }
}

/// Recovers artist and title from a video title, preferring the common
/// "Artist - Title" convention and falling back to the owning channel.
fn split_artist_title(title: &str, channel: Option<&str>) -> (Option<String>, String) {
    if let Some((artist, rest)) = title.split_once(" - ") {
        let artist = artist.trim();
        let rest = rest.trim();
        if !artist.is_empty() && !rest.is_empty() {
            return (Some(artist.to_string()), rest.to_string());
        }
    }
    (
        channel.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
        title.trim().to_string(),
    )
}

/// Converts one playlist item payload; unavailable videos and malformed
/// payloads become `None` and are dropped like null entries.
fn item_from_playlist_entry(raw: serde_json::Value) -> Option<CatalogItem> {
    let resource: PlaylistItemResource = serde_json::from_value(raw.clone()).ok()?;
    if UNAVAILABLE_TITLES.contains(&resource.snippet.title.as_str()) {
        return None;
    }
    let (artist, title) = split_artist_title(
        &resource.snippet.title,
        resource.snippet.video_owner_channel_title.as_deref(),
    );
    Some(CatalogItem {
        id: resource.snippet.resource_id.video_id,
        display_name: title,
        primary_artist: artist,
        raw,
    })
}

#[async_trait]
impl SourceCatalog for YouTubeCatalog {
    fn provider(&self) -> Provider {
        Provider::Youtube
    }

    async fn list_collections(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<Collection>, CatalogError> {
        let first_url = format!(
            "{}/playlists?part=snippet,contentDetails&mine=true&maxResults={PAGE_SIZE}",
            self.base_url
        );
        self.paginator(self.collection_page_ceiling)
            .drain(|cursor| {
                let url = Self::with_page_token(first_url.clone(), cursor);
                async move {
                    let page: ListPage = self.get_json(&url, token).await?;
                    Ok(Page {
                        items: page
                            .items
                            .into_iter()
                            .map(|raw| {
                                serde_json::from_value::<PlaylistResource>(raw).ok().map(
                                    |playlist| Collection {
                                        id: playlist.id,
                                        name: playlist.snippet.title,
                                        item_count: playlist
                                            .content_details
                                            .map(|details| details.item_count),
                                    },
                                )
                            })
                            .collect(),
                        next_cursor: page.next_page_token,
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
        let playlist_id = if collection_id == LIKED_COLLECTION_ID {
            LIKED_PLAYLIST_ID
        } else {
            collection_id
        };
        let first_url = format!(
            "{}/playlistItems?part=snippet&playlistId={}&maxResults={PAGE_SIZE}",
            self.base_url,
            urlencoding::encode(playlist_id)
        );
        self.paginator(self.item_page_ceiling)
            .drain(|cursor| {
                let url = Self::with_page_token(first_url.clone(), cursor);
                async move {
                    let page: ListPage = self.get_json(&url, token).await?;
                    Ok(Page {
                        items: page
                            .items
                            .into_iter()
                            .map(item_from_playlist_entry)
                            .collect(),
                        next_cursor: page.next_page_token,
                    })
                }
            })
            .await
    }
}

#[async_trait]
impl DestCatalog for YouTubeCatalog {
    fn provider(&self) -> Provider {
        Provider::Youtube
    }

    /// No batch insert endpoint exists; every video is its own call.
    fn max_batch_size(&self) -> usize {
        1
    }

    async fn search(
        &self,
        token: &AccessToken,
        query: &str,
    ) -> Result<Vec<SearchHit>, CatalogError> {
        let url = format!(
            "{}/search?part=snippet&type=video&maxResults=1&q={}",
            self.base_url,
            urlencoding::encode(query)
        );
        let page: ListPage = self.get_json(&url, token).await?;
        Ok(page
            .items
            .into_iter()
            .filter_map(|raw| serde_json::from_value::<SearchResource>(raw).ok())
            .map(|result| SearchHit {
                ref_id: result.id.video_id,
                title: result.snippet.title,
                artist: result.snippet.channel_title,
            })
            .collect())
    }

    async fn create_collection(
        &self,
        token: &AccessToken,
        name: &str,
        description: &str,
    ) -> Result<CollectionRef, CatalogError> {
        let url = format!("{}/playlists?part=snippet,status", self.base_url);
        let body = json!({
            "snippet": { "title": name, "description": description },
            "status": { "privacyStatus": "private" },
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
        let url = format!("{}/playlistItems?part=snippet", self.base_url);
        for video_id in item_refs {
            let body = json!({
                "snippet": {
                    "playlistId": collection.0,
                    "resourceId": { "kind": "youtube#video", "videoId": video_id },
                },
            });
            let _: serde_json::Value = self.post_json(&url, token, &body).await?;
        }
        Ok(())
    }
}
