//! Cursor-agnostic pagination of provider listing endpoints.

use std::future::Future;
use std::sync::Arc;

use super::rate_limit::RateLimiter;
use super::retry::RetryPolicy;
use crate::catalog::CatalogError;

/// One page of a listing endpoint.
///
/// Entries are optional because some providers report deleted or region-
/// locked tracks as nulls inside otherwise valid pages; those are dropped
/// silently during draining, not counted as failures.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<Option<T>>,
    /// Opaque continuation: a `next` URL, a page token, whatever the
    /// provider hands back. Absent on the last page.
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Final page with no continuation.
    pub fn last(items: Vec<Option<T>>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }
}

/// Drains a paginated listing into a complete in-memory sequence.
///
/// Each page fetch acquires a rate-limit token and runs under the retry
/// policy. Draining stops when the continuation cursor is absent or the
/// page ceiling is reached; the ceiling bounds worst-case cost against very
/// large libraries.
#[derive(Debug, Clone)]
pub struct Paginator {
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    max_pages: u32,
}

impl Paginator {
    pub fn new(limiter: Arc<RateLimiter>, retry: RetryPolicy, max_pages: u32) -> Self {
        Self {
            limiter,
            retry,
            max_pages,
        }
    }

    /// Fetches pages until the cursor runs out or the ceiling is hit,
    /// returning all non-null items in their original order.
    ///
    /// The fetch closure receives the continuation cursor (`None` for the
    /// first page) and must treat it as opaque.
    ///
    /// # Errors
    ///
    /// The fetch's final error once the retry budget for a page is
    /// exhausted.
    pub async fn drain<T, F, Fut>(&self, mut fetch: F) -> Result<Vec<T>, CatalogError>
    where
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = Result<Page<T>, CatalogError>>,
    {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        let mut dropped = 0usize;

        for _ in 0..self.max_pages {
            self.limiter.acquire().await;
            let page = self.retry.run(|| fetch(cursor.clone())).await?;

            for entry in page.items {
                match entry {
                    Some(item) => items.push(item),
                    None => dropped += 1,
                }
            }

            cursor = page.next_cursor;
            if cursor.is_none() {
                break;
            }
        }

        if dropped > 0 {
            tracing::debug!(dropped, "skipped null entries while draining pages");
        }

        Ok(items)
    }
}
