//! The transfer pipeline: fetch, match, write, report.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::catalog::{
    AccessToken, CatalogError, DestCatalog, LIKED_COLLECTION_ID, Provider, SourceCatalog,
};
use crate::config::MatchingConfig;
use crate::matching::{MatchCandidate, Matcher};
use crate::net::{RateLimiter, RetryPolicy};

use super::events::{Severity, TransferEvent};
use super::summary::{CollectionOutcome, TransferSummary};

/// Description stamped on every collection the engine creates.
const CREATED_DESCRIPTION: &str = "Transferred via Cadence";

/// Buffered events before emission backpressures the pipeline.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Everything a transfer needs besides the per-request inputs.
///
/// The rate limiter and retry policy are shared across transfers so
/// concurrent runs draw from one per-provider budget.
#[derive(Clone)]
pub struct TransferContext {
    pub source: Arc<dyn SourceCatalog>,
    pub dest: Arc<dyn DestCatalog>,
    pub dest_limiter: Arc<RateLimiter>,
    pub retry: RetryPolicy,
    pub matching: MatchingConfig,
}

/// Per-request inputs: credentials and the collections to move.
#[derive(Clone)]
pub struct TransferRequest {
    pub source_token: AccessToken,
    pub dest_token: AccessToken,
    pub collection_ids: Vec<String>,
}

/// Cooperative cancellation flag checked between pipeline steps.
///
/// Cancellation is acknowledged at the next check, never mid-call, so a
/// write already in flight still lands.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Handle to a running transfer: its ordered event stream, a cancel
/// switch, and the join handle of the pipeline task.
pub struct TransferStream {
    events: mpsc::Receiver<TransferEvent>,
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

impl TransferStream {
    /// Next event in emission order; `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<TransferEvent> {
        self.events.recv().await
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Consumes the stream, handing out the raw receiver for adapters
    /// that bridge events onto another transport.
    pub fn into_parts(self) -> (mpsc::Receiver<TransferEvent>, CancelToken, JoinHandle<()>) {
        (self.events, self.cancel, self.handle)
    }
}

/// Starts a transfer on a background task and returns its stream.
pub fn spawn_transfer(ctx: TransferContext, request: TransferRequest) -> TransferStream {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let cancel = CancelToken::new();
    let emitter = Emitter {
        tx,
        cancel: cancel.clone(),
    };

    let pipeline_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        run_pipeline(ctx, request, emitter, pipeline_cancel).await;
    });

    TransferStream {
        events: rx,
        cancel,
        handle,
    }
}

/// Sends events downstream; a dropped receiver flips the cancel flag so
/// the pipeline winds down instead of working for nobody.
struct Emitter {
    tx: mpsc::Sender<TransferEvent>,
    cancel: CancelToken,
}

impl Emitter {
    async fn emit(&self, event: TransferEvent) {
        if self.tx.send(event).await.is_err() {
            tracing::debug!("event receiver dropped, cancelling transfer");
            self.cancel.cancel();
        }
    }

    async fn log(&self, severity: Severity, message: impl Into<String>) {
        self.emit(TransferEvent::Log {
            message: message.into(),
            severity,
        })
        .await;
    }
}

/// Why a pipeline stopped before finishing all collections.
enum TransferAbort {
    Cancelled,
    Fatal(CatalogError),
}

async fn run_pipeline(
    ctx: TransferContext,
    request: TransferRequest,
    emitter: Emitter,
    cancel: CancelToken,
) {
    match drive(&ctx, &request, &emitter, &cancel).await {
        Ok(summary) => {
            tracing::info!(
                successful = summary.successful,
                failed = summary.failed,
                "transfer complete"
            );
            emitter.emit(TransferEvent::Complete { summary }).await;
        }
        Err(TransferAbort::Cancelled) => {
            tracing::info!("transfer cancelled");
            emitter
                .emit(TransferEvent::Cancelled {
                    message: "Transfer cancelled.".to_string(),
                })
                .await;
        }
        Err(TransferAbort::Fatal(error)) => {
            tracing::error!(error = %error, "transfer aborted");
            emitter
                .emit(TransferEvent::Error {
                    message: error.to_string(),
                })
                .await;
        }
    }
}

async fn drive(
    ctx: &TransferContext,
    request: &TransferRequest,
    emitter: &Emitter,
    cancel: &CancelToken,
) -> Result<TransferSummary, TransferAbort> {
    emitter
        .emit(TransferEvent::Start {
            message: format!(
                "Starting transfer of {} collection(s) from {} to {}",
                request.collection_ids.len(),
                ctx.source.provider().display_name(),
                ctx.dest.provider().display_name()
            ),
        })
        .await;

    let names = resolve_collection_names(ctx, &request.source_token).await;
    let matcher = Matcher::new(ctx.dest_limiter.clone(), ctx.retry.clone(), &ctx.matching);

    let mut summary = TransferSummary {
        total_collections: request.collection_ids.len() as u64,
        ..TransferSummary::default()
    };

    for collection_id in &request.collection_ids {
        if cancel.is_cancelled() {
            return Err(TransferAbort::Cancelled);
        }

        let name = collection_display_name(collection_id, &names, ctx.source.provider());
        let outcome = transfer_collection(
            ctx,
            request,
            emitter,
            cancel,
            &matcher,
            collection_id,
            &name,
        )
        .await?;
        summary.record(outcome);
    }

    Ok(summary)
}

/// Moves one collection end to end, returning its tally.
///
/// Recoverable failures degrade to skipped items or a skipped collection;
/// only cancellation and fatal errors (auth expiry, quota exhaustion)
/// abort the whole transfer.
async fn transfer_collection(
    ctx: &TransferContext,
    request: &TransferRequest,
    emitter: &Emitter,
    cancel: &CancelToken,
    matcher: &Matcher,
    collection_id: &str,
    name: &str,
) -> Result<CollectionOutcome, TransferAbort> {
    emitter
        .emit(TransferEvent::Progress {
            message: format!(
                "Fetching '{name}' from {}...",
                ctx.source.provider().display_name()
            ),
        })
        .await;

    let items = match ctx
        .source
        .list_items(&request.source_token, collection_id)
        .await
    {
        Ok(items) => items,
        Err(error) if error.is_fatal_for_transfer() => return Err(TransferAbort::Fatal(error)),
        Err(error) => {
            emitter
                .log(
                    Severity::Error,
                    format!("Failed to fetch '{name}': {error}. Skipping."),
                )
                .await;
            return Ok(CollectionOutcome {
                name: name.to_string(),
                success_count: 0,
                fail_count: 0,
            });
        }
    };

    let total = items.len() as u64;
    emitter
        .emit(TransferEvent::Progress {
            message: format!("Found {total} tracks in '{name}'. Matching..."),
        })
        .await;

    let mut fail_count = 0u64;
    let candidates = if ctx.source.provider() == ctx.dest.provider() {
        // Same-provider clone: references are already valid at the
        // destination, so no searching happens at all.
        emitter
            .log(
                Severity::Info,
                format!("Same provider detected. Cloning {total} tracks directly."),
            )
            .await;
        items.iter().map(MatchCandidate::structural_clone).collect()
    } else {
        let mut matched = Vec::new();
        for (index, item) in items.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(TransferAbort::Cancelled);
            }

            match matcher
                .match_item(ctx.dest.as_ref(), &request.dest_token, item)
                .await
            {
                Ok(Some(candidate)) => {
                    if let Some(warning) = &candidate.warning {
                        emitter.log(Severity::Warning, warning.clone()).await;
                    }
                    matched.push(candidate);
                }
                Ok(None) => {
                    fail_count += 1;
                    emitter
                        .log(
                            Severity::Warning,
                            format!("No match found for '{}'", item.display_name),
                        )
                        .await;
                }
                Err(error) if error.is_fatal_for_transfer() => {
                    return Err(TransferAbort::Fatal(error));
                }
                Err(error) => {
                    fail_count += 1;
                    emitter
                        .log(
                            Severity::Error,
                            format!("Failed to match '{}': {error}", item.display_name),
                        )
                        .await;
                }
            }

            emitter
                .emit(TransferEvent::Progress {
                    message: format!("Processed {} of {total} tracks in '{name}'", index + 1),
                })
                .await;
        }
        matched
    };

    if !candidates.is_empty() {
        emitter
            .emit(TransferEvent::Progress {
                message: format!(
                    "Matched {} songs. Creating '{name}' at destination...",
                    candidates.len()
                ),
            })
            .await;
    }

    let success_count =
        write_candidates(ctx, request, emitter, cancel, name, &candidates).await?;
    fail_count += candidates.len() as u64 - success_count;

    emitter
        .log(
            Severity::Success,
            format!("Completed '{name}': {success_count} transferred, {fail_count} failed"),
        )
        .await;

    Ok(CollectionOutcome {
        name: name.to_string(),
        success_count,
        fail_count,
    })
}

/// Creates the destination collection and writes candidates in batches,
/// returning how many items landed.
async fn write_candidates(
    ctx: &TransferContext,
    request: &TransferRequest,
    emitter: &Emitter,
    cancel: &CancelToken,
    name: &str,
    candidates: &[MatchCandidate],
) -> Result<u64, TransferAbort> {
    if candidates.is_empty() {
        return Ok(0);
    }

    ctx.dest_limiter.acquire().await;
    let collection_ref = match ctx
        .retry
        .run(|| {
            ctx.dest
                .create_collection(&request.dest_token, name, CREATED_DESCRIPTION)
        })
        .await
    {
        Ok(collection_ref) => collection_ref,
        Err(error) if error.is_fatal_for_transfer() => return Err(TransferAbort::Fatal(error)),
        Err(error) => {
            emitter
                .log(
                    Severity::Error,
                    format!("Failed to create '{name}' at destination: {error}. Skipping."),
                )
                .await;
            return Ok(0);
        }
    };

    let batch_size = ctx.dest.max_batch_size().max(1);
    let mut written = 0u64;
    for batch in candidates.chunks(batch_size) {
        if cancel.is_cancelled() {
            return Err(TransferAbort::Cancelled);
        }

        let refs: Vec<String> = batch
            .iter()
            .map(|candidate| candidate.destination_ref.clone())
            .collect();

        ctx.dest_limiter.acquire().await;
        match ctx
            .retry
            .run(|| ctx.dest.add_items(&request.dest_token, &collection_ref, &refs))
            .await
        {
            Ok(()) => written += refs.len() as u64,
            Err(error) if error.is_fatal_for_transfer() => {
                return Err(TransferAbort::Fatal(error));
            }
            Err(error) => {
                emitter
                    .log(
                        Severity::Error,
                        format!("Failed to add {} tracks to '{name}': {error}", refs.len()),
                    )
                    .await;
            }
        }
    }

    Ok(written)
}

/// Maps collection ids to display names, best effort.
///
/// A failed listing degrades to fallback names; if credentials are
/// actually broken the per-collection fetch will surface it as fatal.
async fn resolve_collection_names(
    ctx: &TransferContext,
    token: &AccessToken,
) -> HashMap<String, String> {
    match ctx.source.list_collections(token).await {
        Ok(collections) => collections
            .into_iter()
            .map(|collection| (collection.id, collection.name))
            .collect(),
        Err(error) => {
            tracing::warn!(error = %error, "could not list source collections for naming");
            HashMap::new()
        }
    }
}

fn collection_display_name(
    collection_id: &str,
    names: &HashMap<String, String>,
    source: Provider,
) -> String {
    if collection_id == LIKED_COLLECTION_ID {
        return format!("Liked Songs (From {})", source.display_name());
    }
    names
        .get(collection_id)
        .cloned()
        .unwrap_or_else(|| format!("Transfer {collection_id}"))
}
