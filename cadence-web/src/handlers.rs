//! API handlers for collection listing and streaming transfers.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::{Json, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use cadence_core::{
    AccessToken, CatalogError, Collection, Provider, TransferRequest, spawn_transfer,
};

use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CollectionsBody {
    pub provider: Provider,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferBody {
    pub source: Provider,
    pub dest: Provider,
    pub collection_ids: Vec<String>,
    pub source_token: String,
    pub dest_token: String,
}

pub async fn api_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Lists the caller's collections on one provider.
pub async fn api_collections(
    State(state): State<AppState>,
    Json(body): Json<CollectionsBody>,
) -> Response {
    let Some(source) = state.source(body.provider) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("no catalog configured for {}", body.provider),
        );
    };

    match source
        .list_collections(&AccessToken::new(body.token))
        .await
    {
        Ok(collections) => Json(collections_payload(collections)).into_response(),
        Err(error) => catalog_error_response(&error),
    }
}

/// Starts a transfer and streams its events as they are emitted.
///
/// The response body is the engine's wire encoding, one frame per event,
/// flushed incrementally. Dropping the connection cancels the transfer at
/// its next checkpoint.
pub async fn api_transfer(
    State(state): State<AppState>,
    Json(body): Json<TransferBody>,
) -> Response {
    if body.collection_ids.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "collection_ids must not be empty".to_string(),
        );
    }

    let Some(ctx) = state.transfer_context(body.source, body.dest) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("no catalog pairing for {} -> {}", body.source, body.dest),
        );
    };

    let request = TransferRequest {
        source_token: AccessToken::new(body.source_token),
        dest_token: AccessToken::new(body.dest_token),
        collection_ids: body.collection_ids,
    };

    tracing::info!(
        source = %body.source,
        dest = %body.dest,
        collections = request.collection_ids.len(),
        "starting transfer"
    );

    let stream = spawn_transfer(ctx, request);
    let (events, _cancel, _handle) = stream.into_parts();

    let frames = futures::stream::unfold(events, |mut events| async move {
        events
            .recv()
            .await
            .map(|event| (Ok::<Bytes, Infallible>(Bytes::from(event.encode())), events))
    });

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(frames),
    )
        .into_response()
}

fn collections_payload(collections: Vec<Collection>) -> serde_json::Value {
    json!({ "collections": collections })
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn catalog_error_response(error: &CatalogError) -> Response {
    let status = match error {
        CatalogError::AuthExpired { .. } => StatusCode::UNAUTHORIZED,
        CatalogError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        CatalogError::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
        CatalogError::InvalidData { .. } | CatalogError::Parse { .. } => StatusCode::BAD_REQUEST,
        CatalogError::Transient { .. } => StatusCode::BAD_GATEWAY,
    };
    error_response(status, error.to_string())
}
