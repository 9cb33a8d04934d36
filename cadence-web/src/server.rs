//! HTTP server wiring: state construction, routing, startup.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use cadence_catalog::{MemoryCatalog, SpotifyCatalog, YouTubeCatalog};
use cadence_core::config::CadenceConfig;
use cadence_core::{
    DestCatalog, Provider, RateLimiter, RetryPolicy, SourceCatalog, TransferContext,
};

use crate::handlers::{api_collections, api_health, api_transfer};

/// Which catalog backends the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    /// Real provider APIs; callers must supply valid bearer tokens.
    Production,
    /// In-memory demo catalogs; any token is accepted.
    Demo,
}

/// Shared state handed to every handler.
///
/// Rate limiters live here, one per provider, so every transfer and
/// listing call draws from the same process-wide budget.
#[derive(Clone)]
pub struct AppState {
    pub config: CadenceConfig,
    sources: Arc<HashMap<Provider, Arc<dyn SourceCatalog>>>,
    dests: Arc<HashMap<Provider, Arc<dyn DestCatalog>>>,
    limiters: Arc<HashMap<Provider, Arc<RateLimiter>>>,
}

const PROVIDERS: [Provider; 2] = [Provider::Spotify, Provider::Youtube];

fn limiter_name(provider: Provider) -> &'static str {
    match provider {
        Provider::Spotify => "spotify",
        Provider::Youtube => "youtube",
    }
}

impl AppState {
    pub fn new(config: CadenceConfig, mode: RuntimeMode) -> Self {
        let mut limiters = HashMap::new();
        for provider in PROVIDERS {
            let limits = config.limits(provider);
            limiters.insert(
                provider,
                Arc::new(RateLimiter::new(
                    limiter_name(provider),
                    limits.rate_capacity,
                    limits.refill_interval,
                )),
            );
        }

        let mut sources: HashMap<Provider, Arc<dyn SourceCatalog>> = HashMap::new();
        let mut dests: HashMap<Provider, Arc<dyn DestCatalog>> = HashMap::new();
        match mode {
            RuntimeMode::Production => {
                let spotify = Arc::new(SpotifyCatalog::new(
                    limiters[&Provider::Spotify].clone(),
                    &config,
                ));
                let youtube = Arc::new(YouTubeCatalog::new(
                    limiters[&Provider::Youtube].clone(),
                    &config,
                ));
                sources.insert(Provider::Spotify, spotify.clone());
                dests.insert(Provider::Spotify, spotify);
                sources.insert(Provider::Youtube, youtube.clone());
                dests.insert(Provider::Youtube, youtube);
            }
            RuntimeMode::Demo => {
                for provider in PROVIDERS {
                    let catalog = Arc::new(MemoryCatalog::demo(provider));
                    sources.insert(provider, catalog.clone());
                    dests.insert(provider, catalog);
                }
            }
        }

        Self {
            config,
            sources: Arc::new(sources),
            dests: Arc::new(dests),
            limiters: Arc::new(limiters),
        }
    }

    pub fn source(&self, provider: Provider) -> Option<Arc<dyn SourceCatalog>> {
        self.sources.get(&provider).cloned()
    }

    /// Engine context for a transfer between two providers.
    pub fn transfer_context(
        &self,
        source: Provider,
        dest: Provider,
    ) -> Option<TransferContext> {
        Some(TransferContext {
            source: self.sources.get(&source)?.clone(),
            dest: self.dests.get(&dest)?.clone(),
            dest_limiter: self.limiters.get(&dest)?.clone(),
            retry: RetryPolicy::from_config(&self.config.retry),
            matching: self.config.matching.clone(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api_health))
        .route("/api/collections", post(api_collections))
        .route("/api/transfer", post(api_transfer))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(
    config: CadenceConfig,
    mode: RuntimeMode,
    listen: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(config, mode);
    let app = router(state);

    tracing::info!(%listen, ?mode, "cadence server listening");
    println!("Cadence transfer server running on http://{listen}");
    let listener = tokio::net::TcpListener::bind(listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
