//! CLI command implementations

use anyhow::{Context, bail};
use clap::Subcommand;

use cadence_core::config::CadenceConfig;
use cadence_core::{AccessToken, Provider, Severity, TransferEvent, TransferRequest, spawn_transfer};
use cadence_web::{AppState, RuntimeMode, run_server};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind to
        #[arg(short, long, default_value = "4600")]
        port: u16,
        /// Use in-memory demo catalogs instead of real providers
        #[arg(long)]
        demo: bool,
    },
    /// List collections on a provider
    Collections {
        /// Provider to list (spotify or youtube)
        provider: Provider,
        /// Bearer token for the provider
        #[arg(long)]
        token: Option<String>,
        /// Use in-memory demo catalogs instead of real providers
        #[arg(long)]
        demo: bool,
    },
    /// Transfer collections between providers
    Transfer {
        /// Source provider
        #[arg(long)]
        source: Provider,
        /// Destination provider
        #[arg(long)]
        dest: Provider,
        /// Collection id to move; repeatable. Use "liked_songs" for the
        /// liked library
        #[arg(long = "collection", required = true)]
        collections: Vec<String>,
        /// Bearer token for the source provider
        #[arg(long)]
        source_token: Option<String>,
        /// Bearer token for the destination provider
        #[arg(long)]
        dest_token: Option<String>,
        /// Use in-memory demo catalogs instead of real providers
        #[arg(long)]
        demo: bool,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Serve { host, port, demo } => serve(host, port, demo).await,
        Commands::Collections {
            provider,
            token,
            demo,
        } => list_collections(provider, token, demo).await,
        Commands::Transfer {
            source,
            dest,
            collections,
            source_token,
            dest_token,
            demo,
        } => transfer(source, dest, collections, source_token, dest_token, demo).await,
    }
}

fn runtime_mode(demo: bool) -> RuntimeMode {
    if demo {
        RuntimeMode::Demo
    } else {
        RuntimeMode::Production
    }
}

/// Resolves a bearer token, defaulting in demo mode where any value works.
fn resolve_token(token: Option<String>, demo: bool, flag: &str) -> anyhow::Result<AccessToken> {
    match token {
        Some(token) => Ok(AccessToken::new(token)),
        None if demo => Ok(AccessToken::new("demo")),
        None => bail!("--{flag} is required outside demo mode"),
    }
}

async fn serve(host: String, port: u16, demo: bool) -> anyhow::Result<()> {
    let listen = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;

    run_server(
        CadenceConfig::with_provider_defaults(),
        runtime_mode(demo),
        listen,
    )
    .await
    .map_err(|error| anyhow::anyhow!("server failed: {error}"))
}

async fn list_collections(
    provider: Provider,
    token: Option<String>,
    demo: bool,
) -> anyhow::Result<()> {
    let token = resolve_token(token, demo, "token")?;
    let state = AppState::new(CadenceConfig::with_provider_defaults(), runtime_mode(demo));
    let source = state
        .source(provider)
        .with_context(|| format!("no catalog configured for {provider}"))?;

    let collections = source.list_collections(&token).await?;
    if collections.is_empty() {
        println!("No collections found on {}", provider.display_name());
        return Ok(());
    }

    println!("Collections on {}:", provider.display_name());
    for collection in collections {
        match collection.item_count {
            Some(count) => println!("  {}  {} ({count} tracks)", collection.id, collection.name),
            None => println!("  {}  {}", collection.id, collection.name),
        }
    }
    Ok(())
}

async fn transfer(
    source: Provider,
    dest: Provider,
    collections: Vec<String>,
    source_token: Option<String>,
    dest_token: Option<String>,
    demo: bool,
) -> anyhow::Result<()> {
    let request = TransferRequest {
        source_token: resolve_token(source_token, demo, "source-token")?,
        dest_token: resolve_token(dest_token, demo, "dest-token")?,
        collection_ids: collections,
    };

    let state = AppState::new(CadenceConfig::with_provider_defaults(), runtime_mode(demo));
    let ctx = state
        .transfer_context(source, dest)
        .with_context(|| format!("no catalog pairing for {source} -> {dest}"))?;

    tracing::info!(%source, %dest, collections = request.collection_ids.len(), "starting transfer");

    let mut stream = spawn_transfer(ctx, request);

    // Ctrl-C cancels at the next pipeline checkpoint.
    let cancel = stream.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling transfer...");
            cancel.cancel();
        }
    });

    while let Some(event) = stream.next().await {
        match event {
            TransferEvent::Start { message } => {
                println!("{message}");
            }
            TransferEvent::Progress { message } => {
                println!("{message}");
            }
            TransferEvent::Log { message, severity } => match severity {
                Severity::Error => eprintln!("error: {message}"),
                Severity::Warning => eprintln!("warning: {message}"),
                _ => println!("{message}"),
            },
            TransferEvent::Error { message } => {
                bail!("transfer aborted: {message}");
            }
            TransferEvent::Cancelled { message } => {
                println!("{message}");
                return Ok(());
            }
            TransferEvent::Complete { summary } => {
                println!(
                    "Done: {}/{} tracks transferred across {} collection(s)",
                    summary.successful, summary.total_items, summary.total_collections
                );
                for outcome in &summary.collections {
                    println!(
                        "  {}: {} transferred, {} failed",
                        outcome.name, outcome.success_count, outcome.fail_count
                    );
                }
            }
        }
    }

    Ok(())
}
