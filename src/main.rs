//! `outlet-server`: serves the catalog over HTTP.

use anyhow::Context;
use clap::Parser;
use may_minihttp::HttpServer;
use outlet::catalog::{CatalogService, Projector};
use outlet::config::OutletConfig;
use outlet::http::CatalogHttpService;
use outlet::pool::DbPool;
use outlet::schema::ensure_schema;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "outlet-server")]
#[command(about = "Storefront catalog HTTP service")]
#[command(version)]
struct Cli {
    /// Config file (defaults to config/config.toml when present)
    #[arg(long)]
    config: Option<String>,

    /// Listen address, overrides `server.listen`
    #[arg(long)]
    listen: Option<String>,

    /// Create the catalog tables before serving
    #[arg(long)]
    init_schema: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    #[cfg(feature = "tracing")]
    init_tracing();

    let config = match &cli.config {
        Some(path) => OutletConfig::load_from(path),
        None => OutletConfig::load(),
    }
    .context("failed to load configuration")?;

    if let Some(workers) = config.server.workers {
        may::config().set_workers(workers);
    }

    let pool = DbPool::connect(&config.database).context("failed to open database pool")?;

    if cli.init_schema {
        let connection = pool.acquire()?;
        ensure_schema(&connection).context("failed to create catalog schema")?;
    }

    let images = config.images.policy();
    log::info!("image policy: {images:?}");
    let catalog = Arc::new(CatalogService::new(pool, Projector::new(images)));

    let listen = cli.listen.unwrap_or(config.server.listen);
    let server = HttpServer(CatalogHttpService::new(catalog))
        .start(&listen)
        .with_context(|| format!("failed to start server on {listen}"))?;
    log::info!("catalog listening on http://{listen}");

    server
        .join()
        .map_err(|e| anyhow::anyhow!("server thread panicked: {e:?}"))?;
    Ok(())
}

/// Span timings on stderr, enabled by `OUTLET_TRACE` (an `EnvFilter` directive).
#[cfg(feature = "tracing")]
fn init_tracing() {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    if let Ok(filter) = EnvFilter::try_from_env("OUTLET_TRACE") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .init();
    }
}
