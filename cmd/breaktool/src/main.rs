//! # Breaktool server
//!
//! Assembles the scoring core from configuration and serves it over HTTP.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::web::{build_router, AppState};
use configs::{LogSettings, Settings, StorageBackend};
use storage_adapters::{BroadcastEvents, MemoryStore};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const EVENT_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.log);

    let events = Arc::new(BroadcastEvents::new(EVENT_BUFFER));
    spawn_event_logger(&events);

    let state = match settings.database.backend {
        StorageBackend::Memory => {
            warn!("using the in-memory store, data will not survive a restart");
            AppState::from_store(Arc::new(MemoryStore::new()), events.clone(), &settings.scoring)
        }
        StorageBackend::Postgres => postgres_state(&settings, events.clone()).await?,
    };

    let app = build_router(state);
    let addr = settings.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!("🚀 Breaktool listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log.level.as_str()));
    let fmt = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        fmt.json().init();
    } else {
        fmt.init();
    }
}

#[cfg(feature = "db-postgres")]
async fn postgres_state(
    settings: &Settings,
    events: Arc<BroadcastEvents>,
) -> anyhow::Result<AppState> {
    use secrecy::ExposeSecret;
    use storage_adapters::PgStore;

    let url = settings
        .database
        .url
        .as_ref()
        .context("database.url is not set")?;
    let store = PgStore::connect(url.expose_secret(), settings.database.max_connections)
        .await
        .context("connecting to postgres")?;

    if settings.database.run_migrations {
        store.migrate().await.context("running migrations")?;
        info!("migrations applied");
    }

    Ok(AppState::from_store(Arc::new(store), events, &settings.scoring))
}

#[cfg(not(feature = "db-postgres"))]
async fn postgres_state(
    _settings: &Settings,
    _events: Arc<BroadcastEvents>,
) -> anyhow::Result<AppState> {
    anyhow::bail!("built without the `db-postgres` feature; set database.backend = \"memory\"")
}

/// Logs every score change. Stands in for downstream consumers such as
/// cache invalidation.
fn spawn_event_logger(events: &BroadcastEvents) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => info!(?event, "score changed"),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "score event logger fell behind")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
