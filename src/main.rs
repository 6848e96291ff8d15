//! Chess Link Back binary entrypoint wiring REST, SSE and storage layers.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chess_link_back::{
    config::{self, AppConfig, DatabaseSettings},
    dao::game_store::{StorageHandles, memory::MemoryGameStore},
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_config = AppConfig::load();
    let database = DatabaseSettings::from_env().context("reading database settings")?;
    let table = app_config.table.clone();
    let app_state = AppState::new(app_config);

    match database {
        Some(settings) => spawn_storage_supervisor(app_state.clone(), settings, table)?,
        None => {
            warn!("DATABASE_URL not set; games are kept in memory and lost on restart");
            let store = Arc::new(MemoryGameStore::new());
            app_state
                .install_storage(StorageHandles::shared(store))
                .await;
        }
    }

    // Build the HTTP router once the shared state is ready.
    let app = routes::app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config::server_port()));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Connect the hosted database in the background, toggling degraded mode as connectivity changes.
#[cfg(feature = "rest-store")]
fn spawn_storage_supervisor(
    state: SharedState,
    settings: DatabaseSettings,
    table: String,
) -> anyhow::Result<()> {
    use chess_link_back::{
        dao::{game_store::postgrest, storage::StorageError},
        services::storage_supervisor,
    };

    info!(url = %settings.url, %table, "using PostgREST storage");
    tokio::spawn(storage_supervisor::run(state, move || {
        let settings = settings.clone();
        let table = table.clone();
        async move {
            postgrest::connect_handles(&settings, &table)
                .await
                .map_err(StorageError::from)
        }
    }));
    Ok(())
}

#[cfg(not(feature = "rest-store"))]
fn spawn_storage_supervisor(
    _state: SharedState,
    _settings: DatabaseSettings,
    _table: String,
) -> anyhow::Result<()> {
    anyhow::bail!("DATABASE_URL is set but this build lacks the `rest-store` feature")
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
