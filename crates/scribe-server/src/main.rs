mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use scribe_api::session::{MemorySessionStore, Sessions, SessionStore, SqliteSessionStore};
use scribe_api::{AppStateInner, router};
use scribe_db::Database;

use crate::config::{Config, SessionBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "scribe=debug,scribe_api=debug,scribe_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Fatal if the store cannot be opened.
    let db = Arc::new(Database::open(&config.db_path)?);

    let session_store: Arc<dyn SessionStore> = match config.session_backend {
        SessionBackend::Sqlite => Arc::new(SqliteSessionStore::new(db.clone())),
        SessionBackend::Memory => {
            warn!("Using in-memory sessions: logins are lost on restart");
            Arc::new(MemorySessionStore::new())
        }
    };

    let state = Arc::new(
        AppStateInner::new(db, Sessions::new(session_store))
            .with_secure_cookies(config.cookie_secure)
            .with_body_limit(config.body_limit_bytes),
    );

    let app = router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Scribe listening on {}", addr);
    info!(
        "Sessions: {:?}, body limit: {} MB",
        config.session_backend,
        config.body_limit_bytes / (1024 * 1024)
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
