use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{Level, error, info};

use server::config::AppConfig;
use server::install::InstallGate;
use server::session::SessionStore;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = server::database::init_db(&config.database.url).await?;
    server::seed::ensure_indexes(&db).await?;

    let sessions = SessionStore::new(
        db.clone(),
        chrono::Duration::seconds(config.session.ttl_seconds),
    );
    let install = Arc::new(InstallGate::detect(&db).await?);
    if !install.is_installed() {
        info!("No admin account found; installation endpoints are open");
    }

    let state = AppState {
        db,
        config: config.clone(),
        sessions: sessions.clone(),
        install,
    };

    // Expired sessions are invisible to loads; this keeps the table from
    // growing unboundedly.
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "Purged expired sessions"),
                Err(e) => error!(error = %e, "Session purge failed"),
            }
        }
    });

    let app = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
