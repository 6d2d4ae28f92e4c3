use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use campusgigs::{
    auth::IdentityClient,
    config::Config,
    db,
    state::AppState,
    store::MySqlProfileStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ───────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── Config ────────────────────────────────────────────────
    let config = Config::from_env()?;
    tracing::info!(
        env = %config.app_env,
        development = config.is_development(),
        "Starting CampusGigs backend"
    );
    if !config.is_development() && !config.cookie_secure {
        tracing::warn!("Session cookies are issued without the Secure flag outside development");
    }
    if !config.guard_fail_open {
        tracing::info!("Route guard fails closed on profile lookup errors");
    }

    // ── Database ──────────────────────────────────────────────
    let pool = db::connect(&config).await?;
    db::run_migrations(&pool).await?;

    // ── Identity provider ─────────────────────────────────────
    let sessions = IdentityClient::new(&config.auth_url, &config.auth_api_key)?;

    // Read address before moving config into state
    let addr: SocketAddr = format!("{}:{}", config.backend_host, config.backend_port).parse()?;

    let app_state = AppState {
        sessions: Arc::new(sessions),
        profiles: Arc::new(MySqlProfileStore::new(pool)),
        config,
    };

    // ── Router ────────────────────────────────────────────────
    let app = campusgigs::app(app_state);
    tracing::info!(%addr, "Listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
