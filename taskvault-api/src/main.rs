//! # TaskVault API Server
//!
//! Per-user task-tracking backend. The server exposes registration,
//! multi-device session management and ownership-scoped task CRUD over
//! JSON/HTTP, backed by PostgreSQL.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/taskvault \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p taskvault-api
//! ```

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskvault_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskvault_shared::store::postgres::{connect, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskvault_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskVault API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = connect(&config.database.url, config.database.max_connections).await?;
    sqlx::migrate!("../migrations").run(&pool).await?;

    let store = Arc::new(PgStore::new(pool));
    let bind_address = config.bind_address();
    let state = AppState::new(store.clone(), store, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
