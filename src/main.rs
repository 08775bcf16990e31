use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use draconic_id::config::Config;
use draconic_id::database::schema::ensure_schema;
use draconic_id::database::SqliteProfileRepository;
use draconic_id::error::AppError;
use draconic_id::services::avatar_service::{AvatarUrls, S3AvatarStore};
use draconic_id::services::session_service::DbSessionProvider;
use draconic_id::state::AppState;
use draconic_id::web::build_router;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!("❌ Server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;
    info!(
        "🔌 Connecting to database (build {})",
        env!("DRACONIC_BUILD_ID")
    );

    let pool = SqlitePoolOptions::new()
        .connect(&config.database_url)
        .await?;
    ensure_schema(&pool).await?;

    let avatars = S3AvatarStore::connect(&config.object_store)?;
    let state = AppState::new(
        Arc::new(SqliteProfileRepository::new(pool.clone())),
        Arc::new(DbSessionProvider::new(pool)),
        Arc::new(avatars),
        AvatarUrls::new(&config.object_store.public_url, &config.object_store.bucket),
        config.landing.clone(),
    )
    .with_end_session_url(config.end_session_url.clone());

    let app = build_router(state);

    // Bind, falling back to the next port when busy
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST/PORT: {}", e)))?;

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let fallback = SocketAddr::new(addr.ip(), config.port.saturating_add(1));
            warn!(
                "⚠️ Could not bind {}: {}. Trying fallback {}",
                addr, e, fallback
            );
            tokio::net::TcpListener::bind(fallback)
                .await
                .map_err(|e| AppError::Config(format!("cannot bind {}: {}", fallback, e)))?
        }
    };

    match listener.local_addr() {
        Ok(bound) => info!("🚀 Server listening on http://{}", bound),
        Err(e) => warn!("Could not read bound address: {}", e),
    }

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("server error: {}", e)))
}
