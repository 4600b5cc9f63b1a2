use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nihongo_admin::api::router;
use nihongo_admin::cache::QueryCache;
use nihongo_admin::config::ConsoleConfig;
use nihongo_admin::db;
use nihongo_admin::lms::{LmsClient, LmsConfig, LmsHttpClient};
use nihongo_admin::services::CacheSweeper;
use nihongo_admin::session::SessionStore;
use nihongo_admin::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "nihongo_admin=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ConsoleConfig::new_from_env()?;

    let pool = db::connect(&config.database_url).await?;
    let session = SessionStore::new(pool.clone());

    let lms: Arc<dyn LmsClient> = Arc::new(LmsHttpClient::new(
        LmsConfig::new(config.api_base_url.clone()),
        session.clone(),
    )?);
    info!("LMS backend at {}", config.api_base_url);

    let cache = QueryCache::new(config.cache_stale_time, config.cache_gc_time);
    let sweeper = CacheSweeper::new(cache.clone(), config.cache_sweep_interval);
    tokio::spawn(async move {
        sweeper.start().await;
    });

    if config.bypass_admin_auth {
        info!("BYPASS_ADMIN_AUTH is set, session guard disabled");
    }

    let state = AppState {
        db: pool,
        lms,
        cache,
        session,
        bypass_auth: config.bypass_admin_auth,
    };

    let app = router(state);

    info!("listening on http://{}", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
