//! Topic Sentiment Monitor — Binary Entrypoint
//! Boots the Axum HTTP server: engine wiring, scheduled refresh loop, routes.

use std::sync::Arc;
use std::time::Duration;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use topic_sentiment_monitor::config::MonitorConfig;
use topic_sentiment_monitor::engine::{spawn_refresh_loop, Monitor};
use topic_sentiment_monitor::ingest::providers::google_news::GoogleNewsSource;
use topic_sentiment_monitor::sentiment::LexiconScorer;
use topic_sentiment_monitor::storage::JsonFileStorage;
use topic_sentiment_monitor::{api, AppState};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - MONITOR_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("MONITOR_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("monitor=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This enables
    // MONITOR_* overrides from .env before the config is read.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let config = MonitorConfig::from_env();

    let storage = Arc::new(JsonFileStorage::new(config.data_path.clone()));
    let source = Arc::new(
        GoogleNewsSource::from_http(Duration::from_secs(config.fetch_timeout_secs))
            .expect("Failed to build news client"),
    );
    let scorer = Arc::new(LexiconScorer::new());

    let monitor =
        Arc::new(Monitor::new(config, source, scorer, storage).expect("Failed to open record store"));

    // Background driver; manual /refresh requests gate through the same engine.
    spawn_refresh_loop(monitor.clone());

    let router = api::create_router(AppState { monitor });
    Ok(router.into())
}
