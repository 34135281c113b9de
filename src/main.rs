//! CityEatsInsight — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.

mod aggregate;
mod ai;
mod api;
mod cache;
mod config;
mod directory;
mod fetch;
mod insights;
mod metrics;
mod relevance;
mod sentiment;

mod analyze;

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::ai::build_summarizer_from_config;
use crate::api::AppState;
use crate::cache::{InsightCache, CACHE_TTL, DEFAULT_CACHE_DIR};
use crate::config::ai::AiConfig;
use crate::directory::{CityDirectory, DEFAULT_CITIES_PATH};
use crate::fetch::RedditFetcher;
use crate::insights::InsightService;
use crate::relevance::RelevanceFilter;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - EATS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("EATS_DEV_LOG").ok().is_some_and(|v| v == "1");

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
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("insights=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This makes
    // GEMINI_API_KEY / EATS_RELEVANCE_CONFIG_PATH available early.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    // --- Domain configuration ---
    let filter = Arc::new(RelevanceFilter::from_toml().expect("Failed to load relevance config"));
    let ai_cfg = AiConfig::load_or_default();
    let summarizer = build_summarizer_from_config(&ai_cfg);

    // Static, process-lifetime city list; missing file degrades autocomplete
    // to empty results without failing boot.
    let directory = Arc::new(CityDirectory::load_from_file(DEFAULT_CITIES_PATH));

    let service = InsightService::new(Arc::new(RedditFetcher::default()), summarizer, ai_cfg.schema)
        .with_filter(filter)
        .with_cache(InsightCache::new(DEFAULT_CACHE_DIR));

    let metrics = crate::metrics::Metrics::init(CACHE_TTL);

    let state = AppState {
        service: Arc::new(service),
        directory,
    };
    let router = api::create_router(state).merge(metrics.router());

    Ok(router.into())
}
