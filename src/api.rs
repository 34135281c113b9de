// src/api.rs
//! HTTP surface. Handlers stay thin: decode, call into the core, encode.
//! CORS is wide open because the dashboard frontend is served elsewhere.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::analyze::AnalyzedComment;
use crate::directory::CityDirectory;
use crate::insights::InsightService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InsightService>,
    pub directory: Arc<CityDirectory>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(|| async { "ok" }))
        .route("/city/{name}", get(city_posts))
        .route("/insights/{city}", get(city_insights))
        .route("/restaurants/{city}", get(restaurant_stats))
        .route("/city_suggestions/{prefix}", get(city_suggestions))
        .route("/analyze", post(analyze))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn home() -> Json<Value> {
    Json(json!({ "message": "CityEatsInsight backend is running!" }))
}

/// Raw filtered posts + comments (for debugging / inspection).
async fn city_posts(State(state): State<AppState>, Path(name): Path<String>) -> Json<Value> {
    match state.service.city_posts(&name).await {
        Ok(posts) => Json(json!({ "city": name, "posts": posts })),
        Err(e) => Json(json!({ "city": name, "posts": [], "error": e.to_string() })),
    }
}

/// The main pipeline: AI-generated insights for a city, cached per city.
async fn city_insights(State(state): State<AppState>, Path(city): Path<String>) -> Json<Value> {
    Json(state.service.city_insights(&city).await)
}

/// Per-restaurant statistics from analyzed comments; persists a snapshot.
async fn restaurant_stats(State(state): State<AppState>, Path(city): Path<String>) -> Json<Value> {
    match state.service.restaurant_stats(&city).await {
        Ok(stats) => Json(json!({ "city": city, "restaurants": stats })),
        Err(e) => Json(json!({ "city": city, "restaurants": [], "error": e.to_string() })),
    }
}

#[derive(serde::Serialize)]
struct SuggestionsResp {
    results: Vec<String>,
}

async fn city_suggestions(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Json<SuggestionsResp> {
    Json(SuggestionsResp {
        results: state.directory.suggest(&prefix),
    })
}

#[derive(serde::Deserialize)]
struct AnalyzeReq {
    text: String,
}

/// Run the comment analyzer on one text (no AI involved).
async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeReq>,
) -> Json<AnalyzedComment> {
    Json(state.service.analyze_one(&body.text))
}
