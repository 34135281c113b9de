// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use city_eats_insight::ai::{MockSummarizer, SummarySchema};
use city_eats_insight::api::{create_router, AppState};
use city_eats_insight::cache::InsightCache;
use city_eats_insight::directory::CityDirectory;
use city_eats_insight::fetch::{RawComment, RawPost, StaticFetcher};
use city_eats_insight::insights::InsightService;
use http::header::CONTENT_TYPE;
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot

fn unique_dir(tag: &str) -> std::path::PathBuf {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("eats_api_{tag}_{nonce}"))
}

fn app(tag: &str, fetcher: StaticFetcher) -> Router {
    let dir = unique_dir(tag);
    let service = InsightService::new(
        Arc::new(fetcher),
        Arc::new(MockSummarizer::default()),
        SummarySchema::CityOverview,
    )
    .with_cache(InsightCache::new(dir.join("cache")))
    .with_snapshot_dir(dir.join("data"));

    let directory = CityDirectory::from_cities(
        ["Hyderabad", "Pune", "Delhi", "Mumbai"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );

    create_router(AppState {
        service: Arc::new(service),
        directory: Arc::new(directory),
    })
}

fn sample_posts() -> Vec<RawPost> {
    vec![RawPost {
        title: "Where to eat near the station?".to_string(),
        url: "https://reddit.com/r/pune/abc".to_string(),
        score: 42,
        selftext: String::new(),
        comments: vec![RawComment {
            body: "The misal thali at Bedekar is the one thing you must not miss".to_string(),
            score: 17,
        }],
    }]
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request build");
    let resp = app.clone().oneshot(req).await.expect("router response");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_endpoint_answers_ok() {
    let app = app("health", StaticFetcher::default());
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request build");
    let resp = app.oneshot(req).await.expect("router response");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn home_endpoint_reports_running() {
    let app = app("home", StaticFetcher::default());
    let (status, body) = get_json(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "CityEatsInsight backend is running!");
}

#[tokio::test]
async fn suggestions_use_the_directory() {
    let app = app("suggest", StaticFetcher::default());
    let (status, body) = get_json(&app, "/city_suggestions/pu").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!(["Pune"]));
}

#[tokio::test]
async fn suggestions_degrade_to_empty_for_unknown_prefixes() {
    let app = app("suggest_empty", StaticFetcher::default());
    let (status, body) = get_json(&app, "/city_suggestions/zzz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn insights_endpoint_returns_payload_shape() {
    let app = app("insights", StaticFetcher::with_posts(sample_posts()));
    let (status, body) = get_json(&app, "/insights/pune").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "pune");
    let insights = body["insights"].as_array().expect("insights array");
    assert_eq!(insights.len(), 1);
    assert!(insights[0]["summary"]["city_overview"].is_string());
}

#[tokio::test]
async fn insights_endpoint_survives_fetch_failure() {
    let app = app(
        "insights_fail",
        StaticFetcher::failing("subreddit unreachable"),
    );
    let (status, body) = get_json(&app, "/insights/atlantis").await;
    // request-scoped failure: HTTP succeeds, payload carries the error
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["insights"], json!([]));
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn city_endpoint_exposes_filtered_posts() {
    let app = app("city_raw", StaticFetcher::with_posts(sample_posts()));
    let (status, body) = get_json(&app, "/city/pune").await;
    assert_eq!(status, StatusCode::OK);
    let posts = body["posts"].as_array().expect("posts array");
    assert_eq!(posts.len(), 1);
    assert!(posts[0]["comments_text"]
        .as_str()
        .expect("combined comments")
        .contains("Bedekar"));
}

#[tokio::test]
async fn analyze_endpoint_returns_an_analyzed_comment() {
    let app = app("analyze", StaticFetcher::default());
    let payload = json!({ "text": "The paneer tikka at Kalinga restaurant is delicious" });
    let req = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&payload).expect("serialize")))
        .expect("request build");
    let resp = app.oneshot(req).await.expect("router response");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let body: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["relevant"], json!(true));
    assert_eq!(body["sentiment_label"], "positive");
    assert!(body["restaurants"]
        .as_array()
        .expect("restaurants")
        .iter()
        .any(|r| r == "kalinga"));
}

#[tokio::test]
async fn restaurants_endpoint_returns_aggregates() {
    let app = app("restaurants", StaticFetcher::with_posts(vec![RawPost {
        title: "good food spots?".to_string(),
        url: "https://reddit.com/r/pune/xyz".to_string(),
        score: 5,
        selftext: String::new(),
        comments: vec![RawComment {
            body: "Durvankur restaurant thali is delicious and generous".to_string(),
            score: 3,
        }],
    }]));
    let (status, body) = get_json(&app, "/restaurants/pune").await;
    assert_eq!(status, StatusCode::OK);
    let restaurants = body["restaurants"].as_array().expect("restaurants");
    assert!(restaurants.iter().any(|r| r["name"] == "durvankur"));
}
