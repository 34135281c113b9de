// src/insights.rs
//! The insight pipeline: cache short-circuit -> fetch -> relevance filter ->
//! summarize -> normalize -> cache. Failure scoping: a fetch failure fails
//! the payload (not the process), a single post's AI failure is recorded on
//! that insight only, and normalization failures ride inside the summary map.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::aggregate::{self, RestaurantAggregate};
use crate::ai::{conform, normalize_text, DynSummarizer, SummarySchema};
use crate::analyze::{AnalyzedComment, TextAnalyzer};
use crate::cache::InsightCache;
use crate::fetch::{RawPost, SourceFetcher};
use crate::relevance::RelevanceFilter;

/// At most this many top-ranked posts get an AI call per request.
pub const MAX_SUMMARIZED_POSTS: usize = 3;
/// A comment must exceed this many words to be worth summarizing.
pub const MIN_COMMENT_WORDS: usize = 5;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("insight_requests_total", "Insight pipeline invocations.");
        describe_counter!("insight_cache_hits_total", "Requests served from the city cache.");
        describe_counter!("insight_fetch_failures_total", "Failed platform fetches.");
        describe_counter!(
            "insight_summarize_failures_total",
            "Per-post AI summarization failures."
        );
        describe_counter!("insight_posts_summarized_total", "Posts sent to the AI service.");
        describe_gauge!("insight_last_run_ts", "Unix ts of the last pipeline run.");
    });
}

/// One processed post in the public payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub url: String,
    pub score: i64,
    pub summary: Map<String, Value>,
}

/// The payload returned to the HTTP layer (and cached verbatim).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightPayload {
    pub city: String,
    pub insights: Vec<Insight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A post that survived the relevance gates, with its food comments
/// combined into one text block for the AI call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodPost {
    pub title: String,
    pub url: String,
    pub score: i64,
    pub comments_text: String,
}

pub struct InsightService {
    fetcher: Arc<dyn SourceFetcher>,
    summarizer: DynSummarizer,
    filter: Arc<RelevanceFilter>,
    analyzer: TextAnalyzer,
    cache: InsightCache,
    snapshot_dir: PathBuf,
    schema: SummarySchema,
}

impl InsightService {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        summarizer: DynSummarizer,
        schema: SummarySchema,
    ) -> Self {
        Self {
            fetcher,
            summarizer,
            filter: crate::relevance::default_filter(),
            analyzer: TextAnalyzer::new(),
            cache: InsightCache::new(crate::cache::DEFAULT_CACHE_DIR),
            snapshot_dir: PathBuf::from(aggregate::DEFAULT_SNAPSHOT_DIR),
            schema,
        }
    }

    pub fn with_filter(mut self, filter: Arc<RelevanceFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_cache(mut self, cache: InsightCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    /// Apply the post and comment gates to a raw fetch result. Posts keep
    /// only comments that are food talk and long enough to carry signal;
    /// posts left without any such comment are dropped.
    pub fn filter_posts(&self, posts: Vec<RawPost>) -> Vec<FoodPost> {
        let mut out = Vec::with_capacity(posts.len());
        for post in posts {
            let full_text = format!("{} {}", post.title, post.selftext);
            if !self.filter.is_food_post(full_text.trim()) {
                continue;
            }

            let relevant: Vec<&str> = post
                .comments
                .iter()
                .map(|c| c.body.trim())
                .filter(|body| {
                    body.split_whitespace().count() > MIN_COMMENT_WORDS
                        && self.filter.is_food_comment(body)
                })
                .collect();

            if relevant.is_empty() {
                continue;
            }

            out.push(FoodPost {
                title: post.title,
                url: post.url,
                score: post.score,
                comments_text: relevant.join("\n"),
            });
        }
        out
    }

    /// The raw-inspection surface: filtered posts without any AI calls.
    pub async fn city_posts(&self, city: &str) -> anyhow::Result<Vec<FoodPost>> {
        let posts = self.fetcher.fetch_city_posts(city).await?;
        Ok(self.filter_posts(posts))
    }

    /// Build (or serve from cache) the insight payload for a city.
    pub async fn city_insights(&self, city: &str) -> Value {
        ensure_metrics_described();
        counter!("insight_requests_total").increment(1);

        if let Some(mut hit) = self.cache.load(city) {
            counter!("insight_cache_hits_total").increment(1);
            if let Some(obj) = hit.as_object_mut() {
                obj.insert("cached".into(), Value::Bool(true));
            }
            return hit;
        }

        let posts = match self.fetcher.fetch_city_posts(city).await {
            Ok(posts) => posts,
            Err(e) => {
                counter!("insight_fetch_failures_total").increment(1);
                warn!(error = ?e, city, source = self.fetcher.name(), "platform fetch failed");
                return error_payload(city, format!("failed to fetch posts: {e}"));
            }
        };

        let mut food_posts = self.filter_posts(posts);
        if food_posts.is_empty() {
            counter!("insight_fetch_failures_total").increment(1);
            return error_payload(city, format!("no food discussions found for {city}"));
        }

        // top-ranked posts first
        food_posts.sort_by_key(|p| std::cmp::Reverse(p.score));

        let mut insights = Vec::with_capacity(MAX_SUMMARIZED_POSTS);
        for post in food_posts.into_iter().take(MAX_SUMMARIZED_POSTS) {
            let combined = format!("{}\n{}", post.title, post.comments_text);
            let combined = combined.trim();
            if combined.is_empty() {
                continue;
            }

            counter!("insight_posts_summarized_total").increment(1);
            let summary = match self.summarizer.summarize(combined, city).await {
                Ok(reply) => {
                    let map = normalize_text(&reply);
                    // strict-mode filling is the single-post caller's job
                    match self.schema {
                        SummarySchema::PostAnalysis => conform(map, self.schema),
                        SummarySchema::CityOverview => map,
                    }
                }
                Err(e) => {
                    // isolated per post; the remaining posts still process
                    counter!("insight_summarize_failures_total").increment(1);
                    warn!(error = ?e, city, "summarization failed for one post");
                    let mut map = Map::new();
                    map.insert("error".into(), Value::String(e.to_string()));
                    map
                }
            };

            insights.push(Insight {
                title: post.title,
                url: post.url,
                score: post.score,
                summary,
            });
        }

        let payload = InsightPayload {
            city: city.to_string(),
            insights,
            cached: None,
            error: None,
        };
        let value = serde_json::to_value(&payload).unwrap_or_else(|_| Value::Null);

        if let Err(e) = self.cache.store(city, &value) {
            warn!(error = ?e, city, "failed to store insight cache entry");
        }
        gauge!("insight_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
        info!(city, insights = payload.insights.len(), "insight payload built");

        value
    }

    /// The parallel consumer: analyze every comment of the city's food posts
    /// and fold them into per-restaurant statistics, persisting the snapshot.
    pub async fn restaurant_stats(&self, city: &str) -> anyhow::Result<Vec<RestaurantAggregate>> {
        let posts = self.fetcher.fetch_city_posts(city).await?;
        let comments = self.analyze_comments(&posts);
        Ok(aggregate::aggregate_and_snapshot(
            &self.snapshot_dir,
            city,
            &comments,
        ))
    }

    /// Run the analyzer over every comment of relevance-passing posts. The
    /// analyzer applies its own (broader) gate per comment.
    pub fn analyze_comments(&self, posts: &[RawPost]) -> Vec<AnalyzedComment> {
        let mut out = Vec::new();
        for post in posts {
            let full_text = format!("{} {}", post.title, post.selftext);
            if !self.filter.is_food_post(full_text.trim()) {
                continue;
            }
            for c in &post.comments {
                out.push(self.analyzer.analyze(&c.body));
            }
        }
        out
    }

    /// Analyze one free-standing comment (the `/analyze` surface).
    pub fn analyze_one(&self, text: &str) -> AnalyzedComment {
        self.analyzer.analyze(text)
    }
}

fn error_payload(city: &str, message: String) -> Value {
    serde_json::to_value(InsightPayload {
        city: city.to_string(),
        insights: Vec::new(),
        cached: None,
        error: Some(message),
    })
    .unwrap_or_else(|_| Value::Null)
}
