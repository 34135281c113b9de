// src/fetch.rs
//! Discussion-platform fetch: the `SourceFetcher` contract, the Reddit JSON
//! provider, and shared text normalization. The core treats the fetcher as a
//! collaborator; every failure mode (transport error, error body, empty
//! result) surfaces as `Err`/empty and is handled by the pipeline, never
//! retried here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One comment body with its vote score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawComment {
    pub body: String,
    pub score: i64,
}

/// One discussion thread as fetched. Read-only to the core; relevance
/// filtering happens downstream in the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    pub title: String,
    pub url: String,
    pub score: i64,
    #[serde(default)]
    pub selftext: String,
    /// Ordered best-first (by score), capped at the provider.
    #[serde(default)]
    pub comments: Vec<RawComment>,
}

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch recent discussion threads for a city. `Ok(vec![])` means the
    /// platform had nothing; `Err` covers transport and error-shaped bodies.
    async fn fetch_city_posts(&self, city: &str) -> Result<Vec<RawPost>>;
    fn name(&self) -> &'static str;
}

/// Normalize platform text: decode HTML entities, strip tags, normalize
/// curly quotes, collapse whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

// ------------------------------------------------------------
// Reddit provider
// ------------------------------------------------------------

/// Search query mirrored from the platform-side post filter; the whole-word
/// relevance gate still runs downstream on whatever comes back.
const POST_QUERY: &str = "\"best restaurant\" OR \"food recommendation\" OR \"must try\" \
OR \"food places\" OR \"local food\" OR \"good food\" \
OR \"where to eat\" OR \"recommend\" OR \"cafe\" OR \"street food\"";

const MAX_POSTS: usize = 40;
const MAX_COMMENTS_PER_POST: usize = 30;

/// Fetches the city subreddit's food threads via the public JSON endpoints.
pub struct RedditFetcher {
    http: reqwest::Client,
    base_url: String,
}

impl Default for RedditFetcher {
    fn default() -> Self {
        Self::new("https://www.reddit.com")
    }
}

impl RedditFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("city-eats-insight/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn search_posts(&self, subreddit: &str) -> Result<Vec<SearchChild>> {
        #[derive(Deserialize)]
        struct Listing {
            data: ListingData,
        }
        #[derive(Deserialize)]
        struct ListingData {
            children: Vec<Wrapped>,
        }
        #[derive(Deserialize)]
        struct Wrapped {
            data: SearchChild,
        }

        let url = format!("{}/r/{}/search.json", self.base_url, subreddit);
        let limit = MAX_POSTS.to_string();
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("q", POST_QUERY),
                ("restrict_sr", "1"),
                ("sort", "new"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .context("reddit search request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("reddit search returned {}", resp.status());
        }

        let listing: Listing = resp.json().await.context("reddit search decode")?;
        Ok(listing.data.children.into_iter().map(|w| w.data).collect())
    }

    async fn fetch_comments(&self, permalink: &str) -> Result<Vec<RawComment>> {
        #[derive(Deserialize)]
        struct Listing {
            data: ListingData,
        }
        #[derive(Deserialize)]
        struct ListingData {
            children: Vec<Wrapped>,
        }
        #[derive(Deserialize)]
        struct Wrapped {
            data: CommentChild,
        }
        #[derive(Deserialize)]
        struct CommentChild {
            body: Option<String>,
            score: Option<i64>,
        }

        let url = format!("{}{}.json", self.base_url, permalink.trim_end_matches('/'));
        let limit = MAX_COMMENTS_PER_POST.to_string();
        let resp = self
            .http
            .get(&url)
            .query(&[("limit", limit.as_str())])
            .send()
            .await
            .context("reddit comments request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("reddit comments returned {}", resp.status());
        }

        // The endpoint returns [post-listing, comment-listing].
        let listings: Vec<Listing> = resp.json().await.context("reddit comments decode")?;
        let mut comments: Vec<RawComment> = listings
            .into_iter()
            .nth(1)
            .map(|l| l.data.children)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|w| {
                let body = normalize_text(w.data.body?.as_str());
                if body.is_empty() {
                    return None;
                }
                Some(RawComment {
                    body,
                    score: w.data.score.unwrap_or(0),
                })
            })
            .collect();

        // best-first, capped
        comments.sort_by_key(|c| std::cmp::Reverse(c.score));
        comments.truncate(MAX_COMMENTS_PER_POST);
        Ok(comments)
    }
}

#[derive(Deserialize)]
struct SearchChild {
    title: Option<String>,
    permalink: Option<String>,
    score: Option<i64>,
    selftext: Option<String>,
}

#[async_trait]
impl SourceFetcher for RedditFetcher {
    async fn fetch_city_posts(&self, city: &str) -> Result<Vec<RawPost>> {
        let t0 = std::time::Instant::now();
        let subreddit = city.to_lowercase();

        let children = self.search_posts(&subreddit).await?;
        let mut posts = Vec::with_capacity(children.len());

        for child in children {
            let Some(permalink) = child.permalink else {
                continue;
            };
            let title = normalize_text(child.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                continue;
            }
            // A post with unreachable comments still counts; the pipeline
            // drops it later if nothing relevant remains.
            let comments = self.fetch_comments(&permalink).await.unwrap_or_default();

            posts.push(RawPost {
                title,
                url: format!("https://reddit.com{permalink}"),
                score: child.score.unwrap_or(0),
                selftext: normalize_text(child.selftext.as_deref().unwrap_or_default()),
                comments,
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("fetch_city_posts_ms").record(ms);
        counter!("fetch_posts_total").increment(posts.len() as u64);

        Ok(posts)
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}

// ------------------------------------------------------------
// Static fetcher (tests / fixtures)
// ------------------------------------------------------------

/// Serves a fixed post list; `error` simulates a failing platform.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pub posts: Vec<RawPost>,
    pub error: Option<String>,
}

impl StaticFetcher {
    pub fn with_posts(posts: Vec<RawPost>) -> Self {
        Self { posts, error: None }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            posts: Vec::new(),
            error: Some(message.into()),
        }
    }
}

#[async_trait]
impl SourceFetcher for StaticFetcher {
    async fn fetch_city_posts(&self, _city: &str) -> Result<Vec<RawPost>> {
        match &self.error {
            Some(msg) => Err(anyhow::anyhow!("{msg}")),
            None => Ok(self.posts.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
