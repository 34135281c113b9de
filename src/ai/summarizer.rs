// src/ai/summarizer.rs
//! Summarizer provider abstraction. The real provider calls the Gemini
//! generateContent API; a mock and a disabled client cover tests and
//! keyless environments. Callers treat any `Err` the same way, whether the
//! provider threw or the service answered with an error body.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ai::normalize::SummarySchema;
use crate::ai::prompt;
use crate::config::ai::AiConfig;

/// Trait object used by the insight pipeline and tests.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize combined discussion text for a city. The reply is free text
    /// expected (not guaranteed) to contain one embedded JSON object.
    async fn summarize(&self, text: &str, city: &str) -> anyhow::Result<String>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynSummarizer = Arc<dyn Summarizer>;

/// Factory: build a summarizer according to config and environment.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock.
/// * Else if `config.enabled == false`, returns a disabled client.
/// * Else builds the configured provider (gemini).
pub fn build_summarizer_from_config(config: &AiConfig) -> DynSummarizer {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockSummarizer::default());
    }

    if !config.enabled {
        return Arc::new(DisabledSummarizer);
    }

    match config.provider.as_str() {
        "gemini" => Arc::new(GeminiSummarizer::new(
            config.resolved_api_key(),
            None,
            config.schema,
        )),
        _ => Arc::new(DisabledSummarizer),
    }
}

// ------------------------------------------------------------
// Gemini provider
// ------------------------------------------------------------

pub struct GeminiSummarizer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    schema: SummarySchema,
}

impl GeminiSummarizer {
    /// `model_override`: pass Some("gemini-2.0-flash") to override the default.
    pub fn new(api_key: String, model_override: Option<&str>, schema: SummarySchema) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("city-eats-insight/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            model: model_override.unwrap_or("gemini-2.0-flash").to_string(),
            schema,
        }
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, text: &str, city: &str) -> anyhow::Result<String> {
        if self.api_key.is_empty() {
            return Err(anyhow!("missing Gemini API key"));
        }

        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }
        #[derive(Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            contents: Vec<Content<'a>>,
        }
        #[derive(Deserialize)]
        struct RespPart {
            text: Option<String>,
        }
        #[derive(Deserialize)]
        struct RespContent {
            parts: Option<Vec<RespPart>>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: Option<RespContent>,
        }
        #[derive(Deserialize)]
        struct Resp {
            candidates: Option<Vec<Candidate>>,
        }

        let prompt = prompt::build(self.schema, text, city);
        let req = Req {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send()
            .await
            .context("gemini request failed")?;

        let status = resp.status();
        if !status.is_success() {
            // An error body is a failure too, same as a transport error.
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("gemini returned {status}: {body}"));
        }

        let body: Resp = resp.json().await.context("gemini response decode")?;
        let reply = body
            .candidates
            .and_then(|mut c| c.drain(..).next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|mut p| p.drain(..).next())
            .and_then(|p| p.text)
            .unwrap_or_default();

        if reply.trim().is_empty() {
            return Err(anyhow!("gemini returned no candidates"));
        }
        Ok(reply)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Disabled + mock clients
// ------------------------------------------------------------

/// Always fails; used when AI is disabled or unconfigured.
pub struct DisabledSummarizer;

#[async_trait]
impl Summarizer for DisabledSummarizer {
    async fn summarize(&self, _text: &str, _city: &str) -> anyhow::Result<String> {
        Err(anyhow!("AI summarization is disabled"))
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic mock for tests and local runs. The canned reply is fenced
/// on purpose so the full normalizer path gets exercised end to end.
#[derive(Clone)]
pub struct MockSummarizer {
    pub fixed: String,
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self {
            fixed: concat!(
                "```json\n",
                "{\"city_overview\": \"Discussions focus on biryani and late-night food.\", ",
                "\"top_recommendations\": [], \"major_complaints\": []}\n",
                "```"
            )
            .to_string(),
        }
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, _text: &str, _city: &str) -> anyhow::Result<String> {
        Ok(self.fixed.clone())
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::normalize;

    #[tokio::test]
    async fn mock_reply_round_trips_through_the_normalizer() {
        let mock = MockSummarizer::default();
        let reply = mock.summarize("text", "Pune").await.expect("mock reply");
        let map = normalize::normalize_text(&reply);
        assert!(map.contains_key("city_overview"));
        assert!(!map.contains_key("error"));
    }

    #[tokio::test]
    async fn disabled_client_reports_failure() {
        let c = DisabledSummarizer;
        assert!(c.summarize("text", "Pune").await.is_err());
    }
}
