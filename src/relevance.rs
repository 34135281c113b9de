// src/relevance.rs
//! Relevance gate primitives: the keyword configuration, compiled whole-word
//! matchers, and the two public predicates (`is_food_post`, `is_food_comment`).
//!
//! Both predicates are pure OR semantics over the configured lists: no
//! ranking, no scoring. Adding a keyword can only turn a non-match into a
//! match, never the reverse.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_RELEVANCE_CONFIG_PATH: &str = "config/relevance.toml";
pub const ENV_RELEVANCE_CONFIG_PATH: &str = "EATS_RELEVANCE_CONFIG_PATH";

/// Phrases that mark a post (title + selftext) as a food/restaurant thread.
const DEFAULT_POST_PHRASES: &[&str] = &[
    "must try",
    "recommend",
    "suggest",
    "food places",
    "food spots",
    "best places",
    "any recommendations",
    "where to eat",
    "what to eat",
    "best restaurants",
    "local food",
    "food recommendations",
    "food guide",
    "good food",
    "top 10 food",
    "hidden gems",
    "cheap eats",
    "affordable food",
    "famous food",
    "popular restaurants",
    "must visit restaurants",
    "street food",
    "breakfast places",
    "lunch spots",
    "dinner places",
    "foodie",
];

/// Dish/venue nouns that mark a single comment as food talk.
const DEFAULT_COMMENT_TERMS: &[&str] = &[
    "biryani",
    "chicken",
    "mutton",
    "pizza",
    "burger",
    "cafe",
    "restaurant",
    "hotel",
    "thali",
    "coffee",
    "chai",
    "dosa",
    "tandoori",
    "roll",
    "shawarma",
    "juice",
    "sandwich",
    "snack",
    "pasta",
    "paneer",
    "roti",
    "rice",
    "dal",
];

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct RelevanceConfig {
    #[serde(default)]
    pub post_phrases: Vec<String>,
    #[serde(default)]
    pub comment_terms: Vec<String>,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            post_phrases: DEFAULT_POST_PHRASES.iter().map(|s| s.to_string()).collect(),
            comment_terms: DEFAULT_COMMENT_TERMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/* ----------------------------
Compiled filter
---------------------------- */

/// Holds one compiled whole-word regex per configured keyword.
#[derive(Debug)]
pub struct RelevanceFilter {
    post_patterns: Vec<Regex>,
    comment_patterns: Vec<Regex>,
}

/// Compile `(?i)\b<phrase>\b` for a literal phrase. Escaping keeps keywords
/// like "top 10 food" literal; word boundaries avoid "roll" matching "stroll".
fn whole_word(phrase: &str) -> anyhow::Result<Regex> {
    let pattern = format!(r"(?i)\b{}\b", regex::escape(phrase.trim()));
    Regex::new(&pattern).map_err(|e| anyhow::anyhow!("keyword `{phrase}` regex error: {e}"))
}

impl RelevanceFilter {
    pub fn from_config(cfg: &RelevanceConfig) -> anyhow::Result<Self> {
        let post_patterns = cfg
            .post_phrases
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| whole_word(p))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let comment_patterns = cfg
            .comment_terms
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| whole_word(p))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            post_patterns,
            comment_patterns,
        })
    }

    /// Load from a TOML file. Uses EATS_RELEVANCE_CONFIG_PATH or defaults to
    /// "config/relevance.toml". A missing file falls back to the built-in
    /// lists so the service can boot without local config.
    pub fn from_toml() -> anyhow::Result<Self> {
        let path = std::env::var(ENV_RELEVANCE_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_RELEVANCE_CONFIG_PATH));

        match fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(_) => Self::from_config(&RelevanceConfig::default()),
        }
    }

    /// Load from a TOML string. Empty lists fall back to the defaults.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let mut cfg: RelevanceConfig = toml::from_str(toml_str)?;
        let defaults = RelevanceConfig::default();
        if cfg.post_phrases.is_empty() {
            cfg.post_phrases = defaults.post_phrases;
        }
        if cfg.comment_terms.is_empty() {
            cfg.comment_terms = defaults.comment_terms;
        }
        Self::from_config(&cfg)
    }

    /// True iff the post text contains at least one configured phrase as a
    /// whole word, case-insensitively.
    pub fn is_food_post(&self, text: &str) -> bool {
        self.post_patterns.iter().any(|re| re.is_match(text))
    }

    /// True iff the comment contains at least one configured food term as a
    /// whole word, case-insensitively.
    pub fn is_food_comment(&self, text: &str) -> bool {
        self.comment_patterns.iter().any(|re| re.is_match(text))
    }
}

/// Filter built from the built-in keyword lists; enough for every caller
/// that does not override the config file.
pub fn default_filter() -> Arc<RelevanceFilter> {
    static DEFAULT: Lazy<Arc<RelevanceFilter>> = Lazy::new(|| {
        Arc::new(
            RelevanceFilter::from_config(&RelevanceConfig::default())
                .expect("built-in keyword lists compile"),
        )
    });
    DEFAULT.clone()
}

/* ----------------------------
Tests
---------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> RelevanceFilter {
        RelevanceFilter::from_config(&RelevanceConfig::default()).expect("default filter")
    }

    #[test]
    fn post_gate_matches_whole_phrases_case_insensitively() {
        let f = filter();
        assert!(f.is_food_post("WHERE TO EAT near the station?"));
        assert!(f.is_food_post("Looking for street food recommendations"));
        assert!(!f.is_food_post("Best parks for a morning run"));
    }

    #[test]
    fn comment_gate_requires_word_boundaries() {
        let f = filter();
        assert!(f.is_food_comment("The dosa at Ram ki Bandi is unreal"));
        // "roll" must not fire inside "stroll"
        assert!(!f.is_food_comment("We took a stroll along the lake"));
        assert!(f.is_food_comment("Try their mutton roll"));
    }

    #[test]
    fn gates_are_pure_and_repeatable() {
        let f = filter();
        let text = "any recommendations for biryani?";
        let first = (f.is_food_post(text), f.is_food_comment(text));
        for _ in 0..3 {
            assert_eq!((f.is_food_post(text), f.is_food_comment(text)), first);
        }
    }

    #[test]
    fn enlarging_the_list_is_monotonic() {
        let base = RelevanceConfig {
            post_phrases: vec!["where to eat".into()],
            comment_terms: vec!["biryani".into()],
        };
        let mut wider = base.clone();
        wider.post_phrases.push("late night food".into());
        wider.comment_terms.push("falooda".into());

        let small = RelevanceFilter::from_config(&base).unwrap();
        let big = RelevanceFilter::from_config(&wider).unwrap();

        let samples = [
            "where to eat tonight",
            "late night food options?",
            "falooda at Shah Ghouse",
            "nothing relevant here",
        ];
        for text in samples {
            if small.is_food_post(text) {
                assert!(big.is_food_post(text), "post gate lost a match: {text}");
            }
            if small.is_food_comment(text) {
                assert!(big.is_food_comment(text), "comment gate lost a match: {text}");
            }
        }
    }

    #[test]
    fn toml_overrides_replace_lists() {
        let f = RelevanceFilter::from_toml_str(
            r#"
post_phrases = ["supper clubs"]
comment_terms = ["ramen"]
"#,
        )
        .expect("load inline toml");
        assert!(f.is_food_post("any supper clubs around?"));
        assert!(!f.is_food_post("where to eat?"));
        assert!(f.is_food_comment("the ramen is great"));
        assert!(!f.is_food_comment("the biryani is great"));
    }
}
