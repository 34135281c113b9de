// src/analyze/mod.rs
//! Per-comment analysis: relevance gate -> polarity -> label -> entities.
//! Most input takes the short-circuit path (irrelevant or empty); that is the
//! normal case, not an error.

pub mod entities;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::sentiment::SentimentAnalyzer;

/// Food terms checked by plain substring membership. This gate deliberately
/// overlaps, but is not identical to, the whole-word comment filter in
/// `crate::relevance` (it also admits phrases like "must try" and broader
/// words like "food"/"taste").
const GATE_FOOD_TERMS: &[&str] = &[
    "biryani",
    "thali",
    "shawarma",
    "curry",
    "roll",
    "tandoori",
    "cafe",
    "restaurant",
    "dosa",
    "momos",
    "chicken",
    "paneer",
    "food",
    "taste",
    "must try",
    "recommend",
    "best place",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

/// Map a polarity score onto the three labels. Boundaries are strict:
/// exactly 0.2 or -0.2 stays neutral.
pub fn sentiment_label(score: f32) -> SentimentLabel {
    if score > 0.2 {
        SentimentLabel::Positive
    } else if score < -0.2 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// One analyzed comment. Immutable once created; entity sets are
/// case-folded and deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedComment {
    pub text: String,
    pub sentiment: f32,
    pub sentiment_label: SentimentLabel,
    pub restaurants: BTreeSet<String>,
    pub foods: BTreeSet<String>,
    pub relevant: bool,
}

impl AnalyzedComment {
    /// The short-circuit record for empty or off-topic comments.
    fn skipped(text: &str) -> Self {
        Self {
            text: text.to_string(),
            sentiment: 0.0,
            sentiment_label: SentimentLabel::Neutral,
            restaurants: BTreeSet::new(),
            foods: BTreeSet::new(),
            relevant: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextAnalyzer {
    sentiment: SentimentAnalyzer,
}

impl TextAnalyzer {
    pub fn new() -> Self {
        Self {
            sentiment: SentimentAnalyzer::new(),
        }
    }

    /// Analyze one comment. Empty/whitespace-only text and text that fails
    /// the food-term gate return the default record with `relevant: false`.
    pub fn analyze(&self, comment: &str) -> AnalyzedComment {
        if comment.trim().is_empty() {
            return AnalyzedComment::skipped("");
        }
        if !passes_food_gate(comment) {
            return AnalyzedComment::skipped(comment);
        }

        let sentiment = self.sentiment.polarity(comment);
        let (restaurants, foods) = entities::extract(comment);

        if dev_logging_enabled() {
            // Never log raw comment text; hashed id only.
            debug!(
                target: "analyze",
                id = %anon_hash(comment),
                sentiment,
                restaurants = restaurants.len(),
                foods = foods.len(),
                "comment analyzed"
            );
        }

        AnalyzedComment {
            text: comment.to_string(),
            sentiment,
            sentiment_label: sentiment_label(sentiment),
            restaurants,
            foods,
            relevant: true,
        }
    }
}

/// Substring membership test against the gate list, lower-cased.
fn passes_food_gate(comment: &str) -> bool {
    let text = comment.to_lowercase();
    GATE_FOOD_TERMS.iter().any(|term| text.contains(term))
}

// Dev logging gate: EATS_DEV_LOG=1 AND a debug build.
fn dev_logging_enabled() -> bool {
    std::env::var("EATS_DEV_LOG").ok().as_deref() == Some("1") && cfg!(debug_assertions)
}

pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_comment_short_circuits() {
        let a = TextAnalyzer::new();
        let out = a.analyze("   \n ");
        assert_eq!(out.text, "");
        assert_eq!(out.sentiment, 0.0);
        assert_eq!(out.sentiment_label, SentimentLabel::Neutral);
        assert!(out.restaurants.is_empty());
        assert!(out.foods.is_empty());
        assert!(!out.relevant);
    }

    #[test]
    fn off_topic_comment_is_not_relevant() {
        let a = TextAnalyzer::new();
        let out = a.analyze("The metro extension opens next month.");
        assert!(!out.relevant);
        assert_eq!(out.sentiment, 0.0);
        assert_eq!(out.sentiment_label, SentimentLabel::Neutral);
    }

    #[test]
    fn relevant_comment_gets_scored_and_extracted() {
        let a = TextAnalyzer::new();
        let out = a.analyze("Bawarchi restaurant has delicious chicken biryani");
        assert!(out.relevant);
        assert!(out.sentiment > 0.2);
        assert_eq!(out.sentiment_label, SentimentLabel::Positive);
        assert!(out.restaurants.contains("bawarchi"));
        assert!(out.foods.contains("biryani"));
        assert!(out.foods.contains("chicken"));
    }

    #[test]
    fn gate_accepts_phrases_the_word_filter_would_not() {
        let a = TextAnalyzer::new();
        // "taste" is in the analyzer gate but not a relevance comment keyword
        let out = a.analyze("the taste is incredible here");
        assert!(out.relevant);
    }

    #[test]
    fn label_boundaries_are_strict() {
        assert_eq!(sentiment_label(0.2), SentimentLabel::Neutral);
        assert_eq!(sentiment_label(-0.2), SentimentLabel::Neutral);
        assert_eq!(sentiment_label(0.2000001), SentimentLabel::Positive);
        assert_eq!(sentiment_label(-0.2000001), SentimentLabel::Negative);
        assert_eq!(sentiment_label(0.0), SentimentLabel::Neutral);
        assert_eq!(sentiment_label(1.0), SentimentLabel::Positive);
        assert_eq!(sentiment_label(-1.0), SentimentLabel::Negative);
    }
}
