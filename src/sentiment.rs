// src/sentiment.rs
//! Lexicon polarity scorer. Produces a continuous score in [-1, 1] from a
//! bundled food-review lexicon (word -> integer weight in -5..=5), with a
//! short negation window that flips the sign of a scored word.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Largest absolute lexicon weight; used to normalize into [-1, 1].
const MAX_WORD_WEIGHT: f32 = 5.0;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_weight(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Polarity of `text` in [-1, 1]. The mean of the matched word weights,
    /// normalized by the lexicon scale; text with no scored words is 0.0.
    ///
    /// Negation: a negator within the previous 1..=3 tokens inverts the sign
    /// of the scored word ("not great" counts against, not for).
    pub fn polarity(&self, text: &str) -> f32 {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut sum: i32 = 0;
        let mut hits: usize = 0;

        for i in 0..tokens.len() {
            let base = self.word_weight(tokens[i].as_str());
            if base == 0 {
                continue;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            sum += if negated { -base } else { base };
            hits += 1;
        }

        if hits == 0 {
            return 0.0;
        }
        let mean = sum as f32 / hits as f32;
        (mean / MAX_WORD_WEIGHT).clamp(-1.0, 1.0)
    }
}

/// Alphanumeric tokens, lower-cased.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "without"
    )
}
