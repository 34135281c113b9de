// src/analyze/entities.rs
//! Restaurant/food extraction via keyword and pattern heuristics.
//!
//! Restaurant candidates are runs of capitalized words found anywhere in the
//! text. A candidate is retained only if the whole comment contains at least
//! one indicator word ("restaurant", "cafe", ...). The gate is corpus-level
//! on purpose: one indicator anywhere admits every capitalized run in the
//! comment. That over-recalls names and is the accepted trade-off here; do
//! not tighten it to a per-candidate check.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Words whose presence anywhere in a comment marks it as naming venues.
const RESTAURANT_HINTS: &[&str] = &["restaurant", "hotel", "mess", "biryani", "cafe", "place"];

/// Dishes extracted by substring membership; no NLP beyond this list.
const FOOD_HINTS: &[&str] = &[
    "biryani", "chicken", "mutton", "dosa", "pizza", "pasta", "coffee", "burger",
];

/// Runs of capitalized words, e.g. "Shah Ghouse" or "Paradise".
static CAPITALIZED_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-z]+(?:\s[A-Z][a-z]+)*)\b").expect("capitalized-run regex"));

/// Extract (restaurants, foods) from one comment. Both sets come back
/// lower-cased and deduplicated.
pub fn extract(text: &str) -> (BTreeSet<String>, BTreeSet<String>) {
    let lower = text.to_lowercase();

    let mut restaurants = BTreeSet::new();
    if RESTAURANT_HINTS.iter().any(|h| lower.contains(h)) {
        for m in CAPITALIZED_RUN.find_iter(text) {
            let name = m.as_str().trim().to_lowercase();
            if !name.is_empty() {
                restaurants.insert(name);
            }
        }
    }

    let mut foods = BTreeSet::new();
    for food in FOOD_HINTS {
        if lower.contains(food) {
            foods.insert((*food).to_string());
        }
    }

    (restaurants, foods)
}
