// src/aggregate.rs
//! Folds analyzed comments into per-restaurant statistics and persists the
//! result as a per-city snapshot. Each aggregation run rebuilds the full
//! output from the comment batch; the snapshot file is overwritten wholesale,
//! never merged.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::analyze::AnalyzedComment;

pub const DEFAULT_SNAPSHOT_DIR: &str = "data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantAggregate {
    pub name: String,
    pub mentions: u32,
    pub positive: u32,
    pub negative: u32,
    pub foods: Vec<String>,
    pub summary: String,
}

#[derive(Default)]
struct Accumulator {
    mentions: u32,
    positive: u32,
    negative: u32,
    foods: BTreeSet<String>,
}

/// Build per-restaurant aggregates from a full comment batch.
///
/// Neutral comments (sentiment exactly 0) count toward mentions but neither
/// positive nor negative, so positive + negative <= mentions always holds.
/// Output order follows map iteration and is unspecified.
pub fn aggregate(comments: &[AnalyzedComment]) -> Vec<RestaurantAggregate> {
    let mut by_name: HashMap<String, Accumulator> = HashMap::new();

    for c in comments {
        for r in &c.restaurants {
            let acc = by_name.entry(r.to_lowercase()).or_default();
            acc.mentions += 1;
            if c.sentiment > 0.0 {
                acc.positive += 1;
            } else if c.sentiment < 0.0 {
                acc.negative += 1;
            }
            acc.foods.extend(c.foods.iter().cloned());
        }
    }

    by_name
        .into_iter()
        .map(|(name, acc)| {
            let verdict = if acc.positive > acc.negative {
                "Mostly positive"
            } else {
                "Mixed reviews"
            };
            let dishes = if acc.foods.is_empty() {
                "varied dishes".to_string()
            } else {
                acc.foods.iter().cloned().collect::<Vec<_>>().join(", ")
            };
            RestaurantAggregate {
                name,
                mentions: acc.mentions,
                positive: acc.positive,
                negative: acc.negative,
                foods: acc.foods.into_iter().collect(),
                summary: format!("{verdict}, popular for {dishes}."),
            }
        })
        .collect()
}

/// Aggregate and persist the snapshot for `city` under `dir`
/// (`<dir>/<city_lower>.json`, pretty JSON, unconditional overwrite).
/// A failed write is logged and does not fail the aggregation.
pub fn aggregate_and_snapshot(
    dir: &Path,
    city: &str,
    comments: &[AnalyzedComment],
) -> Vec<RestaurantAggregate> {
    let out = aggregate(comments);
    if let Err(e) = write_snapshot(dir, city, &out) {
        warn!(error = ?e, city, "failed to persist restaurant snapshot");
    }
    out
}

fn snapshot_path(dir: &Path, city: &str) -> PathBuf {
    dir.join(format!("{}.json", city.to_lowercase()))
}

fn write_snapshot(dir: &Path, city: &str, out: &[RestaurantAggregate]) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    let path = snapshot_path(dir, city);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(out).unwrap_or_else(|_| "[]".to_string());
    let mut f = fs::File::create(&tmp)?;
    f.write_all(json.as_bytes())?;
    fs::rename(tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{sentiment_label, SentimentLabel};

    fn comment(text: &str, sentiment: f32, restaurants: &[&str], foods: &[&str]) -> AnalyzedComment {
        AnalyzedComment {
            text: text.to_string(),
            sentiment,
            sentiment_label: sentiment_label(sentiment),
            restaurants: restaurants.iter().map(|s| s.to_string()).collect(),
            foods: foods.iter().map(|s| s.to_string()).collect(),
            relevant: true,
        }
    }

    #[test]
    fn opposing_reviews_yield_mixed_summary() {
        let comments = vec![
            comment("loved it", 0.5, &["tasty spot"], &["biryani"]),
            comment("hated it", -0.5, &["tasty spot"], &["biryani"]),
        ];
        let out = aggregate(&comments);
        assert_eq!(out.len(), 1);
        let agg = &out[0];
        assert_eq!(agg.name, "tasty spot");
        assert_eq!(agg.mentions, 2);
        assert_eq!(agg.positive, 1);
        assert_eq!(agg.negative, 1);
        assert_eq!(agg.summary, "Mixed reviews, popular for biryani.");
    }

    #[test]
    fn neutral_sentiment_counts_in_neither_bucket() {
        let comments = vec![
            comment("meh", 0.0, &["udupi grand"], &[]),
            comment("nice", 0.4, &["udupi grand"], &[]),
        ];
        let out = aggregate(&comments);
        let agg = &out[0];
        assert_eq!(agg.mentions, 2);
        assert_eq!(agg.positive, 1);
        assert_eq!(agg.negative, 0);
        assert!(agg.positive + agg.negative <= agg.mentions);
    }

    #[test]
    fn empty_food_set_uses_fallback_text() {
        let comments = vec![comment("solid", 0.6, &["cafe niloufer"], &[])];
        let out = aggregate(&comments);
        assert_eq!(out[0].summary, "Mostly positive, popular for varied dishes.");
    }

    #[test]
    fn case_variants_of_a_name_collapse_into_one_key() {
        let comments = vec![
            comment("a", 0.3, &["Paradise"], &["biryani"]),
            comment("b", 0.3, &["paradise"], &["chicken"]),
        ];
        let out = aggregate(&comments);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].mentions, 2);
        assert_eq!(out[0].foods, vec!["biryani", "chicken"]);
    }

    #[test]
    fn snapshot_overwrites_previous_run(){
        let dir = std::env::temp_dir().join(format!(
            "eats_snapshot_test_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);

        let first = vec![comment("a", 0.3, &["paradise"], &["biryani"])];
        aggregate_and_snapshot(&dir, "Hyderabad", &first);
        let second = vec![comment("b", -0.3, &["bawarchi"], &[])];
        aggregate_and_snapshot(&dir, "Hyderabad", &second);

        let raw = fs::read_to_string(dir.join("hyderabad.json")).expect("snapshot exists");
        let parsed: Vec<RestaurantAggregate> = serde_json::from_str(&raw).expect("valid snapshot");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "bawarchi");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn labels_partition_matches_aggregation_buckets() {
        // label thresholds (±0.2) are stricter than the bucket thresholds (0):
        // a 0.1 "neutral-labelled" comment still counts as positive here.
        let comments = vec![comment("mild", 0.1, &["minerva"], &[])];
        assert_eq!(comments[0].sentiment_label, SentimentLabel::Neutral);
        let out = aggregate(&comments);
        assert_eq!(out[0].positive, 1);
    }
}
