// src/ai/normalize.rs
//! Recovery of a structured mapping from an unreliable AI reply.
//!
//! `normalize` is a total function: whatever the summarizer hands back
//! (already-parsed object, chunked reply, fenced markdown, double-escaped or
//! single-quoted JSON, plain prose), the caller always receives a map:
//! either the recovered document or `{error, raw}` with the original text.
//!
//! Schema conformance is a separate, optional layer (`conform`): the lenient
//! recovery itself never enforces fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ERR_EMPTY: &str = "Empty AI response";
pub const ERR_NO_JSON: &str = "No valid JSON found";
pub const ERR_MALFORMED: &str = "Malformed JSON object";

/// Which summary shape the caller expects. Selected explicitly (config),
/// never guessed from the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySchema {
    /// City dashboard shape: city_overview, top_recommendations,
    /// major_complaints. The public insight payload uses this one.
    #[default]
    CityOverview,
    /// Single-post shape: intent, restaurant_names, popular_foods,
    /// overall_sentiment, summary, key_finding.
    PostAnalysis,
}

/// Turn any reply value into a structured mapping. Never panics, never
/// errors: failures come back as `{error, raw}`.
pub fn normalize(raw: &Value) -> Map<String, Value> {
    // Already a mapping: idempotent passthrough.
    if let Value::Object(map) = raw {
        return map.clone();
    }

    // A sequence of chunks: concatenate the pieces into one string.
    let text = match raw {
        Value::Array(chunks) => chunks
            .iter()
            .map(|c| match c {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(""),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    normalize_text(&text)
}

/// The string path of `normalize`, exposed for callers that already hold
/// the reply as text.
pub fn normalize_text(raw: &str) -> Map<String, Value> {
    if raw.trim().is_empty() {
        return error_map(ERR_EMPTY, raw);
    }

    // Strip one layer of markdown fencing, then undo double-encoding
    // artifacts the service sometimes produces.
    let text = strip_code_fence(raw.trim());
    let text = text.replace("\\n", "\n").replace("\\\"", "\"");
    let text = text.trim();

    // Candidate document: first '{' through last '}'. A single embedded
    // object is assumed; prose around it is discarded.
    let (start, end) = match (text.find('{'), text.rfind('}')) {
        (Some(s), Some(e)) if s < e => (s, e),
        _ => return error_map(ERR_NO_JSON, raw),
    };
    let candidate = &text[start..=end];

    if let Ok(map) = serde_json::from_str::<Map<String, Value>>(candidate) {
        return map;
    }

    // Retry once for Python-dict-style quoting.
    let requoted = candidate.replace('\'', "\"");
    match serde_json::from_str::<Map<String, Value>>(&requoted) {
        Ok(map) => map,
        Err(_) => error_map(ERR_MALFORMED, raw),
    }
}

/// Strict-mode layer: fill schema defaults so downstream consumers never
/// see missing fields, and title-case extracted names. Error maps pass
/// through untouched.
pub fn conform(mut map: Map<String, Value>, schema: SummarySchema) -> Map<String, Value> {
    if map.contains_key("error") {
        return map;
    }
    match schema {
        SummarySchema::CityOverview => {
            ensure_string(&mut map, "city_overview");
            ensure_array(&mut map, "top_recommendations");
            ensure_array(&mut map, "major_complaints");
        }
        SummarySchema::PostAnalysis => {
            ensure_string(&mut map, "intent");
            ensure_array(&mut map, "restaurant_names");
            ensure_array(&mut map, "popular_foods");
            if !map.get("overall_sentiment").is_some_and(Value::is_string) {
                map.insert("overall_sentiment".into(), Value::String("neutral".into()));
            }
            ensure_string(&mut map, "summary");
            ensure_string(&mut map, "key_finding");
            title_case_strings(&mut map, "restaurant_names");
        }
    }
    map
}

fn error_map(reason: &str, raw: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("error".into(), Value::String(reason.to_string()));
    map.insert("raw".into(), Value::String(raw.to_string()));
    map
}

/// Remove a single leading and trailing triple-backtick marker, with an
/// optional language tag after the opening fence.
fn strip_code_fence(s: &str) -> &str {
    let mut t = s.trim();
    if let Some(rest) = t.strip_prefix("```") {
        // language tag, e.g. "json", runs to the end of the fence token
        t = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = t.trim_end().strip_suffix("```") {
        t = rest;
    }
    t.trim()
}

fn ensure_string(map: &mut Map<String, Value>, key: &str) {
    if !map.get(key).is_some_and(Value::is_string) {
        map.insert(key.into(), Value::String(String::new()));
    }
}

fn ensure_array(map: &mut Map<String, Value>, key: &str) {
    if !map.get(key).is_some_and(Value::is_array) {
        map.insert(key.into(), Value::Array(Vec::new()));
    }
}

fn title_case_strings(map: &mut Map<String, Value>, key: &str) {
    if let Some(Value::Array(items)) = map.get_mut(key) {
        for item in items {
            if let Value::String(s) = item {
                *s = title_case(s);
            }
        }
    }
}

/// "shah ghouse" -> "Shah Ghouse".
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
