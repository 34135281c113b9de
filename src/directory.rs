// src/directory.rs
//! Static city directory for autocomplete. Loaded once at startup and passed
//! around by reference; when the file is missing or corrupt, suggestions
//! degrade to an empty result set instead of failing the process.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_CITIES_PATH: &str = "config/cities.json";
const MAX_SUGGESTIONS: usize = 8;
/// Fuzzy floor for non-prefix matches.
const MIN_SIMILARITY: f64 = 0.78;

#[derive(Debug, Clone, Default)]
pub struct CityDirectory {
    cities: Vec<String>,
}

#[derive(Deserialize)]
struct CitiesFile {
    cities: Vec<String>,
}

impl CityDirectory {
    pub fn from_cities(cities: Vec<String>) -> Self {
        Self { cities }
    }

    /// Load the directory from a JSON file. Any failure is logged and
    /// produces an empty directory.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = ?e, path = %path.display(), "city directory unavailable");
                return Self::default();
            }
        };
        match serde_json::from_str::<CitiesFile>(&raw) {
            Ok(file) => Self {
                cities: file.cities,
            },
            Err(e) => {
                warn!(error = ?e, path = %path.display(), "city directory corrupt");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Suggest cities for a partial query: case-insensitive prefix matches
    /// first, then close fuzzy matches (typo tolerance), capped.
    pub fn suggest(&self, query: &str) -> Vec<String> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }

        let mut out: Vec<String> = self
            .cities
            .iter()
            .filter(|c| c.to_lowercase().starts_with(&q))
            .cloned()
            .collect();

        if out.len() < MAX_SUGGESTIONS {
            let mut fuzzy: Vec<(f64, &String)> = self
                .cities
                .iter()
                .filter(|c| !out.contains(*c))
                .map(|c| (strsim::jaro_winkler(&q, &c.to_lowercase()), c))
                .filter(|(sim, _)| *sim >= MIN_SIMILARITY)
                .collect();
            fuzzy.sort_by(|a, b| b.0.total_cmp(&a.0));
            out.extend(fuzzy.into_iter().map(|(_, c)| c.clone()));
        }

        out.truncate(MAX_SUGGESTIONS);
        out
    }
}
