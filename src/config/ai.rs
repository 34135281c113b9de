// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::ai::normalize::SummarySchema;

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    /// "gemini" (case-insensitive); anything else resolves to disabled.
    pub provider: String,
    /// "ENV" means: read from GEMINI_API_KEY.
    pub api_key: String,
    /// Which summary shape the pipeline requests and conforms to.
    #[serde(default)]
    pub schema: SummarySchema,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "gemini".to_string(),
            api_key: "ENV".to_string(),
            schema: SummarySchema::default(),
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: AiConfig = serde_json::from_str(&data)?;
        cfg.provider = cfg.provider.to_lowercase();
        Ok(cfg)
    }

    /// Load from the default path; fall back to the disabled default when
    /// the file is missing or unparsable. Boot never fails on AI config.
    pub fn load_or_default() -> Self {
        Self::load_from_file(DEFAULT_AI_CONFIG_PATH).unwrap_or_default()
    }

    /// Resolve the "ENV" indirection into the actual key. An empty result
    /// means no usable key; providers treat that as a failure per call.
    pub fn resolved_api_key(&self) -> String {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            env::var("GEMINI_API_KEY").unwrap_or_default()
        } else {
            self.api_key.clone()
        }
    }
}
