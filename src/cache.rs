// src/cache.rs
//! Per-city insight cache: one JSON document per city, keyed by the
//! lower-cased city name. Freshness is derived from the file's last-modified
//! time; no expiry field is stored. A stale entry is treated as absent and
//! never returned partially.

use serde_json::Value;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

pub const DEFAULT_CACHE_DIR: &str = "data";
/// Entries older than this are treated as absent.
pub const CACHE_TTL: Duration = Duration::from_secs(6 * 3600);

#[derive(Debug, Clone)]
pub struct InsightCache {
    dir: PathBuf,
    ttl: Duration,
}

impl InsightCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl: CACHE_TTL,
        }
    }

    /// Same cache with a custom TTL; tests use short TTLs to prove expiry.
    pub fn with_ttl(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    fn path_for(&self, city: &str) -> PathBuf {
        self.dir.join(format!("{}_cache.json", city.to_lowercase()))
    }

    fn is_fresh(&self, path: &Path) -> bool {
        let Ok(meta) = fs::metadata(path) else {
            return false;
        };
        let Ok(modified) = meta.modified() else {
            return false;
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age < self.ttl,
            // mtime in the future (clock skew): treat as fresh-now
            Err(_) => true,
        }
    }

    /// Return the stored payload for `city` iff an entry exists and is
    /// younger than the TTL. Corrupt documents count as absent.
    pub fn load(&self, city: &str) -> Option<Value> {
        let path = self.path_for(city);
        if !self.is_fresh(&path) {
            return None;
        }
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(v) => {
                debug!(city, "cache hit");
                Some(v)
            }
            Err(e) => {
                warn!(error = ?e, city, "discarding corrupt cache entry");
                None
            }
        }
    }

    /// Persist `payload` for `city`, overwriting any prior entry and
    /// resetting the freshness clock. Always a full replacement; the
    /// tmp-file + rename keeps concurrent readers from seeing torn writes
    /// (last writer wins).
    pub fn store(&self, city: &str, payload: &Value) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(city);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(payload).unwrap_or_else(|_| "{}".to_string());
        let mut f = fs::File::create(&tmp)?;
        f.write_all(json.as_bytes())?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}
