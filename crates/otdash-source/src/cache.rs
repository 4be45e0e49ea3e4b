//! Time-bounded on-disk cache for fetched CSV exports
//!
//! Entries are plain files named after the source's cache key. An entry is
//! fresh while its modification time is younger than the TTL.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::SourceError;

#[derive(Clone, Debug)]
pub struct CsvCache {
    dir: PathBuf,
    ttl: Duration,
}

impl CsvCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self { dir: dir.into(), ttl }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.csv"))
    }

    /// Cached bytes for `key` if present and younger than the TTL
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path_for(key);
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        let age = SystemTime::now().duration_since(modified).unwrap_or_default();
        if age > self.ttl {
            debug!(key, age_secs = age.as_secs(), "cache entry expired");
            return None;
        }
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(key, age_secs = age.as_secs(), "cache hit");
                Some(bytes)
            }
            Err(e) => {
                warn!(key, error = %e, "unreadable cache entry");
                None
            }
        }
    }

    /// Store bytes for `key`, replacing any previous entry
    pub fn put(&self, key: &str, bytes: &[u8]) -> Result<(), SourceError> {
        fs::create_dir_all(&self.dir).map_err(SourceError::Cache)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("csv.tmp");
        fs::write(&tmp, bytes).map_err(SourceError::Cache)?;
        fs::rename(&tmp, &path).map_err(SourceError::Cache)?;
        debug!(key, bytes = bytes.len(), path = %path.display(), "cache stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_within_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path(), Duration::from_secs(300));

        assert!(cache.get("ot_master").is_none());
        cache.put("ot_master", b"ot\n1\n").unwrap();
        assert_eq!(cache.get("ot_master").as_deref(), Some(&b"ot\n1\n"[..]));
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path(), Duration::ZERO);
        cache.put("procesos", b"ot\n").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get("procesos").is_none());
    }

    #[test]
    fn keys_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path(), Duration::from_secs(60));
        cache.put("../evil key", b"x").unwrap();
        assert!(dir.path().join("___evil_key.csv").exists());
    }
}
