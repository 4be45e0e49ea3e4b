//! Fetching raw CSV exports over HTTP or from disk
//!
//! Failures are reported, never retried: a dashboard run either has both
//! tables or stops.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::CsvCache;
use crate::SourceError;

/// Where a table comes from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Url(String),
    File(PathBuf),
}

impl Location {
    /// CSV export URL of one tab of a Google spreadsheet
    pub fn google_sheet(sheet_id: &str, gid: &str) -> Self {
        Location::Url(format!(
            "https://docs.google.com/spreadsheets/d/{sheet_id}/export?format=csv&gid={gid}"
        ))
    }

    /// `http(s)://` strings are URLs, anything else a file path
    pub fn parse(s: &str) -> Self {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Location::Url(s.to_string())
        } else {
            Location::File(PathBuf::from(s.strip_prefix("file://").unwrap_or(s)))
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Url(url) => write!(f, "{url}"),
            Location::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A named table source
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetSource {
    pub name: String,
    pub location: Location,
}

impl SheetSource {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }

    /// Cache key: the name plus a digest of the location, so sources that
    /// share a name but point elsewhere never see each other's entries
    pub fn cache_key(&self) -> String {
        let digest = blake3::hash(self.location.to_string().as_bytes()).to_hex();
        format!("{}-{}", self.name, &digest[..16])
    }
}

/// Fetches CSV bytes, consulting the cache for remote sources
#[derive(Clone, Debug)]
pub struct Fetcher {
    timeout: Duration,
    cache: Option<CsvCache>,
    refresh: bool,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            cache: None,
            refresh: false,
        }
    }
}

impl Fetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the HTTP request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cache remote responses
    pub fn with_cache(mut self, cache: CsvCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Ignore cached entries (they are still refreshed)
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn fetch(&self, source: &SheetSource) -> Result<Vec<u8>, SourceError> {
        match &source.location {
            Location::File(path) => {
                debug!(source = %source.name, path = %path.display(), "reading local export");
                std::fs::read(path).map_err(|e| SourceError::Io {
                    path: path.clone(),
                    source: e,
                })
            }
            Location::Url(url) => {
                let key = source.cache_key();
                if !self.refresh {
                    if let Some(bytes) = self.cache.as_ref().and_then(|c| c.get(&key)) {
                        return Ok(bytes);
                    }
                }
                let bytes = self.download(url)?;
                if let Some(cache) = &self.cache {
                    cache.put(&key, &bytes)?;
                }
                Ok(bytes)
            }
        }
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let http_err = |e: reqwest::Error| SourceError::Http {
            url: url.to_string(),
            source: e,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .gzip(true)
            .build()
            .map_err(http_err)?;

        info!(url, "downloading spreadsheet export");
        let resp = client.get(url).send().map_err(http_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = resp.bytes().map_err(http_err)?;
        debug!(url, bytes = bytes.len(), "download complete");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn google_sheet_url() {
        assert_eq!(
            Location::google_sheet("abc", "42"),
            Location::Url("https://docs.google.com/spreadsheets/d/abc/export?format=csv&gid=42".into())
        );
    }

    #[test]
    fn parse_location() {
        assert_eq!(
            Location::parse("HTTPS://example.com/x.csv"),
            Location::Url("HTTPS://example.com/x.csv".into())
        );
        assert_eq!(Location::parse("data/ot.csv"), Location::File("data/ot.csv".into()));
        assert_eq!(Location::parse("file:///tmp/ot.csv"), Location::File("/tmp/ot.csv".into()));
    }

    #[test]
    fn missing_file_reports_path() {
        let source = SheetSource::new("ot_master", Location::File("/definitely/not/here.csv".into()));
        let err = Fetcher::new().fetch(&source).unwrap_err();
        match err {
            SourceError::Io { path, .. } => assert_eq!(path, Path::new("/definitely/not/here.csv")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cached_url_is_served_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path(), Duration::from_secs(600));
        // Unroutable URL: only the cache can answer
        let source = SheetSource::new("ot_master", Location::Url("http://127.0.0.1:9/ot.csv".into()));
        cache.put(&source.cache_key(), b"ot\n7\n").unwrap();

        let fetcher = Fetcher::new().with_cache(cache);
        assert_eq!(fetcher.fetch(&source).unwrap(), b"ot\n7\n".to_vec());
    }

    #[test]
    fn same_name_other_location_misses_cache() {
        let sheet_a = SheetSource::new("ot_master", Location::Url("http://127.0.0.1:9/a.csv".into()));
        let sheet_b = SheetSource::new("ot_master", Location::Url("http://127.0.0.1:9/b.csv".into()));
        assert_ne!(sheet_a.cache_key(), sheet_b.cache_key());
        assert_eq!(sheet_a.cache_key(), sheet_a.clone().cache_key());
        assert!(sheet_a.cache_key().starts_with("ot_master-"));

        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path(), Duration::from_secs(600));
        cache.put(&sheet_a.cache_key(), b"ot\nFROM_SHEET_A\n").unwrap();

        let fetcher = Fetcher::new().timeout(Duration::from_secs(2)).with_cache(cache);
        // b is not cached and unreachable, so it must fail instead of serving a
        assert!(fetcher.fetch(&sheet_b).is_err());
        assert_eq!(fetcher.fetch(&sheet_a).unwrap(), b"ot\nFROM_SHEET_A\n".to_vec());
    }
}
