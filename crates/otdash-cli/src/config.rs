//! TOML configuration
//!
//! Every key is optional; a missing file section falls back to the
//! defaults of the production spreadsheet.
//!
//! ```toml
//! company = "Adimatec"
//! date_order = "day_first"
//!
//! [source]
//! sheet_id = "17eEYewfzoBZXkFWBm5DOJp3IuvHg9WvN"
//! orders_gid = "22353124"
//! processes_gid = "1564553976"
//! # orders = "exports/ot_master.csv"   # URL or path, overrides the gid
//! timeout_secs = 30
//!
//! [cache]
//! ttl_secs = 300
//!
//! [policy]
//! completed = ["FACTURADO", "OK", "OK NO ENTREGADO"]
//! due_soon_days = 7
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use otdash_core::StatusPolicy;
use otdash_source::{CsvCache, DataSource, DateOrder, Fetcher, Location, SheetSource};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Company shown in titles and report file names
    pub company: String,
    pub date_order: DateOrder,
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub policy: StatusPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            company: "Adimatec".into(),
            date_order: DateOrder::default(),
            source: SourceConfig::default(),
            cache: CacheConfig::default(),
            policy: StatusPolicy::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub sheet_id: String,
    pub orders_gid: String,
    pub processes_gid: String,
    /// URL or file path of the work-order export
    pub orders: Option<String>,
    /// URL or file path of the process-steps export
    pub processes: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            sheet_id: "17eEYewfzoBZXkFWBm5DOJp3IuvHg9WvN".into(),
            orders_gid: "22353124".into(),
            processes_gid: "1564553976".into(),
            orders: None,
            processes: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Defaults to `otdash` under the system temp directory
    pub dir: Option<PathBuf>,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            ttl_secs: 300,
        }
    }
}

impl Config {
    /// Load `path`, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("no config file, using defaults");
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config: Config = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate(path)?;
        config.resolve_relative_paths(path.parent().unwrap_or_else(|| Path::new(".")));
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.policy.due_soon_days < 0 {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                message: format!("policy.due_soon_days must not be negative, got {}", self.policy.due_soon_days),
            });
        }
        Ok(())
    }

    /// File locations in the config are relative to the config file
    fn resolve_relative_paths(&mut self, base: &Path) {
        let resolve = |value: &mut Option<String>| {
            if let Some(Location::File(p)) = value.as_deref().map(Location::parse) {
                if p.is_relative() {
                    *value = Some(base.join(p).display().to_string());
                }
            }
        };
        resolve(&mut self.source.orders);
        resolve(&mut self.source.processes);
        if let Some(dir) = &self.cache.dir {
            if dir.is_relative() {
                self.cache.dir = Some(base.join(dir));
            }
        }
    }

    fn location(&self, explicit: Option<&str>, gid: &str) -> Location {
        explicit.map_or_else(|| Location::google_sheet(&self.source.sheet_id, gid), Location::parse)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("otdash"))
    }

    /// The configured data source; `refresh` bypasses cached exports
    pub fn data_source(&self, refresh: bool) -> DataSource {
        let mut fetcher = Fetcher::new()
            .timeout(Duration::from_secs(self.source.timeout_secs))
            .refresh(refresh);
        if self.cache.enabled {
            fetcher = fetcher.with_cache(CsvCache::new(
                self.cache_dir(),
                Duration::from_secs(self.cache.ttl_secs),
            ));
        }
        DataSource::new(
            SheetSource::new(
                "ot_master",
                self.location(self.source.orders.as_deref(), &self.source.orders_gid),
            ),
            SheetSource::new(
                "procesos",
                self.location(self.source.processes.as_deref(), &self.source.processes_gid),
            ),
        )
        .date_order(self.date_order)
        .fetcher(fetcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_point_at_production_sheet() {
        let source = Config::default().data_source(false);
        assert_eq!(
            source.orders.location,
            Location::Url(
                "https://docs.google.com/spreadsheets/d/17eEYewfzoBZXkFWBm5DOJp3IuvHg9WvN/export?format=csv&gid=22353124"
                    .into()
            )
        );
        assert_eq!(source.processes.name, "procesos");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("otdash.toml");
        std::fs::write(
            &path,
            "company = \"Metalurgica\"\n\n[policy]\ndue_soon_days = 3\n\n[source]\norders = \"data/ot.csv\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.company, "Metalurgica");
        assert_eq!(config.policy.due_soon_days, 3);
        assert_eq!(config.policy.rework_marker, "GARANTIA");
        assert_eq!(config.cache.ttl_secs, 300);

        let source = config.data_source(false);
        assert_eq!(source.orders.location, Location::File(dir.path().join("data/ot.csv")));
    }

    #[test]
    fn unknown_date_order_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "date_order = \"sideways\"\n").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn negative_horizon_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("otdash.toml");
        std::fs::write(&path, "[policy]\ndue_soon_days = -1\n").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("due_soon_days must not be negative"));

        std::fs::write(&path, "[policy]\ndue_soon_days = 0\n").unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap().policy.due_soon_days, 0);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load(Some(Path::new("/no/such/otdash.toml"))).unwrap_err();
        assert!(err.to_string().starts_with("cannot read config /no/such/otdash.toml"));
    }
}
