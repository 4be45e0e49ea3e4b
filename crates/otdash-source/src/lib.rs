//! # otdash-source
//!
//! Loads the work-order master and process-steps tables from spreadsheet
//! CSV exports.
//!
//! This crate provides:
//! - `Fetcher`: HTTP (blocking `reqwest`) or local-file reads
//! - `CsvCache`: time-bounded on-disk cache of remote exports
//! - `decode`: header-driven CSV decoding with lenient date/number coercion
//! - `DataSource`: both tables in one call
//!
//! ## Example
//!
//! ```rust,ignore
//! use otdash_source::{DataSource, Fetcher, Location, SheetSource};
//!
//! let source = DataSource::new(
//!     SheetSource::new("ot_master", Location::google_sheet(sheet_id, "22353124")),
//!     SheetSource::new("procesos", Location::google_sheet(sheet_id, "1564553976")),
//! )
//! .fetcher(Fetcher::new());
//! let dataset = source.load()?;
//! ```

pub mod cache;
pub mod decode;
pub mod fetch;

pub use cache::CsvCache;
pub use decode::{decode_process_steps, decode_work_orders, parse_datetime, parse_number, DateOrder};
pub use fetch::{Fetcher, Location, SheetSource};

use std::path::PathBuf;

use otdash_core::Dataset;
use thiserror::Error;
use tracing::info;

/// Loading error
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP status {status} fetching {url}")]
    Status { url: String, status: u16 },

    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {table}: {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::Error,
    },

    #[error("Missing required column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    #[error("Cache error: {0}")]
    Cache(std::io::Error),
}

/// The two tables of the dashboard and how to get them
#[derive(Clone, Debug)]
pub struct DataSource {
    pub orders: SheetSource,
    pub processes: SheetSource,
    pub date_order: DateOrder,
    fetcher: Fetcher,
}

impl DataSource {
    pub fn new(orders: SheetSource, processes: SheetSource) -> Self {
        Self {
            orders,
            processes,
            date_order: DateOrder::default(),
            fetcher: Fetcher::default(),
        }
    }

    pub fn fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn date_order(mut self, order: DateOrder) -> Self {
        self.date_order = order;
        self
    }

    /// Fetch and decode both tables
    pub fn load(&self) -> Result<Dataset, SourceError> {
        let orders_csv = self.fetcher.fetch(&self.orders)?;
        let processes_csv = self.fetcher.fetch(&self.processes)?;

        let orders = decode_work_orders(&orders_csv, self.date_order)?;
        let processes = decode_process_steps(&processes_csv, self.date_order)?;

        info!(
            orders = orders.len(),
            steps = processes.len(),
            "loaded production data"
        );
        Ok(Dataset::new(orders, processes))
    }
}
