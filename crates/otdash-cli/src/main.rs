//! otdash CLI - work-order production dashboard
//!
//! Loads the work-order and process exports, applies filters, and prints or
//! exports the dashboard.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use otdash_core::FilterSet;
use otdash_render::TableKind;

#[derive(Parser)]
#[command(name = "otdash")]
#[command(author, version, about = "Work-order production dashboard", long_about = None)]
struct Cli {
    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file
    #[arg(long, env = "OTDASH_CONFIG", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Reference time for delivery classification (default: now)
    #[arg(long, value_name = "DATE[TIME]", value_parser = parse_as_of, global = true)]
    as_of: Option<NaiveDateTime>,

    /// Ignore cached exports and download again
    #[arg(long, global = true)]
    refresh: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the headline metrics
    Summary {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the values available to each filter
    Options {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print a table of the filtered data
    Tables {
        #[command(flatten)]
        filters: FilterArgs,

        /// Table to print
        #[arg(short, long, value_enum, default_value = "orders")]
        which: TableArg,
    },

    /// Write the dashboard charts as SVG files
    Charts {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
    },

    /// Export reports and filtered tables
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Export format
        #[arg(short, long, value_enum, default_value = "all")]
        format: ExportFormat,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
    },
}

/// Dataset filters, applied in the order listed
#[derive(Args, Debug, Default, Clone)]
struct FilterArgs {
    /// Only orders of this client
    #[arg(long)]
    client: Option<String>,

    /// Only orders with this status
    #[arg(long)]
    status: Option<String>,

    /// Only this work order
    #[arg(long = "ot", value_name = "OT")]
    work_order: Option<String>,

    /// Only orders with a process step worked by this employee
    #[arg(long)]
    employee: Option<String>,

    /// First delivery date of the range (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", requires = "to")]
    from: Option<NaiveDate>,

    /// Last delivery date of the range (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", requires = "from")]
    to: Option<NaiveDate>,
}

impl FilterArgs {
    fn to_filter_set(&self) -> FilterSet {
        let mut filters = FilterSet::new();
        if let Some(client) = &self.client {
            filters = filters.client(client.as_str());
        }
        if let Some(status) = &self.status {
            filters = filters.status(status.as_str());
        }
        if let Some(ot) = &self.work_order {
            filters = filters.work_order(ot.as_str());
        }
        if let Some(employee) = &self.employee {
            filters = filters.employee(employee.as_str());
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            filters = filters.delivery_between(from, to);
        }
        filters
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TableArg {
    Orders,
    Processes,
    Overdue,
    DueSoon,
    Completed,
    Rework,
    Efficiency,
    Critical,
}

impl From<TableArg> for TableKind {
    fn from(arg: TableArg) -> Self {
        match arg {
            TableArg::Orders => TableKind::Orders,
            TableArg::Processes => TableKind::Processes,
            TableArg::Overdue => TableKind::Overdue,
            TableArg::DueSoon => TableKind::DueSoon,
            TableArg::Completed => TableKind::Completed,
            TableArg::Rework => TableKind::Rework,
            TableArg::Efficiency => TableKind::Efficiency,
            TableArg::Critical => TableKind::Critical,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Xlsx,
    Pdf,
    Slides,
    Csv,
    All,
}

/// `YYYY-MM-DD` (start of day) or `YYYY-MM-DD[T ]HH:MM[:SS]`
fn parse_as_of(s: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];
    let s = s.trim();
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| format!("invalid date '{s}', expected YYYY-MM-DD or YYYY-MM-DDTHH:MM"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let ctx = commands::Context::new(cli.config.as_deref(), cli.as_of, cli.refresh)?;

    match cli.command {
        Commands::Summary { filters, format } => {
            commands::summary(&ctx, &filters.to_filter_set(), format == OutputFormat::Json)
        }
        Commands::Options { format } => commands::options(&ctx, format == OutputFormat::Json),
        Commands::Tables { filters, which } => commands::tables(&ctx, &filters.to_filter_set(), which.into()),
        Commands::Charts { filters, out_dir } => commands::charts(&ctx, &filters.to_filter_set(), &out_dir),
        Commands::Export {
            filters,
            format,
            out_dir,
        } => {
            let formats: &[commands::Export] = match format {
                ExportFormat::Xlsx => &[commands::Export::Xlsx],
                ExportFormat::Pdf => &[commands::Export::Pdf],
                ExportFormat::Slides => &[commands::Export::Slides],
                ExportFormat::Csv => &[commands::Export::Csv],
                ExportFormat::All => &commands::Export::ALL,
            };
            commands::export(&ctx, &filters.to_filter_set(), formats, &out_dir)
        }
    }
}
