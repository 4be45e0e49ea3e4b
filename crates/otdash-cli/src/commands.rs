//! Command implementations
//!
//! Every command loads both tables, applies the filters and builds one
//! `DashboardReport`; they differ only in what they render.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use chrono::{Local, NaiveDateTime};
use tracing::{error, info};

use otdash_core::{DashboardReport, Dataset, FilterOptions, FilterSet, Renderer};
use otdash_render::{
    format_table, orders_csv, processes_csv, ChartRenderer, ExcelRenderer, JsonRenderer, PdfRenderer,
    SlideRenderer, TableKind, TableView, TextRenderer, ORDERS_CSV_FILE, PROCESSES_CSV_FILE,
};

use crate::config::Config;

/// Settings shared by all commands
pub struct Context {
    pub config: Config,
    pub now: NaiveDateTime,
    pub refresh: bool,
}

impl Context {
    pub fn new(config_path: Option<&Path>, as_of: Option<NaiveDateTime>, refresh: bool) -> Result<Self> {
        let config = Config::load(config_path)?;
        Ok(Self {
            config,
            now: as_of.unwrap_or_else(|| Local::now().naive_local()),
            refresh,
        })
    }

    fn load(&self) -> Result<Dataset> {
        self.config
            .data_source(self.refresh)
            .load()
            .context("failed to load production data")
    }

    fn report(&self, filters: &FilterSet) -> Result<DashboardReport> {
        let dataset = self.load()?;
        let filtered = filters.apply(&dataset);
        info!(
            orders = filtered.orders.len(),
            steps = filtered.processes.len(),
            "filters applied"
        );
        Ok(DashboardReport::build(
            self.config.company.as_str(),
            filtered,
            self.now,
            &self.config.policy,
        ))
    }
}

pub fn summary(ctx: &Context, filters: &FilterSet, json: bool) -> Result<()> {
    let report = ctx.report(filters)?;
    let out = if json {
        JsonRenderer::new().render(&report)?
    } else {
        TextRenderer::new().render(&report)?
    };
    println!("{}", out.trim_end());
    Ok(())
}

pub fn options(ctx: &Context, json: bool) -> Result<()> {
    let options = FilterOptions::from_dataset(&ctx.load()?);
    if json {
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }

    let list = |title: &str, values: &[String]| {
        println!("{title} ({}):", values.len());
        for v in values {
            println!("  {v}");
        }
    };
    list("Clientes", &options.clients);
    list("Estatus", &options.statuses);
    list("OTs", &options.work_orders);
    list("Empleados", &options.employees);
    match (options.first_delivery, options.last_delivery) {
        (Some(first), Some(last)) => println!("Fechas de entrega: {first} a {last}"),
        _ => println!("Fechas de entrega: sin datos"),
    }
    Ok(())
}

pub fn tables(ctx: &Context, filters: &FilterSet, kind: TableKind) -> Result<()> {
    let report = ctx.report(filters)?;
    print!("{}", format_table(&TableView::build(&report, kind)));
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

pub fn charts(ctx: &Context, filters: &FilterSet, out_dir: &Path) -> Result<()> {
    let report = ctx.report(filters)?;
    std::fs::create_dir_all(out_dir).with_context(|| format!("failed to create {}", out_dir.display()))?;

    let charts = ChartRenderer::new().render(&report)?;
    if charts.is_empty() {
        println!("No hay datos para graficar con los filtros actuales.");
    }
    for chart in charts {
        let path = out_dir.join(format!("{}.svg", chart.name));
        write_file(&path, chart.svg.as_bytes())?;
        println!("{}", path.display());
    }
    Ok(())
}

/// One export target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Export {
    Xlsx,
    Pdf,
    Slides,
    Csv,
}

impl Export {
    pub const ALL: [Export; 4] = [Export::Xlsx, Export::Pdf, Export::Slides, Export::Csv];

    fn name(self) -> &'static str {
        match self {
            Export::Xlsx => "Excel",
            Export::Pdf => "PDF",
            Export::Slides => "presentación",
            Export::Csv => "CSV",
        }
    }

    /// Render and write this export; returns the files written
    fn write(self, report: &DashboardReport, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let stem = report.file_stem();
        let files: Vec<(PathBuf, Vec<u8>)> = match self {
            Export::Xlsx => vec![(
                out_dir.join(format!("{stem}.xlsx")),
                ExcelRenderer::new().render(report)?,
            )],
            Export::Pdf => vec![(out_dir.join(format!("{stem}.pdf")), PdfRenderer::new().render(report)?)],
            Export::Slides => vec![(
                out_dir.join(format!("{stem}.html")),
                SlideRenderer::new().render(report)?.into_bytes(),
            )],
            Export::Csv => vec![
                (out_dir.join(ORDERS_CSV_FILE), orders_csv(report)?),
                (out_dir.join(PROCESSES_CSV_FILE), processes_csv(report)?),
            ],
        };
        for (path, bytes) in &files {
            write_file(path, bytes)?;
        }
        Ok(files.into_iter().map(|(path, _)| path).collect())
    }
}

/// Run every requested export; a failure is reported and the rest still run
pub fn export(ctx: &Context, filters: &FilterSet, formats: &[Export], out_dir: &Path) -> Result<()> {
    let report = ctx.report(filters)?;
    std::fs::create_dir_all(out_dir).with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut failed = Vec::new();
    for format in formats {
        match format.write(&report, out_dir) {
            Ok(paths) => {
                for path in paths {
                    println!("Archivo generado: {}", path.display());
                }
            }
            Err(e) => {
                error!(format = format.name(), error = %e, "export failed");
                eprintln!("Error al generar {}: {e:#}", format.name());
                failed.push(format.name());
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} export(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}
