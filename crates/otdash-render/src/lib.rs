//! # otdash-render
//!
//! Rendering backends for otdash dashboard reports.
//!
//! This crate provides:
//! - Terminal text summary and JSON metrics
//! - SVG charts (bar and donut)
//! - Tabular views and CSV exports of the filtered tables
//! - Excel workbook export
//! - PDF report export
//! - Self-contained HTML slide deck
//!
//! ## Example
//!
//! ```rust,ignore
//! use otdash_core::{DashboardReport, Renderer};
//! use otdash_render::{ChartRenderer, ExcelRenderer, PdfRenderer, SlideRenderer, TextRenderer};
//!
//! // Terminal summary
//! println!("{}", TextRenderer::new().render(&report)?);
//!
//! // Excel workbook
//! let xlsx_bytes = ExcelRenderer::new().render(&report)?;
//! std::fs::write(format!("{}.xlsx", report.file_stem()), xlsx_bytes)?;
//!
//! // Charts, one SVG per chart
//! for chart in ChartRenderer::new().render(&report)? {
//!     std::fs::write(format!("{}.svg", chart.name), chart.svg)?;
//! }
//! ```

pub mod charts;
pub mod excel;
pub mod pdf;
pub mod slides;
pub mod table;
pub mod text;

pub use charts::{BarChart, Chart, ChartRenderer, ChartStyle, DonutChart};
pub use excel::ExcelRenderer;
pub use pdf::PdfRenderer;
pub use slides::SlideRenderer;
pub use table::{orders_csv, processes_csv, TableKind, TableView};
pub use text::{format_table, TextRenderer};

use chrono::NaiveDateTime;
use serde::Serialize;

use otdash_core::{Breakdowns, DashboardMetrics, DashboardReport, RenderError, Renderer};

/// File name of the filtered work-order CSV export
pub const ORDERS_CSV_FILE: &str = "ot_master_filtrado.csv";
/// File name of the filtered process-steps CSV export
pub const PROCESSES_CSV_FILE: &str = "procesos_filtrados.csv";

/// Closing recommendations of the PDF report and slide deck
pub const RECOMMENDATIONS: [&str; 5] = [
    "Enfocar recursos en OTs vencidas y por vencer",
    "Analizar causas de reprocesos",
    "Optimizar estimación de horas",
    "Revisar OTs con mayores desviaciones",
    "Mantener comunicación con clientes críticos",
];

// ============================================================================
// Report narrative
// ============================================================================

/// "Métricas Principales" lines shared by the document exports
pub fn main_metric_lines(report: &DashboardReport) -> Vec<String> {
    let m = &report.metrics;
    vec![
        format!("Total OTs: {}", m.total_orders),
        format!("OTs Facturadas: {} ({:.1}%)", m.billed, m.billed_pct),
        format!("OTs en Proceso: {}", m.in_process),
        format!("OTs Vencidas: {}", m.overdue),
        format!("OTs por Vencer: {}", m.due_soon),
        format!("Reprocesos: {} ({:.1}%)", m.rework, m.rework_pct),
    ]
}

/// "Análisis de Eficiencia" lines shared by the document exports
pub fn efficiency_lines(report: &DashboardReport) -> Vec<String> {
    let m = &report.metrics;
    vec![
        format!("Eficiencia de Facturación: {:.1}%", m.billed_pct),
        format!("Tasa de Reprocesos: {:.1}%", m.rework_pct),
        format!("Horas Programadas Totales: {:.1}h", m.hours.scheduled_hours),
        format!("Desviaciones Positivas: {:.1}%", m.hours.positive_pct),
        format!("Desviaciones Negativas: {:.1}%", m.hours.negative_pct),
    ]
}

/// One line per critical order, largest overrun first
pub fn critical_order_lines(report: &DashboardReport) -> Vec<String> {
    report
        .breakdowns
        .critical_orders
        .iter()
        .map(|c| {
            format!(
                "OT {}: {:.1}h (Cliente: {})",
                c.id,
                c.difference,
                c.client.as_deref().unwrap_or("N/A")
            )
        })
        .collect()
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Serialize)]
struct JsonReport<'a> {
    company: &'a str,
    generated_at: NaiveDateTime,
    metrics: &'a DashboardMetrics,
    breakdowns: &'a Breakdowns,
}

/// Metrics and breakdowns as pretty-printed JSON
#[derive(Clone, Debug, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for JsonRenderer {
    type Output = String;

    fn render(&self, report: &DashboardReport) -> Result<String, RenderError> {
        let doc = JsonReport {
            company: &report.company,
            generated_at: report.generated_at,
            metrics: &report.metrics,
            breakdowns: &report.breakdowns,
        };
        serde_json::to_string_pretty(&doc).map_err(|e| RenderError::Format(e.to_string()))
    }
}
