//! Excel workbook export
//!
//! Generates an XLSX file with up to four sheets:
//! - `OT_Master`: every column of the filtered order table plus
//!   `estado_entrega` and `es_reproceso`
//! - `Procesos`: the filtered process table (only when it has rows)
//! - `Resumen`: headline metrics as a Métrica / Valor table
//! - `OTs_Criticas`: every order over its hour estimate (only when any exist)
//!
//! ```text
//! Sheet: Resumen
//! | Métrica                   | Valor  |
//! |---------------------------|--------|
//! | Total OTs                 | 120    |
//! | % Facturación             | 41.7%  |
//! | Horas Programadas Totales | 812.5h |
//! ```

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::debug;

use otdash_core::{DashboardReport, RenderError, Renderer};

use crate::table::{Cell, TableKind, TableView};

pub const ORDERS_SHEET: &str = "OT_Master";
pub const PROCESSES_SHEET: &str = "Procesos";
pub const SUMMARY_SHEET: &str = "Resumen";
pub const CRITICAL_SHEET: &str = "OTs_Criticas";

/// Excel report renderer
#[derive(Clone, Debug)]
pub struct ExcelRenderer {
    /// Widest a column may be auto-sized to
    pub max_column_width: usize,
    /// Freeze the header row of data sheets
    pub freeze_header: bool,
}

impl Default for ExcelRenderer {
    fn default() -> Self {
        Self {
            max_column_width: 40,
            freeze_header: true,
        }
    }
}

struct ExcelFormats {
    header: Format,
    text: Format,
    number: Format,
    integer: Format,
    percent: Format,
    hours: Format,
}

impl ExcelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap auto-sized column widths
    pub fn max_column_width(mut self, width: usize) -> Self {
        self.max_column_width = width;
        self
    }

    /// Sheets the workbook for `report` will contain, in order
    pub fn sheet_names(report: &DashboardReport) -> Vec<&'static str> {
        let mut names = vec![ORDERS_SHEET];
        if !report.dataset.processes.is_empty() {
            names.push(PROCESSES_SHEET);
        }
        names.push(SUMMARY_SHEET);
        if !report.overrun_orders().is_empty() {
            names.push(CRITICAL_SHEET);
        }
        names
    }

    pub fn render_to_bytes(&self, report: &DashboardReport) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let formats = Self::create_formats();

        for name in Self::sheet_names(report) {
            let sheet = workbook.add_worksheet();
            sheet
                .set_name(name)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            match name {
                ORDERS_SHEET => self.write_table(sheet, &TableView::full_orders(report), &formats)?,
                PROCESSES_SHEET => self.write_table(sheet, &TableView::full_processes(report), &formats)?,
                CRITICAL_SHEET => {
                    self.write_table(sheet, &TableView::build(report, TableKind::Critical), &formats)?
                }
                _ => Self::write_summary(sheet, report, &formats)?,
            }
        }
        debug!(sheets = Self::sheet_names(report).len(), "built workbook");

        workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    fn create_formats() -> ExcelFormats {
        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(0x4472C4)
            .set_font_color(0xFFFFFF)
            .set_border(FormatBorder::Thin);

        let text = Format::new().set_border(FormatBorder::Thin);

        let number = Format::new()
            .set_num_format("#,##0.0")
            .set_border(FormatBorder::Thin);

        let integer = Format::new()
            .set_num_format("#,##0")
            .set_border(FormatBorder::Thin);

        let percent = Format::new()
            .set_num_format("0.0\"%\"")
            .set_border(FormatBorder::Thin);

        let hours = Format::new()
            .set_num_format("#,##0.0\"h\"")
            .set_border(FormatBorder::Thin);

        ExcelFormats {
            header,
            text,
            number,
            integer,
            percent,
            hours,
        }
    }

    fn write_table(&self, sheet: &mut Worksheet, view: &TableView, formats: &ExcelFormats) -> Result<(), RenderError> {
        let mut widths: Vec<usize> = view.headers.iter().map(|h| h.chars().count()).collect();

        for (col, header) in view.headers.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, header.as_str(), &formats.header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        for (i, row) in view.rows.iter().enumerate() {
            let r = (i + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                let c = col as u16;
                match cell {
                    Cell::Empty => continue,
                    Cell::Text(s) => match s.trim().parse::<f64>() {
                        // Numeric source text stays numeric in the sheet
                        Ok(n) if n.is_finite() => sheet.write_with_format(r, c, n, &formats.text),
                        _ => sheet.write_with_format(r, c, s.as_str(), &formats.text),
                    },
                    Cell::Number(n) => sheet.write_with_format(r, c, *n, &formats.number),
                    Cell::Percent(p) => sheet.write_with_format(r, c, *p, &formats.percent),
                    Cell::Bool(b) => sheet.write_with_format(r, c, *b, &formats.text),
                }
                .map_err(|e| RenderError::Format(e.to_string()))?;

                if let Some(w) = widths.get_mut(col) {
                    *w = (*w).max(cell.to_string().chars().count());
                }
            }
        }

        for (col, width) in widths.iter().enumerate() {
            let width = (*width).min(self.max_column_width) + 2;
            sheet.set_column_width(col as u16, width as f64).ok();
        }
        if self.freeze_header {
            sheet.set_freeze_panes(1, 0).ok();
        }
        Ok(())
    }

    fn write_summary(sheet: &mut Worksheet, report: &DashboardReport, formats: &ExcelFormats) -> Result<(), RenderError> {
        let m = &report.metrics;
        let rows: [(&str, f64, &Format); 10] = [
            ("Total OTs", m.total_orders as f64, &formats.integer),
            ("OTs Facturadas", m.billed as f64, &formats.integer),
            ("OTs en Proceso", m.in_process as f64, &formats.integer),
            ("OTs Vencidas", m.overdue as f64, &formats.integer),
            ("OTs por Vencer", m.due_soon as f64, &formats.integer),
            ("% Facturación", m.billed_pct, &formats.percent),
            ("% Reprocesos", m.rework_pct, &formats.percent),
            ("Horas Programadas Totales", m.hours.scheduled_hours, &formats.hours),
            ("Desviaciones Positivas", m.hours.positive_hours, &formats.hours),
            ("Desviaciones Negativas", m.hours.negative_hours, &formats.hours),
        ];

        sheet
            .write_with_format(0, 0, "Métrica", &formats.header)
            .map_err(|e| RenderError::Format(e.to_string()))?;
        sheet
            .write_with_format(0, 1, "Valor", &formats.header)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        for (i, (label, value, format)) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            sheet
                .write_with_format(r, 0, *label, &formats.text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_with_format(r, 1, *value, *format)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        let r = rows.len() as u32 + 2;
        sheet
            .write_with_format(r, 0, "Generado el", &formats.text)
            .map_err(|e| RenderError::Format(e.to_string()))?;
        sheet
            .write_with_format(
                r,
                1,
                report.generated_at.format("%d/%m/%Y %H:%M").to_string(),
                &formats.text,
            )
            .map_err(|e| RenderError::Format(e.to_string()))?;

        sheet.set_column_width(0, 28).ok();
        sheet.set_column_width(1, 18).ok();
        Ok(())
    }
}

impl Renderer for ExcelRenderer {
    type Output = Vec<u8>;

    fn render(&self, report: &DashboardReport) -> Result<Vec<u8>, RenderError> {
        self.render_to_bytes(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use otdash_core::{Dataset, ProcessStep, StatusPolicy, WorkOrder};
    use pretty_assertions::assert_eq;

    fn report(dataset: Dataset) -> DashboardReport {
        let now = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap().and_hms_opt(9, 0, 0).unwrap();
        DashboardReport::build("Adimatec", dataset, now, &StatusPolicy::default())
    }

    #[test]
    fn optional_sheets_follow_data() {
        let mut dataset = Dataset::default();
        dataset.orders.rows = vec![WorkOrder::new("1").hours(5.0, 4.0)];
        assert_eq!(ExcelRenderer::sheet_names(&report(dataset.clone())), vec!["OT_Master", "Resumen"]);

        dataset.orders.rows.push(WorkOrder::new("2").hours(5.0, 9.0));
        dataset.processes.rows = vec![ProcessStep::new("2").process("Corte")];
        assert_eq!(
            ExcelRenderer::sheet_names(&report(dataset)),
            vec!["OT_Master", "Procesos", "Resumen", "OTs_Criticas"]
        );
    }

    #[test]
    fn workbook_is_a_zip_archive() {
        let bytes = ExcelRenderer::new().render(&crate::tests::sample_report()).unwrap();
        assert!(bytes.len() > 1000);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn empty_report_still_renders() {
        let bytes = ExcelRenderer::new().render(&report(Dataset::default())).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
