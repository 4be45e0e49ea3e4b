//! Terminal summary renderer

use std::fmt::Write;

use otdash_core::{DashboardReport, DeliveryState, RenderError, Renderer};

use crate::table::{format_datetime, TableView};

/// Plain text dashboard summary for console output
#[derive(Clone, Debug)]
pub struct TextRenderer {
    /// Include the critical-orders section
    pub show_critical: bool,
    /// Include the per-process hours section
    pub show_processes: bool,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            show_critical: true,
            show_processes: true,
        }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headline metrics only
    pub fn compact(mut self) -> Self {
        self.show_critical = false;
        self.show_processes = false;
        self
    }
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "-".repeat(title.chars().count()));
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, report: &DashboardReport) -> Result<String, RenderError> {
        let m = &report.metrics;
        let mut out = String::new();

        let _ = writeln!(out, "{}", report.title());
        let _ = writeln!(out, "Generado el: {}", report.generated_at.format("%d/%m/%Y %H:%M"));

        heading(&mut out, "Métricas Principales");
        let _ = writeln!(out, "Total OTs:        {}", m.total_orders);
        let _ = writeln!(out, "OTs en Proceso:   {}", m.in_process);
        let _ = writeln!(out, "OTs Facturadas:   {} ({:.1}%)", m.billed, m.billed_pct);
        let _ = writeln!(out, "Por Facturar:     {}", m.pending_billing);
        let _ = writeln!(out, "Reprocesos:       {} ({:.1}%)", m.rework, m.rework_pct);

        heading(&mut out, "Estado de Entregas");
        for row in &report.breakdowns.by_state {
            let _ = writeln!(out, "{:<16}  {}", row.label, row.count);
        }

        heading(&mut out, "Análisis de Horas");
        let h = &m.hours;
        let _ = writeln!(out, "OTs con horas:              {}", h.orders_with_hours);
        let _ = writeln!(out, "Horas Programadas Totales:  {:.1}h", h.scheduled_hours);
        let _ = writeln!(
            out,
            "Desviaciones Positivas:     {:.1}h ({:.1}%, {} OTs)",
            h.positive_hours, h.positive_pct, h.positive_orders
        );
        let _ = writeln!(
            out,
            "Desviaciones Negativas:     {:.1}h ({:.1}%, {} OTs)",
            h.negative_hours, h.negative_pct, h.negative_orders
        );

        if self.show_critical && !report.breakdowns.critical_orders.is_empty() {
            heading(&mut out, "OTs con Desviaciones Negativas");
            for line in crate::critical_order_lines(report) {
                let _ = writeln!(out, "  {line}");
            }
        }

        if self.show_processes && !report.breakdowns.top_process_hours.is_empty() {
            let totals = &report.breakdowns.process_totals;
            heading(&mut out, "Horas por Proceso");
            let _ = writeln!(
                out,
                "Estimadas {:.1}h, Reales {:.1}h, Diferencia {:+.1}h, Eficiencia {:.1}%",
                totals.estimated, totals.actual, totals.difference, totals.efficiency
            );
            for p in &report.breakdowns.top_process_hours {
                let _ = writeln!(out, "  {:<24} {:>8.1} {:>8.1}", p.process, p.estimated, p.actual);
            }
        }

        if let Some(next) = report
            .orders_in(DeliveryState::DueSoon)
            .filter_map(|o| o.delivery_date.map(|d| (d, &o.id)))
            .min()
        {
            let _ = writeln!(out);
            let _ = writeln!(out, "Próxima entrega: OT {} ({})", next.1, format_datetime(next.0));
        }

        Ok(out)
    }
}

/// Render a table with padded columns
pub fn format_table(view: &TableView) -> String {
    let cells: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect();

    let mut widths: Vec<usize> = view.headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |values: &[String]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{v:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", view.title);
    let _ = writeln!(out, "{}", line(&view.headers));
    let _ = writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
    );
    for row in &cells {
        let _ = writeln!(out, "{}", line(row));
    }
    if cells.is_empty() {
        let _ = writeln!(out, "(sin registros)");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, TableKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn summary_lists_headline_metrics() {
        let text = TextRenderer::new().render(&crate::tests::sample_report()).unwrap();
        assert!(text.starts_with("Reporte de Producción - Adimatec\n"));
        assert!(text.contains("Generado el: 10/03/2026 09:00"));
        assert!(text.contains("Total OTs:        3"));
        assert!(text.contains("OTs Facturadas:   1 (33.3%)"));
        assert!(text.contains("Vencida           1"));
        assert!(text.contains("OT 1001: 6.0h (Cliente: ACME)"));
        assert!(text.contains("Próxima entrega: OT 1003 (2026-03-12)"));
    }

    #[test]
    fn compact_summary_skips_detail_sections() {
        let text = TextRenderer::new().compact().render(&crate::tests::sample_report()).unwrap();
        assert!(!text.contains("OTs con Desviaciones Negativas"));
    }

    #[test]
    fn table_columns_are_padded() {
        let view = TableView {
            title: "T".into(),
            headers: vec!["ot".into(), "cliente".into()],
            rows: vec![vec![Cell::Text("1001".into()), Cell::Text("ACME".into())]],
        };
        assert_eq!(format_table(&view), "T\not    cliente\n----  -------\n1001  ACME\n");
    }

    #[test]
    fn empty_table_says_so() {
        let mut view = TableView::build(&crate::tests::sample_report(), TableKind::Critical);
        view.rows.clear();
        assert!(format_table(&view).ends_with("(sin registros)\n"));
    }
}
