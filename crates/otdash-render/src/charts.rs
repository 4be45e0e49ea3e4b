//! SVG dashboard charts
//!
//! Two primitives cover every chart of the dashboard:
//! - [`BarChart`]: vertical or horizontal, one or more series
//! - [`DonutChart`]: share of a whole, drawn with dashed circle strokes so a
//!   single 100% slice needs no special casing
//!
//! [`ChartRenderer`] turns a report into the named set of charts.

use svg::node::element::{Circle, Group, Line, Rectangle, Text};
use svg::Document;
use tracing::debug;

use otdash_core::{CountRow, DashboardReport, DeliveryState, RenderError, Renderer};

/// Qualitative palette used for categorical charts
pub const PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880", "#FF97FF",
    "#FECB52",
];

/// Shared chart geometry and typography
#[derive(Clone, Debug)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub padding: u32,
    pub title_height: u32,
    pub font_family: String,
    pub font_size: u32,
    pub text_color: String,
    pub grid_color: String,
    pub background_color: String,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 720,
            height: 400,
            padding: 20,
            title_height: 36,
            font_family: "system-ui, -apple-system, sans-serif".into(),
            font_size: 12,
            text_color: "#2c3e50".into(),
            grid_color: "#ecf0f1".into(),
            background_color: "#ffffff".into(),
        }
    }
}

impl ChartStyle {
    fn document(&self, title: &str) -> Document {
        let background = Rectangle::new()
            .set("width", self.width)
            .set("height", self.height)
            .set("fill", self.background_color.as_str());
        let heading = Text::new(title)
            .set("x", self.width / 2)
            .set("y", self.padding + 14)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size + 4)
            .set("font-weight", "bold")
            .set("fill", self.text_color.as_str())
            .set("text-anchor", "middle");
        Document::new()
            .set("viewBox", (0, 0, self.width, self.height))
            .set("width", self.width)
            .set("height", self.height)
            .add(background)
            .add(heading)
    }

    fn label(&self, content: impl Into<String>, x: f64, y: f64, anchor: &str) -> Text {
        Text::new(content.into())
            .set("x", x)
            .set("y", y)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size)
            .set("fill", self.text_color.as_str())
            .set("text-anchor", anchor)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

// ============================================================================
// Bar chart
// ============================================================================

/// One series of a bar chart
#[derive(Clone, Debug)]
pub struct BarSeries {
    pub name: String,
    pub color: String,
    pub values: Vec<f64>,
}

#[derive(Clone, Debug)]
pub struct BarChart {
    pub title: String,
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
    /// Per-category colors for single-series charts
    pub category_colors: Option<Vec<String>>,
    pub horizontal: bool,
    pub style: ChartStyle,
}

impl BarChart {
    pub fn new(title: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            title: title.into(),
            categories,
            series: Vec::new(),
            category_colors: None,
            horizontal: false,
            style: ChartStyle::default(),
        }
    }

    pub fn series(mut self, name: impl Into<String>, color: impl Into<String>, values: Vec<f64>) -> Self {
        self.series.push(BarSeries {
            name: name.into(),
            color: color.into(),
            values,
        });
        self
    }

    pub fn category_colors(mut self, colors: Vec<String>) -> Self {
        self.category_colors = Some(colors);
        self
    }

    pub fn horizontal(mut self) -> Self {
        self.horizontal = true;
        self
    }

    fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0_f64, f64::max)
    }

    fn bar_color(&self, series: usize, category: usize) -> &str {
        match &self.category_colors {
            Some(colors) if self.series.len() == 1 => colors
                .get(category)
                .map(String::as_str)
                .unwrap_or(self.series[series].color.as_str()),
            _ => self.series[series].color.as_str(),
        }
    }

    pub fn to_svg(&self) -> String {
        let style = &self.style;
        let mut doc = style.document(&self.title);
        let max = self.max_value().max(1.0) * 1.15;
        let n_cat = self.categories.len().max(1);
        let n_series = self.series.len().max(1);

        let legend_height = if self.series.len() > 1 { 24 } else { 0 };
        let top = f64::from(style.padding + style.title_height + legend_height);
        let bottom = f64::from(style.height - style.padding);
        let label_space = if self.horizontal { 150.0 } else { 0.0 };
        let axis_space = if self.horizontal { 0.0 } else { 40.0 };
        let left = f64::from(style.padding) + label_space;
        let right = f64::from(style.width - style.padding);
        let plot_bottom = bottom - axis_space;

        let mut bars = Group::new().set("class", "bars");
        let mut labels = Group::new().set("class", "labels");

        if self.horizontal {
            let band = (plot_bottom - top) / n_cat as f64;
            let bar_h = band * 0.7 / n_series as f64;
            for (ci, category) in self.categories.iter().enumerate() {
                let band_y = top + band * ci as f64;
                labels = labels.add(style.label(
                    truncate(category, 22),
                    left - 6.0,
                    band_y + band / 2.0 + 4.0,
                    "end",
                ));
                for (si, series) in self.series.iter().enumerate() {
                    let value = series.values.get(ci).copied().unwrap_or(0.0);
                    let w = (right - left - 40.0) * value / max;
                    let y = band_y + band * 0.15 + bar_h * si as f64;
                    bars = bars.add(
                        Rectangle::new()
                            .set("x", left)
                            .set("y", y)
                            .set("width", w.max(0.0))
                            .set("height", bar_h)
                            .set("fill", self.bar_color(si, ci)),
                    );
                    labels = labels.add(style.label(format_value(value), left + w + 4.0, y + bar_h / 2.0 + 4.0, "start"));
                }
            }
        } else {
            let band = (right - left) / n_cat as f64;
            let bar_w = band * 0.7 / n_series as f64;
            for (ci, category) in self.categories.iter().enumerate() {
                let band_x = left + band * ci as f64;
                labels = labels.add(style.label(
                    truncate(category, 16),
                    band_x + band / 2.0,
                    plot_bottom + 18.0,
                    "middle",
                ));
                for (si, series) in self.series.iter().enumerate() {
                    let value = series.values.get(ci).copied().unwrap_or(0.0);
                    let h = (plot_bottom - top) * value / max;
                    let x = band_x + band * 0.15 + bar_w * si as f64;
                    bars = bars.add(
                        Rectangle::new()
                            .set("x", x)
                            .set("y", plot_bottom - h)
                            .set("width", bar_w)
                            .set("height", h.max(0.0))
                            .set("fill", self.bar_color(si, ci)),
                    );
                    labels = labels.add(style.label(format_value(value), x + bar_w / 2.0, plot_bottom - h - 4.0, "middle"));
                }
            }
        }

        let axis = if self.horizontal {
            Line::new().set("x1", left).set("y1", top).set("x2", left).set("y2", plot_bottom)
        } else {
            Line::new().set("x1", left).set("y1", plot_bottom).set("x2", right).set("y2", plot_bottom)
        }
        .set("stroke", style.text_color.as_str())
        .set("stroke-width", 1);

        doc = doc.add(bars).add(axis).add(labels);

        if self.series.len() > 1 {
            let mut legend = Group::new().set("class", "legend");
            let y = f64::from(style.padding + style.title_height);
            for (i, series) in self.series.iter().enumerate() {
                let x = f64::from(style.padding) + 160.0 * i as f64;
                legend = legend
                    .add(
                        Rectangle::new()
                            .set("x", x)
                            .set("y", y)
                            .set("width", 12)
                            .set("height", 12)
                            .set("fill", series.color.as_str()),
                    )
                    .add(style.label(series.name.clone(), x + 18.0, y + 10.0, "start"));
            }
            doc = doc.add(legend);
        }

        doc.to_string()
    }
}

// ============================================================================
// Donut chart
// ============================================================================

#[derive(Clone, Debug)]
pub struct Slice {
    pub label: String,
    pub value: f64,
    pub color: String,
}

#[derive(Clone, Debug)]
pub struct DonutChart {
    pub title: String,
    pub slices: Vec<Slice>,
    pub style: ChartStyle,
}

impl DonutChart {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slices: Vec::new(),
            style: ChartStyle::default(),
        }
    }

    pub fn slice(mut self, label: impl Into<String>, value: f64, color: impl Into<String>) -> Self {
        self.slices.push(Slice {
            label: label.into(),
            value,
            color: color.into(),
        });
        self
    }

    pub fn total(&self) -> f64 {
        self.slices.iter().map(|s| s.value.max(0.0)).sum()
    }

    pub fn to_svg(&self) -> String {
        let style = &self.style;
        let mut doc = style.document(&self.title);

        let top = f64::from(style.padding + style.title_height);
        let avail = f64::from(style.height) - top - f64::from(style.padding);
        let radius = avail * 0.36;
        let ring = avail * 0.2;
        let cx = f64::from(style.padding) + avail / 2.0 + 10.0;
        let cy = top + avail / 2.0;
        let circumference = 2.0 * std::f64::consts::PI * radius;
        let total = self.total();

        let mut ring_group = Group::new()
            .set("class", "slices")
            .set("transform", format!("rotate(-90 {cx} {cy})"));
        let mut offset = 0.0;
        if total > 0.0 {
            for slice in &self.slices {
                let len = circumference * slice.value.max(0.0) / total;
                ring_group = ring_group.add(
                    Circle::new()
                        .set("cx", cx)
                        .set("cy", cy)
                        .set("r", radius)
                        .set("fill", "none")
                        .set("stroke", slice.color.as_str())
                        .set("stroke-width", ring)
                        .set("stroke-dasharray", format!("{len:.3} {:.3}", circumference - len))
                        .set("stroke-dashoffset", format!("{:.3}", -offset)),
                );
                offset += len;
            }
        } else {
            ring_group = ring_group.add(
                Circle::new()
                    .set("cx", cx)
                    .set("cy", cy)
                    .set("r", radius)
                    .set("fill", "none")
                    .set("stroke", style.grid_color.as_str())
                    .set("stroke-width", ring),
            );
        }

        let mut legend = Group::new().set("class", "legend");
        let legend_x = cx + radius + ring + 30.0;
        for (i, slice) in self.slices.iter().enumerate() {
            let y = top + 20.0 + 22.0 * i as f64;
            let pct = if total > 0.0 { slice.value / total * 100.0 } else { 0.0 };
            legend = legend
                .add(
                    Rectangle::new()
                        .set("x", legend_x)
                        .set("y", y - 10.0)
                        .set("width", 12)
                        .set("height", 12)
                        .set("fill", slice.color.as_str()),
                )
                .add(style.label(
                    format!("{} {} ({pct:.1}%)", truncate(&slice.label, 24), format_value(slice.value)),
                    legend_x + 18.0,
                    y,
                    "start",
                ));
        }

        doc = doc.add(ring_group).add(legend);
        doc.to_string()
    }
}

// ============================================================================
// Dashboard charts
// ============================================================================

/// A rendered chart and the file stem it is saved under
#[derive(Clone, Debug, PartialEq)]
pub struct Chart {
    pub name: &'static str,
    pub svg: String,
}

/// Renders the dashboard's chart set; charts without data are skipped
#[derive(Clone, Debug, Default)]
pub struct ChartRenderer {
    pub style: ChartStyle,
}

impl ChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overdue vs due-soon orders
    pub fn delivery_chart(&self, report: &DashboardReport) -> Option<Chart> {
        let states = [DeliveryState::Overdue, DeliveryState::DueSoon];
        let counts = [report.metrics.overdue, report.metrics.due_soon];
        let shown: Vec<(DeliveryState, usize)> =
            states.into_iter().zip(counts).filter(|(_, c)| *c > 0).collect();
        if shown.is_empty() {
            return None;
        }
        let mut chart = BarChart::new(
            "OTs Vencidas y Por Vencer (Solo OTs Activas)",
            shown.iter().map(|(s, _)| s.as_str().to_string()).collect(),
        )
        .series("OTs", "#FF4B4B", shown.iter().map(|(_, c)| *c as f64).collect())
        .category_colors(shown.iter().map(|(s, _)| s.color().to_string()).collect());
        chart.style = self.style.clone();
        Some(Chart {
            name: "estado_entregas",
            svg: chart.to_svg(),
        })
    }

    fn donut(&self, title: &str) -> DonutChart {
        let mut chart = DonutChart::new(title);
        chart.style = self.style.clone();
        chart
    }

    fn counts_bar(&self, title: &str, rows: &[CountRow], horizontal: bool) -> BarChart {
        let mut chart = BarChart::new(title, rows.iter().map(|r| r.label.clone()).collect())
            .series("OTs", PALETTE[0], rows.iter().map(|r| r.count as f64).collect())
            .category_colors(
                (0..rows.len()).map(|i| PALETTE[i % PALETTE.len()].to_string()).collect(),
            );
        if horizontal {
            chart = chart.horizontal();
        }
        chart.style = self.style.clone();
        chart
    }

    pub fn render_all(&self, report: &DashboardReport) -> Vec<Chart> {
        let m = &report.metrics;
        let b = &report.breakdowns;
        let mut charts = Vec::new();

        charts.extend(self.delivery_chart(report));

        if m.total_orders > 0 {
            charts.push(Chart {
                name: "facturacion",
                svg: self
                    .donut("Total de OTs vs Facturado")
                    .slice("Facturado", m.billed as f64, "#00CC96")
                    .slice("No Facturado", m.pending_billing as f64, "#EF553B")
                    .to_svg(),
            });
            charts.push(Chart {
                name: "reprocesos",
                svg: self
                    .donut("Distribución: OTs Normales vs Reprocesos")
                    .slice("Reprocesos", m.rework as f64, "#FFA15A")
                    .slice("OTs Normales", (m.total_orders - m.rework) as f64, "#636EFA")
                    .to_svg(),
            });
        }

        if !b.by_client.is_empty() {
            let mut donut = self.donut("Distribución de OTs por Cliente");
            for (i, row) in b.by_client.iter().enumerate() {
                donut = donut.slice(row.label.clone(), row.count as f64, PALETTE[i % PALETTE.len()]);
            }
            charts.push(Chart {
                name: "ots_por_cliente",
                svg: donut.to_svg(),
            });
        }

        if !b.by_status.is_empty() {
            charts.push(Chart {
                name: "ots_por_estatus",
                svg: self.counts_bar("OTs por Estado", &b.by_status, false).to_svg(),
            });
        }

        if !b.top_processes.is_empty() {
            charts.push(Chart {
                name: "procesos_frecuentes",
                svg: self
                    .counts_bar("Top 10 Procesos más Frecuentes", &b.top_processes, true)
                    .to_svg(),
            });
        }

        if !b.top_process_hours.is_empty() {
            let rows = &b.top_process_hours;
            let mut chart = BarChart::new(
                "Comparación: Horas Estimadas vs Reales por Proceso",
                rows.iter().map(|p| p.process.clone()).collect(),
            )
            .series("Horas Estimadas", "#1f77b4", rows.iter().map(|p| p.estimated).collect())
            .series("Horas Reales", "#ff7f0e", rows.iter().map(|p| p.actual).collect());
            chart.style = self.style.clone();
            charts.push(Chart {
                name: "horas_por_proceso",
                svg: chart.to_svg(),
            });
        }

        debug!(count = charts.len(), "rendered charts");
        charts
    }
}

impl Renderer for ChartRenderer {
    type Output = Vec<Chart>;

    fn render(&self, report: &DashboardReport) -> Result<Vec<Chart>, RenderError> {
        Ok(self.render_all(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use otdash_core::{Dataset, ProcessStep, StatusPolicy, WorkOrder};

    fn report() -> DashboardReport {
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        let mut dataset = Dataset::default();
        dataset.orders.rows = vec![
            WorkOrder::new("1").client("ACME").status("EN PROCESO").delivery(d(1)),
            WorkOrder::new("2").client("Globex").status("EN PROCESO").delivery(d(12)),
            WorkOrder::new("3").client("ACME").status("FACTURADO"),
        ];
        dataset.processes.rows = vec![
            ProcessStep::new("1").process("Corte").hours(2.0, 3.0),
            ProcessStep::new("2").process("Pintura").hours(1.0, 1.0),
        ];
        let now = d(10).and_hms_opt(8, 0, 0).unwrap();
        DashboardReport::build("Adimatec", dataset, now, &StatusPolicy::default())
    }

    #[test]
    fn renders_full_chart_set() {
        let charts = ChartRenderer::new().render(&report()).unwrap();
        let names: Vec<&str> = charts.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                "estado_entregas",
                "facturacion",
                "reprocesos",
                "ots_por_cliente",
                "ots_por_estatus",
                "procesos_frecuentes",
                "horas_por_proceso",
            ]
        );
        for chart in &charts {
            assert!(chart.svg.starts_with("<svg"), "{} is not svg", chart.name);
        }
    }

    #[test]
    fn delivery_chart_uses_state_labels_and_colors() {
        let chart = ChartRenderer::new().delivery_chart(&report()).unwrap();
        assert!(chart.svg.contains("Vencida"));
        assert!(chart.svg.contains("Por vencer"));
        assert!(chart.svg.contains("#FF4B4B"));
        assert!(chart.svg.contains("#FFA500"));
    }

    #[test]
    fn empty_report_has_no_charts() {
        let now = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let empty = DashboardReport::build("X", Dataset::default(), now, &StatusPolicy::default());
        assert!(ChartRenderer::new().render_all(&empty).is_empty());
    }

    #[test]
    fn donut_handles_zero_total() {
        let svg = DonutChart::new("Vacío").slice("A", 0.0, "#000000").to_svg();
        assert!(svg.contains("A 0 (0.0%)"));
    }

    #[test]
    fn long_labels_are_truncated() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
