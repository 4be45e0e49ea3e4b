//! Executive slide deck as a self-contained HTML page
//!
//! Slides, in order:
//! 1. Cover: "Reporte de Producción", company and date
//! 2. Métricas Principales, with the billing chart
//! 3. Análisis de Eficiencia, with the estimated vs actual hours chart
//! 4. OTs con Desviaciones Negativas (only when there are any)
//! 5. Recomendaciones y Acciones
//!
//! Arrow keys page through the deck; printing gives one slide per page.

use tracing::debug;

use otdash_core::{DashboardReport, RenderError, Renderer};

use crate::charts::ChartRenderer;
use crate::{critical_order_lines, efficiency_lines, main_metric_lines, RECOMMENDATIONS};

/// One slide of the deck
#[derive(Clone, Debug, PartialEq)]
pub struct Slide {
    pub title: String,
    pub subtitle: Option<String>,
    pub intro: Option<String>,
    pub bullets: Vec<String>,
    /// Inline SVG markup
    pub chart: Option<String>,
}

impl Slide {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            intro: None,
            bullets: Vec::new(),
            chart: None,
        }
    }

    fn bullets(mut self, bullets: Vec<String>) -> Self {
        self.bullets = bullets;
        self
    }

    fn to_html(&self, index: usize) -> String {
        let mut body = format!("      <h2>{}</h2>\n", html_escape(&self.title));
        if let Some(subtitle) = &self.subtitle {
            body.push_str(&format!("      <p class=\"subtitle\">{}</p>\n", html_escape(subtitle)));
        }
        if let Some(intro) = &self.intro {
            body.push_str(&format!("      <p>{}</p>\n", html_escape(intro)));
        }
        if !self.bullets.is_empty() {
            body.push_str("      <ul>\n");
            for bullet in &self.bullets {
                body.push_str(&format!("        <li>{}</li>\n", html_escape(bullet)));
            }
            body.push_str("      </ul>\n");
        }
        if let Some(chart) = &self.chart {
            body.push_str(&format!("      <div class=\"chart\">{chart}</div>\n"));
        }
        let class = if index == 0 { "slide cover" } else { "slide" };
        format!("    <section class=\"{class}\" id=\"slide-{}\">\n{body}    </section>\n", index + 1)
    }
}

/// HTML slide deck renderer
#[derive(Clone, Debug)]
pub struct SlideRenderer {
    /// Embed SVG charts in the metric slides
    pub include_charts: bool,
    pub accent_color: String,
}

impl Default for SlideRenderer {
    fn default() -> Self {
        Self {
            include_charts: true,
            accent_color: "#4472C4".into(),
        }
    }
}

impl SlideRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text-only slides
    pub fn without_charts(mut self) -> Self {
        self.include_charts = false;
        self
    }

    pub fn slides(&self, report: &DashboardReport) -> Vec<Slide> {
        let charts = if self.include_charts {
            ChartRenderer::new().render_all(report)
        } else {
            Vec::new()
        };
        let chart = |name: &str| charts.iter().find(|c| c.name == name).map(|c| c.svg.clone());

        let mut cover = Slide::new("Reporte de Producción");
        cover.subtitle = Some(format!(
            "{} - {}",
            report.company,
            report.generated_at.format("%d/%m/%Y")
        ));

        let mut metrics = Slide::new("Métricas Principales").bullets(main_metric_lines(report));
        metrics.chart = chart("facturacion");

        let mut efficiency = Slide::new("Análisis de Eficiencia").bullets(efficiency_lines(report));
        efficiency.chart = chart("horas_por_proceso");

        let mut slides = vec![cover, metrics, efficiency];

        let critical = critical_order_lines(report);
        if !critical.is_empty() {
            let mut slide = Slide::new("OTs con Desviaciones Negativas").bullets(critical);
            slide.intro = Some("Principales OTs con desviaciones:".into());
            slides.push(slide);
        }

        slides.push(
            Slide::new("Recomendaciones y Acciones")
                .bullets(RECOMMENDATIONS.iter().map(|r| r.to_string()).collect()),
        );
        slides
    }

    fn generate_css(&self) -> String {
        format!(
            r#"        :root {{ --accent: {accent}; }}
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{ font-family: system-ui, -apple-system, sans-serif; background: #1f2937; color: #2c3e50; }}
        .slide {{
            width: 960px; min-height: 540px; margin: 24px auto; padding: 48px 64px;
            background: #ffffff; border-top: 8px solid var(--accent);
            page-break-after: always; break-after: page;
        }}
        .slide h2 {{ font-size: 32px; color: var(--accent); margin-bottom: 24px; }}
        .slide ul {{ margin-left: 24px; font-size: 20px; line-height: 1.6; }}
        .slide p {{ font-size: 20px; margin-bottom: 12px; }}
        .cover {{ display: flex; flex-direction: column; justify-content: center; text-align: center; }}
        .cover h2 {{ font-size: 44px; }}
        .subtitle {{ color: #7f8c8d; }}
        .chart svg {{ max-width: 100%; height: auto; margin-top: 16px; }}
        @media print {{ body {{ background: none; }} .slide {{ margin: 0; }} }}"#,
            accent = self.accent_color,
        )
    }

    pub fn render_html(&self, report: &DashboardReport) -> String {
        let slides = self.slides(report);
        let sections: String = slides.iter().enumerate().map(|(i, s)| s.to_html(i)).collect();
        debug!(slides = slides.len(), "built slide deck");

        format!(
            r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
{css}
    </style>
</head>
<body>
{sections}    <script>
        let current = 0;
        const slides = document.querySelectorAll('.slide');
        document.addEventListener('keydown', (e) => {{
            if (e.key === 'ArrowRight' || e.key === 'PageDown') current = Math.min(current + 1, slides.length - 1);
            else if (e.key === 'ArrowLeft' || e.key === 'PageUp') current = Math.max(current - 1, 0);
            else return;
            slides[current].scrollIntoView({{ behavior: 'smooth' }});
        }});
    </script>
</body>
</html>
"#,
            title = html_escape(&report.title()),
            css = self.generate_css(),
            sections = sections,
        )
    }
}

impl Renderer for SlideRenderer {
    type Output = String;

    fn render(&self, report: &DashboardReport) -> Result<String, RenderError> {
        Ok(self.render_html(report))
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
