//! PDF report export
//!
//! Writes a minimal PDF 1.4 document using the standard Helvetica fonts
//! (no embedding). Text is WinAnsi encoded; characters outside that
//! encoding print as `?`. Lines flow top to bottom and spill onto new
//! pages when the bottom margin is reached.

use std::fmt::Write as _;

use tracing::debug;

use otdash_core::{DashboardReport, RenderError, Renderer};

use crate::{critical_order_lines, efficiency_lines, main_metric_lines, RECOMMENDATIONS};

/// Text style of one laid-out line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Subtitle,
    Heading,
    Body,
}

impl LineStyle {
    fn font_size(self) -> f64 {
        match self {
            LineStyle::Title => 16.0,
            LineStyle::Heading => 14.0,
            LineStyle::Subtitle | LineStyle::Body => 12.0,
        }
    }

    fn bold(self) -> bool {
        matches!(self, LineStyle::Title | LineStyle::Heading)
    }

    fn centered(self) -> bool {
        matches!(self, LineStyle::Title | LineStyle::Subtitle)
    }
}

/// A positioned line of text
#[derive(Clone, Debug, PartialEq)]
pub struct PdfLine {
    pub style: LineStyle,
    pub text: String,
    pub y: f64,
}

/// PDF report renderer
#[derive(Clone, Debug)]
pub struct PdfRenderer {
    /// Page size in points (A4 by default)
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub line_height: f64,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            margin: 50.0,
            line_height: 18.0,
        }
    }
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set page size in points
    pub fn page_size(mut self, width: f64, height: f64) -> Self {
        self.page_width = width;
        self.page_height = height;
        self
    }

    /// Report content in reading order; `None` marks vertical space
    fn content(report: &DashboardReport) -> Vec<Option<(LineStyle, String)>> {
        let mut lines = vec![
            Some((LineStyle::Title, report.title())),
            None,
            Some((
                LineStyle::Subtitle,
                format!("Generado el: {}", report.generated_at.format("%d/%m/%Y %H:%M")),
            )),
            None,
        ];

        let mut section = |title: &str, items: Vec<String>| {
            lines.push(Some((LineStyle::Heading, title.to_string())));
            lines.extend(items.into_iter().map(|t| Some((LineStyle::Body, t))));
            lines.push(None);
        };

        section("Métricas Principales", main_metric_lines(report));
        section("Análisis de Eficiencia", efficiency_lines(report));
        let critical = critical_order_lines(report);
        if !critical.is_empty() {
            section("OTs con Desviaciones Negativas", critical);
        }
        section(
            "Recomendaciones",
            RECOMMENDATIONS.iter().map(|r| format!("• {r}")).collect(),
        );
        lines
    }

    /// Lay the report out into pages of positioned lines
    pub fn layout(&self, report: &DashboardReport) -> Vec<Vec<PdfLine>> {
        let top = self.page_height - self.margin;
        let mut pages = vec![Vec::new()];
        let mut y = top;

        for entry in Self::content(report) {
            let Some((style, text)) = entry else {
                y -= self.line_height / 2.0;
                continue;
            };
            let advance = self.line_height.max(style.font_size() * 1.3);
            if y - advance < self.margin && pages.last().is_some_and(|p| !p.is_empty()) {
                pages.push(Vec::new());
                y = top;
            }
            y -= advance;
            if let Some(page) = pages.last_mut() {
                page.push(PdfLine { style, text, y });
            }
        }
        pages
    }

    fn text_x(&self, line: &PdfLine) -> f64 {
        if line.style.centered() {
            // Helvetica averages about half an em per glyph
            let width = line.text.chars().count() as f64 * line.style.font_size() * 0.5;
            ((self.page_width - width) / 2.0).max(self.margin)
        } else {
            self.margin
        }
    }

    fn page_stream(&self, lines: &[PdfLine]) -> Vec<u8> {
        let mut stream = Vec::new();
        for line in lines {
            let font = if line.style.bold() { "F2" } else { "F1" };
            let mut op = String::new();
            let _ = write!(
                op,
                "BT /{font} {:.0} Tf {:.2} {:.2} Td (",
                line.style.font_size(),
                self.text_x(line),
                line.y
            );
            stream.extend_from_slice(op.as_bytes());
            stream.extend(encode_text(&line.text));
            stream.extend_from_slice(b") Tj ET\n");
        }
        stream
    }

    pub fn render_to_bytes(&self, report: &DashboardReport) -> Result<Vec<u8>, RenderError> {
        let pages = self.layout(report);
        if pages.iter().all(|p| p.is_empty()) {
            return Err(RenderError::InvalidData("nothing to print".into()));
        }

        // Objects: 1 catalog, 2 page tree, 3-4 fonts, then page/content pairs
        let page_ids: Vec<usize> = (0..pages.len()).map(|i| 5 + 2 * i).collect();
        let mut objects: Vec<Vec<u8>> = vec![
            b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                page_ids.iter().map(|id| format!("{id} 0 R")).collect::<Vec<_>>().join(" "),
                pages.len()
            )
            .into_bytes(),
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_vec(),
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
                .to_vec(),
        ];

        for (page, id) in pages.iter().zip(&page_ids) {
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                     /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                    self.page_width,
                    self.page_height,
                    id + 1
                )
                .into_bytes(),
            );
            let stream = self.page_stream(page);
            let mut content = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
            content.extend(stream);
            content.extend_from_slice(b"endstream");
            objects.push(content);
        }

        let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend(format!("{} 0 obj\n", i + 1).into_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_at = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in &offsets {
            let _ = write!(xref, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        );
        out.extend(xref.into_bytes());

        debug!(pages = pages.len(), bytes = out.len(), "built pdf");
        Ok(out)
    }
}

impl Renderer for PdfRenderer {
    type Output = Vec<u8>;

    fn render(&self, report: &DashboardReport) -> Result<Vec<u8>, RenderError> {
        self.render_to_bytes(report)
    }
}

/// WinAnsi-encode a string literal body, escaping delimiters
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '•' => out.push(0x95),
            '–' => out.push(0x96),
            '—' => out.push(0x97),
            '€' => out.push(0x80),
            c if (' '..='~').contains(&c) => out.push(c as u8),
            c if ('\u{A0}'..='\u{FF}').contains(&c) => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn encodes_latin1_and_escapes() {
        assert_eq!(encode_text("Análisis (1)"), b"An\xE1lisis \\(1\\)".to_vec());
        assert_eq!(encode_text("• ok"), b"\x95 ok".to_vec());
        assert_eq!(encode_text("✓"), b"?".to_vec());
    }

    #[test]
    fn document_structure() {
        let bytes = PdfRenderer::new().render(&crate::tests::sample_report()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));

        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 1"));
        assert!(text.contains("Recomendaciones"));
        assert!(text.contains("Total OTs: 3"));

        // startxref points at the xref table
        let start = text.rfind("startxref\n").unwrap() + "startxref\n".len();
        let offset: usize = text[start..].lines().next().unwrap().parse().unwrap();
        assert!(bytes[offset..].starts_with(b"xref"));
    }

    #[test]
    fn small_pages_paginate() {
        let renderer = PdfRenderer::new().page_size(300.0, 200.0);
        let report = crate::tests::sample_report();
        let pages = renderer.layout(&report);
        assert!(pages.len() > 1);
        for page in &pages {
            assert!(!page.is_empty());
            assert!(page.iter().all(|l| l.y >= renderer.margin));
        }

        let bytes = renderer.render(&report).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains(&format!("/Count {}", pages.len())));
    }

    #[test]
    fn layout_starts_with_title_and_date() {
        let pages = PdfRenderer::new().layout(&crate::tests::sample_report());
        assert_eq!(pages[0][0].text, "Reporte de Producción - Adimatec");
        assert_eq!(pages[0][1].text, "Generado el: 10/03/2026 09:00");
        assert_eq!(pages[0][1].style, LineStyle::Subtitle);
    }
}
