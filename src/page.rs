/// Page composition: a self-contained HTML document.
///
/// Every chart's Plotly figure is embedded as inline JSON and drawn
/// client-side by dashboard.js once Plotly has loaded. The page carries no
/// data other than what was computed at startup.
use std::fmt::Write as FmtWrite;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chart::ChartSpec;
use crate::error::DashError;
use crate::figure;

const DASHBOARD_JS: &str = include_str!("dashboard.js");
const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

// ── Model ───────────────────────────────────────────────────────────────────

/// Heading plus bullet points shown under a section's charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Description {
    pub heading: String,
    pub bullets: Vec<String>,
}

impl Description {
    pub fn new(heading: &str, bullets: &[&str]) -> Self {
        Self {
            heading: heading.to_string(),
            bullets: bullets.iter().map(|b| b.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionLayout {
    /// Charts stacked full width.
    Single,
    /// Charts share one row, equal widths.
    SideBySide,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub charts: Vec<ChartSpec>,
    pub layout: SectionLayout,
    pub description: Description,
}

impl Section {
    pub fn single(chart: ChartSpec, description: Description) -> Self {
        Self {
            charts: vec![chart],
            layout: SectionLayout::Single,
            description,
        }
    }
}

/// Everything the server hands out, built once at startup.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub title: String,
    pub sections: Vec<Section>,
    pub built_at: DateTime<Utc>,
}

impl Dashboard {
    pub fn new(title: &str, sections: Vec<Section>) -> Self {
        Self {
            title: title.to_string(),
            sections,
            built_at: Utc::now(),
        }
    }

    /// All chart specs in page order.
    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        self.sections.iter().flat_map(|s| s.charts.iter())
    }
}

// ── HTML generation ─────────────────────────────────────────────────────────

pub fn render(dashboard: &Dashboard) -> Result<String, DashError> {
    let mut body = String::new();
    for section in &dashboard.sections {
        render_section(&mut body, section)?;
    }

    let html = format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <script src="{plotly}"></script>
  <style>
    body {{ font-family: sans-serif; margin: 0 auto; max-width: 1700px; padding: 8px 16px; color: #212529; }}
    h1 {{ text-align: center; }}
    .section {{ margin-bottom: 24px; }}
    .row {{ display: flex; width: 100%; }}
    .row > .chart {{ display: inline-block; width: 50%; }}
    .description h3 {{ margin-bottom: 4px; }}
    footer {{ color: #868e96; font-size: 11px; text-align: center; margin: 16px 0; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
{body}  <footer>Built {built_at}</footer>
<script>
{dashboard_js}
</script>
</body>
</html>
"##,
        title = escape_html(&dashboard.title),
        plotly = PLOTLY_CDN,
        body = body,
        built_at = dashboard.built_at.format("%Y-%m-%d %H:%M:%S UTC"),
        dashboard_js = DASHBOARD_JS,
    );

    Ok(html)
}

fn render_section(out: &mut String, section: &Section) -> Result<(), DashError> {
    out.push_str("  <div class=\"section\">\n");

    let side_by_side = section.layout == SectionLayout::SideBySide;
    if side_by_side {
        out.push_str("    <div class=\"row\">\n");
    }
    for chart in &section.charts {
        let figure_json = script_safe(&serde_json::to_string(&figure::figure(chart))?);
        let id = escape_html(&chart.id);
        writeln!(out, r#"    <div class="chart" id="{id}"></div>"#)?;
        writeln!(
            out,
            r#"    <script type="application/json" data-chart="{id}">{figure_json}</script>"#
        )?;
    }
    if side_by_side {
        out.push_str("    </div>\n");
    }

    let d = &section.description;
    writeln!(
        out,
        "    <div class=\"description\">\n      <h3>{}</h3>\n      <ul>",
        escape_html(&d.heading)
    )?;
    for bullet in &d.bullets {
        writeln!(out, "        <li>{}</li>", escape_html(bullet))?;
    }
    out.push_str("      </ul>\n    </div>\n  </div>\n");
    Ok(())
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// JSON inside a script element must not close the element early.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{LayoutOptions, SelectorPlacement, Trace, TraceKind};

    fn chart(id: &str, name: &str) -> ChartSpec {
        ChartSpec {
            id: id.to_string(),
            title: "T".to_string(),
            traces: vec![Trace {
                name: name.to_string(),
                kind: TraceKind::Bar,
                x: vec!["a".to_string()],
                y: vec![1.0],
                visible: true,
                text: None,
                color: None,
                hover_template: None,
            }],
            selector: None,
            selector_placement: SelectorPlacement::Default,
            annotations: Vec::new(),
            layout: LayoutOptions::default(),
        }
    }

    #[test]
    fn renders_sections_in_order() {
        let dashboard = Dashboard::new(
            "Airline Features Analysis",
            vec![
                Section::single(chart("first", "a"), Description::new("One", &["x"])),
                Section {
                    charts: vec![chart("left", "b"), chart("right", "c")],
                    layout: SectionLayout::SideBySide,
                    description: Description::new("Two", &["y", "z"]),
                },
            ],
        );
        let html = render(&dashboard).unwrap();
        assert!(html.contains("<h1>Airline Features Analysis</h1>"));
        let first = html.find("id=\"first\"").unwrap();
        let left = html.find("id=\"left\"").unwrap();
        let right = html.find("id=\"right\"").unwrap();
        assert!(first < left && left < right);
        assert!(html.contains(
            "    <div class=\"chart\" id=\"left\"></div>\n    <script type=\"application/json\" data-chart=\"left\">"
        ));
        assert!(html.contains("<div class=\"row\">"));
        assert!(html.contains("<li>z</li>"));
        assert_eq!(dashboard.charts().count(), 3);
    }

    #[test]
    fn escapes_text_and_embedded_json() {
        let dashboard = Dashboard::new(
            "A & B",
            vec![Section::single(
                chart("c", "</script><b>"),
                Description::new("<h>", &["\"quoted\""]),
            )],
        );
        let html = render(&dashboard).unwrap();
        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains("<h3>&lt;h&gt;</h3>"));
        assert!(html.contains("&quot;quoted&quot;"));
        assert!(!html.contains("</script><b>"));
        assert!(html.contains("<\\/script><b>"));
    }
}
