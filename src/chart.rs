//! Chart specifications.
//!
//! A `ChartSpec` is everything the page needs to draw one interactive chart:
//! the traces, the dropdown selector with every alternative view precomputed,
//! annotations and layout options. Nothing is recomputed when the viewer
//! switches the dropdown; the browser only swaps data already embedded here.

use serde::Serialize;

use crate::aggregation::{Extremum, Grouped};
use crate::error::DashError;

/// Default qualitative palette, used for per-route bar colours.
pub const PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub kind: TraceKind,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover_template: Option<String>,
}

impl Trace {
    fn new(name: impl Into<String>, kind: TraceKind, x: Vec<String>, y: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            kind,
            x,
            y,
            visible: true,
            text: None,
            color: None,
            hover_template: None,
        }
    }
}

/// Replaces the single visible series and the title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryOption {
    pub label: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub title: String,
}

/// Shows one metric set of traces and hides the rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricOption {
    pub label: String,
    pub title: String,
    pub y_axis_title: String,
    pub visible: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum Selector {
    Category(Vec<CategoryOption>),
    Metric(Vec<MetricOption>),
}

/// Where the dropdown sits relative to the plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorPlacement {
    /// Centred above the plot area.
    TopCenter,
    /// The renderer's default corner.
    Default,
}

/// Fixed label pointing at one bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub x: String,
    pub y: f64,
    pub text: String,
    /// Text offset from the anchor in pixels; the arrow spans the gap.
    pub offset_x: i32,
    pub offset_y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarMode {
    Group,
    Stack,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutOptions {
    pub x_axis_title: String,
    pub y_axis_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_tick_angle: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_mode: Option<BarMode>,
    /// White plot area with light grid lines.
    pub plain_background: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub traces: Vec<Trace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<Selector>,
    pub selector_placement: SelectorPlacement,
    pub annotations: Vec<Annotation>,
    pub layout: LayoutOptions,
}

impl ChartSpec {
    pub fn visible_traces(&self) -> impl Iterator<Item = &Trace> {
        self.traces.iter().filter(|t| t.visible)
    }
}

// ── Category switch ─────────────────────────────────────────────────────────

/// One category's series, e.g. a carrier's average fare per period.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySeries {
    pub category: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

/// Split a two-key aggregation (x key, category key) into one series per
/// category. Categories keep the order they first appear in `grouped`.
pub fn series_by_category(grouped: &Grouped) -> Vec<CategorySeries> {
    grouped
        .distinct_key(1)
        .into_iter()
        .map(|category| {
            let (x, y) = grouped
                .rows
                .iter()
                .filter(|r| r.key.get(1) == Some(&category))
                .map(|r| (r.key[0].clone(), r.value))
                .unzip();
            CategorySeries { category, x, y }
        })
        .collect()
}

/// Labels for a category-switch chart.
#[derive(Debug, Clone)]
pub struct CategoryChart {
    pub title: String,
    /// Option titles read `"{title_prefix}: {category}"`.
    pub title_prefix: String,
    pub layout: LayoutOptions,
}

/// One line at a time; the dropdown swaps in another category's series.
pub fn category_switch(
    id: &str,
    chart: CategoryChart,
    series: Vec<CategorySeries>,
) -> Result<ChartSpec, DashError> {
    let first = series.first().ok_or_else(|| {
        DashError::EmptyAggregation(format!("{id}: no categories to chart"))
    })?;

    let trace = Trace::new(
        first.category.clone(),
        TraceKind::Line,
        first.x.clone(),
        first.y.clone(),
    );

    let options = series
        .iter()
        .map(|s| CategoryOption {
            label: s.category.clone(),
            x: s.x.clone(),
            y: s.y.clone(),
            title: format!("{}: {}", chart.title_prefix, s.category),
        })
        .collect();

    Ok(ChartSpec {
        id: id.to_string(),
        title: chart.title,
        traces: vec![trace],
        selector: Some(Selector::Category(options)),
        selector_placement: SelectorPlacement::TopCenter,
        annotations: Vec::new(),
        layout: chart.layout,
    })
}

// ── Metric switch ───────────────────────────────────────────────────────────

/// How a metric set turns into traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesSplit {
    /// One bar per group, each its own trace coloured from `PALETTE`.
    PerKey,
    /// The whole metric as a single trace.
    Single,
}

/// One selectable metric: the ranked groups plus its labels.
#[derive(Debug, Clone)]
pub struct MetricSet {
    pub label: String,
    pub title: String,
    pub y_axis_title: String,
    /// Trace name used with `SeriesSplit::Single`.
    pub trace_name: String,
    /// Metric name shown in per-key hover text.
    pub hover_label: String,
    pub groups: Grouped,
}

#[derive(Debug, Clone)]
pub struct MetricChart {
    pub split: SeriesSplit,
    /// What a group key is, for hover text ("Route", "City").
    pub key_label: String,
    pub placement: SelectorPlacement,
    pub layout: LayoutOptions,
}

fn metric_traces(set: &MetricSet, chart: &MetricChart, visible: bool) -> Vec<Trace> {
    match chart.split {
        SeriesSplit::PerKey => set
            .groups
            .rows
            .iter()
            .enumerate()
            .map(|(rank, row)| {
                let label = row.label().to_string();
                let mut trace = Trace::new(
                    label.clone(),
                    TraceKind::Bar,
                    vec![label.clone()],
                    vec![row.value],
                );
                trace.visible = visible;
                trace.color = Some(PALETTE[rank % PALETTE.len()].to_string());
                trace.hover_template = Some(format!(
                    "{}: {label}<br>{}: %{{y}}<extra></extra>",
                    chart.key_label, set.hover_label
                ));
                trace
            })
            .collect(),
        SeriesSplit::Single => {
            let (x, y) = set
                .groups
                .rows
                .iter()
                .map(|r| (r.label().to_string(), r.value))
                .unzip();
            let mut trace = Trace::new(set.trace_name.clone(), TraceKind::Bar, x, y);
            trace.visible = visible;
            vec![trace]
        }
    }
}

/// All metric sets drawn at once, only the first visible; the dropdown
/// flips which set is shown and relabels the y axis.
pub fn metric_switch(
    id: &str,
    chart: MetricChart,
    sets: Vec<MetricSet>,
) -> Result<ChartSpec, DashError> {
    let first = sets
        .first()
        .ok_or_else(|| DashError::EmptyAggregation(format!("{id}: no metrics to chart")))?;
    if let Some(empty) = sets.iter().find(|s| s.groups.is_empty()) {
        return Err(DashError::EmptyAggregation(format!(
            "{id}: no groups for '{}'",
            empty.label
        )));
    }

    let per_set: Vec<Vec<Trace>> = sets
        .iter()
        .enumerate()
        .map(|(i, set)| metric_traces(set, &chart, i == 0))
        .collect();

    let options = sets
        .iter()
        .enumerate()
        .map(|(i, set)| MetricOption {
            label: set.label.clone(),
            title: set.title.clone(),
            y_axis_title: set.y_axis_title.clone(),
            visible: per_set
                .iter()
                .enumerate()
                .flat_map(|(j, traces)| std::iter::repeat(i == j).take(traces.len()))
                .collect(),
        })
        .collect();

    let mut layout = chart.layout;
    layout.y_axis_title = first.y_axis_title.clone();

    Ok(ChartSpec {
        id: id.to_string(),
        title: first.title.clone(),
        traces: per_set.into_iter().flatten().collect(),
        selector: Some(Selector::Metric(options)),
        selector_placement: chart.placement,
        annotations: Vec::new(),
        layout,
    })
}

// ── Grouped feature bars ────────────────────────────────────────────────────

/// One feature drawn as its own bar series.
#[derive(Debug, Clone)]
pub struct Feature {
    pub name: String,
    pub color: String,
    /// Decimal places for the value labels above each bar.
    pub decimals: usize,
    pub groups: Grouped,
}

/// Fixed-text callout for an extremal carrier.
#[derive(Debug, Clone)]
pub struct Callout {
    pub text: String,
    pub offset_x: i32,
    pub offset_y: i32,
}

#[derive(Debug, Clone)]
pub struct FeatureChart {
    pub title: String,
    pub layout: LayoutOptions,
}

/// Side-by-side bars, one series per feature, plus an optional callout.
/// `value` rounded to `decimals` places, without trailing zeros: `99.5`, `120`.
fn bar_label(value: f64, decimals: usize) -> String {
    let fixed = format!("{value:.decimals$}");
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    }
}

pub fn feature_bars(
    id: &str,
    chart: FeatureChart,
    features: Vec<Feature>,
    highlight: Option<(&Extremum, Callout)>,
) -> Result<ChartSpec, DashError> {
    if features.is_empty() || features.iter().any(|f| f.groups.is_empty()) {
        return Err(DashError::EmptyAggregation(format!(
            "{id}: no carriers to chart"
        )));
    }

    let traces = features
        .into_iter()
        .map(|f| {
            let (x, y): (Vec<String>, Vec<f64>) = f
                .groups
                .rows
                .iter()
                .map(|r| (r.label().to_string(), r.value))
                .unzip();
            let text = y.iter().map(|v| bar_label(*v, f.decimals)).collect();
            let mut trace = Trace::new(f.name, TraceKind::Bar, x, y);
            trace.text = Some(text);
            trace.color = Some(f.color);
            trace
        })
        .collect();

    let annotations = highlight
        .map(|(extremum, callout)| Annotation {
            x: extremum.carrier.clone(),
            y: extremum.value,
            text: callout.text,
            offset_x: callout.offset_x,
            offset_y: callout.offset_y,
        })
        .into_iter()
        .collect();

    let mut layout = chart.layout;
    layout.bar_mode = Some(BarMode::Group);

    Ok(ChartSpec {
        id: id.to_string(),
        title: chart.title,
        traces,
        selector: None,
        selector_placement: SelectorPlacement::Default,
        annotations,
        layout,
    })
}
