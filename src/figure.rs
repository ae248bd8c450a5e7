/// Plotly figure rendering.
///
/// Turns a `ChartSpec` into the `{data, layout}` object `Plotly.newPlot`
/// takes. Dropdowns become a single `updatemenus` entry whose buttons use
/// the `update` method, so switching is handled by Plotly itself.
use serde_json::{json, Map, Value};

use crate::chart::{
    Annotation, BarMode, ChartSpec, LayoutOptions, Selector, SelectorPlacement, Trace, TraceKind,
};

const GRID_COLOR: &str = "#EBF0F8";

pub fn figure(spec: &ChartSpec) -> Value {
    json!({
        "data": spec.traces.iter().map(trace).collect::<Vec<_>>(),
        "layout": layout(spec),
    })
}

fn trace(t: &Trace) -> Value {
    let mut out = Map::new();
    out.insert("name".into(), json!(t.name));
    out.insert("x".into(), json!(t.x));
    out.insert("y".into(), json!(t.y));
    out.insert("visible".into(), json!(t.visible));

    match t.kind {
        TraceKind::Line => {
            out.insert("type".into(), json!("scatter"));
            out.insert("mode".into(), json!("lines+markers"));
        }
        TraceKind::Bar => {
            out.insert("type".into(), json!("bar"));
        }
    }
    if let Some(text) = &t.text {
        out.insert("text".into(), json!(text));
        out.insert("textposition".into(), json!("outside"));
    }
    if let Some(color) = &t.color {
        out.insert("marker".into(), json!({ "color": color }));
    }
    if let Some(hover) = &t.hover_template {
        out.insert("hovertemplate".into(), json!(hover));
    }
    Value::Object(out)
}

fn titled(text: &str) -> Value {
    json!({ "title": { "text": text } })
}

fn layout(spec: &ChartSpec) -> Value {
    let opts: &LayoutOptions = &spec.layout;

    let mut xaxis = titled(&opts.x_axis_title);
    let mut yaxis = titled(&opts.y_axis_title);
    if let Some(angle) = opts.x_tick_angle {
        xaxis["tickangle"] = json!(angle);
    }

    let mut out = Map::new();
    out.insert("title".into(), json!({ "text": spec.title }));

    if opts.plain_background {
        out.insert("plot_bgcolor".into(), json!("white"));
        out.insert("paper_bgcolor".into(), json!("white"));
        xaxis["gridcolor"] = json!(GRID_COLOR);
        yaxis["gridcolor"] = json!(GRID_COLOR);
    }
    out.insert("xaxis".into(), xaxis);
    out.insert("yaxis".into(), yaxis);

    if let Some(legend) = &opts.legend_title {
        out.insert("legend".into(), titled(legend));
    }
    if let Some(mode) = opts.bar_mode {
        let mode = match mode {
            BarMode::Group => "group",
            BarMode::Stack => "stack",
        };
        out.insert("barmode".into(), json!(mode));
    }
    if let Some(height) = opts.height {
        out.insert("height".into(), json!(height));
    }
    if let Some(width) = opts.width {
        out.insert("width".into(), json!(width));
    }
    if let Some(m) = &opts.margin {
        out.insert(
            "margin".into(),
            json!({ "t": m.top, "b": m.bottom, "l": m.left, "r": m.right }),
        );
    }
    if let Some(selector) = &spec.selector {
        out.insert(
            "updatemenus".into(),
            json!([dropdown(selector, spec.selector_placement)]),
        );
    }
    if !spec.annotations.is_empty() {
        out.insert(
            "annotations".into(),
            json!(spec.annotations.iter().map(annotation).collect::<Vec<_>>()),
        );
    }
    Value::Object(out)
}

fn dropdown(selector: &Selector, placement: SelectorPlacement) -> Value {
    let buttons: Vec<Value> = match selector {
        Selector::Category(options) => options
            .iter()
            .map(|o| {
                json!({
                    "label": o.label,
                    "method": "update",
                    "args": [
                        { "x": [o.x], "y": [o.y], "type": "scatter" },
                        { "title": { "text": o.title } },
                    ],
                })
            })
            .collect(),
        Selector::Metric(options) => options
            .iter()
            .map(|o| {
                json!({
                    "label": o.label,
                    "method": "update",
                    "args": [
                        { "visible": o.visible },
                        {
                            "title": { "text": o.title },
                            "yaxis": { "title": { "text": o.y_axis_title } },
                        },
                    ],
                })
            })
            .collect(),
    };

    let mut menu = json!({
        "buttons": buttons,
        "direction": "down",
        "showactive": true,
    });
    if placement == SelectorPlacement::TopCenter {
        menu["x"] = json!(0.5);
        menu["xanchor"] = json!("center");
        menu["y"] = json!(1.15);
        menu["yanchor"] = json!("top");
    }
    menu
}

fn annotation(a: &Annotation) -> Value {
    json!({
        "x": a.x,
        "y": a.y,
        "text": a.text,
        "showarrow": true,
        "arrowhead": 2,
        "ax": a.offset_x,
        "ay": a.offset_y,
        "font": { "color": "black", "size": 12 },
        "arrowcolor": "black",
    })
}
