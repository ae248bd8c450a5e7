use tracing::{debug, info};

use crate::aggregation::{self, Grouped, TOP_CITIES, TOP_ROUTES};
use crate::chart::{
    category_switch, feature_bars, metric_switch, series_by_category, BarMode, Callout,
    CategoryChart, ChartSpec, Feature, FeatureChart, LayoutOptions, Margin, MetricChart,
    MetricSet, SelectorPlacement, SeriesSplit,
};
use crate::error::DashError;
use crate::loader::RouteTable;
use crate::page::{Dashboard, Description, Section, SectionLayout};

pub const DASHBOARD_TITLE: &str = "Airline Features Analysis";

/// Run every view over the derived table and assemble the page sections in
/// their fixed order.
pub fn build_dashboard(table: &RouteTable) -> Result<Dashboard, DashError> {
    info!(rows = table.height(), "building dashboard views");

    let sections = vec![
        Section::single(fare_over_time(table)?, fare_over_time_text()),
        Section::single(passengers_over_time(table)?, passengers_over_time_text()),
        Section::single(top_routes(table)?, top_routes_text()),
        Section::single(city_level(table)?, city_level_text()),
        {
            let (pricing, volume) = carrier_features(table)?;
            Section {
                charts: vec![pricing, volume],
                layout: SectionLayout::SideBySide,
                description: carrier_features_text(),
            }
        },
    ];

    let dashboard = Dashboard::new(DASHBOARD_TITLE, sections);
    info!(charts = dashboard.charts().count(), "dashboard built");
    Ok(dashboard)
}

// ── 1 & 2: values over time, one carrier at a time ──────────────────────────

fn over_time(
    id: &str,
    grouped: Grouped,
    chart: CategoryChart,
) -> Result<ChartSpec, DashError> {
    let series = series_by_category(&grouped);
    debug!(view = id, carriers = series.len(), "category series split");
    category_switch(id, chart, series)
}

pub fn fare_over_time(table: &RouteTable) -> Result<ChartSpec, DashError> {
    over_time(
        "fare-over-time",
        aggregation::fare_by_period_carrier(table)?,
        CategoryChart {
            title: "Average Fare Over Time by Carrier".to_string(),
            title_prefix: "Average Fare Over Time for Carrier".to_string(),
            layout: LayoutOptions {
                x_axis_title: "Year".to_string(),
                y_axis_title: "Average Fare".to_string(),
                x_tick_angle: Some(-90),
                ..LayoutOptions::default()
            },
        },
    )
}

pub fn passengers_over_time(table: &RouteTable) -> Result<ChartSpec, DashError> {
    over_time(
        "passengers-over-time",
        aggregation::passengers_by_period_carrier(table)?,
        CategoryChart {
            title: "Average Passengers Over Time by Carrier".to_string(),
            title_prefix: "Average Passengers Over Time for Carrier".to_string(),
            layout: LayoutOptions {
                x_axis_title: "Year".to_string(),
                y_axis_title: "Average Passengers".to_string(),
                legend_title: Some("Carrier".to_string()),
                ..LayoutOptions::default()
            },
        },
    )
}

// ── 3: top routes ───────────────────────────────────────────────────────────

pub fn top_routes(table: &RouteTable) -> Result<ChartSpec, DashError> {
    let routes = aggregation::top_routes(table)?;
    debug!(
        by_passengers = routes.by_passengers.len(),
        by_fare = routes.by_fare.len(),
        "top routes ranked"
    );

    let sets = vec![
        MetricSet {
            label: "Passengers".to_string(),
            title: format!("Top {TOP_ROUTES} Routes by Passengers"),
            y_axis_title: "Passenger Volume".to_string(),
            trace_name: "Passengers".to_string(),
            hover_label: "Passengers".to_string(),
            groups: routes.by_passengers,
        },
        MetricSet {
            label: "Fare".to_string(),
            title: format!("Top {TOP_ROUTES} Routes by Average Fare"),
            y_axis_title: "Average Fare (USD)".to_string(),
            trace_name: "Average Fare".to_string(),
            hover_label: "Average Fare".to_string(),
            groups: routes.by_fare,
        },
    ];

    metric_switch(
        "top-routes",
        MetricChart {
            split: SeriesSplit::PerKey,
            key_label: "Route".to_string(),
            placement: SelectorPlacement::TopCenter,
            layout: LayoutOptions {
                x_axis_title: "Routes".to_string(),
                legend_title: Some("Routes".to_string()),
                bar_mode: Some(BarMode::Stack),
                plain_background: true,
                height: Some(600),
                width: Some(900),
                margin: Some(Margin {
                    top: 100,
                    bottom: 100,
                    left: 50,
                    right: 50,
                }),
                ..LayoutOptions::default()
            },
        },
        sets,
    )
}

// ── 5: city-level totals ────────────────────────────────────────────────────

pub fn city_level(table: &RouteTable) -> Result<ChartSpec, DashError> {
    let cities = aggregation::city_totals(table)?;

    let sets = vec![
        MetricSet {
            label: "Passenger Volume".to_string(),
            title: format!("Top {TOP_CITIES} Cities by Passenger Volume"),
            y_axis_title: "Passenger Volume".to_string(),
            trace_name: "Passenger Volume".to_string(),
            hover_label: "Passengers".to_string(),
            groups: cities.by_passengers,
        },
        MetricSet {
            label: "Revenue Contribution".to_string(),
            title: format!("Top {TOP_CITIES} Cities by Revenue Contribution"),
            y_axis_title: "Revenue (USD)".to_string(),
            trace_name: "Revenue Contribution".to_string(),
            hover_label: "Revenue".to_string(),
            groups: cities.by_revenue,
        },
    ];

    metric_switch(
        "city-level",
        MetricChart {
            split: SeriesSplit::Single,
            key_label: "City".to_string(),
            placement: SelectorPlacement::Default,
            layout: LayoutOptions {
                x_axis_title: "City".to_string(),
                ..LayoutOptions::default()
            },
        },
        sets,
    )
}

// ── 4: carrier features, paired charts ──────────────────────────────────────

fn feature(name: &str, color: &str, decimals: usize, groups: Grouped) -> Feature {
    Feature {
        name: name.to_string(),
        color: color.to_string(),
        decimals,
        groups,
    }
}

fn carrier_layout() -> LayoutOptions {
    LayoutOptions {
        x_axis_title: "Carrier".to_string(),
        y_axis_title: "Values".to_string(),
        legend_title: Some("Features".to_string()),
        plain_background: true,
        height: Some(400),
        width: Some(800),
        ..LayoutOptions::default()
    }
}

pub fn carrier_features(table: &RouteTable) -> Result<(ChartSpec, ChartSpec), DashError> {
    let features = aggregation::carrier_features(table)?;
    let [fare, share]: [Grouped; 2] = features
        .pricing
        .try_into()
        .map_err(|_| DashError::EmptyAggregation("carrier-pricing: feature set".to_string()))?;
    let [passengers, distance, low_fare]: [Grouped; 3] = features
        .volume
        .try_into()
        .map_err(|_| DashError::EmptyAggregation("carrier-volume: feature set".to_string()))?;

    let pricing = feature_bars(
        "carrier-pricing",
        FeatureChart {
            title: "Carrier-wise Fare and Market Share".to_string(),
            layout: carrier_layout(),
        },
        vec![
            feature("Average Fare", "#1f77b4", 2, fare),
            feature("Market Share", "#ff7f0e", 2, share),
        ],
        features.lowest_fare.as_ref().map(|low| {
            (
                low,
                Callout {
                    text: "Lowest average fare!".to_string(),
                    offset_x: 0,
                    offset_y: -50,
                },
            )
        }),
    )?;

    let volume = feature_bars(
        "carrier-volume",
        FeatureChart {
            title: "Carrier-wise Passengers, Distance, and Low Fare".to_string(),
            layout: carrier_layout(),
        },
        vec![
            feature("Passengers", "#2ca02c", 0, passengers),
            feature("Distance (nsmiles)", "#d62728", 0, distance),
            feature("Low Fare", "#9467bd", 0, low_fare),
        ],
        features.highest_passengers.as_ref().map(|high| {
            (
                high,
                Callout {
                    text: "Highest passenger volume!".to_string(),
                    offset_x: 50,
                    offset_y: -50,
                },
            )
        }),
    )?;

    Ok((pricing, volume))
}

// ── Section text ────────────────────────────────────────────────────────────

fn fare_over_time_text() -> Description {
    Description::new(
        "Fare Over Time",
        &[
            "Average fare trends for different carriers",
            "Dropdown menu allows easy comparison between carriers",
        ],
    )
}

fn passengers_over_time_text() -> Description {
    Description::new(
        "Passengers Over Time",
        &[
            "Track passenger numbers for different carriers across years",
            "All the carriers have seen their all time passenger low during the year 2020",
        ],
    )
}

fn top_routes_text() -> Description {
    Description::new(
        "Top Routes Analysis",
        &[
            "Compare top routes by passengers and average fare",
            "Switch between views using the dropdown menu",
        ],
    )
}

fn city_level_text() -> Description {
    Description::new(
        "City-Level Analysis",
        &[
            "Explore top cities by passenger volume and revenue contribution",
            "Toggle between views using the dropdown menu",
        ],
    )
}

fn carrier_features_text() -> Description {
    Description::new(
        "Carrier Comparison",
        &[
            "Left: Average Fare and Market Share by Carrier",
            "Right: Passengers, Distance, and Low Fare Metrics",
            "Annotations highlight key insights",
        ],
    )
}
