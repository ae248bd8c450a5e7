use std::cmp::Ordering;

use polars::prelude::*;
use tracing::{debug, warn};

use crate::error::DashError;
use crate::loader::RouteTable;
use crate::schema::{derived, grouped, source};

/// How many routes the top-routes view keeps per metric.
pub const TOP_ROUTES: usize = 10;
/// How many origin cities the city-level view keeps per metric.
pub const TOP_CITIES: usize = 20;

/// Scalar reduction applied to each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduce {
    Mean,
    Sum,
}

impl Reduce {
    fn expr(self, column: &str) -> Expr {
        match self {
            Reduce::Mean => col(column).mean(),
            Reduce::Sum => col(column).sum(),
        }
    }
}

/// One group of an aggregation: key values in key-column order, the reduced
/// value and how many rows fed into it.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub key: Vec<String>,
    pub value: f64,
    pub count: u64,
}

impl GroupRow {
    /// Last key component, the one charts put on the x axis.
    pub fn label(&self) -> &str {
        self.key.last().map(String::as_str).unwrap_or("")
    }
}

/// Result of one grouped reduction.
///
/// Rows are in first-seen order unless produced by `sorted_by_key` or
/// `top_n`. Never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouped {
    pub keys: Vec<String>,
    pub value_column: String,
    pub reduce: Reduce,
    pub rows: Vec<GroupRow>,
    /// Rows dropped because a key or the value was null.
    pub excluded: usize,
}

impl Grouped {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows that contributed to any group.
    pub fn total_count(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }

    pub fn value_of(&self, key: &[&str]) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.key.iter().map(String::as_str).eq(key.iter().copied()))
            .map(|r| r.value)
    }

    /// Rows ordered by key, lexicographically component by component.
    pub fn sorted_by_key(&self) -> Grouped {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        self.with_rows(rows)
    }

    /// The `n` largest groups by value, descending. Ties keep their current
    /// relative order; fewer than `n` groups are returned as they are.
    pub fn top_n(&self, n: usize) -> Grouped {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| descending(a.value, b.value));
        rows.truncate(n);
        self.with_rows(rows)
    }

    /// First row holding the smallest value.
    pub fn min_by_value(&self) -> Option<&GroupRow> {
        self.rows.iter().fold(None, |best, row| match best {
            Some(b) if b.value <= row.value => Some(b),
            _ => Some(row),
        })
    }

    /// First row holding the largest value.
    pub fn max_by_value(&self) -> Option<&GroupRow> {
        self.rows.iter().fold(None, |best, row| match best {
            Some(b) if b.value >= row.value => Some(b),
            _ => Some(row),
        })
    }

    /// Distinct values of key component `index`, in row order.
    pub fn distinct_key(&self, index: usize) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for row in &self.rows {
            if let Some(k) = row.key.get(index) {
                if !seen.contains(k) {
                    seen.push(k.clone());
                }
            }
        }
        seen
    }

    fn with_rows(&self, rows: Vec<GroupRow>) -> Grouped {
        Grouped {
            keys: self.keys.clone(),
            value_column: self.value_column.clone(),
            reduce: self.reduce,
            rows,
            excluded: self.excluded,
        }
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

// ── Engine ──────────────────────────────────────────────────────────────────

/// Group `df` by `keys` and reduce `value` within each group.
///
/// Rows with a null in any key column, or a null or NaN `value`, are excluded
/// before grouping; the number dropped is reported on the result. Groups come out
/// in the order their first row appears.
pub fn aggregate(
    df: &DataFrame,
    keys: &[&str],
    value: &str,
    reduce: Reduce,
) -> Result<Grouped, DashError> {
    for &name in keys.iter().chain(std::iter::once(&value)) {
        if df.column(name).is_err() {
            return Err(DashError::missing_column(name));
        }
    }

    let present = col(value)
        .is_not_null()
        .and(col(value).cast(DataType::Float64).is_not_nan());
    let not_null = keys
        .iter()
        .fold(present, |acc, k| acc.and(col(*k).is_not_null()));

    let kept = df.clone().lazy().filter(not_null).collect()?;
    let excluded = df.height() - kept.height();
    if excluded > 0 {
        warn!(
            value,
            keys = ?keys,
            excluded,
            "rows with missing keys or values excluded from aggregation"
        );
    }

    let key_exprs: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
    let out = kept
        .lazy()
        .group_by_stable(key_exprs)
        .agg([
            reduce
                .expr(value)
                .cast(DataType::Float64)
                .alias(grouped::VALUE),
            len().cast(DataType::UInt64).alias(grouped::COUNT),
        ])
        .collect()?;

    let key_cols: Vec<&StringChunked> = keys
        .iter()
        .map(|k| out.column(k).and_then(|c| c.as_materialized_series().str()))
        .collect::<Result<_, _>>()?;
    let values = out.column(grouped::VALUE)?.as_materialized_series().f64()?;
    let counts = out.column(grouped::COUNT)?.as_materialized_series().u64()?;

    let mut rows = Vec::with_capacity(out.height());
    for i in 0..out.height() {
        let key = key_cols
            .iter()
            .map(|c| c.get(i).unwrap_or_default().to_string())
            .collect();
        rows.push(GroupRow {
            key,
            value: values.get(i).unwrap_or(f64::NAN),
            count: counts.get(i).unwrap_or(0),
        });
    }

    debug!(value, keys = ?keys, groups = rows.len(), excluded, "aggregated");

    Ok(Grouped {
        keys: keys.iter().map(|k| k.to_string()).collect(),
        value_column: value.to_string(),
        reduce,
        rows,
        excluded,
    })
}

// ── Views ───────────────────────────────────────────────────────────────────

/// Mean fare per (period, carrier), ordered by period then carrier.
pub fn fare_by_period_carrier(table: &RouteTable) -> Result<Grouped, DashError> {
    Ok(aggregate(
        table.frame(),
        &[derived::PERIOD, source::CARRIER],
        source::FARE,
        Reduce::Mean,
    )?
    .sorted_by_key())
}

/// Mean passengers per (period, carrier), ordered by period then carrier.
pub fn passengers_by_period_carrier(table: &RouteTable) -> Result<Grouped, DashError> {
    Ok(aggregate(
        table.frame(),
        &[derived::PERIOD, source::CARRIER],
        source::PASSENGERS,
        Reduce::Mean,
    )?
    .sorted_by_key())
}

/// The two independently ranked route lists.
#[derive(Debug, Clone)]
pub struct TopRoutes {
    pub by_passengers: Grouped,
    pub by_fare: Grouped,
}

pub fn top_routes(table: &RouteTable) -> Result<TopRoutes, DashError> {
    let df = table.frame();
    Ok(TopRoutes {
        by_passengers: aggregate(df, &[derived::ROUTE], source::PASSENGERS, Reduce::Sum)?
            .top_n(TOP_ROUTES),
        by_fare: aggregate(df, &[derived::ROUTE], source::FARE, Reduce::Mean)?
            .top_n(TOP_ROUTES),
    })
}

/// A carrier and the aggregate it stands out on.
#[derive(Debug, Clone, PartialEq)]
pub struct Extremum {
    pub carrier: String,
    pub value: f64,
}

impl From<&GroupRow> for Extremum {
    fn from(row: &GroupRow) -> Self {
        Extremum {
            carrier: row.label().to_string(),
            value: row.value,
        }
    }
}

/// Per-carrier feature means, split into the two side-by-side charts.
#[derive(Debug, Clone)]
pub struct CarrierFeatures {
    /// Means of `fare` and `large_ms`.
    pub pricing: Vec<Grouped>,
    /// Means of `passengers`, `nsmiles` and `fare_low`.
    pub volume: Vec<Grouped>,
    pub lowest_fare: Option<Extremum>,
    pub highest_passengers: Option<Extremum>,
}

pub const PRICING_FEATURES: [&str; 2] = [source::FARE, source::MARKET_SHARE];
pub const VOLUME_FEATURES: [&str; 3] = [source::PASSENGERS, source::DISTANCE, source::FARE_LOW];

pub fn carrier_features(table: &RouteTable) -> Result<CarrierFeatures, DashError> {
    let by_carrier = |feature: &str| -> Result<Grouped, DashError> {
        Ok(aggregate(table.frame(), &[source::CARRIER], feature, Reduce::Mean)?.sorted_by_key())
    };

    let pricing = PRICING_FEATURES
        .iter()
        .map(|f| by_carrier(f))
        .collect::<Result<Vec<_>, _>>()?;
    let volume = VOLUME_FEATURES
        .iter()
        .map(|f| by_carrier(f))
        .collect::<Result<Vec<_>, _>>()?;

    let lowest_fare = pricing[0].min_by_value().map(Extremum::from);
    let highest_passengers = volume[0].max_by_value().map(Extremum::from);

    Ok(CarrierFeatures {
        pricing,
        volume,
        lowest_fare,
        highest_passengers,
    })
}

/// Origin cities ranked by passenger volume and by revenue.
#[derive(Debug, Clone)]
pub struct CityTotals {
    pub by_passengers: Grouped,
    pub by_revenue: Grouped,
}

pub fn city_totals(table: &RouteTable) -> Result<CityTotals, DashError> {
    let df = table.frame();
    Ok(CityTotals {
        by_passengers: aggregate(df, &[source::ORIGIN_CITY], source::PASSENGERS, Reduce::Sum)?
            .top_n(TOP_CITIES),
        by_revenue: aggregate(df, &[source::ORIGIN_CITY], derived::REVENUE, Reduce::Sum)?
            .top_n(TOP_CITIES),
    })
}
