use polars::prelude::*;
use tracing::debug;

use crate::error::DashError;
use crate::loader::RouteTable;
use crate::schema::{derived, source};

/// Append the derived columns every view builds on:
///
/// - `period`: `"{Year} Q{quarter}"`
/// - `route`: `"{city1} to {city2}"`
/// - `revenue`: `passengers * fare`
///
/// A null in any input leaves the derived value null.
pub fn derive_fields(table: RouteTable) -> Result<RouteTable, DashError> {
    let df = table
        .into_frame()
        .lazy()
        .with_columns([
            concat_str(
                [
                    col(source::YEAR).cast(DataType::String),
                    lit(" Q"),
                    col(source::QUARTER).cast(DataType::String),
                ],
                "",
                false,
            )
            .alias(derived::PERIOD),
            concat_str(
                [
                    col(source::ORIGIN_CITY),
                    lit(" to "),
                    col(source::DEST_CITY),
                ],
                "",
                false,
            )
            .alias(derived::ROUTE),
            (col(source::PASSENGERS) * col(source::FARE)).alias(derived::REVENUE),
        ])
        .collect()?;

    debug!(
        columns = ?derived::ALL,
        rows = df.height(),
        null_periods = df.column(derived::PERIOD)?.null_count(),
        null_routes = df.column(derived::ROUTE)?.null_count(),
        "derived fields attached"
    );

    Ok(RouteTable::from_typed(df))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_csv_as_strings;

    fn derived_table(csv: &str) -> DataFrame {
        let raw = read_csv_as_strings(csv.as_bytes().to_vec()).unwrap();
        derive_fields(RouteTable::from_frame(raw).unwrap())
            .unwrap()
            .into_frame()
    }

    #[test]
    fn derives_period_route_and_revenue() {
        let df = derived_table(
            "Year,quarter,city1,city2,carrier_lg,fare,passengers,large_ms,nsmiles,fare_low\n\
             2020,1,Boston,Miami,WN,100.0,50,0.5,1250,80",
        );
        for name in derived::ALL {
            assert!(df.column(name).is_ok(), "missing derived column {name}");
        }
        let period = df.column(derived::PERIOD).unwrap().as_materialized_series();
        assert_eq!(period.str().unwrap().get(0), Some("2020 Q1"));
        let route = df.column(derived::ROUTE).unwrap().as_materialized_series();
        assert_eq!(route.str().unwrap().get(0), Some("Boston to Miami"));
        let revenue = df.column(derived::REVENUE).unwrap().as_materialized_series();
        assert_eq!(revenue.f64().unwrap().get(0), Some(5000.0));
    }

    #[test]
    fn null_inputs_give_null_derived_values() {
        let df = derived_table(
            "Year,quarter,city1,city2,carrier_lg,fare,passengers,large_ms,nsmiles,fare_low\n\
             2020,1,,Miami,WN,100.0,,0.5,1250,80",
        );
        assert_eq!(df.column(derived::ROUTE).unwrap().null_count(), 1);
        assert_eq!(df.column(derived::REVENUE).unwrap().null_count(), 1);
        assert_eq!(df.column(derived::PERIOD).unwrap().null_count(), 0);
    }
}
