use std::fmt;
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::DashError;
use crate::schema::source;

/// Published spreadsheet export of the US domestic route fare dataset.
pub const DEFAULT_SOURCE_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vThoMrLbYM2Fxkps_AioTfF1NfklbLmSAcbs7mlEc_EWbwUZkOc0SShkvaZ8IkpiV_1VycEg9Mvm4vh/pub?gid=1286856073&single=true&output=csv";

const WHITESPACE: &str = " \t\r\n";

/// Cell values read as missing rather than as data.
const MISSING_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Where the route records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    Path(PathBuf),
}

impl Source {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Source::Url(raw.to_string())
        } else {
            Source::Path(PathBuf::from(raw))
        }
    }

    fn parquet_path(&self) -> Option<&Path> {
        match self {
            Source::Path(path)
                if path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet")) =>
            {
                Some(path.as_path())
            }
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Validated, typed route records.
///
/// Integer columns (`Year`, `quarter`) are Int64, numeric columns Float64 and
/// categorical columns whitespace-stripped strings. Extra columns are kept as
/// they were read.
#[derive(Debug, Clone)]
pub struct RouteTable {
    df: DataFrame,
}

impl RouteTable {
    /// Validate and type a raw frame.
    pub fn from_frame(raw: DataFrame) -> Result<Self, DashError> {
        require_columns(&raw, &source::ALL)?;
        check_parseable(&raw)?;
        let df = raw.lazy().with_columns(typed_columns()).collect()?;
        Ok(Self { df })
    }

    /// Wrap a frame that already went through validation and derivation.
    pub(crate) fn from_typed(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_frame(self) -> DataFrame {
        self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }
}

// ── Loading ─────────────────────────────────────────────────────────────────

/// Fetch, parse and type the route records. Single attempt, no retries.
pub fn load(source: &Source) -> Result<RouteTable, DashError> {
    info!(%source, "loading route records");

    let raw = match source.parquet_path() {
        Some(path) => read_parquet(path)?,
        None => read_csv_as_strings(fetch(source)?)?,
    };
    debug!(
        rows = raw.height(),
        columns = raw.width(),
        "raw table parsed"
    );

    let table = RouteTable::from_frame(raw)?;
    info!(rows = table.height(), "route records loaded");
    Ok(table)
}

fn fetch(source: &Source) -> Result<Vec<u8>, DashError> {
    match source {
        Source::Url(url) => {
            let response = reqwest::blocking::get(url.as_str())
                .map_err(|e| DashError::DataUnavailable(format!("{url}: {e}")))?;
            let status = response.status();
            if !status.is_success() {
                return Err(DashError::DataUnavailable(format!("{url}: HTTP {status}")));
            }
            let body = response
                .bytes()
                .map_err(|e| DashError::DataUnavailable(format!("{url}: {e}")))?;
            Ok(body.to_vec())
        }
        Source::Path(path) => std::fs::read(path)
            .map_err(|e| DashError::DataUnavailable(format!("{}: {e}", path.display()))),
    }
}

/// Parse CSV bytes into a DataFrame with all columns as String dtype.
/// Trims whitespace from column names.
pub fn read_csv_as_strings(bytes: Vec<u8>) -> Result<DataFrame, DashError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DashError::SchemaMismatch(
            "source is empty, expected a header row".to_string(),
        ));
    }

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

fn read_parquet(path: &Path) -> Result<DataFrame, DashError> {
    let file = File::open(path)
        .map_err(|e| DashError::DataUnavailable(format!("{}: {e}", path.display())))?;
    Ok(ParquetReader::new(file).finish()?)
}

// ── Validation & typing ─────────────────────────────────────────────────────

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), DashError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(DashError::missing_column(col_name));
        }
    }
    Ok(())
}

/// Column rendered as stripped text, whatever dtype it arrived with.
/// Missing-value tokens become null.
fn as_text(name: &str) -> Expr {
    let text = col(name)
        .cast(DataType::String)
        .str()
        .strip_chars(lit(WHITESPACE));
    let missing = MISSING_TOKENS
        .iter()
        .fold(lit(false), |acc, token| acc.or(text.clone().eq(lit(*token))));
    when(missing)
        .then(lit(NULL).cast(DataType::String))
        .otherwise(text)
}

fn as_float(name: &str) -> Expr {
    as_text(name).cast(DataType::Float64).fill_nan(lit(NULL))
}

fn typed(name: &str) -> Expr {
    if source::INTEGER.contains(&name) {
        // "2020" and "2020.0" both land on 2020
        as_float(name).cast(DataType::Int64)
    } else if source::NUMERIC.contains(&name) {
        as_float(name)
    } else {
        as_text(name)
    }
}

fn typed_columns() -> Vec<Expr> {
    source::ALL
        .iter()
        .map(|&name| typed(name).alias(name))
        .collect()
}

/// Count present values of `name` that do not parse as numbers, or, in
/// integer columns, carry a fractional part.
fn invalid_count(name: &str) -> Expr {
    let present = as_text(name).neq(lit(""));
    let unparsed = as_text(name).cast(DataType::Float64).is_null();
    let invalid = if source::INTEGER.contains(&name) {
        let float = as_float(name);
        let truncated = float.clone().cast(DataType::Int64).cast(DataType::Float64);
        // out-of-range values fail the Int64 cast and compare as null
        unparsed.or(float.neq(truncated).fill_null(lit(true)))
    } else {
        unparsed
    };
    present
        .and(invalid)
        .cast(DataType::UInt64)
        .sum()
        .alias(name)
}

/// Reject present values that do not parse in integer/numeric columns.
/// A plain cast would silently turn them into nulls or truncate them.
fn check_parseable(raw: &DataFrame) -> Result<(), DashError> {
    let checks: Vec<Expr> = source::INTEGER
        .iter()
        .chain(source::NUMERIC.iter())
        .map(|&name| invalid_count(name))
        .collect();

    let counts = raw.clone().lazy().select(checks).collect()?;

    for name in source::INTEGER.iter().chain(source::NUMERIC.iter()) {
        let bad = counts
            .column(name)?
            .as_materialized_series()
            .u64()?
            .get(0)
            .unwrap_or(0);
        if bad > 0 {
            let expected = if source::INTEGER.contains(name) {
                "whole numbers"
            } else {
                "numbers"
            };
            return Err(DashError::SchemaMismatch(format!(
                "column '{name}' has {bad} value(s) that are not {expected}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Year,quarter,city1,city2,carrier_lg,fare,passengers,large_ms,nsmiles,fare_low";

    fn table(rows: &[&str]) -> Result<RouteTable, DashError> {
        let mut csv = String::from(HEADER);
        for row in rows {
            csv.push('\n');
            csv.push_str(row);
        }
        RouteTable::from_frame(read_csv_as_strings(csv.into_bytes())?)
    }

    #[test]
    fn source_parse_distinguishes_urls_and_paths() {
        assert_eq!(
            Source::parse(" https://example.com/data.csv "),
            Source::Url("https://example.com/data.csv".to_string())
        );
        assert_eq!(
            Source::parse("data/routes.csv"),
            Source::Path(PathBuf::from("data/routes.csv"))
        );
        assert!(Source::parse("snap.PARQUET").parquet_path().is_some());
        assert!(Source::parse("snap.csv").parquet_path().is_none());
    }

    #[test]
    fn types_columns() {
        let t = table(&["2020.0, 1 ,Boston , Miami,WN,120.5,300,0.4,1250,99.0"]).unwrap();
        let df = t.frame();
        let year = df.column(source::YEAR).unwrap().as_materialized_series();
        assert_eq!(year.i64().unwrap().get(0), Some(2020));
        let quarter = df.column(source::QUARTER).unwrap().as_materialized_series();
        assert_eq!(quarter.i64().unwrap().get(0), Some(1));
        let city = df.column(source::ORIGIN_CITY).unwrap().as_materialized_series();
        assert_eq!(city.str().unwrap().get(0), Some("Boston"));
        let fare = df.column(source::FARE).unwrap().as_materialized_series();
        assert_eq!(fare.f64().unwrap().get(0), Some(120.5));
    }

    #[test]
    fn empty_cells_become_nulls() {
        let t = table(&["2020,1,Boston,Miami,WN,,300,0.4,1250,99.0"]).unwrap();
        let fare = t.frame().column(source::FARE).unwrap();
        assert_eq!(fare.null_count(), 1);
    }

    #[test]
    fn missing_column_is_schema_mismatch() {
        let csv = "Year,quarter,city1,city2,carrier_lg,fare,passengers,large_ms,nsmiles\n\
                   2020,1,A,B,WN,1,1,1,1";
        let raw = read_csv_as_strings(csv.as_bytes().to_vec()).unwrap();
        match RouteTable::from_frame(raw) {
            Err(DashError::SchemaMismatch(msg)) => assert!(msg.contains("fare_low")),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_value_is_schema_mismatch() {
        match table(&["2020,1,A,B,WN,cheap,1,1,1,1"]) {
            Err(DashError::SchemaMismatch(msg)) => assert!(msg.contains("'fare'")),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_tokens_become_nulls() {
        let t = table(&[
            "2020,1,Boston,Miami,WN,NA,300,0.4,1250,99.0",
            "2020,1,Boston,Miami,NA,120,n/a,0.4,1250,#N/A",
            "2020,1,Boston,Miami,WN,NaN,300,null,1250,99.0",
        ])
        .unwrap();
        let df = t.frame();
        assert_eq!(df.column(source::FARE).unwrap().null_count(), 2);
        assert_eq!(df.column(source::PASSENGERS).unwrap().null_count(), 1);
        assert_eq!(df.column(source::FARE_LOW).unwrap().null_count(), 1);
        assert_eq!(df.column(source::MARKET_SHARE).unwrap().null_count(), 1);
        assert_eq!(df.column(source::CARRIER).unwrap().null_count(), 1);
    }

    #[test]
    fn nan_floats_become_nulls() {
        let raw = df!(
            "Year" => [2020i64, 2020],
            "quarter" => [1i64, 2],
            "city1" => ["A", "A"],
            "city2" => ["B", "B"],
            "carrier_lg" => ["WN", "WN"],
            "fare" => [f64::NAN, 120.0],
            "passengers" => [10.0, 20.0],
            "large_ms" => [0.5, 0.5],
            "nsmiles" => [100.0, 100.0],
            "fare_low" => [90.0, 90.0],
        )
        .unwrap();
        let t = RouteTable::from_frame(raw).unwrap();
        let fare = t.frame().column(source::FARE).unwrap().as_materialized_series();
        assert_eq!(fare.f64().unwrap().get(0), None);
        assert_eq!(fare.f64().unwrap().get(1), Some(120.0));
    }

    #[test]
    fn fractional_year_is_schema_mismatch() {
        match table(&["2020.5,1,A,B,WN,1,1,1,1,1"]) {
            Err(DashError::SchemaMismatch(msg)) => {
                assert!(msg.contains("'Year'") && msg.contains("whole numbers"))
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn empty_source_is_schema_mismatch() {
        assert!(matches!(
            read_csv_as_strings(Vec::new()),
            Err(DashError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn trims_header_whitespace() {
        let csv = " Year ,quarter,city1,city2,carrier_lg,fare,passengers,large_ms,nsmiles,fare_low \n\
                   2021,2,A,B,WN,1,1,1,1,1";
        let raw = read_csv_as_strings(csv.as_bytes().to_vec()).unwrap();
        assert!(RouteTable::from_frame(raw).is_ok());
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let err = load(&Source::Path(PathBuf::from("/nonexistent/routes.csv"))).unwrap_err();
        assert!(matches!(err, DashError::DataUnavailable(_)));
    }
}
