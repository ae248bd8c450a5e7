/// Column-name constants for the route fare dataset.
/// Single source of truth - every lookup into the table goes through here.

// ── Source columns ──────────────────────────────────────────────────────────
pub mod source {
    pub const YEAR: &str = "Year";
    pub const QUARTER: &str = "quarter";
    pub const ORIGIN_CITY: &str = "city1";
    pub const DEST_CITY: &str = "city2";
    pub const CARRIER: &str = "carrier_lg";
    pub const FARE: &str = "fare";
    pub const PASSENGERS: &str = "passengers";
    pub const MARKET_SHARE: &str = "large_ms";
    pub const DISTANCE: &str = "nsmiles";
    pub const FARE_LOW: &str = "fare_low";

    pub const INTEGER: [&str; 2] = [YEAR, QUARTER];

    pub const NUMERIC: [&str; 5] = [FARE, PASSENGERS, MARKET_SHARE, DISTANCE, FARE_LOW];

    pub const ALL: [&str; 10] = [
        YEAR,
        QUARTER,
        ORIGIN_CITY,
        DEST_CITY,
        CARRIER,
        FARE,
        PASSENGERS,
        MARKET_SHARE,
        DISTANCE,
        FARE_LOW,
    ];
}

// ── Derived columns ─────────────────────────────────────────────────────────
pub mod derived {
    pub const PERIOD: &str = "period";
    pub const ROUTE: &str = "route";
    pub const REVENUE: &str = "revenue";

    pub const ALL: [&str; 3] = [PERIOD, ROUTE, REVENUE];
}

// ── Aggregation output columns ──────────────────────────────────────────────
pub mod grouped {
    pub const VALUE: &str = "value";
    pub const COUNT: &str = "count";
}
