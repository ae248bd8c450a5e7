//! Airline route fare dashboard.
//!
//! Startup pipeline: load the route records, derive `period`/`route`/
//! `revenue`, aggregate each view, build chart specs, compose one HTML page,
//! then serve it read-only.

pub mod aggregation;
pub mod chart;
pub mod config;
pub mod derive;
pub mod error;
pub mod figure;
pub mod loader;
pub mod page;
pub mod schema;
pub mod server;
pub mod views;

pub use error::DashError;

use loader::{RouteTable, Source};
use page::Dashboard;

/// Load and derive the table every view reads from.
pub fn prepare(source: &Source) -> Result<RouteTable, DashError> {
    derive::derive_fields(loader::load(source)?)
}

/// Full startup pipeline up to the finished dashboard. Any failure aborts
/// before a page exists.
pub fn build(source: &Source) -> Result<Dashboard, DashError> {
    let table = prepare(source)?;
    views::build_dashboard(&table)
}
