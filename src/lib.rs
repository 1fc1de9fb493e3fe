//! ERCOT load and weather analytics.
//!
//! Reads hourly zonal load, an optional load forecast and hourly station
//! weather, then derives forecast accuracy, load outliers, heatwave
//! streaks and weather/load correlation tables.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod reports;
pub mod tables;
pub mod zones;
