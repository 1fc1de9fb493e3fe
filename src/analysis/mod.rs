/// The time-series analytics engine.
///
/// Every function here is a pure batch transformation over read-only
/// inputs: no I/O, no state kept between calls. Statistics that cannot be
/// computed come back as `None`, never as zero or NaN.
///
/// Submodules, leaves first:
/// - `reshape`  : wide load rows and station readings into long form.
/// - `bucket`   : UTC day/month truncation for grouping keys.
/// - `aggregate`: per-group mean, sample stddev and percentiles.
/// - `outliers` : z-score classification against group statistics.
/// - `streaks`  : consecutive-day runs ("islands") per zone.
/// - `accuracy` : MSE/MAE/MAPE/R² between actual and expected series.
/// - `correlate`: joins of per-(zone, day) aggregates and split summaries.

pub mod accuracy;
pub mod aggregate;
pub mod bucket;
pub mod correlate;
pub mod outliers;
pub mod reshape;
pub mod streaks;
