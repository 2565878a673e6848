//! Per-group statistics.
//!
//! [`StatisticsAggregator`] keeps one [`GroupStatistics`] bucket per
//! `(company, group, vehicle type)` and updates them incrementally as
//! vehicles are built, sold, moved between groups or age.

mod aggregator;
mod bucket;

pub use aggregator::{StatisticsAggregator, DEFAULT_PROFIT_MIN_AGE_DAYS};
pub use bucket::{BucketKey, GroupStatistics, ProfitRecord};
