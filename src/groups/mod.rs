//! Vehicle groups: the command surface and the auto-grouping planner.
//!
//! Both go through [`GroupCommandExecutor`] or [`AutoGroupPlanner`], which
//! keep the [`StatisticsAggregator`](crate::stats::StatisticsAggregator)
//! exact as vehicles move between groups.

mod autogroup;
mod commands;
mod heuristic;
mod naming;

pub use autogroup::{plan, AutoGroupPlanner, AutoGroupReport, PlannedGroup};
pub use commands::{CommandMode, CommandOutcome, GroupCommand, GroupCommandExecutor};
pub use heuristic::{GroupKey, Heuristic};
pub use naming::{truncate_chars, unique_name, validate_name};
