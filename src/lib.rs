//! **Listing filters and vehicle group statistics for a transport simulation.**
//!
//! `fleet-filters` is the bookkeeping core behind a simulation's list
//! windows: which vehicles and stations a window shows, what the per-group
//! totals of a company's fleet are, and how a fleet can be regrouped in one
//! step.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: the domain registry ([`World`]) of companies, towns,
//!   stations, vehicles, order lists and groups, plus [`DomainEvent`]s and
//!   serialisable [`Scenario`] snapshots.
//! - **[`filter`]**: the multi-axis [`FilterModel`] with tri-state elements,
//!   its inclusion predicate, and the [`FilterIndex`] that keeps every open
//!   model live as entities come and go.
//! - **[`catchment`]**: the [`CatchmentController`] that decides which
//!   stations the map overlay draws and classifies tiles.
//! - **[`stats`]**: the [`StatisticsAggregator`], one [`GroupStatistics`]
//!   bucket per `(company, group, vehicle type)`, updated incrementally.
//! - **[`groups`]**: the group command surface and the [`AutoGroupPlanner`].
//! - **[`session`]**: [`Session`] ties the pieces together and is the single
//!   entry point for mutations.
//!
//! ## Getting Started
//!
//! ```no_run
//! use fleet_filters::{AppConfig, Scenario, Session};
//! use fleet_filters::model::{CompanyId, GroupId, VehicleType};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scenario = Scenario::from_path(Path::new("network.yaml"))?;
//!     let session = Session::from_scenario(scenario, AppConfig::default())?;
//!
//!     let all = session.group_statistics(CompanyId(0), GroupId::ALL, VehicleType::Road);
//!     println!("{} road vehicles, {} profit last year", all.num_vehicle, all.profit_last_year);
//!     Ok(())
//! }
//! ```
//!
//! ### Regrouping a Fleet
//!
//! ```no_run
//! use fleet_filters::{AppConfig, Scenario, Session};
//! use fleet_filters::groups::{CommandMode, GroupCommand, Heuristic};
//! use fleet_filters::model::{CompanyId, VehicleType};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scenario = Scenario::from_path(Path::new("network.yaml"))?;
//!     let mut session = Session::from_scenario(scenario, AppConfig::default())?;
//!
//!     let command = GroupCommand::AutoGroup {
//!         vehicle_type: VehicleType::Road,
//!         heuristic: Heuristic::CargoThenOrder,
//!     };
//!     let outcome = session.execute(CompanyId(0), &command, CommandMode::Exec)?;
//!     println!("{} vehicles regrouped", outcome.affected_vehicles.len());
//!     Ok(())
//! }
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    // Variable names like `old`/`new` are clear in context
    clippy::similar_names
)]

pub mod catchment;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod groups;
pub mod model;
pub mod session;
pub mod stats;

// Re-export main types for convenience
pub use catchment::{CatchmentController, TileClass};
pub use config::{AppConfig, AppConfigBuilder, ConfigError, ConfigPreset, Validatable};
pub use error::{ErrorContext, ErrorKind, FleetError, MessageKey, OptionContext, Result};
pub use filter::{AxisMask, Candidate, ClickMode, ElementState, FilterAxis, FilterIndex, FilterModel};
pub use groups::{AutoGroupPlanner, CommandMode, CommandOutcome, GroupCommand, Heuristic};
pub use model::{DomainEvent, Scenario, World};
pub use session::Session;
pub use stats::{GroupStatistics, StatisticsAggregator};
