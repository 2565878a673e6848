//! Configuration for fleet-filters.
//!
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - Named presets
//! - YAML config file loading and discovery
//!
//! # Configuration File
//!
//! Place a `.fleet-filters.yaml` file in your project root or
//! `~/.config/fleet-filters/`:
//!
//! ```yaml
//! statistics:
//!   profit_min_age_days: 730
//! catchment:
//!   modified_catchment: false
//!   unmodified_radius: 4
//! autogroup:
//!   default_heuristic: cargo
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::{
    ConfigPreset, DEFAULT_MAX_NAME_CHARS, DEFAULT_POOL_CAPACITY, DEFAULT_PROFIT_MIN_AGE_DAYS,
    DEFAULT_UNMODIFIED_RADIUS,
};
pub use types::{
    AppConfig, AppConfigBuilder, AutogroupConfig, CatchmentConfig, GroupsConfig, StatisticsConfig,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    discover_config_file, generate_example_config, load_config_file, load_or_default,
    ConfigFileError,
};

/// JSON Schema of the config file format, for editor validation.
pub fn generate_json_schema() -> crate::error::Result<String> {
    let schema = schemars::schema_for!(AppConfig);
    Ok(serde_json::to_string_pretty(&schema)?)
}
