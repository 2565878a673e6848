//! Configuration types for fleet-filters.

use super::defaults::{
    DEFAULT_MAX_NAME_CHARS, DEFAULT_POOL_CAPACITY, DEFAULT_PROFIT_MIN_AGE_DAYS,
    DEFAULT_UNMODIFIED_RADIUS,
};
use crate::groups::Heuristic;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Top-level configuration, loaded from a config file or built in code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Group statistics options
    pub statistics: StatisticsConfig,
    /// Group pool and naming
    pub groups: GroupsConfig,
    /// Catchment overlay options
    pub catchment: CatchmentConfig,
    /// Auto-grouping options
    pub autogroup: AutogroupConfig,
}

impl AppConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub const fn profit_min_age_days(mut self, days: u32) -> Self {
        self.config.statistics.profit_min_age_days = days;
        self
    }

    pub const fn pool_capacity(mut self, capacity: usize) -> Self {
        self.config.groups.pool_capacity = capacity;
        self
    }

    pub const fn max_name_chars(mut self, chars: usize) -> Self {
        self.config.groups.max_name_chars = chars;
        self
    }

    pub const fn modified_catchment(mut self, enabled: bool) -> Self {
        self.config.catchment.modified_catchment = enabled;
        self
    }

    pub const fn unmodified_radius(mut self, radius: u32) -> Self {
        self.config.catchment.unmodified_radius = radius;
        self
    }

    pub const fn default_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.config.autogroup.default_heuristic = heuristic;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Age in days after which a vehicle's profit counts
    pub profit_min_age_days: u32,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            profit_min_age_days: DEFAULT_PROFIT_MIN_AGE_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GroupsConfig {
    /// Number of group slots shared by all companies
    pub pool_capacity: usize,
    /// Longest group name, in characters
    pub max_name_chars: usize,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            max_name_chars: DEFAULT_MAX_NAME_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CatchmentConfig {
    /// Per-facility catchment radius
    pub modified_catchment: bool,
    /// Radius used by every station when modified catchment is off
    pub unmodified_radius: u32,
}

impl Default for CatchmentConfig {
    fn default() -> Self {
        Self {
            modified_catchment: true,
            unmodified_radius: DEFAULT_UNMODIFIED_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AutogroupConfig {
    /// Heuristic used when none is given on the command line
    pub default_heuristic: Heuristic,
}
