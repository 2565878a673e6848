//! Configuration validation.

use super::types::{AppConfig, AutogroupConfig, CatchmentConfig, GroupsConfig, StatisticsConfig};
use crate::model::GroupId;

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.statistics.validate());
        errors.extend(self.groups.validate());
        errors.extend(self.catchment.validate());
        errors.extend(self.autogroup.validate());
        errors
    }
}

/// Older than this is nonsense for a vehicle's lifetime.
const MAX_PROFIT_AGE_DAYS: u32 = 365 * 200;
const MAX_RADIUS: u32 = 64;

impl Validatable for StatisticsConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.profit_min_age_days > MAX_PROFIT_AGE_DAYS {
            errors.push(ConfigError::new(
                "statistics.profit_min_age_days",
                format!(
                    "Must be at most {MAX_PROFIT_AGE_DAYS} days, got {}",
                    self.profit_min_age_days
                ),
            ));
        }
        errors
    }
}

impl Validatable for GroupsConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let max_capacity = usize::from(GroupId::FIRST_RESERVED);
        if self.pool_capacity == 0 || self.pool_capacity > max_capacity {
            errors.push(ConfigError::new(
                "groups.pool_capacity",
                format!("Must be between 1 and {max_capacity}, got {}", self.pool_capacity),
            ));
        }
        if self.max_name_chars == 0 {
            errors.push(ConfigError::new(
                "groups.max_name_chars",
                "Group names need room for at least one character",
            ));
        }
        errors
    }
}

impl Validatable for CatchmentConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.unmodified_radius == 0 || self.unmodified_radius > MAX_RADIUS {
            errors.push(ConfigError::new(
                "catchment.unmodified_radius",
                format!("Must be between 1 and {MAX_RADIUS}, got {}", self.unmodified_radius),
            ));
        }
        errors
    }
}

impl Validatable for AutogroupConfig {
    fn validate(&self) -> Vec<ConfigError> {
        // every heuristic is valid; the enum rejects unknown names on load
        Vec::new()
    }
}
