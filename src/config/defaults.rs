//! Default values and named presets.

use super::types::{AppConfig, CatchmentConfig};
use crate::groups::Heuristic;
use clap::ValueEnum;

pub const DEFAULT_PROFIT_MIN_AGE_DAYS: u32 = crate::stats::DEFAULT_PROFIT_MIN_AGE_DAYS;
pub const DEFAULT_POOL_CAPACITY: usize = crate::model::DEFAULT_GROUP_CAPACITY;
pub const DEFAULT_MAX_NAME_CHARS: usize = 32;
pub const DEFAULT_UNMODIFIED_RADIUS: u32 = 4;

// ============================================================================
// Configuration Presets
// ============================================================================

/// Named configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigPreset {
    /// Defaults of a new game
    Default,
    /// Every station uses the same catchment radius
    Classic,
    /// Group by cargo first for freight-heavy companies
    Freight,
}

impl ConfigPreset {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Classic => "classic",
            Self::Freight => "freight",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::Default),
            "classic" | "unmodified" => Some(Self::Classic),
            "freight" | "cargo" => Some(Self::Freight),
            _ => None,
        }
    }

    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Default, Self::Classic, Self::Freight]
    }
}

impl std::fmt::Display for ConfigPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl AppConfig {
    #[must_use]
    pub fn from_preset(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Default => Self::default(),
            ConfigPreset::Classic => Self {
                catchment: CatchmentConfig {
                    modified_catchment: false,
                    unmodified_radius: DEFAULT_UNMODIFIED_RADIUS,
                },
                ..Self::default()
            },
            ConfigPreset::Freight => Self::builder()
                .default_heuristic(Heuristic::CargoThenOrder)
                .build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_names_roundtrip() {
        for preset in ConfigPreset::all() {
            assert_eq!(ConfigPreset::from_name(preset.name()), Some(*preset));
        }
        assert_eq!(ConfigPreset::from_name("unknown"), None);
    }

    #[test]
    fn test_classic_preset_disables_modified_catchment() {
        let config = AppConfig::from_preset(ConfigPreset::Classic);
        assert!(!config.catchment.modified_catchment);
        assert_eq!(config.groups.max_name_chars, DEFAULT_MAX_NAME_CHARS);
    }
}
