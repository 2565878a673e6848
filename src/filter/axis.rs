//! Filter axes, element states and the closed property sets.

use serde::{Deserialize, Serialize};

/// Independent categorical axes a filter model can select on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterAxis {
    Towns,
    Companies,
    CargoProduced,
    CargoAccepted,
    StationFacilities,
    Stations,
    OrderListShape,
    VehicleGroupProperties,
    CatchmentProperties,
    TownProperties,
}

impl FilterAxis {
    pub const ALL: [Self; 10] = [
        Self::Towns,
        Self::Companies,
        Self::CargoProduced,
        Self::CargoAccepted,
        Self::StationFacilities,
        Self::Stations,
        Self::OrderListShape,
        Self::VehicleGroupProperties,
        Self::CatchmentProperties,
        Self::TownProperties,
    ];

    #[must_use]
    pub const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Towns => "towns",
            Self::Companies => "companies",
            Self::CargoProduced => "cargo-produced",
            Self::CargoAccepted => "cargo-accepted",
            Self::StationFacilities => "station-facilities",
            Self::Stations => "stations",
            Self::OrderListShape => "order-list-shape",
            Self::VehicleGroupProperties => "vehicle-group-properties",
            Self::CatchmentProperties => "catchment-properties",
            Self::TownProperties => "town-properties",
        }
    }

    /// Axes whose elements are sorted by display name rather than id.
    #[must_use]
    pub const fn sorts_by_name(self) -> bool {
        matches!(self, Self::Towns | Self::Stations | Self::Companies)
    }
}

impl std::fmt::Display for FilterAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of enabled axes, fixed when a model is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AxisMask(u16);

impl AxisMask {
    pub const EMPTY: Self = Self(0);

    #[must_use]
    pub fn of(axes: &[FilterAxis]) -> Self {
        Self(axes.iter().fold(0, |mask, a| mask | a.bit()))
    }

    #[must_use]
    pub fn all() -> Self {
        Self::of(&FilterAxis::ALL)
    }

    #[must_use]
    pub const fn contains(self, axis: FilterAxis) -> bool {
        self.0 & axis.bit() != 0
    }

    #[must_use]
    pub const fn with(self, axis: FilterAxis) -> Self {
        Self(self.0 | axis.bit())
    }

    pub fn iter(self) -> impl Iterator<Item = FilterAxis> {
        FilterAxis::ALL.into_iter().filter(move |a| self.contains(*a))
    }
}

// ============================================================================
// Element state
// ============================================================================

/// Trait for states that cycle through a fixed sequence on click.
pub trait CycleFilter: Clone + Copy + Default {
    /// Get the next state in the cycle.
    #[must_use]
    fn next(&self) -> Self;

    /// Get the previous state in the cycle.
    #[must_use]
    fn prev(&self) -> Self;

    fn display_name(&self) -> &str;
}

/// Tri-state selection of a single filter element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementState {
    /// Don't care
    #[default]
    Neutral,
    /// Include
    Positive,
    /// Exclude
    Negative,
}

impl ElementState {
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Neutral)
    }
}

impl CycleFilter for ElementState {
    fn next(&self) -> Self {
        match self {
            Self::Neutral => Self::Positive,
            Self::Positive => Self::Negative,
            Self::Negative => Self::Neutral,
        }
    }

    fn prev(&self) -> Self {
        match self {
            Self::Neutral => Self::Negative,
            Self::Positive => Self::Neutral,
            Self::Negative => Self::Positive,
        }
    }

    fn display_name(&self) -> &str {
        match self {
            Self::Neutral => "neutral",
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

/// How a click on an element changes its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickMode {
    /// Plain click: neutral, positive, negative, neutral.
    #[default]
    Cycle,
    /// Ctrl-click in the active list: back to neutral.
    Remove,
}

// ============================================================================
// Property axes
// ============================================================================

macro_rules! property_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub fn from_index(index: u32) -> Option<Self> {
                usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
            }

            #[must_use]
            pub const fn index(self) -> u32 {
                self as u32
            }

            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }
    };
}

property_enum! {
    /// Per-vehicle flags on the `vehicle-group-properties` axis.
    VehicleProperty {
        Stopped => "stopped",
        Crashed => "crashed",
        Profitable => "profitable",
        Unprofitable => "unprofitable",
        NeedsService => "needs-service",
        PendingReplace => "pending-replace",
        ReplaceProtected => "replace-protected",
    }
}

property_enum! {
    /// Toggles that change catchment overlay semantics. They never filter.
    CatchmentProperty {
        ShowUncaught => "show-uncaught",
        ShowOverlap => "show-overlap",
    }
}

property_enum! {
    /// Relations between a town and the candidate's owner.
    TownProperty {
        CompanyStatue => "company-statue",
        CompanyExclusivity => "company-exclusivity",
        OtherExclusivity => "other-exclusivity",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_has_period_three() {
        let start = ElementState::default();
        let end = start.next().next().next();
        assert_eq!(start, end);
        assert_eq!(start.next(), ElementState::Positive);
        assert_eq!(start.next().prev(), start);
    }

    #[test]
    fn test_axis_mask() {
        let mask = AxisMask::of(&[FilterAxis::Companies, FilterAxis::CargoAccepted]);
        assert!(mask.contains(FilterAxis::Companies));
        assert!(!mask.contains(FilterAxis::Towns));
        assert_eq!(mask.iter().count(), 2);
        assert_eq!(AxisMask::all().iter().count(), FilterAxis::ALL.len());
    }

    #[test]
    fn test_property_indices() {
        assert_eq!(VehicleProperty::from_index(0), Some(VehicleProperty::Stopped));
        assert_eq!(VehicleProperty::PendingReplace.index(), 5);
        assert_eq!(CatchmentProperty::from_index(2), None);
        assert_eq!(TownProperty::OtherExclusivity.name(), "other-exclusivity");
    }
}
