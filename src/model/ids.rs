//! Stable integer identifiers for domain entities.

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident($inner:ty), $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Raw index, as used for filter element ids.
            #[must_use]
            pub const fn index(self) -> u32 {
                self.0 as u32
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }
    };
}

entity_id!(
    /// Company (player or AI) identifier.
    CompanyId(u8),
    "company"
);
entity_id!(TownId(u32), "town");
entity_id!(StationId(u32), "station");
entity_id!(VehicleId(u32), "vehicle");
entity_id!(OrderListId(u32), "order-list");
entity_id!(EngineId(u16), "engine");
entity_id!(
    /// Cargo slot, `0..NUM_CARGO`.
    CargoId(u8),
    "cargo"
);

/// Maximum number of cargo slots a world can define.
pub const NUM_CARGO: usize = 64;

/// Group identifier. Real groups use pool indices; a few values are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u16);

impl GroupId {
    /// Synthetic bucket spanning every vehicle of a company and type.
    pub const ALL: Self = Self(0xFFFD);
    /// Synthetic bucket for vehicles that are in no user group.
    pub const DEFAULT: Self = Self(0xFFFE);
    /// Request a fresh group (command argument only).
    pub const NEW: Self = Self(0xFFFF);

    /// First reserved value; pool capacity can never reach it.
    pub const FIRST_RESERVED: u16 = 0xFFFD;

    #[must_use]
    pub const fn is_default(self) -> bool {
        self.0 == Self::DEFAULT.0
    }

    #[must_use]
    pub const fn is_all(self) -> bool {
        self.0 == Self::ALL.0
    }

    /// True for ids that name a pool entry rather than a synthetic bucket.
    #[must_use]
    pub const fn is_real(self) -> bool {
        self.0 < Self::FIRST_RESERVED
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ALL => f.write_str("group#all"),
            Self::DEFAULT => f.write_str("group#default"),
            Self::NEW => f.write_str("group#new"),
            Self(n) => write!(f, "group#{n}"),
        }
    }
}

/// Kind of vehicle; groups and statistics are scoped by it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
    ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum VehicleType {
    Rail,
    Road,
    Ship,
    Aircraft,
}

impl VehicleType {
    pub const ALL: [Self; 4] = [Self::Rail, Self::Road, Self::Ship, Self::Aircraft];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rail => "rail",
            Self::Road => "road",
            Self::Ship => "ship",
            Self::Aircraft => "aircraft",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "rail" | "train" => Some(Self::Rail),
            "road" | "bus" | "truck" => Some(Self::Road),
            "ship" | "water" => Some(Self::Ship),
            "aircraft" | "air" | "plane" => Some(Self::Aircraft),
            _ => None,
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Money amount in the base currency.
pub type Money = i64;
