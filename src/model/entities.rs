//! Domain entities as seen by the filter and statistics core.
//!
//! These are read-mostly records. The owning [`World`](super::World) hands
//! out shared references; mutation goes through the session so that the
//! statistics and filter indices see every change.

use super::cargo::CargoTypes;
use super::ids::{
    CargoId, CompanyId, EngineId, GroupId, Money, OrderListId, StationId, TownId, VehicleId,
    VehicleType,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Company and cargo display colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Colour {
    #[default]
    DarkBlue,
    PaleGreen,
    Pink,
    Yellow,
    Red,
    LightBlue,
    Green,
    DarkGreen,
    Blue,
    Cream,
    Mauve,
    Purple,
    Orange,
    Brown,
    Grey,
    White,
}

/// Map tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
}

impl Tile {
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub colour: Colour,
    /// Controlled by a human player
    #[serde(default)]
    pub human: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Town {
    pub id: TownId,
    pub name: String,
    #[serde(default)]
    pub centre: Tile,
    #[serde(default)]
    pub population: u32,
    /// Companies that built a statue in this town
    #[serde(default)]
    pub statues: Vec<CompanyId>,
    /// Company holding exclusive transport rights
    #[serde(default)]
    pub exclusivity: Option<CompanyId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cargo {
    pub id: CargoId,
    pub name: String,
    #[serde(default)]
    pub rating_colour: Colour,
}

/// Livery scheme an engine is painted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiveryScheme {
    #[default]
    Default,
    Steam,
    Diesel,
    Electric,
    Monorail,
    Maglev,
    Dmu,
    Emu,
    Bus,
    Truck,
    PassengerTram,
    FreightTram,
    PassengerShip,
    FreightShip,
    Helicopter,
    SmallPlane,
    LargePlane,
}

impl LiveryScheme {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Steam => "Steam",
            Self::Diesel => "Diesel",
            Self::Electric => "Electric",
            Self::Monorail => "Monorail",
            Self::Maglev => "Maglev",
            Self::Dmu => "DMU",
            Self::Emu => "EMU",
            Self::Bus => "Bus",
            Self::Truck => "Truck",
            Self::PassengerTram => "Passenger Tram",
            Self::FreightTram => "Freight Tram",
            Self::PassengerShip => "Passenger Ship",
            Self::FreightShip => "Freight Ship",
            Self::Helicopter => "Helicopter",
            Self::SmallPlane => "Small Plane",
            Self::LargePlane => "Large Plane",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    pub id: EngineId,
    pub name: String,
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub livery: LiveryScheme,
}

/// Facility a station offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StationFacility {
    Train,
    TruckStop,
    BusStop,
    Airport,
    Dock,
}

impl StationFacility {
    pub const ALL: [Self; 5] = [
        Self::Train,
        Self::TruckStop,
        Self::BusStop,
        Self::Airport,
        Self::Dock,
    ];

    #[must_use]
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    #[must_use]
    pub const fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Train),
            1 => Some(Self::TruckStop),
            2 => Some(Self::BusStop),
            3 => Some(Self::Airport),
            4 => Some(Self::Dock),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Train => "Train station",
            Self::TruckStop => "Truck stop",
            Self::BusStop => "Bus stop",
            Self::Airport => "Airport",
            Self::Dock => "Dock",
        }
    }
}

/// Facility mask of a station.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<StationFacility>", into = "Vec<StationFacility>")]
pub struct Facilities(pub u8);

impl Facilities {
    #[must_use]
    pub const fn contains(self, facility: StationFacility) -> bool {
        self.0 & facility.bit() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = StationFacility> {
        StationFacility::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl From<Vec<StationFacility>> for Facilities {
    fn from(list: Vec<StationFacility>) -> Self {
        Self(list.into_iter().fold(0, |mask, f| mask | f.bit()))
    }
}

impl From<Facilities> for Vec<StationFacility> {
    fn from(mask: Facilities) -> Self {
        mask.iter().collect()
    }
}

/// Airport layouts, which determine an airport's catchment radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AirportType {
    Small,
    Large,
    Heliport,
    Metropolitan,
    International,
    Commuter,
    Helidepot,
    Intercontinental,
    Helistation,
}

impl AirportType {
    /// Catchment radius when modified catchment is enabled.
    #[must_use]
    pub const fn catchment_radius(self) -> u32 {
        match self {
            Self::Small => 3,
            Self::Heliport => 1,
            Self::International => 5,
            Self::Intercontinental => 10,
            Self::Large
            | Self::Metropolitan
            | Self::Commuter
            | Self::Helidepot
            | Self::Helistation => 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub owner: CompanyId,
    pub town: TownId,
    #[serde(default)]
    pub facilities: Facilities,
    #[serde(default)]
    pub airport_type: Option<AirportType>,
    /// North corner of the station footprint
    pub location: Tile,
    #[serde(default = "one")]
    pub width: u32,
    #[serde(default = "one")]
    pub height: u32,
    /// Cargo accepted within the catchment
    #[serde(default)]
    pub accepted: CargoTypes,
    /// Cargo waiting or supplied at the station
    #[serde(default)]
    pub supplied: CargoTypes,
}

const fn one() -> u32 {
    1
}

const fn yes() -> bool {
    true
}

const fn default_group() -> GroupId {
    GroupId::DEFAULT
}

/// One unit of a vehicle chain. Primary units have no `head`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub vehicle_type: VehicleType,
    pub owner: CompanyId,
    /// Group of the chain; only meaningful on the primary unit
    #[serde(default = "default_group")]
    pub group: GroupId,
    pub engine: EngineId,
    #[serde(default)]
    pub cargo_type: Option<CargoId>,
    #[serde(default)]
    pub cargo_cap: u32,
    #[serde(default)]
    pub cargo_stored: u32,
    #[serde(default)]
    pub profit_this_year: Money,
    #[serde(default)]
    pub profit_last_year: Money,
    #[serde(default)]
    pub age_days: u32,
    #[serde(default)]
    pub order_list: Option<OrderListId>,
    /// Primary unit this one is attached to
    #[serde(default)]
    pub head: Option<VehicleId>,
    /// Contributes to the per-engine histogram (false for wagons and shadows)
    #[serde(default = "yes")]
    pub engine_countable: bool,
    #[serde(default)]
    pub stopped: bool,
    #[serde(default)]
    pub crashed: bool,
    #[serde(default)]
    pub needs_service: bool,
}

impl Vehicle {
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.head.is_none()
    }

    /// Primary unit of this chain.
    #[must_use]
    pub fn primary(&self) -> VehicleId {
        self.head.unwrap_or(self.id)
    }
}

/// A user-defined group of vehicles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub owner: CompanyId,
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub parent: Option<GroupId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub replace_protection: bool,
}

/// Autoreplace rule: within `group`, replace `from` engines by `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineRenewal {
    pub company: CompanyId,
    pub group: GroupId,
    pub from: EngineId,
    pub to: EngineId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facility_mask() {
        let mask = Facilities::from(vec![StationFacility::BusStop, StationFacility::Airport]);
        assert!(mask.contains(StationFacility::BusStop));
        assert!(!mask.contains(StationFacility::Dock));
        assert_eq!(
            mask.iter().collect::<Vec<_>>(),
            vec![StationFacility::BusStop, StationFacility::Airport]
        );
        for (i, f) in StationFacility::ALL.into_iter().enumerate() {
            assert_eq!(StationFacility::from_index(i as u32), Some(f));
        }
    }

    #[test]
    fn test_airport_radius() {
        assert_eq!(AirportType::Small.catchment_radius(), 3);
        assert_eq!(AirportType::Intercontinental.catchment_radius(), 10);
    }
}
