//! Auto-grouping heuristics and their partition keys.

use crate::model::{CargoId, EngineId, LiveryScheme, OrderListId, StationId, Vehicle, World};
use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Equivalence relation used to partition a company's primary vehicles.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum Heuristic {
    /// Same shared order list
    #[default]
    OrderList,
    /// Same destinations in first-visit order
    OrderStations,
    /// Same carried cargo
    Cargo,
    /// Same cargo and same livery of the first engine
    #[value(alias = "cargo-livery")]
    CargoAndLivery,
    /// Same first engine type
    FirstEngine,
    /// Order-list groups nested under one parent per cargo set
    CargoThenOrder,
}

impl Heuristic {
    pub const ALL: [Self; 6] = [
        Self::OrderList,
        Self::OrderStations,
        Self::Cargo,
        Self::CargoAndLivery,
        Self::FirstEngine,
        Self::CargoThenOrder,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OrderList => "order-list",
            Self::OrderStations => "order-stations",
            Self::Cargo => "cargo",
            Self::CargoAndLivery => "cargo-and-livery",
            Self::FirstEngine => "first-engine",
            Self::CargoThenOrder => "cargo-then-order",
        }
    }

    /// True for heuristics whose classes are exactly the order-list sharers.
    #[must_use]
    pub const fn keys_on_order_list(self) -> bool {
        matches!(self, Self::OrderList | Self::CargoThenOrder)
    }

    /// Partition key of a primary vehicle. Vehicles without a key (no
    /// orders, no cargo) stay in the default group.
    #[must_use]
    pub fn key(self, world: &World, vehicle: &Vehicle) -> Option<GroupKey> {
        match self {
            Self::OrderList | Self::CargoThenOrder => vehicle.order_list.map(GroupKey::OrderList),
            Self::OrderStations => {
                let stations = world.destinations(vehicle);
                (!stations.is_empty()).then_some(GroupKey::Stations(stations))
            }
            Self::Cargo => first_cargo(world, vehicle).map(GroupKey::Cargo),
            Self::CargoAndLivery => {
                let livery = world.engine(vehicle.engine).map(|e| e.livery).unwrap_or_default();
                first_cargo(world, vehicle).map(|c| GroupKey::CargoLivery(c, livery))
            }
            Self::FirstEngine => Some(GroupKey::Engine(vehicle.engine)),
        }
    }
}

/// Cargo of the first unit in the chain that carries any.
fn first_cargo(world: &World, vehicle: &Vehicle) -> Option<CargoId> {
    world.chain(vehicle.id).find_map(|unit| unit.cargo_type)
}

impl std::fmt::Display for Heuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Equivalence class identity under a heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    OrderList(OrderListId),
    Stations(Vec<StationId>),
    Cargo(CargoId),
    CargoLivery(CargoId, LiveryScheme),
    Engine(EngineId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::small_world;
    use crate::model::VehicleId;

    #[test]
    fn test_keys() {
        let world = small_world();
        let v1 = world.vehicle(VehicleId(1)).unwrap();
        let v2 = world.vehicle(VehicleId(2)).unwrap();
        let v3 = world.vehicle(VehicleId(3)).unwrap();
        for h in Heuristic::ALL {
            assert_eq!(h.key(&world, v1), h.key(&world, v2), "{h}");
        }
        assert_ne!(Heuristic::Cargo.key(&world, v1), Heuristic::Cargo.key(&world, v3));
        // list 2 visits the same stations in the other order
        assert_ne!(
            Heuristic::OrderStations.key(&world, v1),
            Heuristic::OrderStations.key(&world, v3)
        );
        // the train has no orders, but its wagon carries coal
        let train = world.vehicle(VehicleId(10)).unwrap();
        assert_eq!(Heuristic::OrderList.key(&world, train), None);
        assert_eq!(Heuristic::Cargo.key(&world, train), Some(GroupKey::Cargo(CargoId(1))));
    }
}
