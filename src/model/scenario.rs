//! Scenario documents: a serialisable snapshot of the domain.
//!
//! Scenarios are the CLI's input and a convenient way to build fixtures.
//! YAML and JSON are both accepted; the format is chosen by file extension.

use super::entities::{Cargo, Company, Engine, EngineRenewal, Group, Station, Town, Vehicle};
use super::orders::OrderList;
use super::world::World;
use crate::error::{messages, ErrorContext, FleetError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Group pool size; `None` keeps the world default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_capacity: Option<usize>,
    pub companies: Vec<Company>,
    pub towns: Vec<Town>,
    pub cargos: Vec<Cargo>,
    pub engines: Vec<Engine>,
    pub stations: Vec<Station>,
    pub order_lists: Vec<OrderList>,
    pub groups: Vec<Group>,
    pub vehicles: Vec<Vehicle>,
    pub renewals: Vec<EngineRenewal>,
}

impl Scenario {
    /// Load a scenario from a `.yaml`/`.yml` or `.json` file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| FleetError::io(path, e))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        };
        parsed.with_context(|| format!("loading {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Build a world, checking every cross reference.
    pub fn into_world(self) -> Result<World> {
        let mut world = World::new();
        if let Some(capacity) = self.group_capacity {
            world.set_group_capacity(capacity);
        }
        for cargo in self.cargos {
            world.insert_cargo(cargo).context("cargos")?;
        }
        for company in self.companies {
            world.insert_company(company).context("companies")?;
        }
        for town in self.towns {
            world.insert_town(town).context("towns")?;
        }
        for engine in self.engines {
            world.insert_engine(engine).context("engines")?;
        }
        for station in self.stations {
            world.insert_station(station).context("stations")?;
        }
        for list in self.order_lists {
            world.insert_order_list(list).context("order lists")?;
        }

        let parents: Vec<_> = self.groups.iter().map(|g| (g.id, g.parent)).collect();
        for group in self.groups {
            world.insert_group(group).context("groups")?;
        }
        for (id, parent) in parents {
            let Some(parent) = parent else { continue };
            let group = world.group(id).map(|g| (g.owner, g.vehicle_type));
            if let Some((owner, vehicle_type)) = group {
                world
                    .check_group_scope(parent, owner, vehicle_type)
                    .with_context(|| format!("parent of {id}"))?;
            }
            if world.is_group_in_subtree(parent, id) {
                return Err(FleetError::invariant(
                    messages::GROUP_CYCLE,
                    format!("{id} is its own ancestor"),
                ));
            }
        }

        let (primaries, units): (Vec<_>, Vec<_>) =
            self.vehicles.into_iter().partition(Vehicle::is_primary);
        for vehicle in primaries.into_iter().chain(units) {
            world.insert_vehicle(vehicle).context("vehicles")?;
        }
        for renewal in self.renewals {
            world.insert_renewal(renewal).context("renewals")?;
        }
        Ok(world)
    }

    /// Snapshot a world back into a scenario.
    #[must_use]
    pub fn from_world(world: &World) -> Self {
        Self {
            group_capacity: Some(world.group_capacity()),
            companies: world.companies().cloned().collect(),
            towns: world.towns().cloned().collect(),
            cargos: world.cargos().cloned().collect(),
            engines: world.engines().cloned().collect(),
            stations: world.stations().cloned().collect(),
            order_lists: world.order_lists().cloned().collect(),
            groups: world.groups().cloned().collect(),
            vehicles: world.vehicles().cloned().collect(),
            renewals: world.renewals().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::fixtures::small_world;
    use crate::model::{GroupId, VehicleId};

    const MINIMAL: &str = r"
companies:
  - { id: 0, name: Acme, colour: red }
towns:
  - { id: 0, name: Aston }
cargos:
  - { id: 0, name: Passengers }
engines:
  - { id: 0, name: Regal Bus, vehicle_type: road, livery: bus }
stations:
  - { id: 0, name: Aston Central, owner: 0, town: 0, location: { x: 4, y: 4 }, facilities: [bus-stop], accepted: [0] }
order_lists:
  - { id: 1, orders: [ { destination: 0 } ] }
groups:
  - { id: 0, owner: 0, vehicle_type: road, name: Buses }
vehicles:
  - { id: 1, vehicle_type: road, owner: 0, group: 0, engine: 0, cargo_type: 0, cargo_cap: 31, order_list: 1 }
";

    #[test]
    fn test_minimal_yaml_scenario() {
        let world = Scenario::from_yaml_str(MINIMAL).unwrap().into_world().unwrap();
        let bus = world.vehicle(VehicleId(1)).unwrap();
        assert_eq!(bus.group, GroupId(0));
        assert!(bus.engine_countable);
        assert_eq!(world.order_list(bus.order_list.unwrap()).unwrap().sharers, vec![VehicleId(1)]);
    }

    #[test]
    fn test_world_roundtrip_through_json() {
        let world = small_world();
        let json = serde_json::to_string(&Scenario::from_world(&world)).unwrap();
        let rebuilt = Scenario::from_json_str(&json).unwrap().into_world().unwrap();
        assert_eq!(rebuilt.vehicles().count(), world.vehicles().count());
        assert_eq!(rebuilt.chain(VehicleId(10)).count(), 2);
    }

    #[test]
    fn test_unknown_reference_is_invalid_argument() {
        let broken = MINIMAL.replace("engine: 0, cargo_type", "engine: 7, cargo_type");
        let err = Scenario::from_yaml_str(&broken)
            .unwrap()
            .into_world()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("vehicles"));
    }
}
