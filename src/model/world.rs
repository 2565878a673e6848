//! The domain registry: every entity the core reads, keyed by stable id.
//!
//! Pools are ordered by id, which is also "domain order" for the global
//! statistics rebuild and the auto-grouping walk.

use super::cargo::CargoTypes;
use super::entities::{Cargo, Company, Engine, EngineRenewal, Group, Station, Town, Vehicle};
use super::ids::{
    CargoId, CompanyId, EngineId, GroupId, OrderListId, StationId, TownId, VehicleId,
    VehicleType, NUM_CARGO,
};
use super::orders::{Order, OrderList, OrderListType};
use crate::error::{messages, ErrorContext, FleetError, OptionContext, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Default number of group slots in the pool.
pub const DEFAULT_GROUP_CAPACITY: usize = 64_000;

#[derive(Debug, Clone)]
pub struct World {
    companies: BTreeMap<CompanyId, Company>,
    towns: BTreeMap<TownId, Town>,
    cargos: Vec<Cargo>,
    engines: BTreeMap<EngineId, Engine>,
    stations: BTreeMap<StationId, Station>,
    vehicles: BTreeMap<VehicleId, Vehicle>,
    order_lists: BTreeMap<OrderListId, OrderList>,
    groups: BTreeMap<GroupId, Group>,
    renewals: Vec<EngineRenewal>,
    /// Non-primary units by primary id
    chains: HashMap<VehicleId, Vec<VehicleId>>,
    group_capacity: usize,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    #[must_use]
    pub fn new() -> Self {
        Self {
            companies: BTreeMap::new(),
            towns: BTreeMap::new(),
            cargos: Vec::new(),
            engines: BTreeMap::new(),
            stations: BTreeMap::new(),
            vehicles: BTreeMap::new(),
            order_lists: BTreeMap::new(),
            groups: BTreeMap::new(),
            renewals: Vec::new(),
            chains: HashMap::new(),
            group_capacity: DEFAULT_GROUP_CAPACITY,
        }
    }

    /// Limit the group pool. Clamped below the reserved group ids.
    pub fn set_group_capacity(&mut self, capacity: usize) {
        self.group_capacity = capacity.min(usize::from(GroupId::FIRST_RESERVED));
    }

    #[must_use]
    pub const fn group_capacity(&self) -> usize {
        self.group_capacity
    }

    // ========================================================================
    // Read API
    // ========================================================================

    #[must_use]
    pub fn company(&self, id: CompanyId) -> Option<&Company> {
        self.companies.get(&id)
    }

    pub fn companies(&self) -> impl Iterator<Item = &Company> {
        self.companies.values()
    }

    #[must_use]
    pub fn town(&self, id: TownId) -> Option<&Town> {
        self.towns.get(&id)
    }

    pub fn towns(&self) -> impl Iterator<Item = &Town> {
        self.towns.values()
    }

    #[must_use]
    pub fn cargo(&self, id: CargoId) -> Option<&Cargo> {
        self.cargos.get(usize::from(id.0))
    }

    pub fn cargos(&self) -> impl Iterator<Item = &Cargo> {
        self.cargos.iter()
    }

    #[must_use]
    pub fn engine(&self, id: EngineId) -> Option<&Engine> {
        self.engines.get(&id)
    }

    pub fn engines(&self) -> impl Iterator<Item = &Engine> {
        self.engines.values()
    }

    #[must_use]
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    #[must_use]
    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Primary vehicles of one company and type, in domain order.
    pub fn primary_vehicles(
        &self,
        company: CompanyId,
        vehicle_type: VehicleType,
    ) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values().filter(move |v| {
            v.is_primary() && v.owner == company && v.vehicle_type == vehicle_type
        })
    }

    /// Units of a chain, primary first.
    pub fn chain(&self, primary: VehicleId) -> impl Iterator<Item = &Vehicle> {
        let units = self.chains.get(&primary).map(Vec::as_slice).unwrap_or(&[]);
        self.vehicles
            .get(&primary)
            .into_iter()
            .chain(units.iter().filter_map(move |id| self.vehicles.get(id)))
    }

    #[must_use]
    pub fn order_list(&self, id: OrderListId) -> Option<&OrderList> {
        self.order_lists.get(&id)
    }

    pub fn order_lists(&self) -> impl Iterator<Item = &OrderList> {
        self.order_lists.values()
    }

    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Groups of one company and vehicle type, in pool order.
    pub fn groups_of(
        &self,
        company: CompanyId,
        vehicle_type: VehicleType,
    ) -> impl Iterator<Item = &Group> {
        self.groups
            .values()
            .filter(move |g| g.owner == company && g.vehicle_type == vehicle_type)
    }

    /// Direct children of a group.
    pub fn child_groups(&self, parent: GroupId) -> impl Iterator<Item = &Group> {
        self.groups.values().filter(move |g| g.parent == Some(parent))
    }

    /// The group and all of its descendants, parents before children.
    #[must_use]
    pub fn group_subtree(&self, root: GroupId) -> Vec<GroupId> {
        let mut out = vec![root];
        let mut i = 0;
        while i < out.len() {
            let current = out[i];
            out.extend(self.child_groups(current).map(|g| g.id));
            i += 1;
        }
        out
    }

    /// True if `ancestor` appears on the parent chain of `group` (or is it).
    #[must_use]
    pub fn is_group_in_subtree(&self, group: GroupId, ancestor: GroupId) -> bool {
        let mut current = Some(group);
        let mut steps = 0usize;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.groups.len() {
                break;
            }
            current = self.groups.get(&id).and_then(|g| g.parent);
        }
        false
    }

    pub fn renewals(&self) -> impl Iterator<Item = &EngineRenewal> {
        self.renewals.iter()
    }

    /// Renewal rule that applies to a primary vehicle's engine, if any.
    #[must_use]
    pub fn renewal_for(&self, vehicle: &Vehicle) -> Option<&EngineRenewal> {
        let group = self.vehicle(vehicle.primary()).map_or(vehicle.group, |p| p.group);
        self.renewals.iter().find(|r| {
            r.company == vehicle.owner
                && r.from == vehicle.engine
                && (r.group == group || r.group == GroupId::ALL)
        })
    }

    /// Number of free group slots.
    #[must_use]
    pub fn free_group_slots(&self) -> usize {
        self.group_capacity.saturating_sub(self.groups.len())
    }

    // ========================================================================
    // Derived fields
    // ========================================================================

    /// Health of a vehicle's orders; vehicles without a list are `Empty`.
    #[must_use]
    pub fn order_list_type(&self, vehicle: &Vehicle) -> OrderListType {
        vehicle
            .order_list
            .and_then(|id| self.order_lists.get(&id))
            .map_or(OrderListType::Empty, OrderList::classify)
    }

    /// Stations a vehicle's orders visit, first visit order.
    #[must_use]
    pub fn destinations(&self, vehicle: &Vehicle) -> Vec<StationId> {
        vehicle
            .order_list
            .and_then(|id| self.order_lists.get(&id))
            .map(OrderList::unique_destinations)
            .unwrap_or_default()
    }

    /// Towns served by a vehicle's order destinations.
    #[must_use]
    pub fn served_towns(&self, vehicle: &Vehicle) -> BTreeSet<TownId> {
        self.destinations(vehicle)
            .into_iter()
            .filter_map(|s| self.stations.get(&s).map(|st| st.town))
            .collect()
    }

    /// Cargo a chain carries plus cargo its orders refit to.
    #[must_use]
    pub fn vehicle_cargo_types(&self, primary: &Vehicle) -> CargoTypes {
        let carried: CargoTypes = self
            .chain(primary.id)
            .filter_map(|unit| unit.cargo_type)
            .collect();
        let refits = primary
            .order_list
            .and_then(|id| self.order_lists.get(&id))
            .map_or(CargoTypes::EMPTY, OrderList::refit_cargos);
        carried.union(refits)
    }

    /// Display names of a cargo set, joined by `/`.
    #[must_use]
    pub fn cargo_names(&self, cargos: CargoTypes) -> String {
        cargos
            .iter()
            .filter_map(|c| self.cargo(c).map(|cargo| cargo.name.as_str()))
            .collect::<Vec<_>>()
            .join("/")
    }

    // ========================================================================
    // Mutation API
    // ========================================================================

    pub fn insert_cargo(&mut self, cargo: Cargo) -> Result<()> {
        if usize::from(cargo.id.0) != self.cargos.len() || self.cargos.len() >= NUM_CARGO {
            return Err(FleetError::invalid_argument(
                messages::UNKNOWN_CARGO,
                format!("cargo slots must be dense below {NUM_CARGO}, got {}", cargo.id),
            ));
        }
        self.cargos.push(cargo);
        Ok(())
    }

    pub fn insert_company(&mut self, company: Company) -> Result<()> {
        insert_unique(&mut self.companies, company.id, company)
    }

    pub(crate) fn company_mut(&mut self, id: CompanyId) -> Result<&mut Company> {
        self.companies
            .get_mut(&id)
            .or_invalid(messages::UNKNOWN_COMPANY, format!("{id}"))
    }

    pub(crate) fn remove_company(&mut self, id: CompanyId) -> Option<Company> {
        self.renewals.retain(|r| r.company != id);
        self.companies.remove(&id)
    }

    pub fn insert_town(&mut self, town: Town) -> Result<()> {
        insert_unique(&mut self.towns, town.id, town)
    }

    pub(crate) fn rename_town(&mut self, id: TownId, name: String) -> Result<()> {
        let town = self
            .towns
            .get_mut(&id)
            .or_invalid(messages::UNKNOWN_TOWN, format!("{id}"))?;
        town.name = name;
        Ok(())
    }

    pub fn insert_engine(&mut self, engine: Engine) -> Result<()> {
        insert_unique(&mut self.engines, engine.id, engine)
    }

    pub fn insert_station(&mut self, station: Station) -> Result<()> {
        self.company(station.owner)
            .or_invalid(messages::UNKNOWN_COMPANY, format!("owner of {}", station.id))?;
        self.town(station.town)
            .or_invalid(messages::UNKNOWN_TOWN, format!("town of {}", station.id))?;
        insert_unique(&mut self.stations, station.id, station)
    }

    pub(crate) fn rename_station(&mut self, id: StationId, name: String) -> Result<()> {
        let station = self
            .stations
            .get_mut(&id)
            .or_invalid(messages::UNKNOWN_STATION, format!("{id}"))?;
        station.name = name;
        Ok(())
    }

    pub(crate) fn remove_station(&mut self, id: StationId) -> Option<Station> {
        self.stations.remove(&id)
    }

    pub fn insert_order_list(&mut self, mut list: OrderList) -> Result<()> {
        self.check_orders(&list.orders)
            .with_context(|| format!("orders of {}", list.id))?;
        list.sharers.clear();
        insert_unique(&mut self.order_lists, list.id, list)
    }

    /// Every destination and refit cargo of `orders` must exist.
    pub fn check_orders(&self, orders: &[Order]) -> Result<()> {
        for order in orders {
            self.station(order.destination)
                .or_invalid(messages::UNKNOWN_STATION, format!("destination {}", order.destination))?;
            if let Some(cargo) = order.refit_cargo {
                self.cargo(cargo)
                    .or_invalid(messages::UNKNOWN_CARGO, format!("refit to {cargo}"))?;
            }
        }
        Ok(())
    }

    /// A list may only be shared within one owner and vehicle type.
    fn check_order_list_scope(
        &self,
        list: OrderListId,
        owner: CompanyId,
        vehicle_type: VehicleType,
    ) -> Result<()> {
        let order_list = self
            .order_list(list)
            .or_invalid(messages::UNKNOWN_ORDER_LIST, format!("{list}"))?;
        let foreign = order_list
            .sharers
            .iter()
            .filter_map(|id| self.vehicle(*id))
            .find(|v| v.owner != owner || v.vehicle_type != vehicle_type);
        match foreign {
            Some(other) => Err(FleetError::invalid_argument(
                messages::FOREIGN_SHARER,
                format!("{list} is shared by {} of {} ({})", other.id, other.owner, other.vehicle_type),
            )),
            None => Ok(()),
        }
    }

    /// Primary vehicles sharing orders with `vehicle` in its own owner and
    /// type scope, itself included, sorted by id.
    #[must_use]
    pub fn sharers_of(&self, vehicle: &Vehicle) -> Vec<VehicleId> {
        let mut sharers: Vec<VehicleId> = vehicle
            .order_list
            .and_then(|id| self.order_lists.get(&id))
            .map(|list| {
                list.sharers
                    .iter()
                    .filter_map(|id| self.vehicle(*id))
                    .filter(|v| v.owner == vehicle.owner && v.vehicle_type == vehicle.vehicle_type)
                    .map(|v| v.id)
                    .collect()
            })
            .unwrap_or_default();
        if !sharers.contains(&vehicle.id) {
            sharers.push(vehicle.id);
        }
        sharers.sort();
        sharers
    }

    pub(crate) fn order_list_mut(&mut self, id: OrderListId) -> Result<&mut OrderList> {
        self.order_lists
            .get_mut(&id)
            .or_invalid(messages::UNKNOWN_ORDER_LIST, format!("{id}"))
    }

    /// Insert a vehicle unit, linking it into its chain and order list.
    pub fn insert_vehicle(&mut self, vehicle: Vehicle) -> Result<()> {
        self.check_new_vehicle(&vehicle)?;
        match vehicle.head {
            Some(head) => {
                let primary = self
                    .vehicle(head)
                    .filter(|p| p.is_primary())
                    .or_invalid(messages::NOT_PRIMARY_VEHICLE, format!("head of {}", vehicle.id))?;
                check_unit_matches(&vehicle, primary)?;
                self.chains.entry(head).or_default().push(vehicle.id);
            }
            None => {
                if vehicle.group.is_real() {
                    self.check_group_scope(vehicle.group, vehicle.owner, vehicle.vehicle_type)?;
                }
                if let Some(list) = vehicle.order_list {
                    self.check_order_list_scope(list, vehicle.owner, vehicle.vehicle_type)?;
                    self.order_list_mut(list)?.sharers.push(vehicle.id);
                }
            }
        }
        self.vehicles.insert(vehicle.id, vehicle);
        Ok(())
    }

    /// Insert a primary vehicle with its units. Every unit is checked before
    /// anything is inserted, so a rejected chain leaves the world untouched.
    pub fn insert_chain(&mut self, primary: Vehicle, units: Vec<Vehicle>) -> Result<()> {
        if !primary.is_primary() {
            return Err(FleetError::invalid_argument(
                messages::NOT_PRIMARY_VEHICLE,
                format!("{} has a head", primary.id),
            ));
        }
        let mut seen = BTreeSet::from([primary.id]);
        for unit in &units {
            if unit.head != Some(primary.id) {
                return Err(FleetError::invalid_argument(
                    messages::NOT_PRIMARY_VEHICLE,
                    format!("{} is not attached to {}", unit.id, primary.id),
                ));
            }
            if !seen.insert(unit.id) {
                return Err(FleetError::invalid_argument(
                    messages::DUPLICATE_ID,
                    format!("{} appears twice in the chain", unit.id),
                ));
            }
            self.check_new_vehicle(unit)?;
            check_unit_matches(unit, &primary)?;
        }
        self.insert_vehicle(primary)?;
        for unit in units {
            self.insert_vehicle(unit)?;
        }
        Ok(())
    }

    fn check_new_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        if self.vehicles.contains_key(&vehicle.id) {
            return Err(FleetError::invalid_argument(
                messages::DUPLICATE_ID,
                format!("{} already exists", vehicle.id),
            ));
        }
        self.company(vehicle.owner)
            .or_invalid(messages::UNKNOWN_COMPANY, format!("owner of {}", vehicle.id))?;
        self.engine(vehicle.engine)
            .or_invalid(messages::UNKNOWN_ENGINE, format!("engine of {}", vehicle.id))?;
        if let Some(cargo) = vehicle.cargo_type {
            self.cargo(cargo)
                .or_invalid(messages::UNKNOWN_CARGO, format!("cargo of {}", vehicle.id))?;
        }
        Ok(())
    }

    /// Remove a single unit. Releases the order list when its last sharer leaves.
    pub(crate) fn remove_vehicle(&mut self, id: VehicleId) -> Option<Vehicle> {
        let vehicle = self.vehicles.remove(&id)?;
        match vehicle.head {
            Some(head) => {
                if let Some(units) = self.chains.get_mut(&head) {
                    units.retain(|u| *u != id);
                }
            }
            None => {
                self.chains.remove(&id);
                if let Some(list) = vehicle.order_list {
                    self.detach_order_list(id, list);
                }
            }
        }
        Some(vehicle)
    }

    pub(crate) fn vehicle_mut(&mut self, id: VehicleId) -> Result<&mut Vehicle> {
        self.vehicles
            .get_mut(&id)
            .or_invalid(messages::UNKNOWN_VEHICLE, format!("{id}"))
    }

    /// Point a primary vehicle at another order list (or none).
    pub(crate) fn assign_order_list(
        &mut self,
        vehicle: VehicleId,
        list: Option<OrderListId>,
    ) -> Result<()> {
        let (owner, vehicle_type) = self
            .vehicle(vehicle)
            .map(|v| (v.owner, v.vehicle_type))
            .or_invalid(messages::UNKNOWN_VEHICLE, format!("{vehicle}"))?;
        if let Some(new) = list {
            self.check_order_list_scope(new, owner, vehicle_type)?;
        }
        let old = self.vehicle_mut(vehicle)?.order_list;
        if old == list {
            return Ok(());
        }
        if let Some(old) = old {
            self.detach_order_list(vehicle, old);
        }
        if let Some(new) = list {
            self.order_list_mut(new)?.sharers.push(vehicle);
        }
        self.vehicle_mut(vehicle)?.order_list = list;
        Ok(())
    }

    fn detach_order_list(&mut self, vehicle: VehicleId, list: OrderListId) {
        let released = match self.order_lists.get_mut(&list) {
            Some(ol) => {
                ol.sharers.retain(|v| *v != vehicle);
                ol.sharers.is_empty()
            }
            None => false,
        };
        if released {
            tracing::debug!("Released {list}: last sharer {vehicle} left");
            self.order_lists.remove(&list);
        }
    }

    /// Lowest free group slot.
    pub(crate) fn allocate_group_id(&self) -> Result<GroupId> {
        (0..self.group_capacity)
            .filter_map(|i| u16::try_from(i).ok())
            .map(GroupId)
            .find(|id| !self.groups.contains_key(id))
            .ok_or_else(|| FleetError::pool_exhausted(1, 0))
    }

    pub fn insert_group(&mut self, group: Group) -> Result<()> {
        if !group.id.is_real() || usize::from(group.id.0) >= self.group_capacity {
            return Err(FleetError::invalid_argument(
                messages::CANNOT_CREATE_GROUP,
                format!("{} is outside the group pool", group.id),
            ));
        }
        self.company(group.owner)
            .or_invalid(messages::UNKNOWN_COMPANY, format!("owner of {}", group.id))?;
        insert_unique(&mut self.groups, group.id, group)
    }

    pub(crate) fn group_mut(&mut self, id: GroupId) -> Result<&mut Group> {
        self.groups
            .get_mut(&id)
            .or_invalid(messages::UNKNOWN_GROUP, format!("{id}"))
    }

    pub(crate) fn remove_group(&mut self, id: GroupId) -> Option<Group> {
        self.renewals.retain(|r| r.group != id);
        self.groups.remove(&id)
    }

    pub fn insert_renewal(&mut self, renewal: EngineRenewal) -> Result<()> {
        self.company(renewal.company)
            .or_invalid(messages::UNKNOWN_COMPANY, "renewal owner")?;
        let mut types = Vec::with_capacity(2);
        for engine in [renewal.from, renewal.to] {
            let engine = self
                .engine(engine)
                .or_invalid(messages::UNKNOWN_ENGINE, format!("renewal engine {engine}"))?;
            types.push(engine.vehicle_type);
        }
        if types[0] != types[1] {
            return Err(FleetError::invalid_argument(
                messages::VEHICLE_TYPE_MISMATCH,
                format!("cannot renew {} ({}) with {} ({})", renewal.from, types[0], renewal.to, types[1]),
            ));
        }
        if renewal.group == GroupId::NEW {
            return Err(FleetError::invalid_argument(
                messages::RESERVED_GROUP,
                format!("renewal rules cannot target {}", renewal.group),
            ));
        }
        if renewal.group.is_real() {
            self.check_group_scope(renewal.group, renewal.company, types[0])
                .with_context(|| format!("renewal group {}", renewal.group))?;
        }
        self.renewals
            .retain(|r| !(r.company == renewal.company && r.group == renewal.group && r.from == renewal.from));
        self.renewals.push(renewal);
        Ok(())
    }

    pub(crate) fn remove_renewal(&mut self, company: CompanyId, group: GroupId, from: EngineId) -> bool {
        let before = self.renewals.len();
        self.renewals
            .retain(|r| !(r.company == company && r.group == group && r.from == from));
        before != self.renewals.len()
    }

    /// Ensure `group` is a real group owned by `owner` for `vehicle_type`.
    pub fn check_group_scope(
        &self,
        group: GroupId,
        owner: CompanyId,
        vehicle_type: VehicleType,
    ) -> Result<&Group> {
        let g = self
            .group(group)
            .or_invalid(messages::UNKNOWN_GROUP, format!("{group}"))?;
        if g.owner != owner {
            return Err(FleetError::not_owner(format!("{group} belongs to {}", g.owner)));
        }
        if g.vehicle_type != vehicle_type {
            return Err(FleetError::invalid_argument(
                messages::VEHICLE_TYPE_MISMATCH,
                format!("{group} holds {} vehicles, not {vehicle_type}", g.vehicle_type),
            ));
        }
        Ok(g)
    }
}

fn insert_unique<K: Ord + Copy + std::fmt::Display, V>(
    map: &mut BTreeMap<K, V>,
    key: K,
    value: V,
) -> Result<()> {
    if map.contains_key(&key) {
        return Err(FleetError::invalid_argument(
            messages::DUPLICATE_ID,
            format!("{key} already exists"),
        ));
    }
    map.insert(key, value);
    Ok(())
}

fn check_unit_matches(unit: &Vehicle, primary: &Vehicle) -> Result<()> {
    if primary.owner != unit.owner || primary.vehicle_type != unit.vehicle_type {
        return Err(FleetError::invalid_argument(
            messages::VEHICLE_TYPE_MISMATCH,
            format!("{} does not match its head {}", unit.id, primary.id),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::small_world;
    use crate::model::Order;

    #[test]
    fn test_chain_lists_primary_first() {
        let world = small_world();
        let chain: Vec<_> = world.chain(VehicleId(10)).map(|v| v.id).collect();
        assert_eq!(chain, vec![VehicleId(10), VehicleId(11)]);
    }

    #[test]
    fn test_order_list_released_with_last_sharer() {
        let mut world = small_world();
        assert_eq!(world.order_list(OrderListId(1)).map(|l| l.sharers.len()), Some(2));

        world.remove_vehicle(VehicleId(1));
        assert!(world.order_list(OrderListId(1)).is_some());
        world.remove_vehicle(VehicleId(2));
        assert!(world.order_list(OrderListId(1)).is_none());
    }

    #[test]
    fn test_reassign_order_list() {
        let mut world = small_world();
        world
            .insert_order_list(OrderList::new(OrderListId(9), vec![Order::to(StationId(1))]))
            .unwrap();
        world.assign_order_list(VehicleId(3), Some(OrderListId(9))).unwrap();
        // order list 2 had a single sharer and is gone
        assert!(world.order_list(OrderListId(2)).is_none());
        assert_eq!(
            world.order_list(OrderListId(9)).unwrap().sharers,
            vec![VehicleId(3)]
        );
    }

    #[test]
    fn test_group_allocation_reuses_lowest_slot() {
        let mut world = small_world();
        world.set_group_capacity(3);
        let first = world.allocate_group_id().unwrap();
        assert_eq!(first, GroupId(0));
        world
            .insert_group(Group {
                id: first,
                owner: CompanyId(0),
                vehicle_type: VehicleType::Road,
                parent: None,
                name: None,
                replace_protection: false,
            })
            .unwrap();
        assert_eq!(world.allocate_group_id().unwrap(), GroupId(1));
        assert_eq!(world.free_group_slots(), 2);
    }

    #[test]
    fn test_served_towns_and_cargo_types() {
        let world = small_world();
        let v1 = world.vehicle(VehicleId(1)).unwrap();
        let towns = world.served_towns(v1);
        assert!(towns.contains(&TownId(0)));
        assert!(towns.contains(&TownId(1)));
        let cargos = world.vehicle_cargo_types(v1);
        assert!(cargos.contains(CargoId(0)));
    }

    #[test]
    fn test_order_lists_are_not_shared_across_scopes() {
        let mut world = small_world();
        let err = world
            .assign_order_list(VehicleId(10), Some(OrderListId(1)))
            .unwrap_err();
        assert_eq!(err.message_key(), Some(messages::FOREIGN_SHARER));
        assert_eq!(world.vehicle(VehicleId(10)).unwrap().order_list, None);

        let mut rival = crate::model::fixtures::road(20, 0, Some(CargoId(0)), 31, Some(1), 50, 0);
        rival.owner = CompanyId(1);
        let err = world.insert_vehicle(rival).unwrap_err();
        assert_eq!(err.message_key(), Some(messages::FOREIGN_SHARER));
        assert!(world.vehicle(VehicleId(20)).is_none());
        assert_eq!(
            world.order_list(OrderListId(1)).unwrap().sharers,
            vec![VehicleId(1), VehicleId(2)]
        );
    }

    #[test]
    fn test_sharers_of_includes_self() {
        let world = small_world();
        let bus = world.vehicle(VehicleId(2)).unwrap();
        assert_eq!(world.sharers_of(bus), vec![VehicleId(1), VehicleId(2)]);
        let train = world.vehicle(VehicleId(10)).unwrap();
        assert_eq!(world.sharers_of(train), vec![VehicleId(10)]);
    }

    #[test]
    fn test_orders_must_name_known_stations_and_cargos() {
        let mut world = small_world();
        let err = world
            .insert_order_list(OrderList::new(OrderListId(8), vec![Order::to(StationId(9))]))
            .unwrap_err();
        assert_eq!(err.message_key(), Some(messages::UNKNOWN_STATION));

        let refit = vec![Order::to(StationId(0)).with_refit(CargoId(66))];
        let err = world
            .insert_order_list(OrderList::new(OrderListId(8), refit))
            .unwrap_err();
        assert_eq!(err.message_key(), Some(messages::UNKNOWN_CARGO));
        assert!(world.order_list(OrderListId(8)).is_none());
    }

    #[test]
    fn test_rejected_chain_keeps_existing_order_list() {
        let mut world = small_world();
        world
            .insert_order_list(OrderList::new(OrderListId(9), vec![Order::to(StationId(1))]))
            .unwrap();
        let primary = crate::model::fixtures::road(40, 0, None, 0, Some(9), 0, 0);
        let mut trailer = crate::model::fixtures::road(41, 7, None, 0, None, 0, 0);
        trailer.head = Some(VehicleId(40));

        let err = world.insert_chain(primary, vec![trailer]).unwrap_err();
        assert_eq!(err.message_key(), Some(messages::UNKNOWN_ENGINE));
        assert!(world.vehicle(VehicleId(40)).is_none());
        let list = world.order_list(OrderListId(9)).expect("list survives");
        assert!(list.sharers.is_empty());
    }

    #[test]
    fn test_renewal_rules_are_checked() {
        let mut world = small_world();
        let renewal = |group, from, to| EngineRenewal {
            company: CompanyId(0),
            group,
            from: EngineId(from),
            to: EngineId(to),
        };

        let err = world.insert_renewal(renewal(GroupId::NEW, 0, 1)).unwrap_err();
        assert_eq!(err.message_key(), Some(messages::RESERVED_GROUP));
        let err = world.insert_renewal(renewal(GroupId::DEFAULT, 0, 2)).unwrap_err();
        assert_eq!(err.message_key(), Some(messages::VEHICLE_TYPE_MISMATCH));

        world
            .insert_group(Group {
                id: GroupId(0),
                owner: CompanyId(0),
                vehicle_type: VehicleType::Rail,
                parent: None,
                name: None,
                replace_protection: false,
            })
            .unwrap();
        let err = world.insert_renewal(renewal(GroupId(0), 0, 1)).unwrap_err();
        assert_eq!(err.message_key(), Some(messages::VEHICLE_TYPE_MISMATCH));
        world.insert_renewal(renewal(GroupId(0), 2, 2)).unwrap();
        assert_eq!(world.renewals().count(), 1);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut world = small_world();
        let dup = world.company(CompanyId(0)).cloned().unwrap();
        let err = world.insert_company(dup).unwrap_err();
        assert_eq!(err.message_key(), Some(messages::DUPLICATE_ID));
    }
}
