//! A running game session: the world plus every derived index.
//!
//! All domain mutations go through [`Session`] so that the statistics
//! aggregator, the open filter models and the catchment overlay observe
//! each change exactly once. Events are dispatched after the world has
//! been updated.

use crate::catchment::CatchmentController;
use crate::config::AppConfig;
use crate::error::{messages, FleetError, OptionContext, Result};
use crate::filter::{
    AxisMask, Candidate, ClickMode, ElementId, ElementState, FilterAxis, FilterIndex, FilterModel,
    IndexUpdate, ModelHandle,
};
use crate::groups::{CommandMode, CommandOutcome, GroupCommand, GroupCommandExecutor};
use crate::model::{
    Colour, Company, CompanyId, DomainEvent, EngineId, EngineRenewal, GroupId, Order, OrderListId,
    Scenario, Station, StationId, Town, TownId, Vehicle, VehicleId, VehicleType, World,
};
use crate::stats::{BucketKey, GroupStatistics, StatisticsAggregator};

#[derive(Debug)]
pub struct Session {
    config: AppConfig,
    world: World,
    stats: StatisticsAggregator,
    filters: FilterIndex,
    catchment: CatchmentController,
}

impl Session {
    /// Start a session over an existing world and run the global rebuild.
    #[must_use]
    pub fn new(world: World, config: AppConfig) -> Self {
        let mut stats = StatisticsAggregator::new(config.statistics.profit_min_age_days);
        stats.update_after_load(&world);
        let mut catchment = CatchmentController::from_config(&config.catchment, None);
        catchment.build(&world);
        Self {
            config,
            world,
            stats,
            filters: FilterIndex::new(),
            catchment,
        }
    }

    /// Load a scenario. Its own group capacity wins over the configured one.
    pub fn from_scenario(mut scenario: Scenario, config: AppConfig) -> Result<Self> {
        scenario
            .group_capacity
            .get_or_insert(config.groups.pool_capacity);
        let world = scenario.into_world()?;
        Ok(Self::new(world, config))
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    #[must_use]
    pub const fn stats(&self) -> &StatisticsAggregator {
        &self.stats
    }

    #[must_use]
    pub const fn catchment(&self) -> &CatchmentController {
        &self.catchment
    }

    #[must_use]
    pub fn group_statistics(
        &self,
        company: CompanyId,
        group: GroupId,
        vehicle_type: VehicleType,
    ) -> &GroupStatistics {
        self.stats.get(company, group, vehicle_type)
    }

    /// Buckets whose incremental state disagrees with a fresh rebuild.
    #[must_use]
    pub fn divergence(&self) -> Vec<BucketKey> {
        self.stats.divergence(&self.world)
    }

    // ========================================================================
    // Filter models
    // ========================================================================

    /// Build and register a model for a new listing window.
    pub fn open_model(&mut self, mask: AxisMask, list_owner: Option<CompanyId>) -> ModelHandle {
        let mut model = FilterModel::new(mask, list_owner);
        model.build(&self.world);
        self.filters.register(model)
    }

    pub fn close_model(&mut self, handle: ModelHandle) -> Result<FilterModel> {
        self.filters.deregister(handle)
    }

    pub fn model(&self, handle: ModelHandle) -> Result<&FilterModel> {
        self.filters.model(handle)
    }

    pub fn toggle(
        &mut self,
        handle: ModelHandle,
        axis: FilterAxis,
        id: ElementId,
        mode: ClickMode,
    ) -> Result<ElementState> {
        self.filters.model_mut(handle)?.toggle(axis, id, mode)
    }

    pub fn reset_model(&mut self, handle: ModelHandle) -> Result<()> {
        self.filters.model_mut(handle)?.reset();
        Ok(())
    }

    /// Primary vehicles of one type a model admits, in domain order.
    pub fn filtered_vehicles(
        &self,
        handle: ModelHandle,
        vehicle_type: VehicleType,
    ) -> Result<Vec<VehicleId>> {
        let model = self.filters.model(handle)?;
        Ok(self
            .world
            .vehicles()
            .filter(|v| v.is_primary() && v.vehicle_type == vehicle_type)
            .filter(|v| model.include(&self.world, Candidate::Vehicle(v)))
            .map(|v| v.id)
            .collect())
    }

    /// Stations a model admits, in domain order.
    pub fn filtered_stations(&self, handle: ModelHandle) -> Result<Vec<StationId>> {
        let model = self.filters.model(handle)?;
        Ok(self
            .world
            .stations()
            .filter(|s| model.include(&self.world, Candidate::Station(s)))
            .map(|s| s.id)
            .collect())
    }

    pub fn toggle_catchment(
        &mut self,
        axis: FilterAxis,
        id: ElementId,
        mode: ClickMode,
    ) -> Result<ElementState> {
        self.catchment.toggle(&self.world, axis, id, mode)
    }

    pub fn reset_catchment(&mut self) {
        self.catchment.reset(&self.world);
    }

    fn dispatch(&mut self, event: DomainEvent) -> Result<IndexUpdate> {
        self.filters
            .dispatch(&self.world, &mut self.catchment, &event)
    }

    // ========================================================================
    // Companies, towns and stations
    // ========================================================================

    pub fn create_company(&mut self, company: Company) -> Result<IndexUpdate> {
        let id = company.id;
        self.world.insert_company(company)?;
        self.stats.ensure_company(id);
        self.dispatch(DomainEvent::CompanyCreated { company: id })
    }

    pub fn rename_company(
        &mut self,
        id: CompanyId,
        name: Option<String>,
        colour: Option<Colour>,
    ) -> Result<IndexUpdate> {
        let company = self.world.company_mut(id)?;
        if let Some(name) = name {
            company.name = name;
        }
        if let Some(colour) = colour {
            company.colour = colour;
        }
        self.dispatch(DomainEvent::CompanyRenamed { company: id })
    }

    /// Close a company: sell its vehicles, drop its groups and stations.
    pub fn destroy_company(&mut self, id: CompanyId) -> Result<IndexUpdate> {
        self.world
            .company(id)
            .or_invalid(messages::UNKNOWN_COMPANY, format!("{id}"))?;
        let vehicles: Vec<VehicleId> = self
            .world
            .vehicles()
            .filter(|v| v.owner == id && v.is_primary())
            .map(|v| v.id)
            .collect();
        for vehicle in vehicles {
            self.sell_vehicle(vehicle)?;
        }
        let groups: Vec<GroupId> = self
            .world
            .groups()
            .filter(|g| g.owner == id)
            .map(|g| g.id)
            .collect();
        for group in groups {
            self.world.remove_group(group);
        }
        let stations: Vec<StationId> = self
            .world
            .stations()
            .filter(|s| s.owner == id)
            .map(|s| s.id)
            .collect();
        let mut update = IndexUpdate::default();
        for station in stations {
            merge(&mut update, self.remove_station(station)?);
        }
        self.world.remove_company(id);
        self.stats.purge_company(id);
        tracing::info!("Closed {id}");
        merge(&mut update, self.dispatch(DomainEvent::CompanyDestroyed { company: id })?);
        Ok(update)
    }

    pub fn create_town(&mut self, town: Town) -> Result<IndexUpdate> {
        let id = town.id;
        self.world.insert_town(town)?;
        self.dispatch(DomainEvent::TownCreated { town: id })
    }

    pub fn rename_town(&mut self, id: TownId, name: impl Into<String>) -> Result<IndexUpdate> {
        self.world.rename_town(id, name.into())?;
        self.dispatch(DomainEvent::TownRenamed { town: id })
    }

    /// Towns are never destroyed; this always reports an invariant violation.
    pub fn destroy_town(&mut self, id: TownId) -> Result<IndexUpdate> {
        self.dispatch(DomainEvent::TownDestroyed { town: id })
    }

    pub fn build_station(&mut self, station: Station) -> Result<IndexUpdate> {
        let id = station.id;
        self.world.insert_station(station)?;
        self.dispatch(DomainEvent::StationCreated { station: id })
    }

    pub fn rename_station(&mut self, id: StationId, name: impl Into<String>) -> Result<IndexUpdate> {
        self.world.rename_station(id, name.into())?;
        self.dispatch(DomainEvent::StationRenamed { station: id })
    }

    pub fn remove_station(&mut self, id: StationId) -> Result<IndexUpdate> {
        self.world
            .remove_station(id)
            .or_invalid(messages::UNKNOWN_STATION, format!("{id}"))?;
        self.dispatch(DomainEvent::StationDestroyed { station: id })
    }

    // ========================================================================
    // Vehicles
    // ========================================================================

    /// Build a vehicle: the primary unit first, then its attached units.
    pub fn build_vehicle(&mut self, primary: Vehicle, units: Vec<Vehicle>) -> Result<()> {
        let id = primary.id;
        self.world.insert_chain(primary, units)?;
        self.count_chain(id, 1)?;
        let owner = self.world.vehicle(id).map(|v| v.owner);
        if let Some(owner) = owner {
            self.stats.update_autoreplace(&self.world, owner);
        }
        self.dispatch(DomainEvent::VehicleCreated { vehicle: id })?;
        Ok(())
    }

    /// Attach one more unit to an existing chain.
    pub fn attach_unit(&mut self, unit: Vehicle) -> Result<()> {
        let head = unit
            .head
            .or_invalid(messages::NOT_PRIMARY_VEHICLE, format!("{} has no head", unit.id))?;
        self.count_chain(head, -1)?;
        let inserted = self.world.insert_vehicle(unit);
        self.count_chain(head, 1)?;
        inserted?;
        let owner = self.world.vehicle(head).map(|v| v.owner);
        if let Some(owner) = owner {
            self.stats.update_autoreplace(&self.world, owner);
        }
        Ok(())
    }

    /// Sell a primary vehicle and every unit attached to it.
    pub fn sell_vehicle(&mut self, id: VehicleId) -> Result<()> {
        let vehicle = self.primary(id)?;
        let owner = vehicle.owner;
        self.count_chain(id, -1)?;
        let units: Vec<VehicleId> = self.world.chain(id).map(|v| v.id).collect();
        for unit in units.into_iter().rev() {
            self.world.remove_vehicle(unit);
        }
        self.stats.update_autoreplace(&self.world, owner);
        self.dispatch(DomainEvent::VehicleDestroyed { vehicle: id })?;
        Ok(())
    }

    /// Age a primary vehicle, crossing the profit threshold as needed.
    pub fn set_vehicle_age(&mut self, id: VehicleId, age_days: u32) -> Result<()> {
        let counted = self.stats.counts_profit(self.primary(id)?);
        self.world.vehicle_mut(id)?.age_days = age_days;
        let vehicle = self.primary(id)?.clone();
        match (counted, self.stats.counts_profit(&vehicle)) {
            (false, true) => self.stats.vehicle_reached_profit_age(&self.world, &vehicle, 1),
            (true, false) => self.stats.vehicle_reached_profit_age(&self.world, &vehicle, -1),
            _ => {}
        }
        Ok(())
    }

    /// Load or unload cargo on one unit.
    pub fn set_cargo_stored(&mut self, unit: VehicleId, amount: u32) -> Result<()> {
        let vehicle = self.world.vehicle_mut(unit)?;
        let old = vehicle.cargo_stored;
        let new = amount.min(vehicle.cargo_cap);
        vehicle.cargo_stored = new;
        let vehicle = vehicle.clone();
        self.stats.update_cargo_stored(&self.world, &vehicle, old, new);
        Ok(())
    }

    pub fn earn(&mut self, id: VehicleId, amount: i64) -> Result<()> {
        self.world.vehicle_mut(id)?.profit_this_year += amount;
        Ok(())
    }

    /// Roll this year's profits over and recompute profit statistics.
    pub fn end_of_year(&mut self) {
        let ids: Vec<VehicleId> = self.world.vehicles().map(|v| v.id).collect();
        for id in ids {
            if let Ok(vehicle) = self.world.vehicle_mut(id) {
                vehicle.profit_last_year = vehicle.profit_this_year;
                vehicle.profit_this_year = 0;
            }
        }
        self.stats.update_profits(&self.world);
        tracing::info!("Year end: profits rolled over for {} vehicles", self.world.vehicles().count());
    }

    // ========================================================================
    // Orders and renewals
    // ========================================================================

    /// Point a primary vehicle at another order list, or at none.
    pub fn set_order_list(&mut self, id: VehicleId, list: Option<OrderListId>) -> Result<()> {
        self.primary(id)?;
        if let Some(list) = list {
            self.world
                .order_list(list)
                .or_invalid(messages::UNKNOWN_ORDER_LIST, format!("{list}"))?;
        }
        self.count_chain(id, -1)?;
        let assigned = self.world.assign_order_list(id, list);
        self.count_chain(id, 1)?;
        assigned
    }

    /// Replace the orders of a list and refresh every bucket its sharers live in.
    pub fn edit_orders(&mut self, list: OrderListId, orders: Vec<Order>) -> Result<()> {
        self.world.check_orders(&orders)?;
        self.world.order_list_mut(list)?.orders = orders;
        self.stats.order_list_changed(&self.world, list);
        self.dispatch(DomainEvent::OrderListMutated { order_list: list })?;
        Ok(())
    }

    pub fn set_renewal(&mut self, renewal: EngineRenewal) -> Result<()> {
        let company = renewal.company;
        self.world.insert_renewal(renewal)?;
        self.stats.update_autoreplace(&self.world, company);
        Ok(())
    }

    pub fn remove_renewal(&mut self, company: CompanyId, group: GroupId, from: EngineId) -> bool {
        let removed = self.world.remove_renewal(company, group, from);
        if removed {
            self.stats.update_autoreplace(&self.world, company);
        }
        removed
    }

    // ========================================================================
    // Group commands
    // ========================================================================

    pub fn execute(
        &mut self,
        actor: CompanyId,
        command: &GroupCommand,
        mode: CommandMode,
    ) -> Result<CommandOutcome> {
        let max_name_chars = self.config.groups.max_name_chars;
        let outcome = GroupCommandExecutor::new(&mut self.world, &mut self.stats, max_name_chars)
            .execute(actor, command, mode)?;
        for event in &outcome.events {
            self.dispatch(*event)?;
        }
        Ok(outcome)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn primary(&self, id: VehicleId) -> Result<&Vehicle> {
        let vehicle = self
            .world
            .vehicle(id)
            .or_invalid(messages::UNKNOWN_VEHICLE, format!("{id}"))?;
        if !vehicle.is_primary() {
            return Err(FleetError::invalid_argument(
                messages::NOT_PRIMARY_VEHICLE,
                format!("{id} is attached to {}", vehicle.primary()),
            ));
        }
        Ok(vehicle)
    }

    /// Count a whole chain in or out of its bucket.
    fn count_chain(&mut self, primary: VehicleId, delta: i32) -> Result<()> {
        let vehicle = self.primary(primary)?.clone();
        self.stats.count_vehicle(&self.world, &vehicle, delta);
        for unit in self.world.chain(primary) {
            self.stats.count_engine(&self.world, unit, delta);
        }
        Ok(())
    }
}

fn merge(into: &mut IndexUpdate, other: IndexUpdate) {
    for handle in other.redraw {
        if !into.redraw.contains(&handle) {
            into.redraw.push(handle);
        }
    }
    into.catchment_dirty |= other.catchment_dirty;
}
