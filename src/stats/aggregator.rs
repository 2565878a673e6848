//! Incremental group statistics.
//!
//! Every `(company, vehicle type)` has an `all` bucket and a `default`
//! bucket; every user group has its own. A vehicle contributes to exactly
//! one group-or-default bucket plus the `all` bucket of its company and type.
//!
//! Incremental updates must never diverge from [`StatisticsAggregator::update_after_load`],
//! which is the definitional state. [`StatisticsAggregator::divergence`]
//! compares the two.

use super::bucket::{adjust, BucketKey, GroupStatistics, ProfitRecord};
use crate::model::{
    CargoTypes, CompanyId, GroupId, OrderListId, OrderListType, Vehicle, VehicleId, VehicleType,
    World,
};
use std::collections::{BTreeMap, HashMap};

/// Default age, in days, after which a vehicle's profit is counted.
pub const DEFAULT_PROFIT_MIN_AGE_DAYS: u32 = 730;

static EMPTY_BUCKET: GroupStatistics = GroupStatistics::EMPTY;

#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    buckets: HashMap<BucketKey, GroupStatistics>,
    profit_min_age_days: u32,
}

impl Default for StatisticsAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_PROFIT_MIN_AGE_DAYS)
    }
}

impl StatisticsAggregator {
    #[must_use]
    pub fn new(profit_min_age_days: u32) -> Self {
        Self {
            buckets: HashMap::new(),
            profit_min_age_days,
        }
    }

    #[must_use]
    pub const fn profit_min_age_days(&self) -> u32 {
        self.profit_min_age_days
    }

    /// True if the vehicle's profit counts towards profit statistics.
    #[must_use]
    pub const fn counts_profit(&self, vehicle: &Vehicle) -> bool {
        vehicle.age_days > self.profit_min_age_days
    }

    /// Read a bucket. Unknown buckets read as empty.
    #[must_use]
    pub fn get(
        &self,
        company: CompanyId,
        group: GroupId,
        vehicle_type: VehicleType,
    ) -> &GroupStatistics {
        self.buckets
            .get(&BucketKey::new(company, group, vehicle_type))
            .unwrap_or(&EMPTY_BUCKET)
    }

    /// Buckets that differ from an empty bucket, in key order.
    #[must_use]
    pub fn non_empty_buckets(&self) -> BTreeMap<BucketKey, &GroupStatistics> {
        self.buckets
            .iter()
            .filter(|(_, stats)| **stats != GroupStatistics::EMPTY)
            .map(|(key, stats)| (*key, stats))
            .collect()
    }

    /// Vehicles in a group and all of its sub-groups.
    #[must_use]
    pub fn num_vehicle_recursive(&self, world: &World, company: CompanyId, group: GroupId) -> u32 {
        self.sum_subtree(world, company, group, |s| i64::from(s.num_vehicle))
            .try_into()
            .unwrap_or(u32::MAX)
    }

    /// Last year's profit of a group and all of its sub-groups.
    #[must_use]
    pub fn profit_last_year_recursive(
        &self,
        world: &World,
        company: CompanyId,
        group: GroupId,
    ) -> i64 {
        self.sum_subtree(world, company, group, |s| s.profit_last_year)
    }

    fn sum_subtree(
        &self,
        world: &World,
        company: CompanyId,
        group: GroupId,
        f: impl Fn(&GroupStatistics) -> i64,
    ) -> i64 {
        let Some(vehicle_type) = world.group(group).map(|g| g.vehicle_type) else {
            return 0;
        };
        world
            .group_subtree(group)
            .into_iter()
            .map(|g| f(self.get(company, g, vehicle_type)))
            .sum()
    }

    // ========================================================================
    // Bucket lifecycle
    // ========================================================================

    /// Make sure the synthetic buckets of a company exist.
    pub fn ensure_company(&mut self, company: CompanyId) {
        for vehicle_type in VehicleType::ALL {
            for group in [GroupId::ALL, GroupId::DEFAULT] {
                self.buckets
                    .entry(BucketKey::new(company, group, vehicle_type))
                    .or_default();
            }
        }
    }

    pub fn add_group(&mut self, company: CompanyId, group: GroupId, vehicle_type: VehicleType) {
        self.buckets
            .entry(BucketKey::new(company, group, vehicle_type))
            .or_default();
    }

    /// Drop a group bucket. The group must already be empty.
    pub fn remove_group(&mut self, company: CompanyId, group: GroupId, vehicle_type: VehicleType) {
        if let Some(stats) = self.buckets.remove(&BucketKey::new(company, group, vehicle_type)) {
            debug_assert_eq!(stats.num_vehicle, 0, "removed group bucket still holds vehicles");
        }
    }

    pub fn purge_company(&mut self, company: CompanyId) {
        self.buckets.retain(|key, _| key.company != company);
    }

    // ========================================================================
    // Global rebuild
    // ========================================================================

    /// Recompute every bucket from the world.
    pub fn update_after_load(&mut self, world: &World) {
        self.buckets.clear();
        for company in world.companies() {
            self.ensure_company(company.id);
        }
        for group in world.groups() {
            self.add_group(group.owner, group.id, group.vehicle_type);
        }
        for vehicle in world.vehicles() {
            if vehicle.is_primary() {
                self.count_vehicle(world, vehicle, 1);
            }
            if vehicle.engine_countable {
                self.count_engine(world, vehicle, 1);
            }
        }
        for company in world.companies() {
            self.update_autoreplace(world, company.id);
        }
        let scopes: Vec<_> = world
            .companies()
            .flat_map(|c| VehicleType::ALL.into_iter().map(move |vt| (c.id, vt)))
            .collect();
        for (company, vehicle_type) in scopes {
            self.update_cargo(world, company, GroupId::ALL, vehicle_type);
        }
        tracing::info!(
            "Rebuilt group statistics: {} buckets from {} vehicles",
            self.buckets.len(),
            world.vehicles().count()
        );
    }

    /// Recompute only the buckets of one company and type.
    pub fn rebuild_scope(&mut self, world: &World, company: CompanyId, vehicle_type: VehicleType) {
        self.buckets
            .retain(|key, _| !(key.company == company && key.vehicle_type == vehicle_type));
        self.ensure_company(company);
        for group in world.groups_of(company, vehicle_type) {
            self.add_group(company, group.id, vehicle_type);
        }
        for vehicle in world.vehicles().filter(|v| v.owner == company && v.vehicle_type == vehicle_type) {
            if vehicle.is_primary() {
                self.count_vehicle(world, vehicle, 1);
            }
            if vehicle.engine_countable {
                self.count_engine(world, vehicle, 1);
            }
        }
        self.update_cargo(world, company, GroupId::ALL, vehicle_type);
        self.update_autoreplace(world, company);
    }

    /// Bucket keys whose incremental state differs from a fresh rebuild.
    #[must_use]
    pub fn divergence(&self, world: &World) -> Vec<BucketKey> {
        let mut fresh = Self::new(self.profit_min_age_days);
        fresh.update_after_load(world);
        let ours = self.non_empty_buckets();
        let theirs = fresh.non_empty_buckets();
        let mut keys: Vec<_> = ours.keys().chain(theirs.keys()).copied().collect();
        keys.sort();
        keys.dedup();
        keys.retain(|k| ours.get(k) != theirs.get(k));
        keys
    }

    // ========================================================================
    // Incremental updates
    // ========================================================================

    /// Add (`delta = 1`) or remove (`delta = -1`) a primary vehicle.
    ///
    /// Call with `-1` while the vehicle is still in its old bucket and with
    /// `+1` once it is in the new one.
    pub fn count_vehicle(&mut self, world: &World, vehicle: &Vehicle, delta: i32) {
        debug_assert!(vehicle.is_primary());
        let key = bucket_of(vehicle);
        let counts_profit = self.counts_profit(vehicle);
        let health = world.order_list_type(vehicle);
        let cargo_types = world.vehicle_cargo_types(vehicle);
        let exclude = (delta < 0).then_some(vehicle.id);

        for key in [key, key.all()] {
            let stats = self.buckets.entry(key).or_default();
            stats.num_vehicle = add_signed(stats.num_vehicle, delta);

            for unit in world.chain(vehicle.id) {
                if let Some(cargo) = unit.cargo_type {
                    adjust(&mut stats.max_cargo, cargo, i64::from(unit.cargo_cap) * i64::from(delta));
                    adjust(&mut stats.act_cargo, cargo, i64::from(unit.cargo_stored) * i64::from(delta));
                }
            }

            if delta > 0 {
                if let Some(list) = vehicle.order_list {
                    stats.order_lists.insert(list);
                }
                stats.ol_type = stats.ol_type.merge(health);
                stats.cargo_types = stats.cargo_types.union(cargo_types);
            }

            if counts_profit {
                self.apply_profit(world, key, vehicle, delta);
            }

            if delta < 0 {
                self.drop_order_list(world, key, vehicle, exclude);
                self.rescan_cargo_types(world, key, exclude);
            }
        }
    }

    /// Add or remove an engine-countable unit from the engine histogram.
    pub fn count_engine(&mut self, world: &World, unit: &Vehicle, delta: i32) {
        if !unit.engine_countable {
            return;
        }
        let Some(key) = world.vehicle(unit.primary()).map(bucket_of) else {
            return;
        };
        for key in [key, key.all()] {
            let stats = self.buckets.entry(key).or_default();
            adjust(&mut stats.num_engines, unit.engine, i64::from(delta));
        }
    }

    /// A primary vehicle crossed the profit age threshold (`+1`), or fell
    /// back below it (`-1`).
    pub fn vehicle_reached_profit_age(&mut self, world: &World, vehicle: &Vehicle, delta: i32) {
        let key = bucket_of(vehicle);
        for key in [key, key.all()] {
            self.apply_profit(world, key, vehicle, delta);
        }
    }

    /// Stored cargo of one unit changed from `old` to `new`.
    pub fn update_cargo_stored(&mut self, world: &World, unit: &Vehicle, old: u32, new: u32) {
        let (Some(cargo), Some(key)) = (unit.cargo_type, world.vehicle(unit.primary()).map(bucket_of))
        else {
            return;
        };
        let delta = i64::from(new) - i64::from(old);
        for key in [key, key.all()] {
            let stats = self.buckets.entry(key).or_default();
            adjust(&mut stats.act_cargo, cargo, delta);
        }
    }

    /// Recompute cargo counters and cargo types of one bucket from scratch.
    pub fn update_cargo(
        &mut self,
        world: &World,
        company: CompanyId,
        group: GroupId,
        vehicle_type: VehicleType,
    ) {
        let key = BucketKey::new(company, group, vehicle_type);
        let mut act = BTreeMap::new();
        let mut max = BTreeMap::new();
        let mut cargo_types = CargoTypes::EMPTY;
        for primary in members(world, key, None) {
            cargo_types = cargo_types.union(world.vehicle_cargo_types(primary));
            for unit in world.chain(primary.id) {
                if let Some(cargo) = unit.cargo_type {
                    adjust(&mut max, cargo, i64::from(unit.cargo_cap));
                    adjust(&mut act, cargo, i64::from(unit.cargo_stored));
                }
            }
        }
        let stats = self.buckets.entry(key).or_default();
        stats.clear_cargo();
        stats.act_cargo = act;
        stats.max_cargo = max;
        stats.cargo_types = cargo_types;
    }

    /// Refresh autoreplace flags of every bucket of a company.
    pub fn update_autoreplace(&mut self, world: &World, company: CompanyId) {
        for (_, stats) in self.buckets.iter_mut().filter(|(k, _)| k.company == company) {
            stats.autoreplace_defined = false;
            stats.autoreplace_finished = true;
        }
        for renewal in world.renewals().filter(|r| r.company == company) {
            let Some(engine) = world.engine(renewal.from) else {
                continue;
            };
            let key = BucketKey::new(company, renewal.group, engine.vehicle_type);
            let stats = self.buckets.entry(key).or_default();
            stats.autoreplace_defined = true;
            if stats.num_engines(renewal.from) > 0 {
                stats.autoreplace_finished = false;
            }
        }
    }

    /// Year end: profits were rolled over, recompute every profit field.
    pub fn update_profits(&mut self, world: &World) {
        for stats in self.buckets.values_mut() {
            stats.clear_profit();
        }
        let min_age = self.profit_min_age_days;
        for vehicle in world
            .vehicles()
            .filter(|v| v.is_primary() && v.age_days > min_age)
        {
            let key = bucket_of(vehicle);
            for key in [key, key.all()] {
                let stats = self.buckets.entry(key).or_default();
                stats.num_profit_vehicle += 1;
                stats.profit_last_year += vehicle.profit_last_year;
                stats.offer_min_profit(profit_record(vehicle));
            }
        }
    }

    /// Orders of a list changed: refresh cargo types and health of every
    /// bucket one of its sharers lives in.
    pub fn order_list_changed(&mut self, world: &World, list: OrderListId) {
        let Some(order_list) = world.order_list(list) else {
            return;
        };
        let mut keys: Vec<BucketKey> = order_list
            .sharers
            .iter()
            .filter_map(|id| world.vehicle(*id))
            .flat_map(|v| {
                let key = bucket_of(v);
                [key, key.all()]
            })
            .collect();
        keys.sort();
        keys.dedup();
        for key in keys {
            tracing::debug!("Order list {list} changed, rescanning {key}");
            self.rescan_cargo_types(world, key, None);
            self.rescan_ol_type(world, key, None);
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn apply_profit(&mut self, world: &World, key: BucketKey, vehicle: &Vehicle, delta: i32) {
        let stats = self.buckets.entry(key).or_default();
        stats.num_profit_vehicle = add_signed(stats.num_profit_vehicle, delta);
        stats.profit_last_year += vehicle.profit_last_year * i64::from(delta);
        if delta > 0 {
            stats.offer_min_profit(profit_record(vehicle));
        } else if stats.min_profit_vehicle.is_some_and(|m| m.vehicle == vehicle.id) {
            self.rescan_min_profit(world, key, Some(vehicle.id));
        }
    }

    fn rescan_min_profit(&mut self, world: &World, key: BucketKey, exclude: Option<VehicleId>) {
        let min = members(world, key, exclude)
            .filter(|v| self.counts_profit(v))
            .map(profit_record)
            .min();
        tracing::debug!("Rescanned minimum profit of {key}: {min:?}");
        if let Some(stats) = self.buckets.get_mut(&key) {
            stats.min_profit_vehicle = min;
        }
    }

    fn rescan_cargo_types(&mut self, world: &World, key: BucketKey, exclude: Option<VehicleId>) {
        let cargo_types = members(world, key, exclude)
            .fold(CargoTypes::EMPTY, |acc, v| acc.union(world.vehicle_cargo_types(v)));
        if let Some(stats) = self.buckets.get_mut(&key) {
            stats.cargo_types = cargo_types;
        }
    }

    fn rescan_ol_type(&mut self, world: &World, key: BucketKey, exclude: Option<VehicleId>) {
        let ol_type = members(world, key, exclude)
            .fold(OrderListType::Ok, |acc, v| acc.merge(world.order_list_type(v)));
        if let Some(stats) = self.buckets.get_mut(&key) {
            stats.ol_type = ol_type;
        }
    }

    /// A vehicle leaves `key`: forget its order list unless another member
    /// still shares it, and rescan health if it defined the bucket's worst.
    fn drop_order_list(
        &mut self,
        world: &World,
        key: BucketKey,
        vehicle: &Vehicle,
        exclude: Option<VehicleId>,
    ) {
        if let Some(list) = vehicle.order_list {
            let still_shared = members(world, key, exclude).any(|v| v.order_list == Some(list));
            if !still_shared {
                if let Some(stats) = self.buckets.get_mut(&key) {
                    stats.order_lists.remove(&list);
                }
            }
        }
        let health = world.order_list_type(vehicle);
        if self.buckets.get(&key).is_some_and(|s| s.ol_type == health) {
            self.rescan_ol_type(world, key, exclude);
        }
    }
}

/// The group-or-default bucket of a primary vehicle.
fn bucket_of(vehicle: &Vehicle) -> BucketKey {
    let group = if vehicle.group.is_real() {
        vehicle.group
    } else {
        GroupId::DEFAULT
    };
    BucketKey::new(vehicle.owner, group, vehicle.vehicle_type)
}

fn profit_record(vehicle: &Vehicle) -> ProfitRecord {
    ProfitRecord {
        profit: vehicle.profit_last_year,
        vehicle: vehicle.id,
    }
}

/// Primary vehicles mapped to a bucket.
fn members(
    world: &World,
    key: BucketKey,
    exclude: Option<VehicleId>,
) -> impl Iterator<Item = &Vehicle> {
    world
        .primary_vehicles(key.company, key.vehicle_type)
        .filter(move |v| Some(v.id) != exclude)
        .filter(move |v| key.group.is_all() || bucket_of(v).group == key.group)
}

fn add_signed(value: u32, delta: i32) -> u32 {
    value.saturating_add_signed(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::small_world;
    use crate::model::{CargoId, EngineId, EngineRenewal};

    fn rebuilt(world: &World) -> StatisticsAggregator {
        let mut stats = StatisticsAggregator::default();
        stats.update_after_load(world);
        stats
    }

    #[test]
    fn test_rebuild_counts_primaries_and_units() {
        let world = small_world();
        let stats = rebuilt(&world);

        let road = stats.get(CompanyId(0), GroupId::ALL, VehicleType::Road);
        assert_eq!(road.num_vehicle, 3);
        assert_eq!(road.num_engines(EngineId(0)), 2);
        assert_eq!(road.max_cargo(CargoId(0)), 62);
        assert_eq!(road.order_lists.len(), 2);
        // refit order on list 2 adds goods
        assert!(road.cargo_types.contains(CargoId(3)));

        let rail = stats.get(CompanyId(0), GroupId::ALL, VehicleType::Rail);
        assert_eq!(rail.num_vehicle, 1);
        assert_eq!(rail.num_engines(EngineId(2)), 1);
        assert_eq!(rail.num_engines(EngineId(3)), 0, "wagons are not engine-countable");
        assert_eq!(rail.max_cargo(CargoId(1)), 30);
        assert_eq!(rail.ol_type, OrderListType::Empty);

        let default = stats.get(CompanyId(0), GroupId::DEFAULT, VehicleType::Road);
        assert_eq!(default, road);
    }

    #[test]
    fn test_profit_counts_only_old_vehicles() {
        let world = small_world();
        let stats = rebuilt(&world);
        let road = stats.get(CompanyId(0), GroupId::ALL, VehicleType::Road);
        // vehicles 1 and 2 are older than 730 days, vehicle 3 is not
        assert_eq!(road.num_profit_vehicle, 2);
        assert_eq!(road.profit_last_year, 900);
        assert_eq!(
            road.min_profit_vehicle,
            Some(ProfitRecord { profit: -300, vehicle: VehicleId(2) })
        );
    }

    #[test]
    fn test_update_profits_after_rollover() {
        let mut world = small_world();
        let mut stats = rebuilt(&world);
        for (id, profit) in [(1, 50), (2, 700), (3, -900)] {
            world.vehicle_mut(VehicleId(id)).unwrap().profit_last_year = profit;
        }
        stats.update_profits(&world);

        let road = stats.get(CompanyId(0), GroupId::ALL, VehicleType::Road);
        // vehicle 3 is still too young to count
        assert_eq!(road.num_profit_vehicle, 2);
        assert_eq!(road.profit_last_year, 750);
        assert_eq!(
            road.min_profit_vehicle,
            Some(ProfitRecord { profit: 50, vehicle: VehicleId(1) })
        );
        assert!(stats.divergence(&world).is_empty());
    }

    #[test]
    fn test_remove_then_add_restores_bucket() {
        let world = small_world();
        let mut stats = rebuilt(&world);
        let before = stats.get(CompanyId(0), GroupId::ALL, VehicleType::Road).clone();

        let v2 = world.vehicle(VehicleId(2)).unwrap().clone();
        stats.count_vehicle(&world, &v2, -1);
        stats.count_engine(&world, &v2, -1);
        assert_ne!(stats.get(CompanyId(0), GroupId::ALL, VehicleType::Road), &before);
        stats.count_vehicle(&world, &v2, 1);
        stats.count_engine(&world, &v2, 1);

        assert_eq!(stats.get(CompanyId(0), GroupId::ALL, VehicleType::Road), &before);
    }

    #[test]
    fn test_min_profit_rescans_when_minimum_leaves() {
        let world = small_world();
        let mut stats = rebuilt(&world);
        let v2 = world.vehicle(VehicleId(2)).unwrap().clone();
        stats.count_vehicle(&world, &v2, -1);
        let road = stats.get(CompanyId(0), GroupId::ALL, VehicleType::Road);
        assert_eq!(
            road.min_profit_vehicle,
            Some(ProfitRecord { profit: 1200, vehicle: VehicleId(1) })
        );
        assert_eq!(road.num_vehicle, 2);
        // v1 still shares list 1
        assert!(road.order_lists.contains(&OrderListId(1)));
    }

    #[test]
    fn test_autoreplace_flags() {
        let mut world = small_world();
        world
            .insert_renewal(EngineRenewal {
                company: CompanyId(0),
                group: GroupId::ALL,
                from: EngineId(1),
                to: EngineId(0),
            })
            .unwrap();
        let stats = rebuilt(&world);
        let all = stats.get(CompanyId(0), GroupId::ALL, VehicleType::Road);
        assert!(all.autoreplace_defined);
        assert!(!all.autoreplace_finished, "one coal truck still runs engine 1");
        let default = stats.get(CompanyId(0), GroupId::DEFAULT, VehicleType::Road);
        assert!(!default.autoreplace_defined);
        assert!(default.autoreplace_finished);
    }

    #[test]
    fn test_fresh_rebuild_has_no_divergence() {
        let world = small_world();
        assert!(rebuilt(&world).divergence(&world).is_empty());
    }
}
