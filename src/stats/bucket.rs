//! A single statistics bucket.

use crate::model::{
    CargoId, CargoTypes, CompanyId, EngineId, GroupId, Money, OrderListId, OrderListType,
    VehicleId, VehicleType,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Identifies a bucket: one per `(company, group, vehicle type)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BucketKey {
    pub company: CompanyId,
    pub group: GroupId,
    pub vehicle_type: VehicleType,
}

impl BucketKey {
    #[must_use]
    pub const fn new(company: CompanyId, group: GroupId, vehicle_type: VehicleType) -> Self {
        Self {
            company,
            group,
            vehicle_type,
        }
    }

    /// The `all` bucket of the same company and type.
    #[must_use]
    pub const fn all(self) -> Self {
        Self::new(self.company, GroupId::ALL, self.vehicle_type)
    }
}

impl std::fmt::Display for BucketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.company, self.group, self.vehicle_type)
    }
}

/// Lowest-profit vehicle of a bucket. Ties go to the lower vehicle id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ProfitRecord {
    pub profit: Money,
    pub vehicle: VehicleId,
}

/// Denormalised counters for one bucket.
///
/// Every field is a pure function of the vehicles mapped to the bucket, so an
/// incremental update followed by its inverse restores the value exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupStatistics {
    /// Primary vehicles in the bucket
    pub num_vehicle: u32,
    /// Primary vehicles old enough for their profit to count
    pub num_profit_vehicle: u32,
    /// Sum of last year's profit over profit-counting vehicles
    pub profit_last_year: Money,
    pub min_profit_vehicle: Option<ProfitRecord>,
    /// Engine-countable units per engine type
    pub num_engines: BTreeMap<EngineId, u32>,
    /// Cargo on board per cargo kind
    pub act_cargo: BTreeMap<CargoId, u32>,
    /// Capacity per cargo kind
    pub max_cargo: BTreeMap<CargoId, u32>,
    pub cargo_types: CargoTypes,
    pub order_lists: BTreeSet<OrderListId>,
    /// Worst order-list health in the bucket
    pub ol_type: OrderListType,
    pub autoreplace_defined: bool,
    pub autoreplace_finished: bool,
}

impl GroupStatistics {
    pub const EMPTY: Self = Self {
        num_vehicle: 0,
        num_profit_vehicle: 0,
        profit_last_year: 0,
        min_profit_vehicle: None,
        num_engines: BTreeMap::new(),
        act_cargo: BTreeMap::new(),
        max_cargo: BTreeMap::new(),
        cargo_types: CargoTypes::EMPTY,
        order_lists: BTreeSet::new(),
        ol_type: OrderListType::Ok,
        autoreplace_defined: false,
        autoreplace_finished: true,
    };

    #[must_use]
    pub fn num_engines(&self, engine: EngineId) -> u32 {
        self.num_engines.get(&engine).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn max_cargo(&self, cargo: CargoId) -> u32 {
        self.max_cargo.get(&cargo).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn act_cargo(&self, cargo: CargoId) -> u32 {
        self.act_cargo.get(&cargo).copied().unwrap_or(0)
    }

    /// Average load factor in percent over all carried cargo.
    #[must_use]
    pub fn load_percent(&self) -> u32 {
        let capacity: u64 = self.max_cargo.values().map(|&c| u64::from(c)).sum();
        if capacity == 0 {
            return 0;
        }
        let loaded: u64 = self.act_cargo.values().map(|&c| u64::from(c)).sum();
        u32::try_from(loaded * 100 / capacity).unwrap_or(u32::MAX)
    }

    pub(crate) fn clear_cargo(&mut self) {
        self.act_cargo.clear();
        self.max_cargo.clear();
        self.cargo_types = CargoTypes::EMPTY;
    }

    pub(crate) fn clear_profit(&mut self) {
        self.num_profit_vehicle = 0;
        self.profit_last_year = 0;
        self.min_profit_vehicle = None;
    }

    /// Offer a candidate minimum.
    pub(crate) fn offer_min_profit(&mut self, candidate: ProfitRecord) {
        if self.min_profit_vehicle.map_or(true, |current| candidate < current) {
            self.min_profit_vehicle = Some(candidate);
        }
    }
}

impl Default for GroupStatistics {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Add a signed delta to a counter map, dropping entries that reach zero.
pub(crate) fn adjust<K: Ord>(map: &mut BTreeMap<K, u32>, key: K, delta: i64) {
    let current = i64::from(map.get(&key).copied().unwrap_or(0));
    let next = u32::try_from((current + delta).max(0)).unwrap_or(u32::MAX);
    if next == 0 {
        map.remove(&key);
    } else {
        map.insert(key, next);
    }
}
