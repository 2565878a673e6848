//! Auto-grouping planner.
//!
//! Rebuilds the whole group tree of one `(company, vehicle type)` from a
//! [`Heuristic`]. Planning is pure; the plan is checked against the group
//! pool before anything is written, so a failed preflight leaves the world
//! untouched.

use super::heuristic::{GroupKey, Heuristic};
use super::naming::unique_name;
use crate::error::{FleetError, Result};
use crate::model::{CargoTypes, CompanyId, Group, GroupId, VehicleId, VehicleType, World};
use crate::stats::StatisticsAggregator;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// One group of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedGroup {
    /// Assigned once the plan is applied
    pub id: Option<GroupId>,
    /// Index of the parent within the plan
    pub parent: Option<usize>,
    pub name: Option<String>,
    pub cargo_types: CargoTypes,
    pub vehicles: Vec<VehicleId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoGroupReport {
    pub company: CompanyId,
    pub vehicle_type: VehicleType,
    pub heuristic: Heuristic,
    /// Groups in scope before the rebuild
    pub destroyed: usize,
    /// Slots the preflight asked for
    pub required_slots: usize,
    pub groups: Vec<PlannedGroup>,
    pub applied: bool,
}

impl AutoGroupReport {
    /// Vehicles left in the default group.
    #[must_use]
    pub fn ungrouped(&self, world: &World) -> usize {
        let grouped: usize = self.groups.iter().map(|g| g.vehicles.len()).sum();
        world
            .primary_vehicles(self.company, self.vehicle_type)
            .count()
            .saturating_sub(grouped)
    }
}

pub struct AutoGroupPlanner<'a> {
    world: &'a mut World,
    stats: &'a mut StatisticsAggregator,
    max_name_chars: usize,
}

impl<'a> AutoGroupPlanner<'a> {
    pub fn new(
        world: &'a mut World,
        stats: &'a mut StatisticsAggregator,
        max_name_chars: usize,
    ) -> Self {
        Self {
            world,
            stats,
            max_name_chars,
        }
    }

    /// Plan and apply.
    pub fn rebuild(
        &mut self,
        company: CompanyId,
        vehicle_type: VehicleType,
        heuristic: Heuristic,
    ) -> Result<AutoGroupReport> {
        let mut report = self.preflight(company, vehicle_type, heuristic)?;
        self.apply(&mut report)?;
        Ok(report)
    }

    /// Plan and check the pool without touching the world.
    pub fn preflight(
        &self,
        company: CompanyId,
        vehicle_type: VehicleType,
        heuristic: Heuristic,
    ) -> Result<AutoGroupReport> {
        let world = &*self.world;
        let groups = plan(world, company, vehicle_type, heuristic, self.max_name_chars);

        let existing = world.groups_of(company, vehicle_type).count();
        let distinct_lists: BTreeSet<_> = world
            .primary_vehicles(company, vehicle_type)
            .filter_map(|v| v.order_list)
            .collect();
        let required = (2 * distinct_lists.len())
            .max(groups.len())
            .saturating_sub(existing);
        let available = world.free_group_slots();
        if required > available {
            tracing::warn!(
                "Auto-group of {company}/{vehicle_type} needs {required} group slots, {available} free"
            );
            return Err(FleetError::pool_exhausted(required, available));
        }

        Ok(AutoGroupReport {
            company,
            vehicle_type,
            heuristic,
            destroyed: existing,
            required_slots: required,
            groups,
            applied: false,
        })
    }

    fn apply(&mut self, report: &mut AutoGroupReport) -> Result<()> {
        let (company, vehicle_type) = (report.company, report.vehicle_type);

        let doomed: Vec<GroupId> = self
            .world
            .groups_of(company, vehicle_type)
            .map(|g| g.id)
            .collect();
        let grouped: Vec<VehicleId> = self
            .world
            .primary_vehicles(company, vehicle_type)
            .filter(|v| v.group.is_real())
            .map(|v| v.id)
            .collect();
        for id in grouped {
            self.world.vehicle_mut(id)?.group = GroupId::DEFAULT;
        }
        // the scope rebuild below drops the buckets of removed groups
        for id in doomed {
            self.world.remove_group(id);
        }

        // parents come after their children in the plan
        for index in 0..report.groups.len() {
            let id = self.world.allocate_group_id()?;
            let planned = &report.groups[index];
            self.world.insert_group(Group {
                id,
                owner: company,
                vehicle_type,
                parent: None,
                name: planned.name.clone(),
                replace_protection: false,
            })?;
            for vehicle in &planned.vehicles {
                self.world.vehicle_mut(*vehicle)?.group = id;
            }
            report.groups[index].id = Some(id);
        }
        for planned in &report.groups {
            let (Some(id), Some(parent)) = (planned.id, planned.parent) else {
                continue;
            };
            let parent_id = report.groups.get(parent).and_then(|p| p.id);
            self.world.group_mut(id)?.parent = parent_id;
        }

        self.stats.rebuild_scope(self.world, company, vehicle_type);
        report.applied = true;
        tracing::info!(
            "Auto-grouped {company}/{vehicle_type} by {}: {} groups replaced {}",
            report.heuristic,
            report.groups.len(),
            report.destroyed
        );
        Ok(())
    }
}

/// Partition the primary vehicles of a scope, in domain order.
#[must_use]
pub fn plan(
    world: &World,
    company: CompanyId,
    vehicle_type: VehicleType,
    heuristic: Heuristic,
    max_name_chars: usize,
) -> Vec<PlannedGroup> {
    let mut classes: IndexMap<GroupKey, Vec<VehicleId>> = IndexMap::new();
    let mut assigned: HashSet<VehicleId> = HashSet::new();
    for vehicle in world.primary_vehicles(company, vehicle_type) {
        if assigned.contains(&vehicle.id) {
            continue;
        }
        let Some(key) = heuristic.key(world, vehicle) else {
            continue;
        };
        let members: Vec<VehicleId> = match (heuristic.keys_on_order_list(), vehicle.order_list) {
            // every sharer at once
            (true, Some(_)) => world.sharers_of(vehicle),
            _ => vec![vehicle.id],
        };
        assigned.extend(members.iter().copied());
        classes.entry(key).or_default().extend(members);
    }

    let mut taken = HashSet::new();
    let mut groups: Vec<PlannedGroup> = classes
        .into_iter()
        .map(|(key, mut vehicles)| {
            vehicles.sort();
            let cargo_types = vehicles
                .iter()
                .filter_map(|id| world.vehicle(*id))
                .fold(CargoTypes::EMPTY, |acc, v| acc.union(world.vehicle_cargo_types(v)));
            let name = descriptor(world, &key, &vehicles, cargo_types)
                .map(|base| unique_name(&base, max_name_chars, &mut taken));
            PlannedGroup {
                id: None,
                parent: None,
                name,
                cargo_types,
                vehicles,
            }
        })
        .collect();

    if heuristic == Heuristic::CargoThenOrder {
        let mut parents: IndexMap<CargoTypes, usize> = IndexMap::new();
        let children = groups.len();
        for child in 0..children {
            let cargo_types = groups[child].cargo_types;
            let next = groups.len();
            let parent = *parents.entry(cargo_types).or_insert(next);
            if parent == next {
                let base = cargo_label(world, cargo_types);
                groups.push(PlannedGroup {
                    id: None,
                    parent: None,
                    name: Some(unique_name(&base, max_name_chars, &mut taken)),
                    cargo_types,
                    vehicles: Vec::new(),
                });
            }
            groups[child].parent = Some(parent);
        }
    }
    groups
}

fn descriptor(
    world: &World,
    key: &GroupKey,
    vehicles: &[VehicleId],
    cargo_types: CargoTypes,
) -> Option<String> {
    let name = match key {
        GroupKey::OrderList(_) | GroupKey::Stations(_) => {
            let first = vehicles.first().and_then(|id| world.vehicle(*id))?;
            world
                .destinations(first)
                .into_iter()
                .filter_map(|s| world.station(s).map(|st| st.name.as_str()))
                .collect::<Vec<_>>()
                .join("/")
        }
        GroupKey::Cargo(_) => cargo_label(world, cargo_types),
        GroupKey::CargoLivery(cargo, livery) => {
            let cargo = world.cargo(*cargo).map_or("", |c| c.name.as_str());
            format!("{cargo} {}", livery.name())
        }
        GroupKey::Engine(engine) => world.engine(*engine)?.name.clone(),
    };
    (!name.trim().is_empty()).then_some(name)
}

fn cargo_label(world: &World, cargo_types: CargoTypes) -> String {
    let names = world.cargo_names(cargo_types);
    if names.is_empty() {
        "No cargo".to_string()
    } else {
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::fixtures::small_world;

    fn planner_run(world: &mut World, heuristic: Heuristic) -> Result<AutoGroupReport> {
        let mut stats = StatisticsAggregator::default();
        stats.update_after_load(world);
        let report = AutoGroupPlanner::new(world, &mut stats, 32).rebuild(
            CompanyId(0),
            VehicleType::Road,
            heuristic,
        )?;
        assert!(stats.divergence(world).is_empty());
        Ok(report)
    }

    #[test]
    fn test_order_list_plan() {
        let world = small_world();
        let groups = plan(&world, CompanyId(0), VehicleType::Road, Heuristic::OrderList, 32);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].vehicles, vec![VehicleId(1), VehicleId(2)]);
        assert_eq!(groups[0].name.as_deref(), Some("Aston Central/Brindle Yard"));
        assert_eq!(groups[1].vehicles, vec![VehicleId(3)]);
    }

    #[test]
    fn test_cargo_then_order_adds_parents() {
        let world = small_world();
        let groups = plan(&world, CompanyId(0), VehicleType::Road, Heuristic::CargoThenOrder, 32);
        // two order-list groups with different cargo sets, each with its own parent
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0].parent, Some(2));
        assert_eq!(groups[1].parent, Some(3));
        assert_eq!(groups[2].name.as_deref(), Some("Passengers"));
        assert_eq!(groups[3].name.as_deref(), Some("Coal/Goods"));
    }

    #[test]
    fn test_rebuild_moves_vehicles_and_is_idempotent() {
        let mut world = small_world();
        let first = planner_run(&mut world, Heuristic::OrderList).unwrap();
        assert!(first.applied);
        let v1 = world.vehicle(VehicleId(1)).unwrap().group;
        assert_eq!(world.vehicle(VehicleId(2)).unwrap().group, v1);
        assert_ne!(world.vehicle(VehicleId(3)).unwrap().group, v1);

        let second = planner_run(&mut world, Heuristic::OrderList).unwrap();
        assert_eq!(second.destroyed, 2);
        let partition = |r: &AutoGroupReport| r.groups.iter().map(|g| g.vehicles.clone()).collect::<Vec<_>>();
        assert_eq!(partition(&first), partition(&second));
        assert_eq!(world.groups_of(CompanyId(0), VehicleType::Road).count(), 2);
    }

    #[test]
    fn test_regrouping_populated_groups_drops_their_buckets() {
        let mut world = small_world();
        let mut stats = StatisticsAggregator::default();
        stats.update_after_load(&world);
        for heuristic in [Heuristic::CargoThenOrder, Heuristic::OrderList] {
            AutoGroupPlanner::new(&mut world, &mut stats, 32)
                .rebuild(CompanyId(0), VehicleType::Road, heuristic)
                .unwrap();
            assert!(stats.divergence(&world).is_empty(), "{heuristic}");
        }
        // the four cargo-then-order groups were replaced by two
        assert_eq!(world.groups_of(CompanyId(0), VehicleType::Road).count(), 2);
        for (key, _) in stats.non_empty_buckets() {
            assert!(!key.group.is_real() || world.group(key.group).is_some(), "{key}");
        }
    }

    #[test]
    fn test_preflight_fails_before_mutation() {
        let mut world = small_world();
        world.set_group_capacity(3);
        let err = planner_run(&mut world, Heuristic::OrderList).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PoolExhausted);
        assert_eq!(world.groups().count(), 0);
        assert!(world.vehicles().all(|v| v.group == GroupId::DEFAULT));
    }

    #[test]
    fn test_empty_scope_is_noop() {
        let mut world = small_world();
        let mut stats = StatisticsAggregator::default();
        stats.update_after_load(&world);
        let report = AutoGroupPlanner::new(&mut world, &mut stats, 32)
            .rebuild(CompanyId(1), VehicleType::Ship, Heuristic::Cargo)
            .unwrap();
        assert!(report.groups.is_empty());
        assert_eq!(report.required_slots, 0);
    }
}
