//! Inclusion test for a candidate against a model's active selection.
//!
//! Every enabled axis projects the candidate onto a set of element ids. An
//! axis rejects when it has positives and the projection misses all of
//! them, or when the projection hits any negative. Axes that make no sense
//! for the candidate kind, and the catchment-property toggles, never reject.

use super::axis::{FilterAxis, TownProperty, VehicleProperty};
use super::element::ElementId;
use super::model::FilterModel;
use crate::model::{CompanyId, Facilities, Station, TownId, Vehicle, World};
use std::collections::BTreeSet;

/// Entity offered to a filter.
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    Vehicle(&'a Vehicle),
    Station(&'a Station),
}

impl Candidate<'_> {
    #[must_use]
    pub const fn owner(&self) -> CompanyId {
        match self {
            Self::Vehicle(v) => v.owner,
            Self::Station(s) => s.owner,
        }
    }
}

/// Result of projecting a candidate onto an axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Values(BTreeSet<ElementId>),
    /// The axis does not apply to this kind of candidate
    Unconstrained,
}

#[must_use]
pub fn include(model: &FilterModel, world: &World, candidate: Candidate<'_>) -> bool {
    include_axes(model, world, candidate, |_| true)
}

/// [`include`] restricted to the axes `consider` accepts.
pub(crate) fn include_axes(
    model: &FilterModel,
    world: &World,
    candidate: Candidate<'_>,
    consider: impl Fn(FilterAxis) -> bool,
) -> bool {
    if !model.admits_owner(candidate.owner()) {
        return false;
    }
    model.mask().iter().filter(|a| consider(*a)).all(|axis| {
        let selection = model.query_active(axis);
        if selection.is_empty() {
            return true;
        }
        let Projection::Values(values) = project(world, candidate, axis) else {
            return true;
        };
        if !selection.positive.is_empty() && values.is_disjoint(&selection.positive) {
            return false;
        }
        values.is_disjoint(&selection.negative)
    })
}

/// Element ids of `axis` that the candidate exhibits.
#[must_use]
pub fn project(world: &World, candidate: Candidate<'_>, axis: FilterAxis) -> Projection {
    let values: BTreeSet<ElementId> = match (axis, candidate) {
        (FilterAxis::CatchmentProperties, _) => return Projection::Unconstrained,

        (FilterAxis::Towns, Candidate::Vehicle(v)) => {
            world.served_towns(v).into_iter().map(TownId::index).collect()
        }
        (FilterAxis::Towns, Candidate::Station(s)) => [s.town.index()].into(),

        (FilterAxis::Companies, c) => [c.owner().index()].into(),

        (FilterAxis::CargoProduced | FilterAxis::CargoAccepted, Candidate::Vehicle(v)) => {
            world.vehicle_cargo_types(v).iter().map(|c| c.index()).collect()
        }
        (FilterAxis::CargoProduced, Candidate::Station(s)) => {
            s.supplied.iter().map(|c| c.index()).collect()
        }
        (FilterAxis::CargoAccepted, Candidate::Station(s)) => {
            s.accepted.iter().map(|c| c.index()).collect()
        }

        (FilterAxis::StationFacilities, Candidate::Station(s)) => facility_ids(s.facilities),
        (FilterAxis::StationFacilities, Candidate::Vehicle(v)) => world
            .destinations(v)
            .into_iter()
            .filter_map(|id| world.station(id))
            .flat_map(|s| facility_ids(s.facilities))
            .collect(),

        (FilterAxis::Stations, Candidate::Station(s)) => [s.id.index()].into(),
        (FilterAxis::Stations, Candidate::Vehicle(v)) => {
            world.destinations(v).into_iter().map(|s| s.index()).collect()
        }

        (FilterAxis::OrderListShape, Candidate::Vehicle(v)) => {
            [world.order_list_type(v) as u32].into()
        }
        (FilterAxis::VehicleGroupProperties, Candidate::Vehicle(v)) => vehicle_properties(world, v),
        (FilterAxis::OrderListShape | FilterAxis::VehicleGroupProperties, Candidate::Station(_)) => {
            return Projection::Unconstrained
        }

        (FilterAxis::TownProperties, Candidate::Station(s)) => {
            town_properties(world, [s.town], s.owner)
        }
        (FilterAxis::TownProperties, Candidate::Vehicle(v)) => {
            town_properties(world, world.served_towns(v), v.owner)
        }
    };
    Projection::Values(values)
}

fn facility_ids(facilities: Facilities) -> BTreeSet<ElementId> {
    facilities.iter().map(|f| f as u32).collect()
}

fn vehicle_properties(world: &World, vehicle: &Vehicle) -> BTreeSet<ElementId> {
    let pending_replace = world
        .chain(vehicle.id)
        .any(|unit| world.renewal_for(unit).is_some());
    let protected = world
        .group(vehicle.group)
        .is_some_and(|g| g.replace_protection);
    [
        (VehicleProperty::Stopped, vehicle.stopped),
        (VehicleProperty::Crashed, vehicle.crashed),
        (VehicleProperty::Profitable, vehicle.profit_last_year > 0),
        (VehicleProperty::Unprofitable, vehicle.profit_last_year < 0),
        (VehicleProperty::NeedsService, vehicle.needs_service),
        (VehicleProperty::PendingReplace, pending_replace),
        (VehicleProperty::ReplaceProtected, protected),
    ]
    .into_iter()
    .filter(|(_, holds)| *holds)
    .map(|(p, _)| p.index())
    .collect()
}

fn town_properties(
    world: &World,
    towns: impl IntoIterator<Item = TownId>,
    owner: CompanyId,
) -> BTreeSet<ElementId> {
    let mut out = BTreeSet::new();
    for town in towns.into_iter().filter_map(|t| world.town(t)) {
        if town.statues.contains(&owner) {
            out.insert(TownProperty::CompanyStatue.index());
        }
        match town.exclusivity {
            Some(holder) if holder == owner => {
                out.insert(TownProperty::CompanyExclusivity.index());
            }
            Some(_) => {
                out.insert(TownProperty::OtherExclusivity.index());
            }
            None => {}
        }
    }
    out
}
