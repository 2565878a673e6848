//! Per-window filter model.
//!
//! A [`FilterModel`] owns one [`ElementList`] per enabled axis. Its active
//! selection is always derived from element states, so the active list can
//! never hold an element the axis lists don't.

use super::axis::{
    AxisMask, CatchmentProperty, ClickMode, CycleFilter, ElementState, FilterAxis, TownProperty,
    VehicleProperty,
};
use super::element::{ActiveSelection, ElementId, ElementList, FilterElement};
use super::predicate::{self, Candidate};
use crate::error::{messages, FleetError, Result};
use crate::model::{
    CargoId, CompanyId, OrderListType, StationFacility, StationId, TownId, World,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct FilterModel {
    mask: AxisMask,
    /// When set, only this company's stations and the company itself are listed
    list_owner: Option<CompanyId>,
    axes: BTreeMap<FilterAxis, ElementList>,
}

impl FilterModel {
    #[must_use]
    pub fn new(mask: AxisMask, list_owner: Option<CompanyId>) -> Self {
        let axes = mask.iter().map(|a| (a, ElementList::new(a))).collect();
        Self {
            mask,
            list_owner,
            axes,
        }
    }

    #[must_use]
    pub const fn mask(&self) -> AxisMask {
        self.mask
    }

    #[must_use]
    pub const fn list_owner(&self) -> Option<CompanyId> {
        self.list_owner
    }

    /// True if a company's entities may appear in owner-filtered axes.
    #[must_use]
    pub fn admits_owner(&self, owner: CompanyId) -> bool {
        self.list_owner.map_or(true, |o| o == owner)
    }

    #[must_use]
    pub fn list(&self, axis: FilterAxis) -> Option<&ElementList> {
        self.axes.get(&axis)
    }

    /// Populate every enabled axis from the domain.
    ///
    /// States of elements that survive the rebuild are kept.
    pub fn build(&mut self, world: &World) {
        for (axis, list) in &mut self.axes {
            let mut fresh = ElementList::new(*axis);
            for mut element in domain_elements(world, *axis, self.list_owner) {
                if let Some(old) = list.get(element.id) {
                    element.state = old.state;
                }
                let inserted = fresh.insert(element);
                debug_assert!(inserted.is_ok(), "domain enumeration yielded a duplicate id");
            }
            fresh.sort();
            *list = fresh;
        }
    }

    /// Apply a click and return the element's new state.
    pub fn toggle(
        &mut self,
        axis: FilterAxis,
        id: ElementId,
        mode: ClickMode,
    ) -> Result<ElementState> {
        let element = self.element_mut(axis, id)?;
        element.state = match mode {
            ClickMode::Cycle => element.state.next(),
            ClickMode::Remove => ElementState::Neutral,
        };
        Ok(element.state)
    }

    pub fn set_state(&mut self, axis: FilterAxis, id: ElementId, state: ElementState) -> Result<()> {
        self.element_mut(axis, id)?.state = state;
        Ok(())
    }

    #[must_use]
    pub fn state(&self, axis: FilterAxis, id: ElementId) -> Option<ElementState> {
        self.axes.get(&axis).and_then(|l| l.get(id)).map(|e| e.state)
    }

    pub fn sort(&mut self, axis: FilterAxis) {
        if let Some(list) = self.axes.get_mut(&axis) {
            list.sort();
        }
    }

    pub fn reset(&mut self) {
        for list in self.axes.values_mut() {
            list.reset();
        }
    }

    /// `(positive, negative)` ids of an axis. Disabled axes are empty.
    #[must_use]
    pub fn query_active(&self, axis: FilterAxis) -> ActiveSelection {
        self.axes.get(&axis).map(ElementList::active).unwrap_or_default()
    }

    pub fn iter(&self, axis: FilterAxis) -> impl Iterator<Item = &FilterElement> {
        self.axes.get(&axis).into_iter().flat_map(ElementList::iter)
    }

    /// Every element with a non-neutral state, axis by axis.
    pub fn active(&self) -> impl Iterator<Item = &FilterElement> {
        self.axes
            .values()
            .flat_map(ElementList::iter)
            .filter(|e| e.state.is_active())
    }

    #[must_use]
    pub fn include(&self, world: &World, candidate: Candidate<'_>) -> bool {
        predicate::include(self, world, candidate)
    }

    fn element_mut(&mut self, axis: FilterAxis, id: ElementId) -> Result<&mut FilterElement> {
        let list = self.axes.get_mut(&axis).ok_or_else(|| {
            FleetError::invalid_argument(messages::AXIS_DISABLED, format!("{axis}"))
        })?;
        list.get_mut(id).ok_or_else(|| {
            FleetError::invalid_argument(messages::UNKNOWN_ELEMENT, format!("{axis} {id}"))
        })
    }

    // ========================================================================
    // Index hooks
    // ========================================================================

    /// Append a newly created entity. Returns false if the axis is disabled
    /// or the entity is not listed by this model.
    pub(crate) fn insert_element(
        &mut self,
        world: &World,
        axis: FilterAxis,
        id: ElementId,
    ) -> Result<bool> {
        let Some(element) = element_for(world, axis, id, self.list_owner) else {
            return Ok(false);
        };
        match self.axes.get_mut(&axis) {
            Some(list) => list.insert(element).map(|()| true),
            None => Ok(false),
        }
    }

    pub(crate) fn remove_element(&mut self, axis: FilterAxis, id: ElementId) -> Option<FilterElement> {
        self.axes.get_mut(&axis).and_then(|l| l.remove(id))
    }

    /// Refresh the sort key and colour of a renamed entity.
    pub(crate) fn refresh_element(&mut self, world: &World, axis: FilterAxis, id: ElementId) -> bool {
        let Some(fresh) = element_for(world, axis, id, self.list_owner) else {
            return false;
        };
        match self.axes.get_mut(&axis).and_then(|l| l.get_mut(id)) {
            Some(element) => {
                element.sort_key = fresh.sort_key;
                element.colour = fresh.colour;
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Domain enumeration
// ============================================================================

fn domain_elements(world: &World, axis: FilterAxis, owner: Option<CompanyId>) -> Vec<FilterElement> {
    let admits = |o: CompanyId| owner.map_or(true, |w| w == o);
    match axis {
        FilterAxis::Towns => world
            .towns()
            .map(|t| FilterElement::new(axis, t.id.index(), t.name.clone()))
            .collect(),
        FilterAxis::Companies => world
            .companies()
            .filter(|c| admits(c.id))
            .map(|c| FilterElement::new(axis, c.id.index(), c.name.clone()).with_colour(c.colour))
            .collect(),
        FilterAxis::CargoProduced | FilterAxis::CargoAccepted => world
            .cargos()
            .map(|c| {
                FilterElement::new(axis, c.id.index(), c.name.clone()).with_colour(c.rating_colour)
            })
            .collect(),
        FilterAxis::Stations => world
            .stations()
            .filter(|s| admits(s.owner))
            .map(|s| FilterElement::new(axis, s.id.index(), s.name.clone()))
            .collect(),
        FilterAxis::StationFacilities => StationFacility::ALL
            .iter()
            .map(|f| FilterElement::new(axis, *f as u32, f.name()))
            .collect(),
        FilterAxis::OrderListShape => OrderListType::ALL
            .iter()
            .map(|t| FilterElement::new(axis, *t as u32, t.name()))
            .collect(),
        FilterAxis::VehicleGroupProperties => VehicleProperty::ALL
            .iter()
            .map(|p| FilterElement::new(axis, p.index(), p.name()))
            .collect(),
        FilterAxis::CatchmentProperties => CatchmentProperty::ALL
            .iter()
            .map(|p| FilterElement::new(axis, p.index(), p.name()))
            .collect(),
        FilterAxis::TownProperties => TownProperty::ALL
            .iter()
            .map(|p| FilterElement::new(axis, p.index(), p.name()))
            .collect(),
    }
}

/// The element a single entity contributes to an axis, if listed.
fn element_for(
    world: &World,
    axis: FilterAxis,
    id: ElementId,
    owner: Option<CompanyId>,
) -> Option<FilterElement> {
    let admits = |o: CompanyId| owner.map_or(true, |w| w == o);
    match axis {
        FilterAxis::Towns => world
            .town(TownId(id))
            .map(|t| FilterElement::new(axis, id, t.name.clone())),
        FilterAxis::Companies => {
            let company = world.company(CompanyId(u8::try_from(id).ok()?))?;
            admits(company.id)
                .then(|| FilterElement::new(axis, id, company.name.clone()).with_colour(company.colour))
        }
        FilterAxis::CargoProduced | FilterAxis::CargoAccepted => {
            let cargo = world.cargo(CargoId(u8::try_from(id).ok()?))?;
            Some(FilterElement::new(axis, id, cargo.name.clone()).with_colour(cargo.rating_colour))
        }
        FilterAxis::Stations => {
            let station = world.station(StationId(id))?;
            admits(station.owner).then(|| FilterElement::new(axis, id, station.name.clone()))
        }
        _ => domain_elements(world, axis, owner).into_iter().find(|e| e.id == id),
    }
}
