//! Cross-window index of open filter models.
//!
//! Windows register their model on construction and get a [`ModelHandle`]
//! back; lifecycle events are fanned out to every registered model and to
//! the catchment controller so that axis lists stay live.

use super::axis::FilterAxis;
use super::element::ElementId;
use super::model::FilterModel;
use crate::catchment::CatchmentController;
use crate::error::{messages, FleetError, Result};
use crate::model::{DomainEvent, World};
use serde::Serialize;
use std::collections::BTreeMap;

/// Registration handle of a filter model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ModelHandle(u32);

impl std::fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "model#{}", self.0)
    }
}

/// What a dispatched event invalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexUpdate {
    /// Models whose axis lists changed and need a redraw
    pub redraw: Vec<ModelHandle>,
    /// The catchment overlay was recomputed
    pub catchment_dirty: bool,
}

impl IndexUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.redraw.is_empty() && !self.catchment_dirty
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Append,
    Remove,
    Refresh,
}

#[derive(Debug, Default)]
pub struct FilterIndex {
    models: BTreeMap<ModelHandle, FilterModel>,
    next_handle: u32,
}

impl FilterIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, model: FilterModel) -> ModelHandle {
        let handle = ModelHandle(self.next_handle);
        self.next_handle += 1;
        self.models.insert(handle, model);
        tracing::debug!("Registered {handle}");
        handle
    }

    pub fn deregister(&mut self, handle: ModelHandle) -> Result<FilterModel> {
        self.models
            .remove(&handle)
            .ok_or_else(|| FleetError::invalid_argument(messages::UNKNOWN_MODEL, format!("{handle}")))
    }

    pub fn model(&self, handle: ModelHandle) -> Result<&FilterModel> {
        self.models
            .get(&handle)
            .ok_or_else(|| FleetError::invalid_argument(messages::UNKNOWN_MODEL, format!("{handle}")))
    }

    pub fn model_mut(&mut self, handle: ModelHandle) -> Result<&mut FilterModel> {
        self.models
            .get_mut(&handle)
            .ok_or_else(|| FleetError::invalid_argument(messages::UNKNOWN_MODEL, format!("{handle}")))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = ModelHandle> + '_ {
        self.models.keys().copied()
    }

    /// Fan a domain event out to every model and the catchment controller.
    ///
    /// The world must already reflect the mutation that raised the event.
    /// Affected axes are sorted once, after all models were updated.
    pub fn dispatch(
        &mut self,
        world: &World,
        catchment: &mut CatchmentController,
        event: &DomainEvent,
    ) -> Result<IndexUpdate> {
        let (axis, id, change) = match *event {
            DomainEvent::StationCreated { station } => (FilterAxis::Stations, station.index(), Change::Append),
            DomainEvent::StationRenamed { station } => (FilterAxis::Stations, station.index(), Change::Refresh),
            DomainEvent::StationDestroyed { station } => (FilterAxis::Stations, station.index(), Change::Remove),
            DomainEvent::CompanyCreated { company } => (FilterAxis::Companies, company.index(), Change::Append),
            DomainEvent::CompanyRenamed { company } => (FilterAxis::Companies, company.index(), Change::Refresh),
            DomainEvent::CompanyDestroyed { company } => (FilterAxis::Companies, company.index(), Change::Remove),
            DomainEvent::TownCreated { town } => (FilterAxis::Towns, town.index(), Change::Append),
            DomainEvent::TownRenamed { town } => (FilterAxis::Towns, town.index(), Change::Refresh),
            DomainEvent::TownDestroyed { town } => {
                tracing::warn!("Received destroy event for {town}; towns are never destroyed");
                return Err(FleetError::invariant(messages::TOWN_DESTROYED, format!("{town}")));
            }
            DomainEvent::VehicleCreated { .. }
            | DomainEvent::VehicleDestroyed { .. }
            | DomainEvent::VehicleMovedToGroup { .. }
            | DomainEvent::OrderListMutated { .. } => return Ok(IndexUpdate::default()),
        };

        let mut update = IndexUpdate::default();
        for (handle, model) in &mut self.models {
            if apply(model, world, axis, id, change)? {
                update.redraw.push(*handle);
            }
        }
        for handle in &update.redraw {
            if let Some(model) = self.models.get_mut(handle) {
                model.sort(axis);
            }
        }

        update.catchment_dirty = match (axis, change) {
            (FilterAxis::Stations, Change::Append) => catchment.on_station_created(world, id)?,
            (FilterAxis::Stations, Change::Remove) => catchment.on_station_destroyed(id),
            (FilterAxis::Companies, Change::Append) => catchment.on_company_created(world, id)?,
            (FilterAxis::Companies, Change::Remove) => catchment.on_company_destroyed(id),
            (_, Change::Refresh) => {
                catchment.on_renamed(world, axis, id);
                false
            }
            _ => false,
        };
        if update.catchment_dirty {
            catchment.refresh(world);
        }

        tracing::debug!(
            "Dispatched {:?} to {} of {} models",
            event,
            update.redraw.len(),
            self.models.len()
        );
        Ok(update)
    }
}

fn apply(
    model: &mut FilterModel,
    world: &World,
    axis: FilterAxis,
    id: ElementId,
    change: Change,
) -> Result<bool> {
    match change {
        Change::Append => model.insert_element(world, axis, id),
        Change::Remove => Ok(model.remove_element(axis, id).is_some()),
        Change::Refresh => Ok(model.refresh_element(world, axis, id)),
    }
}
