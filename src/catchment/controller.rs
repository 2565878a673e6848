//! The catchment overlay controller.

use super::radius::{catchment_radius, coverage};
use crate::config::CatchmentConfig;
use crate::error::Result;
use crate::filter::predicate::{self, Candidate};
use crate::filter::{
    AxisMask, CatchmentProperty, ClickMode, ElementId, ElementState, FilterAxis, FilterModel,
};
use crate::model::{CompanyId, Station, StationId, Tile, World};
use serde::Serialize;
use std::collections::HashMap;

/// How many active stations catch a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TileClass {
    Uncaught,
    CaughtOnce,
    CaughtMultiple,
}

/// Overlay colour of a tile, after the catchment-property toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayTint {
    None,
    Uncaught,
    Caught,
    Overlap,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    pub caught_once: usize,
    pub caught_multiple: usize,
}

/// Filter model driving the map catchment overlay.
///
/// While `stations_modified` is set the stations axis alone decides which
/// stations are shown; otherwise the active stations are those passing the
/// model's other axes.
#[derive(Debug, Clone)]
pub struct CatchmentController {
    model: FilterModel,
    stations_modified: bool,
    modified_catchment: bool,
    unmodified_radius: u32,
    active: Vec<StationId>,
    coverage: HashMap<Tile, u32>,
}

impl CatchmentController {
    pub const AXES: [FilterAxis; 5] = [
        FilterAxis::Stations,
        FilterAxis::Companies,
        FilterAxis::CargoAccepted,
        FilterAxis::StationFacilities,
        FilterAxis::CatchmentProperties,
    ];

    #[must_use]
    pub fn new(list_owner: Option<CompanyId>, modified_catchment: bool, unmodified_radius: u32) -> Self {
        Self {
            model: FilterModel::new(AxisMask::of(&Self::AXES), list_owner),
            stations_modified: false,
            modified_catchment,
            unmodified_radius,
            active: Vec::new(),
            coverage: HashMap::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &CatchmentConfig, list_owner: Option<CompanyId>) -> Self {
        Self::new(list_owner, config.modified_catchment, config.unmodified_radius)
    }

    #[must_use]
    pub const fn model(&self) -> &FilterModel {
        &self.model
    }

    #[must_use]
    pub const fn stations_modified(&self) -> bool {
        self.stations_modified
    }

    /// Stations currently drawn, in domain order.
    #[must_use]
    pub fn active_stations(&self) -> &[StationId] {
        &self.active
    }

    pub fn build(&mut self, world: &World) {
        self.model.build(world);
        self.stations_modified = self.has_station_selection();
        self.refresh(world);
    }

    /// Apply a click and recompute the overlay.
    pub fn toggle(
        &mut self,
        world: &World,
        axis: FilterAxis,
        id: ElementId,
        mode: ClickMode,
    ) -> Result<ElementState> {
        let state = self.model.toggle(axis, id, mode)?;
        match axis {
            FilterAxis::Stations => {
                self.stations_modified = self.has_station_selection();
                self.refresh(world);
            }
            // display toggles don't move coverage
            FilterAxis::CatchmentProperties => {}
            _ => self.refresh(world),
        }
        Ok(state)
    }

    pub fn reset(&mut self, world: &World) {
        self.model.reset();
        self.stations_modified = false;
        self.refresh(world);
    }

    /// Recompute the active station set and per-tile coverage.
    pub fn refresh(&mut self, world: &World) {
        self.active = world
            .stations()
            .filter(|s| self.shows(world, s))
            .map(|s| s.id)
            .collect();
        self.coverage.clear();
        for station in self.active.iter().filter_map(|id| world.station(*id)) {
            let radius = catchment_radius(station, self.modified_catchment, self.unmodified_radius);
            let (min, max) = coverage(station, radius);
            for x in min.x..=max.x {
                for y in min.y..=max.y {
                    *self.coverage.entry(Tile::new(x, y)).or_insert(0) += 1;
                }
            }
        }
        tracing::debug!(
            "Catchment overlay: {} stations cover {} tiles",
            self.active.len(),
            self.coverage.len()
        );
    }

    #[must_use]
    pub fn tile_class(&self, tile: Tile) -> TileClass {
        match self.coverage.get(&tile).copied().unwrap_or(0) {
            0 => TileClass::Uncaught,
            1 => TileClass::CaughtOnce,
            _ => TileClass::CaughtMultiple,
        }
    }

    #[must_use]
    pub fn overlay_tint(&self, tile: Tile) -> OverlayTint {
        match self.tile_class(tile) {
            TileClass::Uncaught if self.property(CatchmentProperty::ShowUncaught) => {
                OverlayTint::Uncaught
            }
            TileClass::Uncaught => OverlayTint::None,
            TileClass::CaughtMultiple if self.property(CatchmentProperty::ShowOverlap) => {
                OverlayTint::Overlap
            }
            TileClass::CaughtOnce | TileClass::CaughtMultiple => OverlayTint::Caught,
        }
    }

    #[must_use]
    pub fn class_counts(&self) -> ClassCounts {
        let mut counts = ClassCounts::default();
        for count in self.coverage.values() {
            if *count == 1 {
                counts.caught_once += 1;
            } else {
                counts.caught_multiple += 1;
            }
        }
        counts
    }

    fn property(&self, property: CatchmentProperty) -> bool {
        self.model.state(FilterAxis::CatchmentProperties, property.index())
            == Some(ElementState::Positive)
    }

    fn has_station_selection(&self) -> bool {
        !self.model.query_active(FilterAxis::Stations).is_empty()
    }

    fn shows(&self, world: &World, station: &Station) -> bool {
        let candidate = Candidate::Station(station);
        if self.stations_modified {
            predicate::include_axes(&self.model, world, candidate, |a| a == FilterAxis::Stations)
        } else {
            predicate::include_axes(&self.model, world, candidate, |a| a != FilterAxis::Stations)
        }
    }

    // ========================================================================
    // Index hooks; each returns true if the overlay must be recomputed
    // ========================================================================

    pub(crate) fn on_station_created(&mut self, world: &World, id: ElementId) -> Result<bool> {
        if !self.model.insert_element(world, FilterAxis::Stations, id)? {
            return Ok(false);
        }
        self.model.sort(FilterAxis::Stations);
        let Some(station) = world.station(StationId(id)) else {
            return Ok(false);
        };
        let passes = predicate::include_axes(&self.model, world, Candidate::Station(station), |a| {
            a != FilterAxis::Stations
        });
        if passes && self.stations_modified {
            self.model
                .set_state(FilterAxis::Stations, id, ElementState::Positive)?;
        }
        Ok(passes)
    }

    pub(crate) fn on_station_destroyed(&mut self, id: ElementId) -> bool {
        self.model.remove_element(FilterAxis::Stations, id);
        if self.stations_modified && !self.has_station_selection() {
            // back to the other axes deciding
            self.stations_modified = false;
            return true;
        }
        self.active.contains(&StationId(id))
    }

    pub(crate) fn on_company_created(&mut self, world: &World, id: ElementId) -> Result<bool> {
        if self.model.insert_element(world, FilterAxis::Companies, id)? {
            self.model.sort(FilterAxis::Companies);
        }
        Ok(false)
    }

    pub(crate) fn on_company_destroyed(&mut self, id: ElementId) -> bool {
        self.model.remove_element(FilterAxis::Companies, id);
        true
    }

    pub(crate) fn on_renamed(&mut self, world: &World, axis: FilterAxis, id: ElementId) {
        if self.model.refresh_element(world, axis, id) {
            self.model.sort(axis);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::small_world;
    use crate::model::CargoId;

    fn controller(world: &World) -> CatchmentController {
        let mut c = CatchmentController::new(None, true, 4);
        c.build(world);
        c
    }

    #[test]
    fn test_unfiltered_overlay_covers_every_station() {
        let world = small_world();
        let c = controller(&world);
        assert_eq!(c.active_stations().len(), 3);
        assert_eq!(c.tile_class(Tile::new(10, 10)), TileClass::CaughtOnce);
        assert_eq!(c.tile_class(Tile::new(13, 13)), TileClass::CaughtOnce);
        assert_eq!(c.tile_class(Tile::new(14, 10)), TileClass::Uncaught);
    }

    #[test]
    fn test_cargo_filter_drops_stations() {
        let world = small_world();
        let mut c = controller(&world);
        // only coal acceptors
        c.toggle(&world, FilterAxis::CargoAccepted, CargoId(1).index(), ClickMode::Cycle)
            .unwrap();
        assert_eq!(c.active_stations(), &[StationId(1)]);
        assert_eq!(c.tile_class(Tile::new(10, 10)), TileClass::Uncaught);
    }

    #[test]
    fn test_station_axis_is_authoritative_when_modified() {
        let world = small_world();
        let mut c = controller(&world);
        c.toggle(&world, FilterAxis::CargoAccepted, CargoId(1).index(), ClickMode::Cycle)
            .unwrap();
        c.toggle(&world, FilterAxis::Stations, 2, ClickMode::Cycle).unwrap();
        assert!(c.stations_modified());
        // Corby Halt does not accept coal but is selected directly
        assert_eq!(c.active_stations(), &[StationId(2)]);
        c.toggle(&world, FilterAxis::Stations, 2, ClickMode::Remove).unwrap();
        assert!(!c.stations_modified());
        assert_eq!(c.active_stations(), &[StationId(1)]);
    }

    #[test]
    fn test_overlay_tint_honours_properties() {
        let world = small_world();
        let mut c = controller(&world);
        let far = Tile::new(200, 200);
        assert_eq!(c.overlay_tint(far), OverlayTint::None);
        c.toggle(&world, FilterAxis::CatchmentProperties, CatchmentProperty::ShowUncaught.index(), ClickMode::Cycle)
            .unwrap();
        assert_eq!(c.overlay_tint(far), OverlayTint::Uncaught);
        assert_eq!(c.overlay_tint(Tile::new(10, 10)), OverlayTint::Caught);
    }
}
