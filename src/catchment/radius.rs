//! Catchment radius and coverage rectangles.

use crate::model::{Station, StationFacility, Tile};

pub const BUS_TRUCK_RADIUS: u32 = 3;
pub const TRAIN_RADIUS: u32 = 4;
pub const DOCK_RADIUS: u32 = 5;
/// Airports of unknown layout
pub const DEFAULT_AIRPORT_RADIUS: u32 = 4;

/// Catchment radius of a station.
///
/// With modified catchment, each facility has its own radius and the
/// station uses the largest. Otherwise every station uses `unmodified`.
#[must_use]
pub fn catchment_radius(station: &Station, modified_catchment: bool, unmodified: u32) -> u32 {
    if !modified_catchment {
        return unmodified;
    }
    station
        .facilities
        .iter()
        .map(|f| match f {
            StationFacility::BusStop | StationFacility::TruckStop => BUS_TRUCK_RADIUS,
            StationFacility::Train => TRAIN_RADIUS,
            StationFacility::Dock => DOCK_RADIUS,
            StationFacility::Airport => station
                .airport_type
                .map_or(DEFAULT_AIRPORT_RADIUS, |a| a.catchment_radius()),
        })
        .max()
        .unwrap_or(unmodified)
}

/// Inclusive tile rectangle `(min, max)` a station catches.
#[must_use]
pub fn coverage(station: &Station, radius: u32) -> (Tile, Tile) {
    let min = Tile::new(
        station.location.x.saturating_sub(radius),
        station.location.y.saturating_sub(radius),
    );
    let max = Tile::new(
        station
            .location
            .x
            .saturating_add(station.width.max(1) - 1)
            .saturating_add(radius),
        station
            .location
            .y
            .saturating_add(station.height.max(1) - 1)
            .saturating_add(radius),
    );
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::small_world;
    use crate::model::{AirportType, StationId};

    #[test]
    fn test_largest_facility_wins() {
        let world = small_world();
        let mut station = world.station(StationId(0)).unwrap().clone();
        assert_eq!(catchment_radius(&station, true, 4), BUS_TRUCK_RADIUS);
        station.facilities = vec![StationFacility::BusStop, StationFacility::Airport].into();
        station.airport_type = Some(AirportType::Intercontinental);
        assert_eq!(catchment_radius(&station, true, 4), 10);
        assert_eq!(catchment_radius(&station, false, 4), 4);
    }

    #[test]
    fn test_coverage_clamps_at_map_edge() {
        let world = small_world();
        let mut station = world.station(StationId(0)).unwrap().clone();
        station.location = Tile::new(1, 2);
        station.width = 2;
        let (min, max) = coverage(&station, 3);
        assert_eq!(min, Tile::new(0, 0));
        assert_eq!(max, Tile::new(5, 5));
    }
}
