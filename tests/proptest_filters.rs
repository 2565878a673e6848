//! Property-based tests for filter models and the inclusion predicate.

use fleet_filters::filter::predicate::project;
use fleet_filters::filter::{AxisMask, Candidate, ClickMode, ElementState, FilterAxis, FilterModel, Projection};
use fleet_filters::model::{Scenario, World};
use proptest::prelude::*;
use std::path::Path;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/small_network.yaml");

fn fixture_world() -> World {
    Scenario::from_path(Path::new(FIXTURE))
        .and_then(Scenario::into_world)
        .expect("fixture scenario should load")
}

fn built_model(world: &World) -> FilterModel {
    let mut model = FilterModel::new(AxisMask::all(), None);
    model.build(world);
    model
}

fn axis_strategy() -> impl Strategy<Value = FilterAxis> {
    (0..FilterAxis::ALL.len()).prop_map(|i| FilterAxis::ALL[i])
}

/// The `index`-th element id of an axis, wrapping around.
fn element_at(model: &FilterModel, axis: FilterAxis, index: usize) -> Option<u32> {
    let ids: Vec<u32> = model.iter(axis).map(|e| e.id).collect();
    if ids.is_empty() {
        None
    } else {
        Some(ids[index % ids.len()])
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_toggle_has_period_three(
        clicks in prop::collection::vec((axis_strategy(), any::<usize>()), 0..12),
        axis in axis_strategy(),
        index in any::<usize>(),
    ) {
        let world = fixture_world();
        let mut model = built_model(&world);
        for (a, i) in clicks {
            if let Some(id) = element_at(&model, a, i) {
                model.toggle(a, id, ClickMode::Cycle).unwrap();
            }
        }
        let Some(id) = element_at(&model, axis, index) else {
            return Ok(());
        };
        let start = model.state(axis, id);
        for _ in 0..3 {
            model.toggle(axis, id, ClickMode::Cycle).unwrap();
        }
        prop_assert_eq!(model.state(axis, id), start);
    }

    #[test]
    fn prop_active_is_subset_of_axis_lists(
        clicks in prop::collection::vec((axis_strategy(), any::<usize>(), any::<bool>()), 0..20),
    ) {
        let world = fixture_world();
        let mut model = built_model(&world);
        for (axis, i, remove) in clicks {
            if let Some(id) = element_at(&model, axis, i) {
                let mode = if remove { ClickMode::Remove } else { ClickMode::Cycle };
                model.toggle(axis, id, mode).unwrap();
            }
        }
        for axis in FilterAxis::ALL {
            let selection = model.query_active(axis);
            for id in &selection.positive {
                prop_assert_eq!(model.state(axis, *id), Some(ElementState::Positive));
            }
            for id in &selection.negative {
                prop_assert_eq!(model.state(axis, *id), Some(ElementState::Negative));
            }
        }
        for element in model.active() {
            prop_assert!(element.state.is_active());
            prop_assert!(model.iter(element.axis).any(|e| e.id == element.id));
        }
    }

    #[test]
    fn prop_adding_an_exhibited_positive_keeps_stations_included(
        clicks in prop::collection::vec((axis_strategy(), any::<usize>()), 0..10),
        axis in axis_strategy(),
        station_index in any::<usize>(),
        value_index in any::<usize>(),
    ) {
        let world = fixture_world();
        let mut model = built_model(&world);
        for (a, i) in clicks {
            if let Some(id) = element_at(&model, a, i) {
                model.toggle(a, id, ClickMode::Cycle).unwrap();
            }
        }

        let stations: Vec<_> = world.stations().collect();
        let station = stations[station_index % stations.len()];
        let candidate = Candidate::Station(station);
        if !model.include(&world, candidate) {
            return Ok(());
        }
        let Projection::Values(values) = project(&world, candidate, axis) else {
            return Ok(());
        };
        let values: Vec<u32> = values.into_iter().collect();
        if values.is_empty() {
            return Ok(());
        }
        let value = values[value_index % values.len()];
        if model.state(axis, value) != Some(ElementState::Neutral) {
            return Ok(());
        }
        model.set_state(axis, value, ElementState::Positive).unwrap();
        prop_assert!(model.include(&world, candidate));
    }

    #[test]
    fn prop_reset_restores_unfiltered_listing(
        clicks in prop::collection::vec((axis_strategy(), any::<usize>()), 0..15),
    ) {
        let world = fixture_world();
        let mut model = built_model(&world);
        for (a, i) in clicks {
            if let Some(id) = element_at(&model, a, i) {
                model.toggle(a, id, ClickMode::Cycle).unwrap();
            }
        }
        model.reset();
        prop_assert_eq!(model.active().count(), 0);
        for vehicle in world.vehicles().filter(|v| v.is_primary()) {
            prop_assert!(model.include(&world, Candidate::Vehicle(vehicle)));
        }
    }
}
