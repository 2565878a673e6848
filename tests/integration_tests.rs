//! Integration tests for fleet-filters
//!
//! These drive a [`Session`] loaded from a scenario file through the public
//! API: statistics, filter models, the catchment overlay and group commands.

use fleet_filters::groups::{CommandMode, GroupCommand, Heuristic};
use fleet_filters::model::{
    CargoTypes, CompanyId, GroupId, OrderListId, OrderListType, Scenario, Station, StationFacility,
    StationId, Tile, TownId, VehicleId, VehicleType,
};
use fleet_filters::stats::BucketKey;
use fleet_filters::{
    AppConfig, AxisMask, Candidate, ClickMode, ElementState, ErrorKind, FilterAxis, Session,
    TileClass,
};
use std::collections::BTreeSet;
use std::path::Path;

// ============================================================================
// Test Fixtures
// ============================================================================

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

const ACME: CompanyId = CompanyId(0);
const RIVAL: CompanyId = CompanyId(1);

fn fixture_scenario() -> Scenario {
    Scenario::from_path(&Path::new(FIXTURES_DIR).join("small_network.yaml"))
        .expect("fixture scenario should parse")
}

fn fixture_session() -> Session {
    Session::from_scenario(fixture_scenario(), AppConfig::default())
        .expect("fixture scenario should load")
}

fn assert_exact(session: &Session) {
    assert_eq!(session.divergence(), Vec::<BucketKey>::new());
}

fn auto_group(session: &mut Session, heuristic: Heuristic) -> fleet_filters::Result<()> {
    let command = GroupCommand::AutoGroup {
        vehicle_type: VehicleType::Road,
        heuristic,
    };
    session.execute(ACME, &command, CommandMode::Exec).map(|_| ())
}

/// Vehicle sets and names of every road group of Acme, ignoring ids.
fn group_partition(session: &Session) -> BTreeSet<(Option<String>, Vec<VehicleId>)> {
    let world = session.world();
    world
        .groups_of(ACME, VehicleType::Road)
        .map(|g| {
            let mut members: Vec<VehicleId> = world
                .vehicles()
                .filter(|v| v.is_primary() && v.group == g.id)
                .map(|v| v.id)
                .collect();
            members.sort();
            (g.name.clone(), members)
        })
        .collect()
}

fn dock(id: u32, owner: CompanyId, at: Tile) -> Station {
    Station {
        id: StationId(id),
        name: format!("Harbour {id}"),
        owner,
        town: TownId(2),
        facilities: vec![StationFacility::Dock].into(),
        airport_type: None,
        location: at,
        width: 1,
        height: 1,
        accepted: CargoTypes::EMPTY,
        supplied: CargoTypes::EMPTY,
    }
}

// ============================================================================
// Statistics
// ============================================================================

mod statistics_tests {
    use super::*;

    #[test]
    fn test_fixture_loads_with_exact_statistics() {
        let session = fixture_session();
        assert_exact(&session);

        let all = session.group_statistics(ACME, GroupId::ALL, VehicleType::Road);
        assert_eq!(all.num_vehicle, 3);
        assert_eq!(
            all.order_lists,
            BTreeSet::from([OrderListId(1), OrderListId(2)])
        );
        // only the two buses are past the profit age
        assert_eq!(all.num_profit_vehicle, 2);
        assert_eq!(all.profit_last_year, 900);

        let rail = session.group_statistics(ACME, GroupId::ALL, VehicleType::Rail);
        assert_eq!(rail.num_vehicle, 1);
        assert_eq!(rail.num_engines.values().sum::<u32>(), 1);
    }

    #[test]
    fn test_auto_group_by_order_list_empties_default() {
        let mut session = fixture_session();
        auto_group(&mut session, Heuristic::OrderList).unwrap();
        assert_exact(&session);

        assert_eq!(session.world().groups_of(ACME, VehicleType::Road).count(), 2);
        let default = session.group_statistics(ACME, GroupId::DEFAULT, VehicleType::Road);
        assert_eq!(default.num_vehicle, 0);
        let all = session.group_statistics(ACME, GroupId::ALL, VehicleType::Road);
        assert_eq!(all.num_vehicle, 3);

        // Rival's bus and Acme's train are untouched
        assert_eq!(
            session
                .group_statistics(RIVAL, GroupId::DEFAULT, VehicleType::Road)
                .num_vehicle,
            1
        );
        assert_eq!(
            session
                .group_statistics(ACME, GroupId::DEFAULT, VehicleType::Rail)
                .num_vehicle,
            1
        );
    }

    #[test]
    fn test_selling_min_profit_vehicle_rescans() {
        let mut session = fixture_session();
        let before = session.group_statistics(ACME, GroupId::ALL, VehicleType::Road);
        assert_eq!(before.min_profit_vehicle.map(|m| m.vehicle), Some(VehicleId(2)));

        session.sell_vehicle(VehicleId(2)).unwrap();
        assert_exact(&session);
        for group in [GroupId::ALL, GroupId::DEFAULT] {
            let bucket = session.group_statistics(ACME, group, VehicleType::Road);
            let min = bucket.min_profit_vehicle.expect("bus 1 still qualifies");
            assert_eq!(min.vehicle, VehicleId(1));
            assert_eq!(min.profit, 1200);
        }
    }

    #[test]
    fn test_empty_company_has_zero_buckets_and_noop_auto_group() {
        let mut scenario = fixture_scenario();
        scenario.companies.push(fleet_filters::model::Company {
            id: CompanyId(5),
            name: "Newcomer".into(),
            colour: fleet_filters::model::Colour::default(),
            human: false,
        });
        let mut session = Session::from_scenario(scenario, AppConfig::default()).unwrap();

        for group in [GroupId::ALL, GroupId::DEFAULT] {
            let bucket = session.group_statistics(CompanyId(5), group, VehicleType::Road);
            assert_eq!(bucket.num_vehicle, 0);
            assert_eq!(bucket.profit_last_year, 0);
            assert!(bucket.min_profit_vehicle.is_none());
        }

        let outcome = session
            .execute(
                CompanyId(5),
                &GroupCommand::AutoGroup {
                    vehicle_type: VehicleType::Road,
                    heuristic: Heuristic::Cargo,
                },
                CommandMode::Exec,
            )
            .unwrap();
        assert!(outcome.affected_vehicles.is_empty());
        assert_eq!(session.world().groups_of(CompanyId(5), VehicleType::Road).count(), 0);
        assert_exact(&session);
    }

    #[test]
    fn test_vehicle_without_orders() {
        let session = fixture_session();
        let bucket = session.group_statistics(RIVAL, GroupId::ALL, VehicleType::Road);
        assert_eq!(bucket.num_vehicle, 1);
        assert_eq!(bucket.cargo_types, CargoTypes::from(vec![fleet_filters::model::CargoId(0)]));
        assert_eq!(bucket.ol_type, OrderListType::Empty);
        assert!(bucket.order_lists.is_empty());
    }
}

// ============================================================================
// Filters and catchment
// ============================================================================

mod filter_tests {
    use super::*;

    #[test]
    fn test_company_positive_and_cargo_negative() {
        let mut session = fixture_session();
        let handle = session.open_model(
            AxisMask::of(&[FilterAxis::Companies, FilterAxis::CargoAccepted]),
            None,
        );
        let state = session
            .toggle(handle, FilterAxis::Companies, ACME.index(), ClickMode::Cycle)
            .unwrap();
        assert_eq!(state, ElementState::Positive);
        let coal = 1;
        session
            .toggle(handle, FilterAxis::CargoAccepted, coal, ClickMode::Cycle)
            .unwrap();
        let state = session
            .toggle(handle, FilterAxis::CargoAccepted, coal, ClickMode::Cycle)
            .unwrap();
        assert_eq!(state, ElementState::Negative);

        let world = session.world();
        let model = session.model(handle).unwrap();
        let include = |id: u32| {
            let station = world.station(StationId(id)).unwrap();
            model.include(world, Candidate::Station(station))
        };
        // Brindle Yard: Acme, coal only
        assert!(!include(1));
        // Aston Central: Acme, passengers and mail
        assert!(include(0));
        // Corby Halt: Rival, mail
        assert!(!include(2));
        assert_eq!(session.filtered_stations(handle).unwrap(), vec![StationId(0)]);
    }

    #[test]
    fn test_station_creation_reaches_models_and_overlay() {
        let mut session = fixture_session();
        let stations = session.open_model(AxisMask::of(&[FilterAxis::Stations]), None);
        let towns = session.open_model(AxisMask::of(&[FilterAxis::Towns]), None);

        let update = session.build_station(dock(9, RIVAL, Tile::new(150, 150))).unwrap();
        assert_eq!(update.redraw, vec![stations]);
        assert!(!update.redraw.contains(&towns));
        assert!(update.catchment_dirty);

        let list = session
            .model(stations)
            .unwrap()
            .list(FilterAxis::Stations)
            .unwrap();
        assert!(list.get(9).is_some());
        assert!(session.catchment().active_stations().contains(&StationId(9)));
        assert_eq!(
            session.catchment().tile_class(Tile::new(150, 150)),
            TileClass::CaughtOnce
        );
        assert_eq!(
            session.catchment().tile_class(Tile::new(156, 150)),
            TileClass::Uncaught
        );
    }

    #[test]
    fn test_overlapping_stations_are_caught_multiple() {
        let mut session = fixture_session();
        session.build_station(dock(9, ACME, Tile::new(150, 150))).unwrap();
        session.build_station(dock(10, ACME, Tile::new(156, 150))).unwrap();
        assert_eq!(
            session.catchment().tile_class(Tile::new(153, 150)),
            TileClass::CaughtMultiple
        );
    }

    #[test]
    fn test_catchment_selection_hides_other_stations() {
        let mut session = fixture_session();
        session
            .toggle_catchment(FilterAxis::Stations, 2, ClickMode::Cycle)
            .unwrap();
        assert!(session.catchment().stations_modified());
        assert_eq!(session.catchment().active_stations(), &[StationId(2)]);
        assert_eq!(
            session.catchment().tile_class(Tile::new(10, 10)),
            TileClass::Uncaught
        );

        session.reset_catchment();
        assert!(!session.catchment().stations_modified());
        assert_eq!(session.catchment().active_stations().len(), 3);
    }

    #[test]
    fn test_new_station_joins_an_existing_selection() {
        let mut session = fixture_session();
        session
            .toggle_catchment(FilterAxis::Stations, 2, ClickMode::Cycle)
            .unwrap();
        session
            .toggle_catchment(FilterAxis::Companies, ACME.index(), ClickMode::Cycle)
            .unwrap();
        assert_eq!(session.catchment().active_stations(), &[StationId(2)]);

        let update = session.build_station(dock(9, ACME, Tile::new(150, 150))).unwrap();
        assert!(update.catchment_dirty);
        assert_eq!(
            session.catchment().model().state(FilterAxis::Stations, 9),
            Some(ElementState::Positive)
        );
        assert_eq!(
            session.catchment().active_stations(),
            &[StationId(2), StationId(9)]
        );

        // Rival's dock fails the company axis and stays out of the selection
        let update = session.build_station(dock(10, RIVAL, Tile::new(200, 200))).unwrap();
        assert!(!update.catchment_dirty);
        assert_eq!(
            session.catchment().model().state(FilterAxis::Stations, 10),
            Some(ElementState::Neutral)
        );
        assert_eq!(
            session.catchment().active_stations(),
            &[StationId(2), StationId(9)]
        );
        assert_eq!(
            session.catchment().tile_class(Tile::new(200, 200)),
            TileClass::Uncaught
        );
    }

    #[test]
    fn test_removing_the_last_selected_station_clears_the_selection() {
        let mut session = fixture_session();
        session.build_station(dock(9, ACME, Tile::new(150, 150))).unwrap();
        for station in [2, 9] {
            session
                .toggle_catchment(FilterAxis::Stations, station, ClickMode::Cycle)
                .unwrap();
        }

        let update = session.remove_station(StationId(2)).unwrap();
        assert!(update.catchment_dirty);
        assert!(session.catchment().stations_modified());
        assert_eq!(session.catchment().active_stations(), &[StationId(9)]);

        let update = session.remove_station(StationId(9)).unwrap();
        assert!(update.catchment_dirty);
        assert!(!session.catchment().stations_modified());
        assert_eq!(
            session.catchment().active_stations(),
            &[StationId(0), StationId(1)]
        );
    }

    #[test]
    fn test_build_reset_build_keeps_axis_order() {
        let mut session = fixture_session();
        let handle = session.open_model(AxisMask::all(), None);
        let order = |session: &Session| -> Vec<(FilterAxis, Vec<u32>)> {
            let model = session.model(handle).unwrap();
            FilterAxis::ALL
                .iter()
                .map(|axis| (*axis, model.iter(*axis).map(|e| e.id).collect()))
                .collect()
        };
        let before = order(&session);
        session
            .toggle(handle, FilterAxis::Towns, 1, ClickMode::Cycle)
            .unwrap();
        session.reset_model(handle).unwrap();
        assert_eq!(order(&session), before);
        assert_eq!(session.model(handle).unwrap().active().count(), 0);
    }

    #[test]
    fn test_vehicle_listing_follows_served_towns() {
        let mut session = fixture_session();
        let handle = session.open_model(AxisMask::of(&[FilterAxis::Towns]), Some(ACME));
        let all = session.filtered_vehicles(handle, VehicleType::Road).unwrap();
        assert_eq!(all, vec![VehicleId(1), VehicleId(2), VehicleId(3)]);

        // Brindle is served by every Acme road route; Corby by none
        session
            .toggle(handle, FilterAxis::Towns, 2, ClickMode::Cycle)
            .unwrap();
        assert!(session
            .filtered_vehicles(handle, VehicleType::Road)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_destroying_a_town_is_rejected() {
        let mut session = fixture_session();
        let err = session.destroy_town(TownId(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        assert!(session.world().town(TownId(1)).is_some());
    }
}

// ============================================================================
// Group commands
// ============================================================================

mod group_tests {
    use super::*;

    fn create_group(session: &mut Session, parent: Option<GroupId>) -> GroupId {
        session
            .execute(
                ACME,
                &GroupCommand::CreateGroup {
                    vehicle_type: VehicleType::Road,
                    parent,
                },
                CommandMode::Exec,
            )
            .unwrap()
            .new_group
            .expect("create returns the new id")
    }

    #[test]
    fn test_reparent_under_itself_changes_nothing() {
        let mut session = fixture_session();
        let root = create_group(&mut session, None);
        let child = create_group(&mut session, Some(root));

        for parent in [root, child] {
            let err = session
                .execute(
                    ACME,
                    &GroupCommand::ReparentGroup {
                        group: root,
                        parent: Some(parent),
                    },
                    CommandMode::Exec,
                )
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        }
        assert_eq!(session.world().group(root).unwrap().parent, None);
        assert_eq!(session.world().group(child).unwrap().parent, Some(root));
        assert_exact(&session);
    }

    #[test]
    fn test_rename_rules() {
        let mut session = fixture_session();
        let first = create_group(&mut session, None);
        let second = create_group(&mut session, None);
        let rename = |group, name: &str| GroupCommand::RenameGroup {
            group,
            name: name.into(),
        };

        session
            .execute(ACME, &rename(first, "Express"), CommandMode::Exec)
            .unwrap();
        let err = session
            .execute(ACME, &rename(second, "Express"), CommandMode::Exec)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NameConflict);

        // empty names never conflict
        session.execute(ACME, &rename(first, ""), CommandMode::Exec).unwrap();
        session.execute(ACME, &rename(second, ""), CommandMode::Exec).unwrap();
        assert_eq!(session.world().group(first).unwrap().name, None);
        assert_eq!(session.world().group(second).unwrap().name, None);
    }

    #[test]
    fn test_non_owner_cannot_mutate() {
        let mut session = fixture_session();
        let group = create_group(&mut session, None);
        let err = session
            .execute(
                RIVAL,
                &GroupCommand::DeleteGroup { group },
                CommandMode::Exec,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorisation);
        assert!(session.world().group(group).is_some());
    }

    #[test]
    fn test_auto_group_is_idempotent_modulo_ids() {
        let mut session = fixture_session();
        for heuristic in [Heuristic::OrderList, Heuristic::Cargo, Heuristic::CargoThenOrder] {
            auto_group(&mut session, heuristic).unwrap();
            let first = group_partition(&session);
            auto_group(&mut session, heuristic).unwrap();
            assert_eq!(group_partition(&session), first, "{heuristic}");
            assert_exact(&session);
        }
    }

    #[test]
    fn test_pool_exhaustion_is_reported_before_mutation() {
        let mut scenario = fixture_scenario();
        scenario.group_capacity = Some(3);
        let mut session = Session::from_scenario(scenario, AppConfig::default()).unwrap();
        let err = auto_group(&mut session, Heuristic::OrderList).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PoolExhausted);

        assert_eq!(session.world().groups().count(), 0);
        assert!(session
            .world()
            .vehicles()
            .all(|v| v.group == GroupId::DEFAULT));
        assert_exact(&session);
    }

    #[test]
    fn test_dry_run_reports_without_changes() {
        let mut session = fixture_session();
        let outcome = session
            .execute(
                ACME,
                &GroupCommand::AutoGroup {
                    vehicle_type: VehicleType::Road,
                    heuristic: Heuristic::OrderList,
                },
                CommandMode::DryRun,
            )
            .unwrap();
        let report = outcome.report.expect("auto-group reports its plan");
        assert!(!report.applied);
        assert_eq!(report.groups.len(), 2);
        assert_eq!(session.world().groups().count(), 0);
    }

    #[test]
    fn test_regrouped_scenario_survives_a_save() {
        let mut session = fixture_session();
        auto_group(&mut session, Heuristic::CargoThenOrder).unwrap();
        let yaml = serde_yaml::to_string(&Scenario::from_world(session.world())).unwrap();

        let reloaded =
            Session::from_scenario(Scenario::from_yaml_str(&yaml).unwrap(), AppConfig::default())
                .unwrap();
        assert_exact(&reloaded);
        assert_eq!(group_partition(&reloaded), group_partition(&session));
    }
}
