//! Catchment command handler.
//!
//! Applies station, owner and cargo selections to the catchment overlay
//! and reports which stations are drawn and how many tiles they catch.

use super::load_session;
use super::output::{resolve_format, write_output, OutputFormat, OutputTarget};
use crate::catchment::ClassCounts;
use crate::config::AppConfig;
use crate::filter::{ClickMode, ElementId, FilterAxis};
use crate::model::StationId;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

pub struct CatchmentRunConfig {
    pub scenario: PathBuf,
    /// Stations to show; overrides every other axis
    pub stations: Vec<u32>,
    pub companies: Vec<u8>,
    pub cargos: Vec<u8>,
    /// Cargos whose accepting stations are hidden
    pub exclude_cargos: Vec<u8>,
    pub output: OutputFormat,
    pub output_file: Option<PathBuf>,
    pub quiet: bool,
}

#[derive(Serialize)]
struct CatchmentSummary {
    stations_modified: bool,
    active_stations: Vec<StationId>,
    #[serde(flatten)]
    counts: ClassCounts,
}

pub fn run_catchment(config: CatchmentRunConfig, app: AppConfig) -> Result<()> {
    let mut session = load_session(&config.scenario, app)?;

    // one click makes an element positive, two make it negative
    let clicks = [
        (FilterAxis::Stations, ids(&config.stations), 1),
        (FilterAxis::Companies, ids(&config.companies), 1),
        (FilterAxis::CargoAccepted, ids(&config.cargos), 1),
        (FilterAxis::CargoAccepted, ids(&config.exclude_cargos), 2),
    ];
    for (axis, elements, times) in clicks {
        for id in elements {
            for _ in 0..times {
                session
                    .toggle_catchment(axis, id, ClickMode::Cycle)
                    .with_context(|| format!("selecting {axis} element {id}"))?;
            }
        }
    }

    let catchment = session.catchment();
    let summary = CatchmentSummary {
        stations_modified: catchment.stations_modified(),
        active_stations: catchment.active_stations().to_vec(),
        counts: catchment.class_counts(),
    };

    let target = OutputTarget::from_option(config.output_file);
    let text = match resolve_format(config.output, &target) {
        OutputFormat::Json => serde_json::to_string_pretty(&summary)?,
        _ => {
            let world = session.world();
            let mut out = String::new();
            let _ = writeln!(out, "{} stations drawn", summary.active_stations.len());
            for id in &summary.active_stations {
                let name = world.station(*id).map_or("?", |s| s.name.as_str());
                let _ = writeln!(out, "  {id:<12} {name}");
            }
            let _ = writeln!(
                out,
                "{} tiles caught once, {} caught more than once",
                summary.counts.caught_once, summary.counts.caught_multiple
            );
            out
        }
    };
    write_output(&text, &target, config.quiet)
}

fn ids<T: Copy + Into<u32>>(values: &[T]) -> Vec<ElementId> {
    values.iter().map(|&v| v.into()).collect()
}
