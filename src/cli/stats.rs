//! Stats command handler.
//!
//! Loads a scenario, runs the global rebuild and prints every non-empty
//! statistics bucket.

use super::output::{resolve_format, write_output, OutputFormat, OutputTarget};
use super::load_session;
use crate::config::AppConfig;
use crate::model::{CompanyId, GroupId, VehicleType, World};
use crate::stats::{BucketKey, GroupStatistics};
use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

pub struct StatsConfig {
    pub scenario: PathBuf,
    pub company: Option<u8>,
    pub vehicle_type: Option<VehicleType>,
    pub output: OutputFormat,
    pub output_file: Option<PathBuf>,
    pub quiet: bool,
}

#[derive(Serialize)]
struct BucketRow<'a> {
    #[serde(flatten)]
    key: BucketKey,
    group_name: Option<&'a str>,
    #[serde(flatten)]
    stats: &'a GroupStatistics,
}

pub fn run_stats(config: StatsConfig, app: AppConfig) -> Result<()> {
    let session = load_session(&config.scenario, app)?;
    let world = session.world();
    let rows: Vec<BucketRow<'_>> = session
        .stats()
        .non_empty_buckets()
        .into_iter()
        .filter(|(key, _)| config.company.map_or(true, |c| key.company == CompanyId(c)))
        .filter(|(key, _)| config.vehicle_type.map_or(true, |vt| key.vehicle_type == vt))
        .map(|(key, stats)| BucketRow {
            key,
            group_name: world.group(key.group).and_then(|g| g.name.as_deref()),
            stats,
        })
        .collect();
    tracing::info!("{} non-empty buckets", rows.len());

    let target = OutputTarget::from_option(config.output_file);
    let text = match resolve_format(config.output, &target) {
        OutputFormat::Json => serde_json::to_string_pretty(&rows)?,
        _ => format_table(world, &rows),
    };
    write_output(&text, &target, config.quiet)
}

fn format_table(world: &World, rows: &[BucketRow<'_>]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<16} {:<9} {:>8} {:>8} {:>12} {:>12} {:>6}  {:<12} {}",
        "company", "group", "type", "vehicles", "earning", "profit", "min profit", "load", "orders", "cargo"
    );
    for row in rows {
        let group = match row.key.group {
            GroupId::ALL => "(all)".to_string(),
            GroupId::DEFAULT => "(ungrouped)".to_string(),
            id => row.group_name.map_or_else(|| id.to_string(), str::to_string),
        };
        let company = world
            .company(row.key.company)
            .map_or_else(|| row.key.company.to_string(), |c| c.name.clone());
        let min_profit = row
            .stats
            .min_profit_vehicle
            .map_or_else(|| "-".to_string(), |m| m.profit.to_string());
        let _ = writeln!(
            out,
            "{:<12} {:<16} {:<9} {:>8} {:>8} {:>12} {:>12} {:>5}%  {:<12} {}",
            company,
            group,
            row.key.vehicle_type,
            row.stats.num_vehicle,
            row.stats.num_profit_vehicle,
            row.stats.profit_last_year,
            min_profit,
            row.stats.load_percent(),
            row.stats.ol_type.name(),
            world.cargo_names(row.stats.cargo_types),
        );
    }
    out
}
