//! Auto-group command handler.

use super::load_session;
use super::output::{resolve_format, write_output, OutputFormat, OutputTarget};
use crate::config::AppConfig;
use crate::groups::{AutoGroupReport, CommandMode, GroupCommand, Heuristic};
use crate::model::{CompanyId, Scenario, VehicleType, World};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::PathBuf;

pub struct AutoGroupConfig {
    pub scenario: PathBuf,
    pub company: u8,
    pub vehicle_type: VehicleType,
    /// Falls back to the configured default heuristic
    pub heuristic: Option<Heuristic>,
    pub dry_run: bool,
    /// Write the regrouped world back out as a scenario
    pub save: Option<PathBuf>,
    pub output: OutputFormat,
    pub output_file: Option<PathBuf>,
    pub quiet: bool,
}

pub fn run_auto_group(config: AutoGroupConfig, app: AppConfig) -> Result<()> {
    let heuristic = config
        .heuristic
        .unwrap_or(app.autogroup.default_heuristic);
    let mut session = load_session(&config.scenario, app)?;
    let command = GroupCommand::AutoGroup {
        vehicle_type: config.vehicle_type,
        heuristic,
    };
    let mode = if config.dry_run {
        CommandMode::DryRun
    } else {
        CommandMode::Exec
    };
    let company = CompanyId(config.company);
    let outcome = session
        .execute(company, &command, mode)
        .with_context(|| format!("auto-group {company}/{} by {heuristic}", config.vehicle_type))?;
    let report = outcome
        .report
        .context("auto-group returned no report")?;

    let target = OutputTarget::from_option(config.output_file);
    let text = match resolve_format(config.output, &target) {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        _ => format_report(session.world(), &report),
    };
    write_output(&text, &target, config.quiet)?;

    if let Some(path) = config.save {
        let yaml = serde_yaml::to_string(&Scenario::from_world(session.world()))?;
        std::fs::write(&path, yaml)
            .with_context(|| format!("Failed to write scenario to {}", path.display()))?;
        if !config.quiet {
            tracing::info!("Regrouped scenario written to {}", path.display());
        }
    }
    Ok(())
}

fn format_report(world: &World, report: &AutoGroupReport) -> String {
    let mut out = String::new();
    let verb = if report.applied { "Replaced" } else { "Would replace" };
    let _ = writeln!(
        out,
        "{verb} {} groups of {}/{} using {} ({} pool slots needed)",
        report.destroyed, report.company, report.vehicle_type, report.heuristic, report.required_slots
    );
    for (index, group) in report.groups.iter().enumerate() {
        let indent = if group.parent.is_some() { "    " } else { "  " };
        let id = group.id.map_or_else(|| format!("#{index}"), |id| id.to_string());
        let _ = writeln!(
            out,
            "{indent}{id:<10} {:<32} {:>4} vehicles  [{}]",
            group.name.as_deref().unwrap_or("(unnamed)"),
            group.vehicles.len(),
            world.cargo_names(group.cargo_types),
        );
    }
    let _ = writeln!(out, "  {} vehicles left ungrouped", report.ungrouped(world));
    out
}
