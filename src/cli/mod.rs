//! CLI command handlers.
//!
//! Each handler loads a scenario into a [`Session`], runs one operation and
//! renders the result. `main.rs` only parses arguments and dispatches here.

mod autogroup;
mod catchment;
mod output;
mod stats;

pub use autogroup::{run_auto_group, AutoGroupConfig};
pub use catchment::{run_catchment, CatchmentRunConfig};
pub use output::{resolve_format, write_output, OutputFormat, OutputTarget};
pub use stats::{run_stats, StatsConfig};

use crate::config::AppConfig;
use crate::model::Scenario;
use crate::session::Session;
use anyhow::{Context, Result};
use std::path::Path;

/// Load a scenario file and start a session over it.
pub fn load_session(path: &Path, config: AppConfig) -> Result<Session> {
    let scenario = Scenario::from_path(path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;
    let session = Session::from_scenario(scenario, config)?;
    tracing::debug!(
        "Loaded {}: {} vehicles, {} groups, {} stations",
        path.display(),
        session.world().vehicles().count(),
        session.world().groups().count(),
        session.world().stations().count()
    );
    Ok(session)
}
