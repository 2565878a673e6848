//! Output handling for command results.

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::io::IsTerminal;
use std::path::PathBuf;

/// Rendering of a command result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table when writing to a terminal, JSON otherwise
    #[default]
    Auto,
    Table,
    Json,
}

/// Target for output - either stdout or a file
#[derive(Debug, Clone)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    pub fn from_option(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Stdout, Self::File)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stdout) && std::io::stdout().is_terminal()
    }
}

/// Resolve `Auto` against the output target.
pub fn resolve_format(format: OutputFormat, target: &OutputTarget) -> OutputFormat {
    match format {
        OutputFormat::Auto if target.is_terminal() => OutputFormat::Table,
        OutputFormat::Auto => OutputFormat::Json,
        other => other,
    }
}

pub fn write_output(content: &str, target: &OutputTarget, quiet: bool) -> Result<()> {
    match target {
        OutputTarget::Stdout => {
            println!("{content}");
            Ok(())
        }
        OutputTarget::File(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            if !quiet {
                tracing::info!("Output written to {}", path.display());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_target_from_option() {
        assert!(matches!(OutputTarget::from_option(None), OutputTarget::Stdout));
        let target = OutputTarget::from_option(Some(PathBuf::from("/tmp/out.json")));
        assert!(matches!(target, OutputTarget::File(_)));
        assert!(!target.is_terminal());
    }

    #[test]
    fn test_file_target_resolves_auto_to_json() {
        let target = OutputTarget::File(PathBuf::from("stats.json"));
        assert_eq!(resolve_format(OutputFormat::Auto, &target), OutputFormat::Json);
        assert_eq!(resolve_format(OutputFormat::Table, &target), OutputFormat::Table);
    }

    #[test]
    fn test_write_output_to_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.txt");
        write_output("hello", &OutputTarget::File(path.clone()), true).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }
}
