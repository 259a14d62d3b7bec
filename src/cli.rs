//! The Testator Command-Line Interface.
//!
//! Parses arguments, builds the harness configuration and maps the outcome
//! of a run onto the process exit status.

use std::{path::PathBuf, process};

use clap::Parser;
use termcolor::StandardStream;

use crate::{
    config::{HarnessConfig, SuiteSelection},
    harness,
    runner::SystemRunner,
};

// ============================================================================
// CLI ARGUMENTS
// ============================================================================

/// Exit status when the run completed but some scenario failed (`--strict` only).
pub const EXIT_REGRESSION: i32 = 2;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "testator",
    version,
    about = "Non-regression tests: runs the engine over the scenario catalogs and checks its output files."
)]
pub struct TestatorArgs {
    /// Project root containing bin/ and testing/.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Which suites to run.
    #[arg(long, value_enum, default_value_t = SuiteSelection::All)]
    pub suite: SuiteSelection,

    /// Only run scenarios whose purpose contains this text (case-insensitive).
    #[arg(long)]
    pub filter: Option<String>,

    /// Disable colored console output.
    #[arg(long)]
    pub no_color: bool,

    /// Exit with a non-zero status when any scenario failed.
    #[arg(long)]
    pub strict: bool,
}

impl TestatorArgs {
    pub fn to_config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::with_root(&self.root).select(self.suite);
        config.filter = self.filter.clone();
        if self.no_color {
            config.use_colors = false;
        }
        config
    }
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    let args = TestatorArgs::parse();
    let config = args.to_config();
    let choice = config.color_choice();

    let summary = match harness::run(&config, &mut SystemRunner, || {
        StandardStream::stdout(choice)
    }) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Fatal error!");
            eprintln!("{:?}", miette::Report::new(e));
            process::exit(1);
        }
    };

    if args.strict && !summary.total.all_passed() {
        process::exit(EXIT_REGRESSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_run_everything_from_cwd() {
        let args = TestatorArgs::parse_from(["testator"]);
        assert_eq!(args.suite, SuiteSelection::All);
        assert!(!args.strict);
        let config = args.to_config();
        assert_eq!(config.root, PathBuf::from("."));
        assert_eq!(config.suites.len(), 2);
    }

    #[test]
    fn flags_reach_the_config() {
        let args = TestatorArgs::parse_from([
            "testator",
            "--root",
            "/opt/imitator",
            "--suite",
            "local",
            "--filter",
            "L/U",
            "--no-color",
        ]);
        let config = args.to_config();
        assert_eq!(config.root, PathBuf::from("/opt/imitator"));
        assert_eq!(config.suites.len(), 1);
        assert_eq!(config.suites[0].binary_name, "imitator");
        assert_eq!(config.filter.as_deref(), Some("L/U"));
        assert!(!config.use_colors);
    }
}
