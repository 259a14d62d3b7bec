//! Testator run orchestration.
//!
//! A run is one or more suites. A suite pairs an engine binary with a
//! catalog and a log file, and walks the catalog strictly in order:
//!
//! 1. **Build**: turn the scenario into an invocation
//! 2. **Launch**: run it to completion, output captured in the log
//! 3. **Verify**: check every expectation against the produced files
//! 4. **Clean up**: delete the produced files
//! 5. **Tally**: count the scenario and its expectations
//!
//! Everything that can go fatally wrong (a missing binary, a bad catalog) is
//! checked for every suite before the first scenario of the first suite is
//! launched.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use testator::config::HarnessConfig;
//! use testator::harness;
//! use testator::runner::SystemRunner;
//! use termcolor::{ColorChoice, StandardStream};
//!
//! let config = HarnessConfig::default();
//! let summary = harness::run(&config, &mut SystemRunner, || {
//!     StandardStream::stdout(ColorChoice::Auto)
//! })
//! .expect("fatal harness error");
//! if !summary.total.all_passed() {
//!     std::process::exit(2);
//! }
//! ```

use crate::catalog::{Scenario, ScenarioCatalog};
use crate::command::{ensure_binary_exists, CommandBuilder};
use crate::config::{HarnessConfig, SuiteConfig};
use crate::errors::{Result, TestatorError};
use crate::report::Reporter;
use crate::runner::{describe_status, ProcessRunner};
use crate::tally::RunCounters;
use crate::verify::{remove_artifacts, OutputVerifier, ScenarioCheck};
use std::path::{Path, PathBuf};
use termcolor::WriteColor;
use time::macros::format_description;
use time::OffsetDateTime;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// CORE TYPES
// =============================================================================

/// A suite ready to run: binary checked, catalog loaded and validated.
#[derive(Debug, Clone)]
pub struct Suite {
    pub binary_name: String,
    pub log_path: PathBuf,
    pub builder: CommandBuilder,
    pub verifier: OutputVerifier,
    pub catalog: ScenarioCatalog,
}

/// Counters per suite, plus their sum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub suites: Vec<(String, RunCounters)>,
    pub total: RunCounters,
}

impl RunSummary {
    fn record(&mut self, binary_name: &str, counters: RunCounters) {
        self.total.absorb(&counters);
        self.suites.push((binary_name.to_string(), counters));
    }
}

// =============================================================================
// PREPARATION
// =============================================================================

/// Checks the binary and loads the catalogs of one suite.
pub fn prepare_suite(config: &HarnessConfig, suite: &SuiteConfig) -> Result<Suite> {
    let binary = config.binary_path(suite);
    ensure_binary_exists(&binary)?;

    let mut catalogs = Vec::with_capacity(suite.catalogs.len());
    for path in config.catalog_paths(suite) {
        catalogs.push(ScenarioCatalog::load(&path)?);
    }
    let mut catalog = ScenarioCatalog::concat(catalogs);
    if let Some(filter) = config.filter.as_deref() {
        catalog = catalog.filtered(filter);
    }

    let example_root = config.example_root();
    tracing::info!(
        binary = %binary.display(),
        scenarios = catalog.len(),
        "suite prepared"
    );
    Ok(Suite {
        binary_name: suite.binary_name.clone(),
        log_path: config.log_path(suite),
        builder: CommandBuilder::new(binary, &example_root, &config.launcher),
        verifier: OutputVerifier::new(example_root),
        catalog,
    })
}

/// Prepares every configured suite, failing on the first fatal problem.
pub fn prepare(config: &HarnessConfig) -> Result<Vec<Suite>> {
    config
        .suites
        .iter()
        .map(|suite| prepare_suite(config, suite))
        .collect()
}

// =============================================================================
// EXECUTION
// =============================================================================

/// Runs one scenario and records it.
pub fn run_scenario<R, C>(
    suite: &Suite,
    scenario: &Scenario,
    runner: &mut R,
    reporter: &mut Reporter<C>,
    counters: &mut RunCounters,
) -> Result<bool>
where
    R: ProcessRunner + ?Sized,
    C: WriteColor,
{
    let id = counters.next_scenario_id();
    reporter.scenario_header(id, &scenario.purpose)?;

    let invocation = suite.builder.build(scenario);
    reporter.command(&invocation)?;

    // The engine writes straight into the log file; nothing of ours may be pending.
    reporter.flush_log()?;
    let launched = runner.run(&invocation, reporter.captured_output()?);
    reporter.flush_log()?;

    match launched {
        Ok(code) => reporter.exit_status(&describe_status(code))?,
        Err(e) => {
            tracing::warn!(scenario = id, command = %invocation, error = %e, "engine launch failed");
            reporter.launch_failure(&e)?;
        }
    }

    let check = suite.verifier.verify(scenario, counters);
    settle_scenario(&check, reporter, counters)
}

/// Logs the verdicts of a checked scenario, deletes its artifacts and records it.
///
/// A file that cannot be deleted is only warned about; the verdict stands.
pub fn settle_scenario<C: WriteColor>(
    check: &ScenarioCheck,
    reporter: &mut Reporter<C>,
    counters: &mut RunCounters,
) -> Result<bool> {
    for outcome in &check.outcomes {
        reporter.expectation(outcome)?;
    }
    for (path, e) in remove_artifacts(&check.artifacts) {
        tracing::warn!(path = %path.display(), error = %e, "could not remove output file");
        reporter.removal_failure(&path, &e)?;
    }

    let passed = check.passed();
    counters.record_scenario(passed);
    if !passed {
        reporter.scenario_failed()?;
    }
    Ok(passed)
}

/// Runs every scenario of a prepared suite and prints its summary.
pub fn run_suite<R, C>(
    suite: &Suite,
    runner: &mut R,
    reporter: &mut Reporter<C>,
) -> Result<RunCounters>
where
    R: ProcessRunner + ?Sized,
    C: WriteColor,
{
    reporter.suite_header(&suite.binary_name)?;
    let mut counters = RunCounters::new();
    for scenario in suite.catalog.scenarios() {
        run_scenario(suite, scenario, runner, reporter, &mut counters)?;
    }
    reporter.summary(&counters)?;
    reporter.flush_log()?;
    Ok(counters)
}

/// Full run: banner, every configured suite in order, closing line.
///
/// `make_console` is called once per suite.
pub fn run<R, C, F>(config: &HarnessConfig, runner: &mut R, mut make_console: F) -> Result<RunSummary>
where
    R: ProcessRunner + ?Sized,
    C: WriteColor,
    F: FnMut() -> C,
{
    let mut summary = RunSummary::default();
    let Some(first) = config.suites.first() else {
        return Ok(summary);
    };

    let mut first_reporter = open_reporter(&config.log_path(first), make_console())?;
    first_reporter.banner(VERSION, &now_string())?;

    let suites = match prepare(config) {
        Ok(suites) => suites,
        Err(e) => {
            first_reporter.write_log("Fatal error!")?;
            first_reporter.write_log(&e.to_string())?;
            first_reporter.flush_log()?;
            return Err(e);
        }
    };

    let last = suites.len() - 1;
    let mut pending = Some(first_reporter);
    for (i, suite) in suites.iter().enumerate() {
        let mut reporter = match pending.take() {
            Some(reporter) => reporter,
            None => open_reporter(&suite.log_path, make_console())?,
        };
        let counters = run_suite(suite, runner, &mut reporter)?;
        if i == last {
            reporter.write_both("")?;
            reporter.write_both("…The end of TESTATOR!")?;
            reporter.flush_log()?;
        }
        summary.record(&suite.binary_name, counters);
    }
    Ok(summary)
}

fn open_reporter<C: WriteColor>(path: &Path, console: C) -> Result<Reporter<C>> {
    Reporter::create(path, console).map_err(|source| TestatorError::LogOpen {
        path: path.to_path_buf(),
        source,
    })
}

fn now_string() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let format = format_description!(
        "[weekday] [day]. [month repr:long] [year] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"
    );
    now.format(&format).unwrap_or_else(|_| now.to_string())
}
