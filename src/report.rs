//! Reporting context for one suite run.
//!
//! A [`Reporter`] owns two sinks: the verbose transcript (a log file that the
//! engine also writes into) and the terse console. Callers pick the sink per
//! message; nothing swaps process-wide output streams.

use crate::command::Invocation;
use crate::runner::CapturedOutput;
use crate::tally::RunCounters;
use crate::verify::{ExpectationOutcome, Verdict};
use difference::{Changeset, Difference};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use termcolor::{Color, ColorSpec, WriteColor};

const RULE: &str = "############################################################";

// ============================================================================
// STYLES
// ============================================================================

/// Console styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Bold,
    Success,
    Warning,
    Error,
}

impl Style {
    /// Success when everything passed, warning otherwise.
    pub fn for_ratio(passed: usize, total: usize) -> Style {
        if passed == total {
            Style::Success
        } else {
            Style::Warning
        }
    }

    fn spec(self) -> ColorSpec {
        let mut spec = ColorSpec::new();
        match self {
            Style::Plain => {}
            Style::Bold => {
                spec.set_bold(true);
            }
            Style::Success => {
                spec.set_fg(Some(Color::Green))
                    .set_bg(Some(Color::Black))
                    .set_bold(true);
            }
            Style::Warning => {
                spec.set_fg(Some(Color::Yellow))
                    .set_bg(Some(Color::Black))
                    .set_intense(true);
            }
            Style::Error => {
                spec.set_fg(Some(Color::White))
                    .set_bg(Some(Color::Red))
                    .set_bold(true);
            }
        }
        spec
    }
}

// ============================================================================
// REPORTER
// ============================================================================

pub struct Reporter<C: WriteColor> {
    log: File,
    log_path: PathBuf,
    console: C,
}

impl<C: WriteColor> Reporter<C> {
    /// Creates (truncating) the log file at `log_path`.
    pub fn create(log_path: &Path, console: C) -> io::Result<Self> {
        if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let log = File::create(log_path)?;
        Ok(Self {
            log,
            log_path: log_path.to_path_buf(),
            console,
        })
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn write_log(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.log, "{}", text)
    }

    pub fn write_console(&mut self, text: &str, style: Style) -> io::Result<()> {
        if style == Style::Plain {
            return writeln!(self.console, "{}", text);
        }
        self.console.set_color(&style.spec())?;
        write!(self.console, "{}", text)?;
        self.console.reset()?;
        writeln!(self.console)
    }

    pub fn write_both(&mut self, text: &str) -> io::Result<()> {
        self.write_log(text)?;
        self.write_console(text, Style::Plain)
    }

    pub fn flush_log(&mut self) -> io::Result<()> {
        self.log.flush()
    }

    /// Handles onto the log for a child's stdout and stderr.
    pub fn captured_output(&self) -> io::Result<CapturedOutput> {
        Ok(CapturedOutput {
            stdout: Stdio::from(self.log.try_clone()?),
            stderr: Stdio::from(self.log.try_clone()?),
        })
    }

    // ------------------------------------------------------------------------
    // Transcript pieces
    // ------------------------------------------------------------------------

    pub fn banner(&mut self, version: &str, date: &str) -> io::Result<()> {
        self.write_both(RULE)?;
        let title = format!(" TESTATOR{:>50}", format!("v{version}"));
        self.write_console(&title, Style::Bold)?;
        self.write_log(&title)?;
        self.write_both("")?;
        self.write_both(" Non-regression tests for the analysis engine")?;
        self.write_both(RULE)?;
        self.write_both(date)
    }

    pub fn suite_header(&mut self, binary_name: &str) -> io::Result<()> {
        self.write_console("", Style::Plain)?;
        self.write_console(&format!("# TESTING BINARY {binary_name}"), Style::Bold)?;
        self.write_log(&format!("# TESTING BINARY {binary_name}"))
    }

    pub fn scenario_header(&mut self, id: usize, purpose: &str) -> io::Result<()> {
        self.write_log("")?;
        self.write_log("")?;
        self.write_log(RULE)?;
        self.write_log(&format!(" BENCHMARK {id}"))?;
        self.write_log(&format!(" purpose: {purpose}"))?;
        self.write_log("")?;
        self.write_console(&format!(" Benchmark {id}: {purpose}.."), Style::Plain)
    }

    pub fn command(&mut self, invocation: &Invocation) -> io::Result<()> {
        self.write_log(&format!(" command : {invocation}"))
    }

    pub fn exit_status(&mut self, status: &str) -> io::Result<()> {
        self.write_log(&format!(" exit status: {status} (not used for verdicts)"))
    }

    pub fn launch_failure(&mut self, error: &io::Error) -> io::Result<()> {
        self.write_log(&format!(" *** Warning: could not launch the engine: {error}"))
    }

    pub fn removal_failure(&mut self, path: &Path, error: &io::Error) -> io::Result<()> {
        self.write_log(&format!(
            " *** Warning: could not remove {}: {error}",
            path.display()
        ))
    }

    pub fn expectation(&mut self, outcome: &ExpectationOutcome) -> io::Result<()> {
        // Scenario-local id, then the position across the whole suite.
        let id = format!("{} (#{})", outcome.id, outcome.id.global);
        match &outcome.verdict {
            Verdict::Passed => self.write_log(&format!(" Test {id} passed.")),
            Verdict::MissingFile { path } => self.write_log(&format!(
                " File {} does not exist! Test {id} failed.",
                path.display()
            )),
            Verdict::Unreadable { path, reason } => self.write_log(&format!(
                " File {} could not be read ({reason})! Test {id} failed.",
                path.display()
            )),
            Verdict::ContentMismatch { expected, found, .. } => {
                self.write_log(&format!(" Test {id} failed!"))?;
                self.write_log("\n*** Expected content for this test:")?;
                self.write_log(&format!("\n{expected}\n\n"))?;
                self.write_log("*** Content found:")?;
                self.write_log(&format!("\n{found}\n\n"))?;
                self.normalized_diff(expected, found)
            }
        }
    }

    pub fn scenario_failed(&mut self) -> io::Result<()> {
        self.write_console("FAILED!", Style::Error)
    }

    fn normalized_diff(&mut self, expected: &str, found: &str) -> io::Result<()> {
        let expected = crate::verify::normalize_whitespace(expected);
        let found = crate::verify::normalize_whitespace(found);
        let changeset = Changeset::new(&expected, &found, " ");
        self.write_log("*** Normalized difference (- expected, + found):")?;
        let mut line = String::new();
        for diff in &changeset.diffs {
            let piece = match diff {
                Difference::Same(x) => x.clone(),
                Difference::Rem(x) => format!("[-{x}-]"),
                Difference::Add(x) => format!("{{+{x}+}}"),
            };
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&piece);
        }
        self.write_log(&line)?;
        self.write_log("")
    }

    // ------------------------------------------------------------------------
    // Summary
    // ------------------------------------------------------------------------

    pub fn summary(&mut self, counters: &RunCounters) -> io::Result<()> {
        self.write_log(&format!("\n\n{RULE}"))?;

        let (sp, st) = (counters.scenario_passed, counters.scenario_total);
        let (ep, et) = (counters.expectation_passed, counters.expectation_total);

        if counters.all_passed() {
            self.write_both(&format!("All benchmarks ({sp}/{st}) passed successfully."))?;
            self.write_both(&format!("All test cases ({ep}/{et}) passed successfully."))?;
        } else {
            self.write_console("WARNING! Some tests failed.", Style::Warning)?;
            self.write_log("WARNING! Some tests failed.")?;
            self.ratio_lines("benchmarks", sp, st)?;
            self.ratio_lines("test cases", ep, et)?;
        }

        let details = format!("(See {} for details.)", self.log_path.display());
        self.write_console(&details, Style::Plain)
    }

    fn ratio_lines(&mut self, what: &str, passed: usize, total: usize) -> io::Result<()> {
        let passed_line = format!("{passed}/{total} {what} passed successfully.");
        self.write_console(&passed_line, Style::for_ratio(passed, total))?;
        self.write_log(&passed_line)?;

        let failed_line = format!("{}/{total} {what} failed.", total - passed);
        self.write_console(&failed_line, Style::Error)?;
        self.write_log(&failed_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    fn reporter(dir: &Path) -> Reporter<Buffer> {
        Reporter::create(&dir.join("logs/tests.log"), Buffer::no_color()).unwrap()
    }

    fn console_text(reporter: &Reporter<Buffer>) -> String {
        String::from_utf8_lossy(reporter.console().as_slice()).into_owned()
    }

    fn log_text(reporter: &mut Reporter<Buffer>) -> String {
        reporter.flush_log().unwrap();
        std::fs::read_to_string(reporter.log_path()).unwrap()
    }

    #[test]
    fn sinks_are_kept_apart() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = reporter(dir.path());
        r.write_log("only in log").unwrap();
        r.write_console("only on console", Style::Warning).unwrap();
        r.write_both("everywhere").unwrap();

        let console = console_text(&r);
        let log = log_text(&mut r);
        assert!(console.contains("only on console"));
        assert!(!console.contains("only in log"));
        assert!(log.contains("only in log"));
        assert!(!log.contains("only on console"));
        assert!(console.contains("everywhere") && log.contains("everywhere"));
    }

    #[test]
    fn ratio_style_is_success_only_when_complete() {
        assert_eq!(Style::for_ratio(3, 3), Style::Success);
        assert_eq!(Style::for_ratio(0, 0), Style::Success);
        assert_eq!(Style::for_ratio(2, 3), Style::Warning);
    }

    #[test]
    fn colored_console_gets_escape_codes() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = Reporter::create(&dir.path().join("t.log"), Buffer::ansi()).unwrap();
        r.write_console("FAILED!", Style::Error).unwrap();
        let console = String::from_utf8_lossy(r.console().as_slice()).into_owned();
        assert!(console.contains("\x1b["));
        assert!(console.contains("FAILED!"));
    }

    #[test]
    fn summary_when_everything_passed() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = reporter(dir.path());
        let counters = RunCounters {
            scenario_total: 2,
            scenario_passed: 2,
            expectation_total: 3,
            expectation_passed: 3,
        };
        r.summary(&counters).unwrap();
        let console = console_text(&r);
        assert!(console.contains("All benchmarks (2/2) passed successfully."));
        assert!(console.contains("All test cases (3/3) passed successfully."));
        assert!(console.contains("for details.)"));
        assert!(log_text(&mut r).contains("All test cases (3/3)"));
    }

    #[test]
    fn summary_with_failures_reports_both_granularities() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = reporter(dir.path());
        let counters = RunCounters {
            scenario_total: 2,
            scenario_passed: 1,
            expectation_total: 4,
            expectation_passed: 3,
        };
        r.summary(&counters).unwrap();
        let console = console_text(&r);
        assert!(console.contains("WARNING! Some tests failed."));
        assert!(console.contains("1/2 benchmarks passed successfully."));
        assert!(console.contains("1/2 benchmarks failed."));
        assert!(console.contains("3/4 test cases passed successfully."));
        assert!(console.contains("1/4 test cases failed."));
    }

    #[test]
    fn mismatch_logs_literal_texts() {
        use crate::tally::ExpectationId;
        let dir = tempfile::tempdir().unwrap();
        let mut r = reporter(dir.path());
        let outcome = ExpectationOutcome {
            id: ExpectationId {
                scenario: 1,
                index: 2,
                global: 2,
            },
            verdict: Verdict::ContentMismatch {
                path: dir.path().join("a.res"),
                expected: "K = 1".to_string(),
                found: "K   =\n2".to_string(),
            },
        };
        r.expectation(&outcome).unwrap();
        let log = log_text(&mut r);
        assert!(log.contains(" Test 1.2 (#2) failed!"));
        assert!(log.contains("*** Expected content for this test:"));
        assert!(log.contains("K   =\n2"));
        assert!(log.contains("[-1-]"));
        assert!(log.contains("{+2+}"));
    }
}
