//! Harness configuration.
//!
//! The directory layout is fixed relative to the project root; only the root
//! itself, suite selection, filtering and coloring are chosen at run time.

use std::path::{Path, PathBuf};
use termcolor::ColorChoice;

/// Launcher used for scenarios with more than one node.
pub const DISTRIBUTED_LAUNCHER: &str = "mpiexec";

/// One pass over a catalog with one engine binary, logged to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteConfig {
    pub binary_name: String,
    /// Log file, relative to the project root.
    pub log_file: PathBuf,
    /// Catalogs run in order, relative to the project root.
    pub catalogs: Vec<PathBuf>,
}

impl SuiteConfig {
    /// The single-process engine over the main catalog.
    pub fn local() -> Self {
        Self {
            binary_name: "imitator".to_string(),
            log_file: PathBuf::from("testing/tests.log"),
            catalogs: vec![PathBuf::from("testing/regression_tests.yaml")],
        }
    }

    /// The distributed engine over the distributed-only catalog, then the main one.
    pub fn distributed() -> Self {
        Self {
            binary_name: "patator".to_string(),
            log_file: PathBuf::from("testing/testsdistr.log"),
            catalogs: vec![
                PathBuf::from("testing/regression_tests_distr.yaml"),
                PathBuf::from("testing/regression_tests.yaml"),
            ],
        }
    }
}

/// Which suites a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SuiteSelection {
    Local,
    Distributed,
    #[default]
    All,
}

/// Configuration for a full harness run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub root: PathBuf,
    pub binary_dir: PathBuf,
    pub example_dir: PathBuf,
    pub launcher: String,
    pub suites: Vec<SuiteConfig>,
    pub filter: Option<String>,
    pub use_colors: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            binary_dir: PathBuf::from("bin"),
            example_dir: PathBuf::from("testing/testcases"),
            launcher: DISTRIBUTED_LAUNCHER.to_string(),
            suites: vec![SuiteConfig::local(), SuiteConfig::distributed()],
            filter: None,
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }
}

impl HarnessConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn select(mut self, selection: SuiteSelection) -> Self {
        self.suites = match selection {
            SuiteSelection::Local => vec![SuiteConfig::local()],
            SuiteSelection::Distributed => vec![SuiteConfig::distributed()],
            SuiteSelection::All => vec![SuiteConfig::local(), SuiteConfig::distributed()],
        };
        self
    }

    pub fn binary_path(&self, suite: &SuiteConfig) -> PathBuf {
        self.root.join(&self.binary_dir).join(&suite.binary_name)
    }

    pub fn example_root(&self) -> PathBuf {
        self.root.join(&self.example_dir)
    }

    pub fn log_path(&self, suite: &SuiteConfig) -> PathBuf {
        self.root.join(&suite.log_file)
    }

    pub fn catalog_paths<'a>(&'a self, suite: &'a SuiteConfig) -> impl Iterator<Item = PathBuf> + 'a {
        suite.catalogs.iter().map(move |c| self.resolve(c))
    }

    pub fn color_choice(&self) -> ColorChoice {
        if self.use_colors {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}
