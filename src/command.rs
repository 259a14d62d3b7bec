//! Builds engine invocations from scenarios.
//!
//! Options are split on whitespace only. There is no quoting or escaping: an
//! option value containing spaces cannot be expressed in a catalog. Catalog
//! authors rely on this simple contract, so it is kept as is.

use crate::catalog::Scenario;
use crate::errors::{Result, TestatorError};
use std::fmt;
use std::path::{Path, PathBuf};

/// A fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// The whole argv, program first.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Splits an option string the naive way: on runs of whitespace.
pub fn tokenize_options(options: &str) -> impl Iterator<Item = &str> {
    options.split_whitespace()
}

/// Turns scenarios into invocations of one engine binary.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    binary: PathBuf,
    example_root: PathBuf,
    launcher: String,
}

impl CommandBuilder {
    pub fn new(
        binary: impl Into<PathBuf>,
        example_root: impl Into<PathBuf>,
        launcher: impl Into<String>,
    ) -> Self {
        Self {
            binary: binary.into(),
            example_root: example_root.into(),
            launcher: launcher.into(),
        }
    }

    pub fn build(&self, scenario: &Scenario) -> Invocation {
        let binary = self.binary.display().to_string();
        let inputs = scenario
            .input_files
            .iter()
            .map(|name| self.example_root.join(name).display().to_string());
        let options = tokenize_options(&scenario.options).map(str::to_string);

        if scenario.is_distributed() {
            let mut args = vec![
                "-n".to_string(),
                scenario.node_count.to_string(),
                binary,
            ];
            args.extend(inputs);
            args.extend(options);
            Invocation {
                program: self.launcher.clone(),
                args,
            }
        } else {
            Invocation {
                program: binary,
                args: inputs.chain(options).collect(),
            }
        }
    }
}

/// The one global precondition of a run: the engine binary is on disk.
pub fn ensure_binary_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(TestatorError::MissingBinary {
            path: path.to_path_buf(),
        })
    }
}
