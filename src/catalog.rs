//! Scenario catalog: loading, validation and selection.
//!
//! A catalog is an ordered list of scenarios. Each scenario names the model
//! files handed to the engine, the option string, and the output files whose
//! content must be checked afterwards:
//!
//! ```yaml
//! - purpose: "Test the L/U-nature (L-PTA)"
//!   input_files: ["testL.imi"]
//!   options: "-mode checksyntax -output-result"
//!   expectations:
//!     - file: "testL.res"
//!       content: |
//!         L/U subclass                            : L-PTA
//! - purpose: "Distributed cartography"
//!   input_files: ["flipflop.imi", "flipflop.v0"]
//!   options: "-mode cover -distributed static"
//!   node_count: 4                 # optional, defaults to 1
//!   expectations:
//!     - file: "flipflop.res"
//!       content: ""               # the file only has to exist
//! ```
//!
//! Catalogs are validated as a whole when loaded, so a malformed entry stops
//! the run before the first scenario is launched.

use crate::errors::{Result, TestatorError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// =============================================================================
// CORE TYPES
// =============================================================================

/// One end-to-end run of the engine plus the files it must produce.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub purpose: String,
    /// Model files, in argv order, relative to the example root.
    pub input_files: Vec<String>,
    /// Engine flags, split on whitespace when the command is built.
    pub options: String,
    /// Number of ranks for a distributed run. Anything above 1 goes through the launcher.
    #[serde(default = "default_node_count", alias = "nb_nodes")]
    pub node_count: u32,
    pub expectations: Vec<Expectation>,
}

/// A single-file content assertion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    /// Output path relative to the example root.
    pub file: String,
    /// Fragment that must appear in the file, whitespace-insensitively.
    /// Empty means the file only has to exist.
    #[serde(default)]
    pub content: String,
}

fn default_node_count() -> u32 {
    1
}

impl Scenario {
    pub fn is_distributed(&self) -> bool {
        self.node_count > 1
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.purpose.trim().is_empty() {
            return Err("purpose must not be empty".to_string());
        }
        if self.input_files.is_empty() {
            return Err("input_files must list at least one file".to_string());
        }
        if let Some(blank) = self.input_files.iter().position(|f| f.trim().is_empty()) {
            return Err(format!("input file #{} is empty", blank + 1));
        }
        if let Some(absolute) = self.input_files.iter().find(|f| Path::new(f).is_absolute()) {
            return Err(format!(
                "input file '{absolute}' must be relative to the example root"
            ));
        }
        if self.node_count == 0 {
            return Err("node_count must be at least 1".to_string());
        }
        if self.expectations.is_empty() {
            return Err("expectations must contain at least one entry".to_string());
        }
        for (i, expectation) in self.expectations.iter().enumerate() {
            if expectation.file.trim().is_empty() {
                return Err(format!("expectation #{} has an empty file name", i + 1));
            }
            if Path::new(&expectation.file).is_absolute() {
                return Err(format!(
                    "expectation #{} file '{}' must be relative to the example root",
                    i + 1,
                    expectation.file
                ));
            }
        }
        Ok(())
    }
}

/// An ordered, validated sequence of scenarios.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
}

// =============================================================================
// LOADING
// =============================================================================

impl ScenarioCatalog {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self { scenarios }
    }

    /// Parses a YAML catalog. `name` is used in diagnostics.
    pub fn from_yaml_str(name: &str, text: &str) -> Result<Self> {
        let scenarios: Vec<Scenario> = serde_yaml::from_str(text).map_err(|e| {
            let offset = e.location().map(|loc| loc.index());
            TestatorError::catalog_parse(name, text, e.to_string(), offset)
        })?;
        Self::validated(name, scenarios)
    }

    /// Parses a JSON catalog. `name` is used in diagnostics.
    pub fn from_json_str(name: &str, text: &str) -> Result<Self> {
        let scenarios: Vec<Scenario> = serde_json::from_str(text).map_err(|e| {
            let offset = line_col_to_offset(text, e.line(), e.column());
            TestatorError::catalog_parse(name, text, e.to_string(), offset)
        })?;
        Self::validated(name, scenarios)
    }

    /// Loads a catalog file, or every catalog file below a directory in sorted order.
    pub fn load(path: &Path) -> Result<Self> {
        if path.is_dir() {
            let files = discover_catalog_files(path)?;
            let mut catalogs = Vec::with_capacity(files.len());
            for file in files {
                catalogs.push(Self::load_file(&file)?);
            }
            return Ok(Self::concat(catalogs));
        }
        Self::load_file(path)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| TestatorError::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path.display().to_string();
        let catalog = if has_extension(path, &["json"]) {
            Self::from_json_str(&name, &text)?
        } else {
            Self::from_yaml_str(&name, &text)?
        };
        tracing::debug!(catalog = %name, scenarios = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    fn validated(name: &str, scenarios: Vec<Scenario>) -> Result<Self> {
        for (i, scenario) in scenarios.iter().enumerate() {
            scenario
                .validate()
                .map_err(|reason| TestatorError::InvalidScenario {
                    catalog: name.to_string(),
                    index: i + 1,
                    purpose: scenario.purpose.clone(),
                    reason,
                })?;
        }
        Ok(Self { scenarios })
    }

    /// Joins catalogs end to end, keeping their order.
    pub fn concat(catalogs: impl IntoIterator<Item = ScenarioCatalog>) -> Self {
        Self {
            scenarios: catalogs.into_iter().flat_map(|c| c.scenarios).collect(),
        }
    }

    /// Keeps the scenarios whose purpose contains `needle`, ignoring case.
    pub fn filtered(self, needle: &str) -> Self {
        let needle = needle.to_lowercase();
        Self {
            scenarios: self
                .scenarios
                .into_iter()
                .filter(|s| s.purpose.to_lowercase().contains(&needle))
                .collect(),
        }
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Finds every YAML or JSON file below `root`, sorted for a stable run order.
pub fn discover_catalog_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| TestatorError::CatalogWalk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && has_extension(entry.path(), &["yaml", "yml", "json"]) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, wanted: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| wanted.iter().any(|w| ext.eq_ignore_ascii_case(w)))
        .unwrap_or(false)
}

// serde_json reports 1-based line and column; 0 means "unknown".
fn line_col_to_offset(text: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    Some(line_start + column.saturating_sub(1))
}
