//! Testator error handling.
//!
//! Everything that can stop a run before or between scenarios lands in
//! [`TestatorError`]. Scenario-level problems (missing outputs, mismatched
//! content, an engine that could not be launched) are *not* errors: they are
//! verdicts, recorded by the verifier and counted by the tally.

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TestatorError>;

// ============================================================================
// ERROR ENUM
// ============================================================================

/// Fatal harness errors. Any of these aborts the run.
#[derive(Error, Diagnostic, Debug)]
pub enum TestatorError {
    #[error("Binary {} does not exist", path.display())]
    #[diagnostic(
        code(testator::fatal::missing_binary),
        help("build the engine first, or point --root at the directory containing bin/")
    )]
    MissingBinary { path: PathBuf },

    #[error("Failed to read catalog '{}'", path.display())]
    #[diagnostic(code(testator::catalog::read))]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk catalog directory '{}'", path.display())]
    #[diagnostic(code(testator::catalog::walk))]
    CatalogWalk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Malformed catalog {name}: {message}")]
    #[diagnostic(code(testator::catalog::parse))]
    CatalogParse {
        name: String,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
    },

    #[error("Invalid scenario #{index} ('{purpose}') in {catalog}: {reason}")]
    #[diagnostic(
        code(testator::catalog::invalid_scenario),
        help("required fields: purpose, input_files, options, expectations; node_count is optional")
    )]
    InvalidScenario {
        catalog: String,
        index: usize,
        purpose: String,
        reason: String,
    },

    #[error("Cannot open log file '{}'", path.display())]
    #[diagnostic(code(testator::log::open))]
    LogOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while writing the report")]
    #[diagnostic(code(testator::io))]
    Io(#[from] std::io::Error),
}

impl TestatorError {
    /// Builds a parse error pointing at `offset` inside the catalog text.
    pub fn catalog_parse(
        name: &str,
        source: &str,
        message: impl Into<String>,
        offset: Option<usize>,
    ) -> Self {
        let span = offset.map(|at| {
            let at = at.min(source.len());
            let len = if at < source.len() { 1 } else { 0 };
            SourceSpan::from((at, len))
        });
        TestatorError::CatalogParse {
            name: name.to_string(),
            message: message.into(),
            src: NamedSource::new(name, source.to_string()),
            span,
        }
    }

    /// True for the error raised when the engine binary is absent.
    pub fn is_missing_binary(&self) -> bool {
        matches!(self, TestatorError::MissingBinary { .. })
    }
}
