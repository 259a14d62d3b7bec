//! Runs engine invocations.
//!
//! The exit status is reported back but never decides a verdict: only the
//! files the engine leaves behind do. A crashing engine and an engine that
//! printed the wrong answer look the same to the harness.

use crate::command::Invocation;
use std::io;
use std::process::{Command, Stdio};

/// Where the child's combined output goes.
pub struct CapturedOutput {
    pub stdout: Stdio,
    pub stderr: Stdio,
}

/// Executes one invocation to completion.
pub trait ProcessRunner {
    /// Blocks until the process exits and returns its exit code, `None` if it
    /// was killed by a signal. An `Err` means it could not be started.
    fn run(&mut self, invocation: &Invocation, output: CapturedOutput) -> io::Result<Option<i32>>;
}

/// Spawns real processes, with no timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation, output: CapturedOutput) -> io::Result<Option<i32>> {
        tracing::debug!(command = %invocation, "spawning engine");
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(output.stdout)
            .stderr(output.stderr)
            .status()?;
        tracing::debug!(%status, "engine exited");
        Ok(status.code())
    }
}

/// Human-readable exit status for the transcript.
pub fn describe_status(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "terminated by signal".to_string(),
    }
}
