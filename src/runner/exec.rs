//! Command execution primitive shared by every runner phase.
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

/// A command line split on whitespace; no shell interpretation, so quoting
/// and globbing are not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// `None` for a blank command line.
    pub fn parse(command: &str) -> Option<Self> {
        let mut tokens = command.split_whitespace().map(str::to_string);
        let program = tokens.next()?;
        Some(Self {
            program,
            args: tokens.collect(),
        })
    }

    pub fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit status of a finished command; `code` is `None` when it was killed
/// by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Capability for spawning commands on the host.
pub trait CommandRunner {
    /// Run `invocation` in `workdir` with inherited stdio, overlaying `env` on
    /// the process environment. Errors only when the command cannot be spawned.
    fn run(
        &self,
        workdir: &Path,
        invocation: &Invocation,
        env: &BTreeMap<String, String>,
    ) -> Result<CommandStatus>;

    /// True when `invocation` runs and exits successfully; output is discarded.
    fn probe(&self, invocation: &Invocation) -> bool;
}

/// Spawns real processes.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        workdir: &Path,
        invocation: &Invocation,
        env: &BTreeMap<String, String>,
    ) -> Result<CommandStatus> {
        let start = Instant::now();
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(workdir)
            .envs(env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("spawn {}", invocation.program))?;
        tracing::info!(
            command = %invocation,
            status = %status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "command finished"
        );
        Ok(CommandStatus {
            code: status.code(),
        })
    }

    fn probe(&self, invocation: &Invocation) -> bool {
        if which::which(&invocation.program).is_err() {
            return false;
        }
        Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}
