//! Restoring a snapshot's environments inside the sandbox.
//!
//! The lifecycle is strictly sequential: secrets first, then each
//! environment's preflight, setup and run steps in order, then any legacy
//! global commands.
pub mod exec;
pub mod install;
pub mod prompt;
pub mod secrets;

use crate::metadata::{EnvironmentConfig, LifecycleCommands, SnapshotMetadata};
use crate::resolve::devpack::{devpack_reference, Devpack};
use crate::util::summarize_deps;
use anyhow::{anyhow, bail, Context, Result};
use exec::{CommandRunner, Invocation};
use install::{plan_install, InstallPlan};
use prompt::Prompter;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Confirm every setup step before running it.
    pub manual: bool,
    /// Secrets file name relative to the sandbox.
    pub secrets_file: String,
}

/// How one environment (or the legacy command block) ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvOutcome {
    Ran,
    RunDeclined,
    NoRunCommand,
    MissingToolchain,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub environments: Vec<(String, EnvOutcome)>,
    pub legacy: Option<EnvOutcome>,
}

/// Whether a failed setup step stops the whole restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetupFailure {
    Warn,
    Abort,
}

pub struct Runner<'a> {
    sandbox: &'a Path,
    commands: &'a dyn CommandRunner,
    prompter: &'a dyn Prompter,
    options: RunOptions,
    session_env: BTreeMap<String, String>,
}

impl<'a> Runner<'a> {
    pub fn new(
        sandbox: &'a Path,
        commands: &'a dyn CommandRunner,
        prompter: &'a dyn Prompter,
        options: RunOptions,
    ) -> Self {
        Self {
            sandbox,
            commands,
            prompter,
            options,
            session_env: BTreeMap::new(),
        }
    }

    /// Drive the full lifecycle for `meta`. Only a failed run step (or a
    /// failed legacy setup step) is fatal.
    pub fn run(&mut self, meta: &SnapshotMetadata) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        if !meta.required_vars.is_empty() {
            println!("Checking {} required secret(s)...", meta.required_vars.len());
            let path = self.sandbox.join(&self.options.secrets_file);
            self.session_env = secrets::prepare_secrets(&path, &meta.required_vars, self.prompter)?;
        }

        for env in &meta.environments {
            let outcome = self.run_environment(env)?;
            summary.environments.push((env.label(), outcome));
        }

        if !meta.commands.setup.is_empty() || meta.commands.run.is_some() {
            summary.legacy = Some(self.run_legacy(&meta.commands)?);
        }
        Ok(summary)
    }

    fn run_environment(&self, env: &EnvironmentConfig) -> Result<EnvOutcome> {
        println!("==> {}", env.label());
        if !self.preflight(env) {
            tracing::warn!(
                environment = %env.kind,
                "toolchain not found on this machine; skipping environment"
            );
            return Ok(EnvOutcome::MissingToolchain);
        }
        for step in &env.setup {
            self.setup_step(step, SetupFailure::Warn)?;
        }
        self.run_step(env.run.as_deref())
    }

    fn run_legacy(&self, commands: &LifecycleCommands) -> Result<EnvOutcome> {
        println!("==> legacy commands");
        for step in &commands.setup {
            self.setup_step(step, SetupFailure::Abort)?;
        }
        self.run_step(commands.run.as_deref())
    }

    /// Unknown and generic environments have nothing to probe and pass.
    fn preflight(&self, env: &EnvironmentConfig) -> bool {
        let Some(probe) = env.runtime().and_then(|runtime| runtime.probe_command()) else {
            return true;
        };
        let Some((program, args)) = probe.split_first() else {
            return true;
        };
        let invocation = Invocation::new(program, args.iter().map(|arg| arg.to_string()).collect());
        self.commands.probe(&invocation)
    }

    fn setup_step(&self, step: &str, on_failure: SetupFailure) -> Result<()> {
        if step.trim().is_empty() {
            return Ok(());
        }
        if self.options.manual && !self.prompter.confirm(&format!("Run setup step `{step}`?")) {
            println!("Skipped: {step}");
            return Ok(());
        }
        let result = match devpack_reference(step) {
            Some(file_name) => self.install_devpack(file_name),
            None => self.execute_line(step),
        };
        match (result, on_failure) {
            (Ok(()), _) => Ok(()),
            (Err(err), SetupFailure::Warn) => {
                tracing::warn!(step, error = %format!("{err:#}"), "setup step failed; continuing");
                Ok(())
            }
            (Err(err), SetupFailure::Abort) => Err(err.context(format!("setup step `{step}`"))),
        }
    }

    fn run_step(&self, command: Option<&str>) -> Result<EnvOutcome> {
        let Some(command) = command.filter(|command| !command.trim().is_empty()) else {
            println!("No run command.");
            return Ok(EnvOutcome::NoRunCommand);
        };
        if !self.prompter.confirm(&format!("Start `{command}`?")) {
            println!("Skipped: {command}");
            return Ok(EnvOutcome::RunDeclined);
        }
        self.execute_line(command)
            .with_context(|| format!("run `{command}`"))?;
        Ok(EnvOutcome::Ran)
    }

    /// A missing devpack file only warns; a malformed one or a failed install
    /// is reported to the caller.
    fn install_devpack(&self, file_name: &str) -> Result<()> {
        let path = self.sandbox.join(file_name);
        if !path.is_file() {
            tracing::warn!(devpack = file_name, "devpack not found; skipping install");
            println!("Could not find {file_name}; skipping dependency install.");
            return Ok(());
        }
        let devpack = Devpack::load(&path)?;
        let names: Vec<String> = devpack.dependencies.keys().cloned().collect();
        match plan_install(&devpack) {
            InstallPlan::Commands(invocations) => {
                if !names.is_empty() {
                    println!("Installing {}", summarize_deps(&names));
                }
                for invocation in &invocations {
                    self.execute(invocation)?;
                }
            }
            InstallPlan::BuildToolManaged(runtime) => {
                println!(
                    "{} dependencies are fetched by its build step; nothing to install.",
                    runtime.as_str()
                );
            }
            InstallPlan::Unsupported(kind) => {
                tracing::warn!(devpack = file_name, kind = %kind, "no installer for devpack type");
            }
        }
        Ok(())
    }

    fn execute_line(&self, line: &str) -> Result<()> {
        let invocation =
            Invocation::parse(line).ok_or_else(|| anyhow!("empty command line"))?;
        self.execute(&invocation)
    }

    fn execute(&self, invocation: &Invocation) -> Result<()> {
        println!("$ {invocation}");
        let status = self
            .commands
            .run(self.sandbox, invocation, &self.session_env)?;
        if status.success() {
            return Ok(());
        }
        match status.code {
            Some(code) => bail!("`{invocation}` exited with status {code}"),
            None => bail!("`{invocation}` was terminated by a signal"),
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
