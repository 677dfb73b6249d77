//! Shared fakes and fixtures for unit tests.
use crate::resolve::versions::ToolQuery;
use crate::runner::exec::{CommandRunner, CommandStatus, Invocation};
use crate::runner::prompt::Prompter;
use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::path::Path;

pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(&path, contents).expect("write fixture file");
}

/// Tool query answering from a fixed table keyed by `"program arg1 arg2"`.
#[derive(Default)]
pub struct CannedQuery {
    pub responses: BTreeMap<String, String>,
    pub calls: RefCell<Vec<String>>,
}

impl ToolQuery for CannedQuery {
    fn stdout(&self, _cwd: &Path, program: &str, args: &[&str]) -> Option<String> {
        let mut key = program.to_string();
        for arg in args {
            key.push(' ');
            key.push_str(arg);
        }
        self.calls.borrow_mut().push(key.clone());
        self.responses.get(&key).cloned()
    }
}

/// Command runner that records every invocation instead of spawning it.
#[derive(Default)]
pub struct RecordingRunner {
    /// Programs whose probe fails.
    pub missing: BTreeSet<String>,
    /// Full command lines that exit with status 1.
    pub failing: BTreeSet<String>,
    /// Full command lines that cannot be spawned at all.
    pub unspawnable: BTreeSet<String>,
    pub calls: RefCell<Vec<String>>,
    pub probes: RefCell<Vec<String>>,
    pub envs: RefCell<Vec<BTreeMap<String, String>>>,
}

impl RecordingRunner {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(
        &self,
        _workdir: &Path,
        invocation: &Invocation,
        env: &BTreeMap<String, String>,
    ) -> Result<CommandStatus> {
        let line = invocation.to_string();
        if self.unspawnable.contains(&line) {
            return Err(anyhow!("spawn {}", invocation.program));
        }
        self.calls.borrow_mut().push(line.clone());
        self.envs.borrow_mut().push(env.clone());
        let code = if self.failing.contains(&line) { 1 } else { 0 };
        Ok(CommandStatus { code: Some(code) })
    }

    fn probe(&self, invocation: &Invocation) -> bool {
        self.probes.borrow_mut().push(invocation.to_string());
        !self.missing.contains(&invocation.program)
    }
}

/// Prompter replaying scripted answers; confirmations default to yes and
/// inputs to blank once the script runs out.
#[derive(Default)]
pub struct ScriptedPrompter {
    pub confirms: RefCell<VecDeque<bool>>,
    pub inputs: RefCell<VecDeque<String>>,
    pub questions: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn with_confirms(answers: &[bool]) -> Self {
        let prompter = Self::default();
        prompter.confirms.borrow_mut().extend(answers.iter().copied());
        prompter
    }

    pub fn with_inputs(answers: &[&str]) -> Self {
        let prompter = Self::default();
        prompter
            .inputs
            .borrow_mut()
            .extend(answers.iter().map(|answer| answer.to_string()));
        prompter
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str) -> bool {
        self.questions.borrow_mut().push(question.to_string());
        self.confirms.borrow_mut().pop_front().unwrap_or(true)
    }

    fn input(&self, question: &str) -> String {
        self.questions.borrow_mut().push(question.to_string());
        self.inputs.borrow_mut().pop_front().unwrap_or_default()
    }
}
