use anyhow::Result;
use serde::Deserialize;
use std::{collections::VecDeque, fs, path::Path};

use mdcommand_testkit::CommandRecord;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandScriptFile {
    #[serde(default)]
    name: Option<String>,
    steps: Vec<ScriptStep>,
}

/// One scheduled command and what it should produce.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptStep {
    pub tick: u64,
    pub command: String,
    #[serde(default)]
    pub expect_result: Option<i32>,
    #[serde(default)]
    pub expect_success: Option<bool>,
}

impl ScriptStep {
    /// Describe every expectation `record` misses.
    pub fn check(&self, record: &CommandRecord) -> Vec<String> {
        let mut unmet = Vec::new();
        if let Some(expected) = self.expect_success {
            if expected != record.success {
                unmet.push(format!(
                    "tick {} `{}`: expected success={expected}, got {}",
                    self.tick, self.command, record.success
                ));
            }
        }
        if let Some(expected) = self.expect_result {
            if expected != record.result {
                unmet.push(format!(
                    "tick {} `{}`: expected result {expected}, got {}",
                    self.tick, self.command, record.result
                ));
            }
        }
        unmet
    }

    pub fn expects_failure(&self) -> bool {
        self.expect_success == Some(false)
    }
}

/// Deterministic command script runner.
///
/// Scripts are a list of `{tick, command}` steps, executed in file order.
#[derive(Debug)]
pub struct CommandScriptPlayer {
    name: Option<String>,
    pending: VecDeque<ScriptStep>,
}

impl CommandScriptPlayer {
    /// Load a command script from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    /// Load a command script from an in-memory JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self> {
        let file: CommandScriptFile = serde_json::from_str(contents)?;
        if file.steps.is_empty() {
            anyhow::bail!("command script contains no steps");
        }

        let mut pending = VecDeque::with_capacity(file.steps.len());
        let mut last_tick: Option<u64> = None;
        for mut step in file.steps {
            step.command = step.command.trim().to_string();
            if step.command.is_empty() {
                anyhow::bail!("command script contains an empty command");
            }

            if let Some(prev) = last_tick {
                if step.tick < prev {
                    anyhow::bail!("command script steps must be sorted by tick");
                }
            }
            last_tick = Some(step.tick);
            pending.push_back(step);
        }

        Ok(Self {
            name: file.name,
            pending,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Tick of the next pending step.
    pub fn next_tick(&self) -> Option<u64> {
        self.pending.front().map(|step| step.tick)
    }

    /// Drain and return all steps scheduled for ticks `<= tick`.
    pub fn drain_ready(&mut self, tick: u64) -> Vec<ScriptStep> {
        let mut ready = Vec::new();
        while self.next_tick().is_some_and(|next| next <= tick) {
            if let Some(step) = self.pending.pop_front() {
                ready.push(step);
            }
        }
        ready
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }
}
