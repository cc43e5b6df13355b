//! Summary reports for command script runs, exported as JSON for CI.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::CommandRecord;

/// Outcome of a whole script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunResult {
    /// Every command succeeded.
    Pass,
    /// A command failed unexpectedly or an expectation was not met.
    Fail,
}

/// Aggregated command counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandTotals {
    pub executed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Sum of every command result.
    pub result_sum: i64,
    pub feedback_lines: usize,
}

/// Top-level report written after a script run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptReport {
    /// Script or scenario name.
    pub name: String,
    /// When the report was built (RFC 3339).
    pub timestamp: String,
    pub seed: u64,
    pub result: RunResult,
    pub commands: CommandTotals,
    /// Block reads performed by the world during the run.
    pub block_reads: u64,
    /// Last tick that ran a command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tick: Option<u64>,
    /// Expectations the run did not meet.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmet: Vec<String>,
}

/// Accumulates command records into a [`ScriptReport`].
pub struct ScriptReportBuilder {
    report: ScriptReport,
}

impl ScriptReportBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            report: ScriptReport {
                name: name.into(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                seed: 0,
                result: RunResult::Pass,
                commands: CommandTotals::default(),
                block_reads: 0,
                last_tick: None,
                unmet: Vec::new(),
            },
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.report.seed = seed;
        self
    }

    pub fn block_reads(mut self, reads: u64) -> Self {
        self.report.block_reads = reads;
        self
    }

    /// Fold one executed command into the totals. A failure fails the run.
    pub fn record(&mut self, record: &CommandRecord) {
        self.tally(record);
        if !record.success {
            self.report.result = RunResult::Fail;
        }
    }

    /// Like [`record`](Self::record), for a command that was meant to fail.
    pub fn record_expected_failure(&mut self, record: &CommandRecord) {
        self.tally(record);
    }

    /// Note an unmet expectation; the run fails.
    pub fn unmet(&mut self, message: impl Into<String>) {
        self.report.unmet.push(message.into());
        self.report.result = RunResult::Fail;
    }

    fn tally(&mut self, record: &CommandRecord) {
        let totals = &mut self.report.commands;
        totals.executed += 1;
        if record.success {
            totals.succeeded += 1;
        } else {
            totals.failed += 1;
        }
        totals.result_sum += i64::from(record.result);
        totals.feedback_lines += record.feedback.len();
        self.report.last_tick = Some(
            self.report
                .last_tick
                .map_or(record.tick, |tick| tick.max(record.tick)),
        );
    }

    pub fn build(self) -> ScriptReport {
        self.report
    }
}

/// Writes reports as pretty JSON.
pub struct ReportSink {
    path: PathBuf,
}

impl ReportSink {
    /// Sink at `path`, creating parent directories.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        Ok(Self { path })
    }

    pub fn write(&self, report: &ScriptReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&self.path)
            .with_context(|| format!("Failed to create report {}", self.path.display()))?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
