//! Headless console session: one world, one dispatcher, commands run at
//! ticks and folded into a report.

use anyhow::Result;
use mdcommand_core::{DVec3, DimensionId};
use mdcommand_engine::{Dispatcher, ExecutionContext};
use mdcommand_testkit::{
    run_recorded, CommandRecord, MemoryServer, ScriptReport, ScriptReportBuilder, TranscriptSink,
};
use tracing::{debug, info};

use crate::command_script::CommandScriptPlayer;
use crate::config::ServerConfig;

/// Where the console stands in the overworld.
pub const CONSOLE_SPAWN: DVec3 = DVec3::new(0.5, 64.0, 0.5);

pub struct ConsoleSession {
    dispatcher: Dispatcher,
    server: MemoryServer,
    context: ExecutionContext,
    report: ScriptReportBuilder,
    transcript: Option<TranscriptSink>,
    tick: u64,
}

impl ConsoleSession {
    pub fn new(mut server: MemoryServer, config: &ServerConfig, name: &str) -> Self {
        server.set_settings(config.feedback_settings());
        let context = ExecutionContext::console(DimensionId::Overworld, CONSOLE_SPAWN)
            .with_permission_level(config.permission_level);
        Self {
            dispatcher: Dispatcher::with_builtin_commands(),
            server,
            context,
            report: ScriptReportBuilder::new(name).seed(config.seed),
            transcript: None,
            tick: 0,
        }
    }

    /// Also append every record to `sink`.
    pub fn with_transcript(mut self, sink: TranscriptSink) -> Self {
        self.transcript = Some(sink);
        self
    }

    pub fn server(&self) -> &MemoryServer {
        &self.server
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Run one command at the current tick. A failure fails the run.
    pub fn run(&mut self, command: &str) -> Result<CommandRecord> {
        let record = self.execute(command)?;
        self.report.record(&record);
        Ok(record)
    }

    /// Play every step of `script`, checking each step's expectations.
    pub fn play(&mut self, script: &mut CommandScriptPlayer) -> Result<Vec<CommandRecord>> {
        let mut records = Vec::new();
        while let Some(tick) = script.next_tick() {
            self.tick = self.tick.max(tick);
            for step in script.drain_ready(self.tick) {
                let record = self.execute(&step.command)?;
                if step.expects_failure() {
                    self.report.record_expected_failure(&record);
                } else {
                    self.report.record(&record);
                }
                for unmet in step.check(&record) {
                    debug!(%unmet, "script expectation missed");
                    self.report.unmet(unmet);
                }
                records.push(record);
            }
        }
        info!(tick = self.tick, commands = records.len(), "script finished");
        Ok(records)
    }

    /// Close the session and produce its report.
    pub fn finish(self) -> ScriptReport {
        self.report.block_reads(self.server.block_reads()).build()
    }

    fn execute(&mut self, command: &str) -> Result<CommandRecord> {
        let record = run_recorded(
            &self.dispatcher,
            &mut self.server,
            &self.context,
            self.tick,
            command,
        );
        if let Some(sink) = self.transcript.as_mut() {
            sink.write(&record)?;
        }
        Ok(record)
    }
}
