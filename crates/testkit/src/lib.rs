//! Deterministic test surfaces for the command engine: an in-memory world,
//! JSON fixtures, command transcripts, world snapshots and run reports.

mod fixture;
mod report;
mod server;
mod snapshot;

use anyhow::Result;
use mdcommand_engine::{Dispatcher, ExecutionContext};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::info_span;

pub use fixture::*;
pub use report::*;
pub use server::*;
pub use snapshot::*;

/// One executed command and what it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Tick the command ran at.
    pub tick: u64,
    /// Command line as typed.
    pub command: String,
    /// False when the command failed as a whole.
    pub success: bool,
    /// Command result; 0 on failure.
    pub result: i32,
    /// Rendered feedback lines emitted while the command ran.
    pub feedback: Vec<String>,
}

/// Run `command` against `server` and capture its feedback.
///
/// A failing command reports its error to `ctx`'s output, the same way
/// [`Dispatcher::run_command`] does.
pub fn run_recorded(
    dispatcher: &Dispatcher,
    server: &mut MemoryServer,
    ctx: &ExecutionContext,
    tick: u64,
    command: &str,
) -> CommandRecord {
    let span = info_span!("scripted", tick, command);
    let _guard = span.enter();
    let before = server.feedback().len();
    let (success, result) = match dispatcher.execute(server, command, ctx) {
        Ok(result) => (true, result),
        Err(err) => {
            ctx.send_failure(server, err.message());
            (false, 0)
        }
    };
    CommandRecord {
        tick,
        command: command.to_string(),
        success,
        result,
        feedback: server.feedback()[before..]
            .iter()
            .map(ToString::to_string)
            .collect(),
    }
}

/// A sink that writes command records as newline-delimited JSON.
pub struct TranscriptSink {
    file: File,
}

impl TranscriptSink {
    /// Create a new sink at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            file: File::create(path)?,
        })
    }

    /// Append a record to the transcript.
    pub fn write(&mut self, record: &CommandRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdcommand_core::{DVec3, DimensionId};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn recorded_failure_carries_its_feedback() {
        let dispatcher = Dispatcher::with_builtin_commands();
        let mut server = MemoryServer::new(0);
        let console = ExecutionContext::console(DimensionId::Overworld, DVec3::ZERO);
        let record = run_recorded(
            &dispatcher,
            &mut server,
            &console,
            4,
            "scoreboard players get Alex nope",
        );
        assert!(!record.success);
        assert_eq!(record.result, 0);
        assert_eq!(record.tick, 4);
        assert_eq!(record.feedback.len(), 1);
        assert!(record.feedback[0].starts_with("! [console] arguments.objective.notFound"));
    }

    #[test]
    fn transcript_sink_writes_one_line_per_record() {
        let path = std::env::temp_dir().join(format!(
            "mdcommand-transcript-{}.jsonl",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let mut sink = TranscriptSink::create(&path).expect("sink create");
        for tick in 0..2 {
            sink.write(&CommandRecord {
                tick,
                command: "say hi".into(),
                success: true,
                result: 1,
                feedback: Vec::new(),
            })
            .expect("write succeeds");
        }
        drop(sink);
        let contents = fs::read_to_string(&path).expect("file readable");
        assert_eq!(contents.lines().count(), 2);
        let first: CommandRecord =
            serde_json::from_str(contents.lines().next().expect("line")).expect("json");
        assert_eq!(first.command, "say hi");
        let _ = fs::remove_file(&path);
    }
}
