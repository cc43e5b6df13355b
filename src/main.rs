//! mdcommand - headless runner for the command engine
//!
//! Loads a world fixture, then runs a command script or a single command
//! from the console and prints the feedback it produced.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use mdcommand::command_script::CommandScriptPlayer;
use mdcommand::config::{ServerConfig, DEFAULT_CONFIG_PATH};
use mdcommand::console::ConsoleSession;
use mdcommand_testkit::{MemoryServer, ReportSink, RunResult, TranscriptSink, WorldFixture};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run commands against an in-memory world", long_about = None)]
struct Args {
    /// Server configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// World fixture (JSON); overrides the configured world
    #[arg(long)]
    world: Option<PathBuf>,
    /// Command script (JSON) to play
    #[arg(long)]
    script: Option<PathBuf>,
    /// Random seed for `@r`
    #[arg(long)]
    seed: Option<u64>,
    /// Console permission level (0-4)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=4))]
    permission_level: Option<u8>,
    /// Write a JSON run report here
    #[arg(long)]
    report: Option<PathBuf>,
    /// Write every command record here as JSON lines
    #[arg(long)]
    transcript: Option<PathBuf>,
    /// Command to run when no script is given
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> Result<ExitCode> {
    // WARN by default; RUST_LOG overrides.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    info!("Starting mdcommand v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ServerConfig::load_from_path(&args.config);
    if let Some(level) = args.permission_level {
        config.permission_level = level;
    }
    if let Some(world) = args.world.clone() {
        config.world = Some(world);
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let server = match &config.world {
        Some(path) => {
            let mut fixture = WorldFixture::load(path)?;
            match args.seed {
                Some(seed) => fixture.seed = seed,
                None => config.seed = fixture.seed,
            }
            fixture.build()?
        }
        None => MemoryServer::new(config.seed),
    };

    let script = args
        .script
        .as_deref()
        .map(|path| {
            CommandScriptPlayer::from_path(path)
                .with_context(|| format!("Failed to load command script {}", path.display()))
        })
        .transpose()?;
    let name = script
        .as_ref()
        .and_then(|script| script.name().map(str::to_string))
        .unwrap_or_else(|| "console".to_string());

    let mut session = ConsoleSession::new(server, &config, &name);
    if let Some(path) = &args.transcript {
        session = session.with_transcript(TranscriptSink::create(path)?);
    }

    let records = match script {
        Some(mut script) => {
            if !args.command.is_empty() {
                tracing::warn!("ignoring trailing command because --script was given");
            }
            session.play(&mut script)?
        }
        None if args.command.is_empty() => {
            anyhow::bail!("nothing to run: pass --script or a command");
        }
        None => vec![session.run(&args.command.join(" "))?],
    };

    for record in &records {
        println!("[{}] /{} -> {}", record.tick, record.command, record.result);
        for line in &record.feedback {
            println!("    {line}");
        }
    }

    let report = session.finish();
    for unmet in &report.unmet {
        eprintln!("unmet: {unmet}");
    }
    if let Some(path) = &args.report {
        ReportSink::create(path)?.write(&report)?;
    }

    Ok(match report.result {
        RunResult::Pass => ExitCode::SUCCESS,
        RunResult::Fail => ExitCode::FAILURE,
    })
}
