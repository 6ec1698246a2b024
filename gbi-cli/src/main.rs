mod config;
mod runner;

use crate::config::{AppConfig, SerialSink};
use crate::runner::RunOutcome;
use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use gbi_core::Console;
use std::fs;
use std::path::PathBuf;

/// Headless runner for Game Boy test programs.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Path to the program ROM, at most 32KB
    #[arg(short = 'r', long)]
    rom: PathBuf,

    /// Optional TOML config file; command-line flags take precedence
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(short = 'f', long)]
    frames: Option<u64>,

    /// Pace emulation to 60 frames per second
    #[arg(long)]
    realtime: bool,

    /// Where serial output goes (stdout, log, none)
    #[arg(long)]
    serial_sink: Option<SerialSink>,

    /// Print the final CPU registers as TOML
    #[arg(long)]
    dump_state: bool,
}

impl Cli {
    fn app_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_toml_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(frames) = self.frames {
            config.frame_limit = Some(frames);
        }
        if self.realtime {
            config.realtime = true;
        }
        if let Some(serial_sink) = self.serial_sink {
            config.serial_sink = serial_sink;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    let config = args.app_config()?;

    log::info!("Running with config:\n{config}");

    let program = fs::read(&args.rom)
        .with_context(|| format!("error reading ROM file from '{}'", args.rom.display()))?;

    let mut console = Console::new(config.emulation);
    console
        .load_program(&program)
        .with_context(|| format!("error loading ROM file '{}'", args.rom.display()))?;

    let outcome = runner::run(&mut console, &config);

    if args.dump_state {
        let registers = toml::to_string(console.cpu().registers())
            .context("error serializing CPU registers into TOML")?;
        println!("{registers}");
    }

    match outcome.context("emulation stopped")? {
        RunOutcome::Failed => anyhow::bail!("program reported failure over serial"),
        RunOutcome::Passed | RunOutcome::FrameLimitReached | RunOutcome::Suspended => Ok(()),
    }
}
