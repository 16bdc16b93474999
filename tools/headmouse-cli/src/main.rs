//! Headmouse CLI: drive the pointer from head orientation.
//!
//! Usage:
//!   headmouse run [OPTIONS]      Run the pointer driver
//!   headmouse simulate <TRACE>   Re-run a recorded trace offline
//!   headmouse init               Write the default config file
//!   headmouse info [TRACE]       Show effective configuration or a trace summary
//!   headmouse check              Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use headmouse_common::config::{AppConfig, LoggingConfig, SinkKind, SourceKind, TuningMode};

mod commands;

#[derive(Parser)]
#[command(
    name = "headmouse",
    about = "Move the mouse pointer with head tracking",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/headmouse/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pointer driver until cancelled
    Run {
        /// Orientation source
        #[arg(long, value_enum)]
        source: Option<SourceArg>,

        /// Pointer sink
        #[arg(long, value_enum)]
        sink: Option<SinkArg>,

        /// Trace to play back with `--source replay`
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Motion pattern for `--source synthetic`
        #[arg(long, value_enum, default_value = "sweep")]
        pattern: PatternArg,

        /// Synthetic motion amplitude (degrees)
        #[arg(long, default_value = "15.0")]
        amplitude: f64,

        /// Stop a synthetic run after this many seconds
        #[arg(long)]
        duration_secs: Option<f64>,

        /// Override the configured consumption mode
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Override the configured tick rate (Hz)
        #[arg(long)]
        tick_rate: Option<u32>,

        /// Record the session to a JSONL trace
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Re-run a recorded trace through the transducer and compare deltas
    Simulate {
        /// Path to the trace file
        trace: PathBuf,

        /// Override the mode stored in the trace header
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Exit with an error if any delta differs from the recording
        #[arg(long)]
        strict: bool,
    },

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration, or summarize a trace
    Info {
        /// Path to a trace file
        trace: Option<PathBuf>,
    },

    /// Check system capabilities
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SourceArg {
    Opentrack,
    Replay,
    Synthetic,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Opentrack => SourceKind::Opentrack,
            SourceArg::Replay => SourceKind::Replay,
            SourceArg::Synthetic => SourceKind::Synthetic,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SinkArg {
    Uinput,
    Log,
}

impl From<SinkArg> for SinkKind {
    fn from(arg: SinkArg) -> Self {
        match arg {
            SinkArg::Uinput => SinkKind::Uinput,
            SinkArg::Log => SinkKind::Log,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Velocity,
    Position,
}

impl From<ModeArg> for TuningMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Velocity => TuningMode::Velocity,
            ModeArg::Position => TuningMode::Position,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PatternArg {
    Hold,
    Sweep,
    Steps,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display())),
        None => Ok(AppConfig::load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;

    headmouse_common::logging::init_logging(&LoggingConfig {
        level: headmouse_common::logging::effective_level(&config.logging, cli.verbose),
        ..config.logging.clone()
    })?;

    match cli.command {
        Commands::Run {
            source,
            sink,
            trace,
            pattern,
            amplitude,
            duration_secs,
            mode,
            tick_rate,
            record,
        } => {
            let mut config = config;
            if let Some(source) = source {
                config.driver.source = source.into();
            }
            if let Some(sink) = sink {
                config.driver.sink = sink.into();
            }
            if let Some(mode) = mode {
                config.tuning.mode = mode.into();
            }
            if let Some(tick_rate) = tick_rate {
                config.driver.tick_rate_hz = tick_rate;
            }
            commands::run::run(
                config,
                commands::run::RunOptions {
                    trace,
                    pattern,
                    amplitude,
                    duration_secs,
                    record,
                },
            )
            .await
        }
        Commands::Simulate {
            trace,
            mode,
            strict,
        } => commands::simulate::run(config, trace, mode.map(Into::into), strict),
        Commands::Init { force } => commands::init::run(cli.config, force),
        Commands::Info { trace } => commands::info::run(&config, cli.config, trace),
        Commands::Check => commands::check::run(&config),
    }
}
