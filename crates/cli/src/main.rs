mod driver;
mod fixture;
mod sim;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use story_engine::SessionConfig;
use tracing_subscriber::EnvFilter;

use driver::Replay;
use fixture::{Fixture, load_script};

#[derive(Parser, Debug)]
#[command(name = "stories")]
#[command(about = "Headless driver for the story playback engine", long_about = None)]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Replay a scripted session and print emitted events as JSON lines
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Stories fixture (JSON array of stories)
    #[arg(long)]
    stories: PathBuf,

    /// Input script (JSON array of steps)
    #[arg(long)]
    script: PathBuf,

    /// Session config (JSON); missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Animation tick length in milliseconds
    #[arg(long)]
    frame_ms: Option<u64>,

    /// Report a zero duration before the real one, like a slow asset
    #[arg(long)]
    interim_zero: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        CliCommand::Replay(args) => replay(args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn replay(args: ReplayArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_json_file(path)
            .with_context(|| format!("failed to load session config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(frame_ms) = args.frame_ms {
        config.frame_us = i64::try_from(frame_ms)
            .context("frame length is too large")?
            .saturating_mul(1_000);
        config.validate()?;
    }

    let fixture = Fixture::load(&args.stories)?;
    let steps = load_script(&args.script)?;
    tracing::info!(
        stories = fixture.stories.len(),
        steps = steps.len(),
        frame_us = config.frame_us,
        "replay starting"
    );

    let stdout = std::io::stdout().lock();
    let mut replay = Replay::new(fixture, config, args.interim_zero, stdout)?;
    replay.run(&steps)
}
