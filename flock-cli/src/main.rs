use anyhow::{Context, Result};
use clap::Parser;
use flock_cli::{build_flock, load_settings, run, RunOptions};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless flock simulation", long_about = None)]
struct Args {
    /// Settings file (JSON); defaults are used for missing fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of agents
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Override the spawn seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    /// Write a snapshot every N frames (0 = first and last only)
    #[arg(short, long, default_value_t = 60)]
    every: u64,

    /// Output file for JSON-lines snapshots (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    log::info!("Flock simulation starting...");

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(count) = args.count {
        settings.count = count;
    }
    if let Some(seed) = args.seed {
        settings.seed = Some(seed);
    }

    let mut flock = build_flock(&settings)?;
    let options = RunOptions {
        frames: args.frames,
        every: args.every,
    };

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let started = Instant::now();
    let summary = run(&mut flock, &options, &mut out).context("Simulation error")?;

    log::info!(
        "Simulated {} frames of {} agents in {:.2?}, wrote {} snapshots",
        summary.frames,
        flock.len(),
        started.elapsed(),
        summary.snapshots
    );
    if let Some(frame) = summary.first_non_finite {
        anyhow::bail!("Simulation produced non-finite positions at frame {}", frame);
    }

    Ok(())
}
