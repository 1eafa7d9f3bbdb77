use anyhow::{Context, Result};
use flock_core::Flock;
use flock_shared::{FlockSettings, FrameSnapshot};
use std::io::Write;
use std::path::Path;

/// How many frames to simulate and which of them to write out
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub frames: u64,
    /// Snapshot stride; 0 writes only the first and last frame.
    pub every: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub snapshots: u64,
    /// First frame where any agent left finite space.
    pub first_non_finite: Option<u64>,
}

/// Reads settings from a JSON file, or the defaults when no file is given.
pub fn load_settings(path: Option<&Path>) -> Result<FlockSettings> {
    let Some(path) = path else {
        return Ok(FlockSettings::default());
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    let settings = FlockSettings::from_json(&json)
        .with_context(|| format!("Invalid settings in {}", path.display()))?;

    log::debug!("Loaded settings: {:?}", settings);
    Ok(settings)
}

/// Spawns the flock described by `settings`.
pub fn build_flock(settings: &FlockSettings) -> Result<Flock> {
    let config = settings.to_config().context("Invalid flock settings")?;

    let flock = match settings.seed {
        Some(seed) => {
            log::info!("Spawning {} agents with seed {}", config.count, seed);
            Flock::with_seed(config, seed)
        }
        None => {
            log::info!("Spawning {} agents with a random seed", config.count);
            Flock::new(config)
        }
    };

    Ok(flock)
}

/// Headless render loop: steps the flock once per frame and writes one
/// JSON line per selected frame.
pub fn run<W: Write>(flock: &mut Flock, options: &RunOptions, out: &mut W) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    write_snapshot(flock, 0, out, &mut summary)?;

    for frame in 1..=options.frames {
        flock.step();
        summary.frames = frame;

        let on_stride = options.every > 0 && frame % options.every == 0;
        if on_stride || frame == options.frames {
            write_snapshot(flock, frame, out, &mut summary)?;
        } else if summary.first_non_finite.is_none() && !all_finite(flock) {
            summary.first_non_finite = Some(frame);
            log::warn!("Agent position became non-finite at frame {}", frame);
        }
    }

    out.flush().context("Failed to flush output")?;
    Ok(summary)
}

fn write_snapshot<W: Write>(
    flock: &Flock,
    frame: u64,
    out: &mut W,
    summary: &mut RunSummary,
) -> Result<()> {
    let snapshot = FrameSnapshot::capture(frame, flock.phase(), flock.agents());

    if summary.first_non_finite.is_none() && !snapshot.all_finite() {
        summary.first_non_finite = Some(frame);
        log::warn!("Agent position became non-finite at frame {}", frame);
    }

    serde_json::to_writer(&mut *out, &snapshot)
        .with_context(|| format!("Failed to write snapshot for frame {}", frame))?;
    out.write_all(b"\n")?;
    summary.snapshots += 1;

    log::debug!("Wrote snapshot for frame {}", frame);
    Ok(())
}

fn all_finite(flock: &Flock) -> bool {
    flock.agents().iter().all(|a| a.position.is_finite())
}
