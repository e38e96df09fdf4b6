#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Crystal Defence simulation.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crystal_defence_core::{TowerKind, Vec2};
use crystal_defence_simulation::{Simulation, SimulationConfig, Summary};
use crystal_defence_world::query;
use log::{info, warn};

/// Frames simulated per second of run time.
const FRAMES_PER_SECOND: u32 = 60;

/// Command-line arguments accepted by the Crystal Defence runner.
#[derive(Debug, Parser)]
#[command(name = "crystal-defence", about = "Runs a headless Crystal Defence game")]
struct CliArgs {
    /// TOML file with `[world]` and `[waves]` tables.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Simulated seconds to run before printing the summary.
    #[arg(long, default_value_t = 120.0)]
    seconds: f64,
    /// Tower to place before the first wave, for example `laser@100,360`.
    #[arg(long = "tower", value_name = "KIND@X,Y", value_parser = parse_tower)]
    towers: Vec<TowerPlacement>,
    /// Prints the summary as JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// Tower requested on the command line.
#[derive(Clone, Copy, Debug, PartialEq)]
struct TowerPlacement {
    kind: TowerKind,
    position: Vec2,
}

fn parse_tower(value: &str) -> Result<TowerPlacement> {
    let (kind, coordinates) = value
        .split_once('@')
        .with_context(|| format!("expected KIND@X,Y, got `{value}`"))?;
    let kind = kind.parse::<TowerKind>()?;
    let (x, y) = coordinates
        .split_once(',')
        .with_context(|| format!("expected X,Y coordinates, got `{coordinates}`"))?;
    let x = x
        .trim()
        .parse::<f32>()
        .with_context(|| format!("invalid x coordinate `{x}`"))?;
    let y = y
        .trim()
        .parse::<f32>()
        .with_context(|| format!("invalid y coordinate `{y}`"))?;
    Ok(TowerPlacement {
        kind,
        position: Vec2::new(x, y),
    })
}

fn load_config(path: Option<&PathBuf>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

fn run(args: &CliArgs) -> Result<Summary> {
    if !args.seconds.is_finite() || args.seconds < 0.0 {
        bail!("--seconds must be a non-negative number, got {}", args.seconds);
    }

    let config = load_config(args.config.as_ref())?;
    let mut simulation = Simulation::new(config).context("failed to build simulation")?;
    for placement in &args.towers {
        let _ = simulation
            .place_tower(placement.kind, placement.position)
            .with_context(|| {
                format!(
                    "failed to place {} tower at {}",
                    placement.kind, placement.position
                )
            })?;
    }
    simulation.start_waves().context("failed to start waves")?;

    let frame = Duration::from_secs(1) / FRAMES_PER_SECOND;
    let frames = (args.seconds * f64::from(FRAMES_PER_SECOND)).ceil() as u64;
    for _ in 0..frames {
        simulation.step(frame);
        let _ = simulation.drain_events();
        if query::is_base_destroyed(simulation.world()) {
            warn!("base destroyed, stopping early");
            break;
        }
    }

    Ok(simulation.summary())
}

fn print_text(summary: &Summary) {
    println!("wave:        {}", summary.wave);
    println!("elapsed:     {:.1}s", summary.elapsed_secs);
    println!("towers:      {}", summary.towers);
    println!("kills:       {}", summary.kills);
    println!("escapes:     {}", summary.escapes);
    println!(
        "base health: {}{}",
        summary.base_health,
        if summary.base_destroyed {
            " (destroyed)"
        } else {
            ""
        }
    );
    for (currency, balance) in &summary.balances {
        println!("{:<12} {balance}", format!("{currency}:"));
    }
}

/// Entry point for the Crystal Defence command-line interface.
fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();

    let args = CliArgs::parse();
    let summary = run(&args)?;
    info!(
        "finished after {:.1}s with {} kills",
        summary.elapsed_secs, summary.kills
    );

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to encode summary")?
        );
    } else {
        print_text(&summary);
    }
    Ok(())
}
