//! main.rs — track-sim entry point
//!
//! Simulates one patrol of a preset or user-supplied polygon and prints the
//! trajectory report as JSON on stdout. Exit code:
//!   0  trajectory accepted
//!   2  every attempt rejected (best-effort trajectory still reported)
//!   3  an attempt ran out of ticks

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use track_simulator::presets::{self, Preset};
use track_simulator::{
    JsonLinesObserver, LogObserver, SimConfig, SimulationStatus, TrajectoryReport, TrajectorySimulator,
};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "track-sim", about = "Patrol trajectory simulator with a noisy positioning receiver")]
struct Args {
    /// Config file path (bundled defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Reference polygon to walk
    #[arg(long, value_enum, default_value = "irregular", conflicts_with = "polygon")]
    preset: Preset,
    /// Custom polygon: "x,y x,y x,y ..."
    #[arg(long)]
    polygon: Option<String>,
    /// RNG seed (overrides simulation.seed)
    #[arg(long)]
    seed: Option<u64>,
    /// Start time, Unix seconds
    #[arg(long, default_value = "1625097600")]
    start_time: f64,
    /// Write every event as JSON lines to this file
    #[arg(long)]
    events: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut cfg = match &args.config {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::from_toml_str(include_str!("../config.toml")).context("bundled config.toml")?,
    };
    if args.seed.is_some() {
        cfg.simulation.seed = args.seed;
    }
    Ok(cfg)
}

fn run(args: Args) -> Result<SimulationStatus> {
    let cfg = load_config(&args)?;
    let polygon = match &args.polygon {
        Some(raw) => presets::parse_polygon(raw)?,
        None => args.preset.polygon(),
    };
    let start = polygon.first().copied().unwrap_or_default();

    let mut sim = TrajectorySimulator::new(cfg).context("invalid configuration")?;
    sim.add_observer(LogObserver);
    if let Some(path) = &args.events {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        sim.add_observer(JsonLinesObserver::new(file));
    }

    info!("Simulating {} vertices from ({:.1}, {:.1})", polygon.len(), start.x, start.y);
    let outcome = sim.simulate(args.start_time, start, &polygon)?;

    let report = TrajectoryReport::from_outcome(&outcome);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(outcome.status)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "track_simulator=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(SimulationStatus::Accepted) => ExitCode::SUCCESS,
        Ok(SimulationStatus::Exhausted) => ExitCode::from(2),
        Ok(SimulationStatus::TickBudgetExhausted) => ExitCode::from(3),
        Err(e) => {
            eprintln!("track-sim: {e:#}");
            ExitCode::FAILURE
        }
    }
}
