// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: analyze a JSON wall set and print rooms as JSON
//!
//! Usage:
//!   floorplan-rooms analyze walls.json [--config config.json] [--output rooms.json]
//!   floorplan-rooms validate walls.json
//!   floorplan-rooms optimize walls.json --axis-snap

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use floorplan_topology::{EngineConfig, FloorplanEngine, Wall};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "floorplan-rooms", version)]
#[command(about = "Detect rooms, metrics and floor meshes from hand-drawn walls.")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Full room analysis
    Analyze(CommonArgs),
    /// Topology validation report only
    Validate(CommonArgs),
    /// Run the segment optimizer and print the cleaned walls
    Optimize(CommonArgs),
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Wall set: a JSON array of walls, or an object with a `walls` array
    input: PathBuf,

    /// Engine configuration JSON (camelCase keys, all optional)
    #[arg(long, env = "FLOORPLAN_CONFIG")]
    config: Option<PathBuf>,

    /// Write JSON here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Override the snap tolerance (meters)
    #[arg(long)]
    snap_tolerance: Option<f64>,

    /// Straighten near-axis walls when optimizing
    #[arg(long)]
    axis_snap: bool,

    /// Run the segment optimizer before analysis
    #[arg(long)]
    optimize: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WallInput {
    List(Vec<Wall>),
    Document { walls: Vec<Wall> },
}

impl WallInput {
    fn into_walls(self) -> Vec<Wall> {
        match self {
            WallInput::List(walls) | WallInput::Document { walls } => walls,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Analyze(args) => {
            let (engine, walls) = load(&args)?;
            let analysis = engine.analyze(&walls);
            tracing::info!(
                walls = walls.len(),
                rooms = analysis.rooms.len(),
                valid = analysis.validation.is_valid,
                "Analysis complete"
            );
            for warning in &analysis.warnings {
                tracing::warn!("{warning}");
            }
            write_json(&analysis, &args)
        }
        Command::Validate(args) => {
            let (engine, walls) = load(&args)?;
            let report = engine.validate(&walls);
            tracing::info!(
                valid = report.is_valid,
                errors = report.errors.len(),
                warnings = report.warnings.len(),
                "Validation complete"
            );
            for message in report.messages() {
                tracing::warn!("{message}");
            }
            write_json(&report, &args)
        }
        Command::Optimize(args) => {
            let (engine, walls) = load(&args)?;
            let optimized = engine.optimize(&walls);
            tracing::info!(
                input = optimized.stats.input_count,
                output = optimized.stats.output_count,
                passes = optimized.stats.passes,
                "Optimization complete"
            );
            write_json(&optimized, &args)
        }
    }
}

fn load(args: &CommonArgs) -> Result<(FloorplanEngine, Vec<Wall>)> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = read_file(path)?;
            EngineConfig::from_json_str(&raw)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?
        }
        None => EngineConfig::default(),
    }
    .with_env_overrides()
    .context("Invalid FLOORPLAN_* environment override")?;

    if let Some(snap) = args.snap_tolerance {
        config.snap_tolerance = snap;
        config.cluster_tolerance = config.cluster_tolerance.max(snap);
    }
    config.axis_snap |= args.axis_snap;
    config.optimize_segments |= args.optimize;

    let engine = FloorplanEngine::new(config).context("Invalid engine configuration")?;

    let raw = read_file(&args.input)?;
    let walls = serde_json::from_str::<WallInput>(&raw)
        .with_context(|| format!("Failed to parse walls from {}", args.input.display()))?
        .into_walls();

    Ok((engine, walls))
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_json<T: Serialize>(value: &T, args: &CommonArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize result")?;

    match &args.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
