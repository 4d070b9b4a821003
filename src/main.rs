// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! TRACKEDIT - command line front end
//!
//! Loads a tracking project, reports segments and gaps, fills gaps, and
//! hit-tests positions against the curve set.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use trackedit::engine::{find_gaps, insert_track, segment, FillMode, SourceCurve};
use trackedit::io::{loader, serialization};
use trackedit::util::{geometry::ViewTransform, spatial_index::entries_from_curves};
use trackedit::{CurveStore, EditorSettings};

#[derive(Parser, Debug)]
#[command(name = "trackedit")]
#[command(about = "Inspect and repair 2D tracking curves", long_about = None)]
struct Args {
    /// Settings file (YAML or JSON)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print segments and gaps of every curve
    Summary {
        project: PathBuf,
    },
    /// Fill the gap around a frame and write the result
    Fill {
        project: PathBuf,

        /// Curve to fill
        #[arg(short, long)]
        curve: String,

        /// Frame inside or next to the gap
        #[arg(short, long)]
        frame: i32,

        /// Curves to copy motion from
        #[arg(long = "source")]
        sources: Vec<String>,

        /// Fill strategy; defaults from the settings
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Fill across an endframe
        #[arg(long)]
        bridge: bool,

        /// Output file; overwrites the input when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Find the point nearest to a position
    Hit {
        project: PathBuf,

        #[arg(short, allow_negative_numbers = true)]
        x: f64,

        #[arg(short, allow_negative_numbers = true)]
        y: f64,

        /// Search radius; defaults from the settings
        #[arg(short, long)]
        radius: Option<f64>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Interpolate,
    Copy,
    Average,
}

impl From<ModeArg> for FillMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Interpolate => FillMode::Interpolate,
            ModeArg::Copy => FillMode::CopyWithOffset,
            ModeArg::Average => FillMode::Average,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();
    let settings = EditorSettings::load(args.settings.as_deref())?;

    match args.command {
        Command::Summary { project } => {
            let store = open(&project)?;
            summary(&store, &settings);
        }
        Command::Fill {
            project,
            curve,
            frame,
            sources,
            mode,
            bridge,
            output,
        } => {
            let mut store = open(&project)?;
            let mut options = settings.gap_options();
            options.bridge_endframes |= bridge;
            let mode = mode.map_or_else(|| settings.fill_mode(sources.len()), FillMode::from);

            let Some(target) = store.curve(&curve) else {
                bail!("No curve named '{}'", curve);
            };
            let mut source_curves = Vec::new();
            for name in &sources {
                let Some(trajectory) = store.curve(name) else {
                    bail!("No source curve named '{}'", name);
                };
                source_curves.push(SourceCurve::new(name, trajectory));
            }

            let patch = insert_track(&curve, target, frame, mode, &source_curves, options)
                .with_context(|| format!("Cannot fill '{}' at frame {}", curve, frame))?;
            store.batch(|store| store.apply_patch(&patch));
            println!("filled {} frame(s) on '{}'", patch.points.len(), curve);

            let output = output.unwrap_or(project);
            serialization::export_project(&store.project(), &output)?;
            log::info!("Wrote {}", output.display());
        }
        Command::Hit { project, x, y, radius } => {
            let mut store = open(&project)?;
            store.set_show_all(true);
            let visible = store.visible_curves();
            let mut index = settings.spatial_index();
            index.rebuild(entries_from_curves(
                store.curves().filter(|(name, _)| visible.iter().any(|v| v == name)),
                &ViewTransform::identity(),
            ));

            match index.query(x, y, radius.unwrap_or(settings.hit_radius)) {
                Some(hit) => println!("{} frame {} at distance {:.3}", hit.curve, hit.frame, hit.distance),
                None => println!("no point within range"),
            }
        }
    }

    Ok(())
}

/// Parse a project on a worker thread and load it into a fresh store.
fn open(path: &Path) -> Result<CurveStore> {
    let project = loader::spawn_load(path).wait()?;
    let mut store = CurveStore::new();
    store.load_project(&project);
    Ok(store)
}

fn summary(store: &CurveStore, settings: &EditorSettings) {
    println!("{} curve(s), {} frame(s)", store.curve_count(), store.total_frames());
    for (name, trajectory) in store.curves() {
        println!("{} ({} points)", name, trajectory.len());
        for s in segment(trajectory) {
            println!(
                "  {:>6}..={:<6} {}",
                s.start_frame,
                s.end_frame,
                if s.active { "active" } else { "held" }
            );
        }
        for gap in find_gaps(trajectory, settings.gap_options()) {
            println!("  gap {}..={} ({} frames)", gap.start, gap.end, gap.len());
        }
    }
}
