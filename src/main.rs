mod app;
mod export;
mod phrase;
mod scene;
mod sensor;
mod util;
mod zetpath;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::scene::{SceneSource, load_scene};
use crate::sensor::{NodeId, RadiusGrowth, SensorOverrides};
use crate::zetpath::{MAX_PATH_LENGTH, ZetPathOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    Radial,
    Spiral,
    Branching,
    Random,
}

impl LayoutArg {
    fn style_name(self) -> &'static str {
        match self {
            Self::Radial => "Radial",
            Self::Spiral => "Spiral",
            Self::Branching => "Branching",
            Self::Random => "Random",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum GrowthArg {
    Linear,
    Geometric,
}

impl From<GrowthArg> for RadiusGrowth {
    fn from(value: GrowthArg) -> Self {
        match value {
            GrowthArg::Linear => RadiusGrowth::linear(),
            GrowthArg::Geometric => RadiusGrowth::geometric(),
        }
    }
}

/// Interactive nearby-node sensor over a scene of scaled nodes.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Scene file (JSON). A layout is generated when omitted.
    #[arg(long)]
    scene: Option<PathBuf>,
    /// Layout used to generate a scene.
    #[arg(long, value_enum, default_value_t = LayoutArg::Radial)]
    layout: LayoutArg,
    /// Number of generated nodes around the root.
    #[arg(
        long,
        default_value_t = 64,
        value_parser = clap::value_parser!(u32).range(0..=MAX_PATH_LENGTH as i64)
    )]
    count: u32,
    /// Nearby nodes to keep [default: 6, or the scene's sensor block]
    #[arg(long)]
    max_nodes: Option<usize>,
    /// Extended radius factor [default: 1.1, or the scene's sensor block]
    #[arg(long)]
    extended_factor: Option<f32>,
    /// Radius growth between probes [default: linear, or the scene's sensor block]
    #[arg(long, value_enum)]
    growth: Option<GrowthArg>,
    /// Id of the node the sensor starts on.
    #[arg(long)]
    origin: Option<u64>,
    /// Run one sensor update and write it as SVG instead of opening a window.
    #[arg(long)]
    export_svg: Option<PathBuf>,
}

impl Args {
    fn scene_source(&self) -> SceneSource {
        match &self.scene {
            Some(path) => SceneSource::File(path.clone()),
            None => SceneSource::Generated {
                style: self.layout.style_name().to_owned(),
                count: self.count as usize,
                options: ZetPathOptions::default(),
            },
        }
    }

    fn overrides(&self) -> SensorOverrides {
        SensorOverrides {
            max_node_count: self.max_nodes,
            extended_radius_factor: self.extended_factor,
            growth: self.growth.map(RadiusGrowth::from),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn run_export(args: &Args, path: &Path) -> Result<()> {
    let scene = load_scene(&args.scene_source())?;
    let config = args.overrides().apply(scene.sensor.unwrap_or_default());
    config.validate().context("invalid sensor settings")?;

    let origin = match args.origin {
        Some(id) => NodeId(id),
        None => scene
            .initial_origin()
            .ok_or_else(|| anyhow!("scene has no nodes to place the sensor on"))?,
    };

    export::export_svg(&scene, origin, config, path)?;
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    if let Some(path) = &args.export_svg {
        return run_export(&args, path);
    }

    let launch = app::LaunchConfig {
        source: args.scene_source(),
        overrides: args.overrides(),
        origin: args.origin.map(NodeId),
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "neurite-sensor",
        options,
        Box::new(move |cc| Ok(Box::new(app::SensorViewerApp::new(cc, launch)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
