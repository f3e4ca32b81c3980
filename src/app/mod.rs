use std::collections::{HashSet, VecDeque};
use std::ops::Range;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2, Vec2};
use tracing::{error, info};

use crate::scene::{Scene, SceneSource, load_scene};
use crate::sensor::{
    NodeId, NodePopulation, NodeSensor, QuadtreeCell, SearchStats, SensorConfig, SensorOverrides,
};
use crate::zetpath::ZetPathOptions;

mod graph;
mod render_utils;
mod ui;

/// Everything the viewer needs to (re)build its scene and sensor.
#[derive(Clone, Debug)]
pub struct LaunchConfig {
    pub source: SceneSource,
    pub overrides: SensorOverrides,
    pub origin: Option<NodeId>,
}

pub struct SensorViewerApp {
    launch: LaunchConfig,
    state: AppState,
    reload_rx: Option<Receiver<Result<Scene, String>>>,
}

enum AppState {
    Loading { rx: Receiver<Result<Scene, String>> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    scene: Scene,
    source: SceneSource,
    population: NodePopulation,
    sensor: Option<NodeSensor>,
    sensor_config: SensorConfig,
    sensor_error: Option<String>,
    config_error: Option<String>,
    last_stats: Option<SearchStats>,
    layout_style: String,
    layout_count: usize,
    layout_options: ZetPathOptions,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    pan: Vec2,
    zoom: f32,
    fit_pending: bool,
    dragging: Option<NodeId>,
    show_scene_edges: bool,
    show_sensor_edges: bool,
    show_search_areas: bool,
    show_quadtree_overlay: bool,
    show_labels: bool,
    phrase_min_words: usize,
    phrase_cache: Option<PhraseCache>,
    view_scratch: ViewScratch,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

struct SearchMatchCache {
    query: String,
    matches: Arc<Vec<(NodeId, i64)>>,
}

struct PhraseCache {
    key: PhraseCacheKey,
    entries: Vec<SharedPhraseEntry>,
    /// Every shared phrase marked in the origin's text.
    origin_highlights: Vec<Range<usize>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct PhraseCacheKey {
    origin: NodeId,
    neighbours: Vec<NodeId>,
    min_words: usize,
}

struct SharedPhraseEntry {
    node: NodeId,
    phrases: Vec<String>,
    highlights: Vec<Range<usize>>,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_indices: Vec<usize>,
    quadtree_cells: Vec<QuadtreeCell>,
    nearby: HashSet<NodeId>,
    extended: HashSet<NodeId>,
}

impl SensorViewerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, launch: LaunchConfig) -> Self {
        let state = Self::start_load(launch.source.clone());
        Self {
            launch,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: SceneSource) -> Receiver<Result<Scene, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_scene(&source).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: SceneSource) -> AppState {
        info!(source = %source.describe(), "loading scene");
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    /// `carried` keeps the sensor settings edited in a previous view.
    fn ready_state(&self, result: Result<Scene, String>, carried: Option<SensorConfig>) -> AppState {
        match result {
            Ok(scene) => AppState::Ready(Box::new(ViewModel::new(scene, &self.launch, carried))),
            Err(message) => {
                error!(%message, "scene load failed");
                AppState::Error(message)
            }
        }
    }
}

impl eframe::App for SensorViewerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut carried = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading scene...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(message) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load scene");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    self.state = Self::start_load(self.launch.source.clone());
                    return;
                }
            }
            AppState::Ready(model) => {
                let mut reload_request = None;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_request, is_reloading);

                if let Some(source) = reload_request
                    && self.reload_rx.is_none()
                {
                    info!(source = %source.describe(), "reloading scene");
                    self.launch.source = source.clone();
                    self.reload_rx = Some(Self::spawn_load(source));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            carried = Some(model.sensor_config);
                            transition = Some(result);
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = self.ready_state(result, carried);
        }
    }
}
