use std::collections::VecDeque;

use eframe::egui::{self, Align, Context, Layout, Vec2};
use tracing::warn;

use crate::scene::{Scene, SceneSource};
use crate::sensor::{NodePopulation, NodeSensor, SensorConfig};
use crate::zetpath::ZetPathOptions;

use super::super::{LaunchConfig, ViewModel, ViewScratch};

impl ViewModel {
    pub(in crate::app) fn new(
        scene: Scene,
        launch: &LaunchConfig,
        carried: Option<SensorConfig>,
    ) -> Self {
        let layered = launch
            .overrides
            .apply(scene.sensor.unwrap_or_default());
        let mut config_error = None;
        let sensor_config = match carried {
            Some(config) => config,
            None => match layered.validate() {
                Ok(()) => layered,
                Err(error) => {
                    warn!(%error, "ignoring invalid sensor settings");
                    config_error = Some(error.to_string());
                    SensorConfig::default()
                }
            },
        };

        let requested = launch.origin.filter(|id| scene.node(*id).is_some());
        if let Some(id) = launch.origin
            && requested.is_none()
        {
            warn!(origin = %id, "requested origin is not in the scene");
        }
        let sensor = requested
            .or_else(|| scene.initial_origin())
            .and_then(|origin| NodeSensor::new(origin, sensor_config).ok());

        let (layout_style, layout_count, layout_options) = match &launch.source {
            SceneSource::Generated {
                style,
                count,
                options,
            } => (style.clone(), *count, *options),
            SceneSource::File(_) => ("Radial".to_owned(), 64, ZetPathOptions::default()),
        };

        Self {
            population: NodePopulation::new(scene.sensor_nodes()),
            scene,
            source: launch.source.clone(),
            sensor,
            sensor_config,
            sensor_error: None,
            config_error,
            last_stats: None,
            layout_style,
            layout_count,
            layout_options,
            search: String::new(),
            search_match_cache: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            fit_pending: true,
            dragging: None,
            show_scene_edges: true,
            show_sensor_edges: true,
            show_search_areas: true,
            show_quadtree_overlay: false,
            show_labels: true,
            phrase_min_words: crate::phrase::DEFAULT_MIN_WORDS,
            phrase_cache: None,
            view_scratch: ViewScratch::default(),
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_request: &mut Option<SceneSource>,
        is_loading: bool,
    ) {
        self.update_fps_counter(ctx);
        self.run_sensor();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("neurite-sensor");
                    ui.separator();
                    ui.label(format!("scene: {}", self.scene.label));
                    ui.label(format!("nodes: {}", self.scene.node_count()));
                    ui.label(format!("edges: {}", self.scene.edge_count()));
                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        *reload_request = Some(self.source.clone());
                    }
                    if ui.button("Fit view").clicked() {
                        self.fit_pending = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                        if let Some(stats) = self.last_stats {
                            ui.label(format!(
                                "radius {:.2} after {} probes",
                                stats.final_radius, stats.iterations
                            ));
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(330.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("controls_scroll")
                    .show(ui, |ui| self.draw_controls(ui, reload_request, is_loading));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("details_scroll")
                    .show(ui, |ui| self.draw_details(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Loading scene...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }
}
