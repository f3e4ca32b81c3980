use eframe::egui::{self, RichText, Ui};

use crate::scene::SceneSource;
use crate::sensor::RadiusGrowth;
use crate::util::truncate_label;
use crate::zetpath::ZetPath;

use super::super::ViewModel;

const SEARCH_RESULT_ROWS: usize = 12;

impl ViewModel {
    pub(in crate::app) fn draw_controls(
        &mut self,
        ui: &mut Ui,
        reload_request: &mut Option<SceneSource>,
        is_loading: bool,
    ) {
        ui.heading("Sensor Controls");
        ui.separator();
        ui.add_space(4.0);

        self.draw_sensor_settings(ui);
        ui.separator();
        self.draw_search(ui);
        ui.separator();
        self.draw_layout_settings(ui, reload_request, is_loading);
        ui.separator();

        ui.checkbox(&mut self.show_sensor_edges, "Sensor edges")
            .on_hover_text("Draw tapered edges from the origin to every detected node.");
        ui.checkbox(&mut self.show_search_areas, "Search areas")
            .on_hover_text("Draw the standard and extended search circles.");
        ui.checkbox(&mut self.show_scene_edges, "Scene links");
        ui.checkbox(&mut self.show_labels, "Node labels");
        ui.checkbox(&mut self.show_quadtree_overlay, "Show quadtree overlay")
            .on_hover_text("Draw the partitions of the spatial index the sensor queries.");
        ui.checkbox(&mut self.show_fps_bar, "FPS Display");
    }

    fn draw_sensor_settings(&mut self, ui: &mut Ui) {
        let mut changed = false;
        let config = &mut self.sensor_config;

        changed |= ui
            .add(egui::Slider::new(&mut config.max_node_count, 1..=48).text("Max nearby nodes"))
            .on_hover_text("How many closest nodes the sensor keeps.")
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut config.extended_radius_factor, 0.1..=6.0)
                    .text("Extended radius factor"),
            )
            .on_hover_text("How far past the farthest nearby node the extended probe reaches.")
            .changed();

        ui.horizontal(|ui| {
            ui.label("Radius growth");
            let linear = matches!(config.growth, RadiusGrowth::Linear { .. });
            if ui.selectable_label(linear, "Linear").clicked() && !linear {
                config.growth = RadiusGrowth::linear();
                changed = true;
            }
            if ui.selectable_label(!linear, "Geometric").clicked() && linear {
                config.growth = RadiusGrowth::geometric();
                changed = true;
            }
        });
        changed |= match &mut config.growth {
            RadiusGrowth::Linear { step } => ui
                .add(egui::Slider::new(step, 0.1..=10.0).text("Step"))
                .changed(),
            RadiusGrowth::Geometric { factor } => ui
                .add(egui::Slider::new(factor, 1.05..=4.0).text("Factor"))
                .changed(),
        };

        changed |= ui
            .checkbox(&mut config.persist_search_radius, "Keep radius between frames")
            .on_hover_text("Start each search from the last radius instead of the initial one.")
            .changed();

        ui.collapsing("Distance tuning", |ui| {
            changed |= ui
                .add(
                    egui::Slider::new(&mut config.distance.larger_node_bias, 0.0..=1.0)
                        .text("Larger node bias"),
                )
                .on_hover_text("Weight of the scale gap when the candidate is the larger node.")
                .changed();
            changed |= ui
                .add(
                    egui::Slider::new(&mut config.distance.scale_influence, 0.0..=4.0)
                        .text("Scale influence"),
                )
                .changed();
            changed |= ui
                .add(
                    egui::Slider::new(&mut config.initial_radius, 0.1..=10.0)
                        .text("Initial radius"),
                )
                .changed();
        });

        if changed {
            self.apply_sensor_config();
        }

        if let Some(error) = &self.config_error {
            ui.colored_label(egui::Color32::LIGHT_RED, error.as_str());
        }
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("Find origin")
            .on_hover_text("Fuzzy-match node titles and first text lines.");
        ui.text_edit_singleline(&mut self.search);

        let Some(matches) = self.search_matches() else {
            return;
        };

        if matches.is_empty() {
            ui.label(RichText::new("No matching nodes.").weak());
            return;
        }

        let mut chosen = None;
        for (id, _score) in matches.iter().take(SEARCH_RESULT_ROWS) {
            let Some(node) = self.scene.node(*id) else {
                continue;
            };
            let label = format!("{}  {}", truncate_label(&node.display_name(), 36), node.id);
            if ui.link(label).clicked() {
                chosen = Some(*id);
            }
        }
        if matches.len() > SEARCH_RESULT_ROWS {
            ui.label(RichText::new(format!("{} more", matches.len() - SEARCH_RESULT_ROWS)).weak());
        }

        if let Some(id) = chosen {
            self.set_origin(id);
            self.focus_node(id);
        }
    }

    fn draw_layout_settings(
        &mut self,
        ui: &mut Ui,
        reload_request: &mut Option<SceneSource>,
        is_loading: bool,
    ) {
        ui.label(RichText::new("Generated layout").strong());

        egui::ComboBox::from_label("Style")
            .selected_text(self.layout_style.as_str())
            .show_ui(ui, |ui| {
                for style in ZetPath::STYLE_NAMES {
                    ui.selectable_value(&mut self.layout_style, style.to_owned(), style);
                }
            });
        ui.add(egui::Slider::new(&mut self.layout_count, 1..=512).text("Nodes"));

        let options = &mut self.layout_options;
        match self.layout_style.as_str() {
            "Spiral" => {
                ui.add(egui::Slider::new(&mut options.spiral.curl, -1.0..=1.0).text("Curl"));
                ui.add(
                    egui::Slider::new(&mut options.spiral.path_distance, 0.2..=5.0)
                        .text("Spacing"),
                );
                ui.add(egui::Slider::new(&mut options.spiral.scale, 0.1..=2.0).text("Node size"));
            }
            "Branching" => {
                ui.add(
                    egui::Slider::new(&mut options.branching.factor, 2..=8).text("Branching factor"),
                );
                ui.add(
                    egui::Slider::new(&mut options.branching.path_distance, 0.2..=5.0)
                        .text("Spacing"),
                );
                ui.add(
                    egui::Slider::new(&mut options.branching.scale, 0.1..=1.5).text("Node size"),
                );
            }
            "Radial" => {
                ui.add(egui::Slider::new(&mut options.radial.depth, 1.0..=8.0).text("Depth"));
                ui.add(
                    egui::Slider::new(&mut options.radial.path_distance, 1.0..=12.0)
                        .text("Spacing"),
                );
                ui.add(egui::Slider::new(&mut options.radial.scale, 0.1..=1.5).text("Node size"));
            }
            _ => {
                ui.label(RichText::new("Nodes are scattered at stable pseudo-random spots.").weak());
            }
        }

        let button = ui
            .add_enabled(!is_loading, egui::Button::new("Generate"))
            .on_hover_text("Replace the current scene with a generated one.");
        if button.clicked() {
            *reload_request = Some(SceneSource::Generated {
                style: self.layout_style.clone(),
                count: self.layout_count,
                options: self.layout_options,
            });
        }
    }
}
