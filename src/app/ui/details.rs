use std::ops::Range;

use eframe::egui::text::LayoutJob;
use eframe::egui::{self, Color32, FontId, RichText, TextFormat, Ui};

use crate::phrase::{MAX_PHRASE_WORDS, PhraseError, find_shared_phrases, highlight_ranges};
use crate::sensor::{NodeId, SensorNode};
use crate::util::truncate_label;

use super::super::render_utils::{EXTENDED_COLOR, NEARBY_COLOR};
use super::super::{PhraseCache, PhraseCacheKey, SharedPhraseEntry, ViewModel};

fn highlighted_text(text: &str, highlights: &[Range<usize>]) -> LayoutJob {
    let plain = TextFormat {
        font_id: FontId::proportional(13.0),
        color: Color32::from_gray(205),
        ..TextFormat::default()
    };
    let marked = TextFormat {
        background: Color32::from_rgba_unmultiplied(242, 193, 78, 70),
        color: Color32::WHITE,
        ..plain.clone()
    };

    let mut job = LayoutJob::default();
    let mut cursor = 0;
    for range in highlights {
        if range.start > cursor {
            job.append(&text[cursor..range.start], 0.0, plain.clone());
        }
        job.append(&text[range.clone()], 0.0, marked.clone());
        cursor = range.end;
    }
    if cursor < text.len() {
        job.append(&text[cursor..], 0.0, plain);
    }
    job
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Sensor Details");
        ui.add_space(6.0);

        if let Some(error) = &self.sensor_error {
            ui.colored_label(Color32::LIGHT_RED, error.as_str());
        }

        let Some(sensor) = &self.sensor else {
            ui.label("Click a node to place the sensor on it.");
            return;
        };
        let Some(origin) = self.scene.node(sensor.origin()) else {
            ui.label("The origin node no longer exists in the scene.");
            return;
        };

        ui.label(RichText::new(origin.display_name()).strong());
        ui.small(format!(
            "{}  at ({:.2}, {:.2})  scale {:.2}",
            origin.id, origin.pos.x, origin.pos.y, origin.scale
        ));
        ui.add_space(6.0);

        ui.label(format!("Search radius: {:.2}", sensor.search_radius()));
        if let Some(stats) = self.last_stats {
            ui.label(format!(
                "Probes: {}  candidates: {}",
                stats.iterations, stats.candidates_considered
            ));
            if stats.passthrough {
                ui.label("Whole population fits; every node is nearby.");
            }
            if stats.capped {
                ui.colored_label(
                    Color32::LIGHT_YELLOW,
                    "Radius stopped growing; every remaining node was ranked.",
                );
            }
        }
        if let Some(farthest) = sensor.farthest_node_info() {
            ui.label(format!(
                "Farthest nearby: {} at {:.2}",
                farthest.id, farthest.distance
            ));
        }
        if let (Some(position), Some(radius)) = (
            sensor.extended_search_position(),
            sensor.extended_search_radius(),
        ) {
            ui.label(format!(
                "Extended probe: ({:.2}, {:.2}) radius {:.2}",
                position.x, position.y, radius
            ));
        }

        let origin_node = origin.sensor_node();
        let nearby = sensor.nearby_nodes().to_vec();
        let extended = sensor.nodes_within_extended_radius().to_vec();

        let mut chosen = None;
        ui.separator();
        ui.label(RichText::new(format!("Nearby ({})", nearby.len())).color(NEARBY_COLOR));
        self.draw_node_rows(ui, "nearby_rows", &origin_node, &nearby, &mut chosen);

        ui.separator();
        ui.label(RichText::new(format!("Extended ({})", extended.len())).color(EXTENDED_COLOR));
        self.draw_node_rows(ui, "extended_rows", &origin_node, &extended, &mut chosen);

        ui.separator();
        self.draw_shared_phrases(ui, origin_node.id, &nearby, &extended);

        if let Some(id) = chosen {
            self.set_origin(id);
        }
    }

    fn draw_node_rows(
        &self,
        ui: &mut Ui,
        salt: &str,
        origin: &SensorNode,
        nodes: &[SensorNode],
        chosen: &mut Option<NodeId>,
    ) {
        if nodes.is_empty() {
            ui.label(RichText::new("none").weak());
            return;
        }
        let Some(sensor) = &self.sensor else {
            return;
        };

        egui::ScrollArea::vertical()
            .id_salt(salt)
            .max_height(180.0)
            .auto_shrink([false, true])
            .show_rows(ui, 20.0, nodes.len(), |ui, row_range| {
                for node in &nodes[row_range] {
                    let name = self
                        .scene
                        .node(node.id)
                        .map(|scene_node| scene_node.display_name())
                        .unwrap_or_else(|| node.id.to_string());
                    let label = format!(
                        "{}  d={:.2}  s={:.2}",
                        truncate_label(&name, 28),
                        sensor.distance_to(origin, node),
                        node.scale
                    );
                    if ui
                        .link(label)
                        .on_hover_text("Move the sensor to this node")
                        .clicked()
                    {
                        *chosen = Some(node.id);
                    }
                }
            });
    }

    fn draw_shared_phrases(
        &mut self,
        ui: &mut Ui,
        origin: NodeId,
        nearby: &[SensorNode],
        extended: &[SensorNode],
    ) {
        ui.label(RichText::new("Shared phrases").strong());
        ui.add(
            egui::Slider::new(&mut self.phrase_min_words, 1..=MAX_PHRASE_WORDS)
                .text("Minimum words"),
        );

        let key = PhraseCacheKey {
            origin,
            neighbours: nearby.iter().chain(extended).map(|node| node.id).collect(),
            min_words: self.phrase_min_words,
        };
        if self.phrase_cache.as_ref().is_none_or(|cache| cache.key != key) {
            match self.collect_shared_phrases(key) {
                Ok(cache) => self.phrase_cache = Some(cache),
                Err(error) => {
                    ui.colored_label(Color32::LIGHT_RED, error.to_string());
                    return;
                }
            }
        }

        let Some(cache) = &self.phrase_cache else {
            return;
        };
        let Some(origin_node) = self.scene.node(origin) else {
            return;
        };
        if cache.entries.is_empty() {
            ui.label(RichText::new("No phrases shared with detected nodes.").weak());
            return;
        }

        for entry in &cache.entries {
            let Some(node) = self.scene.node(entry.node) else {
                continue;
            };
            ui.collapsing(truncate_label(&node.display_name(), 32), |ui| {
                for phrase in &entry.phrases {
                    ui.label(format!("\u{201c}{phrase}\u{201d}"));
                }
                ui.add_space(4.0);
                ui.label(highlighted_text(&node.text, &entry.highlights));
            });
        }

        ui.add_space(4.0);
        ui.label(RichText::new("Origin text").weak());
        ui.label(highlighted_text(&origin_node.text, &cache.origin_highlights));
    }

    /// Shared phrases per detected node, with highlight ranges computed once
    /// per cache key rather than every frame.
    fn collect_shared_phrases(&self, key: PhraseCacheKey) -> Result<PhraseCache, PhraseError> {
        let mut entries = Vec::new();
        let mut origin_highlights = Vec::new();

        if let Some(origin) = self.scene.node(key.origin)
            && !origin.text.trim().is_empty()
        {
            let mut all_phrases = Vec::new();
            for node in key.neighbours.iter().filter_map(|id| self.scene.node(*id)) {
                if node.text.trim().is_empty() {
                    continue;
                }
                let phrases = find_shared_phrases(&origin.text, &node.text, key.min_words)?;
                if phrases.is_empty() {
                    continue;
                }
                all_phrases.extend(phrases.iter().cloned());
                entries.push(SharedPhraseEntry {
                    node: node.id,
                    highlights: highlight_ranges(&node.text, &phrases)?,
                    phrases,
                });
            }
            origin_highlights = highlight_ranges(&origin.text, &all_phrases)?;
        }

        Ok(PhraseCache {
            key,
            entries,
            origin_highlights,
        })
    }
}
