use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Shape, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::sensor::NodeId;
use crate::sensor::geometry::{
    NODE_WORLD_RADIUS, Projection, SENSOR_WORLD_UNIT, SearchArea, SensorEdge,
};
use crate::util::{first_line, truncate_label};

use super::super::render_utils::{
    EXTENDED_COLOR, IDLE_NODE_COLOR, NEARBY_COLOR, ORIGIN_COLOR, blend_color, draw_background,
    segment_visible, with_alpha,
};
use super::super::{SearchMatchCache, ViewModel, ViewScratch};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl ViewModel {
    fn update_screen_space(&mut self, projection: Projection) {
        let scratch = &mut self.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for node in &self.scene.nodes {
            scratch.screen_positions.push(projection.to_screen(node.pos));
            scratch
                .screen_radii
                .push((node.scale * NODE_WORLD_RADIUS * projection.zoom).clamp(2.5, 60.0));
        }
        ViewModel::visible_indices_into(
            projection.rect,
            &scratch.screen_positions,
            &scratch.screen_radii,
            &mut scratch.visible_indices,
        );
    }

    /// Nodes whose name or first text line fuzzy-matches the search box,
    /// best first.
    pub(in crate::app) fn search_matches(&mut self) -> Option<Arc<Vec<(NodeId, i64)>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let mut matches = self
            .scene
            .nodes
            .iter()
            .filter_map(|node| {
                let by_name = fuzzy_match_score(&matcher, &node.display_name(), query);
                let by_text = fuzzy_match_score(&matcher, first_line(&node.text), query);
                by_name.max(by_text).map(|score| (node.id, score))
            })
            .collect::<Vec<_>>();
        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        if self.fit_pending {
            self.fit_view(rect);
        }
        let painter = ui.painter_at(rect);

        self.handle_graph_zoom(ui, rect, &response);
        self.update_screen_space(self.projection(rect));

        let pointer = response.hover_pos();
        let hovered = Self::hovered_index(
            pointer,
            &self.view_scratch.visible_indices,
            &self.view_scratch.screen_positions,
            &self.view_scratch.screen_radii,
        )
        .map(|index| self.scene.nodes[index].id);

        self.handle_node_drag(rect, &response, hovered);
        self.handle_graph_pan(&response);
        if response.clicked()
            && let Some(id) = hovered
        {
            self.set_origin(id);
        }
        if self.dragging.is_some() || response.dragged() {
            ui.ctx().request_repaint();
        }

        let projection = self.projection(rect);
        self.update_screen_space(projection);
        draw_background(&painter, projection);

        if self.show_quadtree_overlay {
            self.draw_quadtree_overlay(&painter, projection);
        }
        if self.show_scene_edges {
            self.draw_scene_edges(&painter, projection);
        }
        self.draw_sensor(&painter, projection);

        let search_hits = self
            .search_matches()
            .map(|matches| matches.iter().map(|(id, _)| *id).collect::<HashSet<_>>());
        self.draw_nodes(&painter, hovered, search_hits.as_ref());

        if let (Some(id), Some(pointer)) = (hovered, pointer) {
            self.draw_hover_card(&painter, id, pointer);
        }
    }

    fn draw_quadtree_overlay(&mut self, painter: &egui::Painter, projection: Projection) {
        self.population
            .quadtree_cells(&mut self.view_scratch.quadtree_cells);
        for cell in &self.view_scratch.quadtree_cells {
            let extent = vec2(cell.half_extent, cell.half_extent);
            let min = projection.to_screen(cell.center - extent);
            let max = projection.to_screen(cell.center + extent);
            let alpha = if cell.is_leaf { 110 } else { 55 };
            let width = (1.6 - (cell.depth as f32 * 0.12)).max(0.6);
            painter.rect_stroke(
                egui::Rect::from_two_pos(min, max),
                0.0,
                Stroke::new(width, Color32::from_rgba_unmultiplied(110, 190, 255, alpha)),
                egui::StrokeKind::Inside,
            );
        }
    }

    fn draw_scene_edges(&self, painter: &egui::Painter, projection: Projection) {
        let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(120, 132, 150, 90));
        for (from, to) in &self.scene.edges {
            let (Some(from), Some(to)) = (self.scene.index_of(*from), self.scene.index_of(*to))
            else {
                continue;
            };
            let start = self.view_scratch.screen_positions[from];
            let end = self.view_scratch.screen_positions[to];
            if segment_visible(projection.rect, start, end, 2.0) {
                painter.line_segment([start, end], stroke);
            }
        }
    }

    fn draw_sensor(&self, painter: &egui::Painter, projection: Projection) {
        let Some(sensor) = &self.sensor else {
            return;
        };
        let Some(origin) = self.scene.node(sensor.origin()) else {
            return;
        };

        let unit = projection.zoom * SENSOR_WORLD_UNIT;
        let origin_screen = projection.to_screen(origin.pos);

        if self.show_sensor_edges {
            let groups = [
                (sensor.nearby_nodes(), NEARBY_COLOR),
                (sensor.nodes_within_extended_radius(), EXTENDED_COLOR),
            ];
            for (targets, color) in groups {
                for target in targets {
                    let Some(edge) = SensorEdge::with_unit(
                        origin_screen,
                        origin.scale,
                        projection.to_screen(target.pos),
                        target.scale,
                        unit,
                    ) else {
                        continue;
                    };
                    painter.add(Shape::convex_polygon(
                        edge.corners.to_vec(),
                        with_alpha(color, 120),
                        Stroke::NONE,
                    ));
                }
            }
        }

        if self.show_search_areas
            && let Some(farthest) = sensor.farthest_node_info()
        {
            let standard = SearchArea::with_unit(
                origin_screen,
                projection.to_screen(farthest.position),
                farthest.scale,
                unit,
            );
            painter.circle_stroke(
                standard.center,
                standard.radius,
                Stroke::new(standard.stroke_width, with_alpha(NEARBY_COLOR, 70)),
            );

            if let Some(position) = sensor.extended_search_position() {
                let extended = SearchArea::with_unit(
                    origin_screen,
                    projection.to_screen(position),
                    farthest.scale,
                    unit,
                );
                painter.circle_stroke(
                    extended.center,
                    extended.radius,
                    Stroke::new(extended.stroke_width, with_alpha(EXTENDED_COLOR, 70)),
                );
            }
        }
    }

    fn draw_nodes(
        &self,
        painter: &egui::Painter,
        hovered: Option<NodeId>,
        search_hits: Option<&HashSet<NodeId>>,
    ) {
        let ViewScratch {
            screen_positions,
            screen_radii,
            visible_indices,
            nearby,
            extended,
            ..
        } = &self.view_scratch;
        let origin = self.origin();

        for &index in visible_indices {
            let node = &self.scene.nodes[index];
            let center = screen_positions[index];
            let radius = screen_radii[index];

            let base = if origin == Some(node.id) {
                ORIGIN_COLOR
            } else if nearby.contains(&node.id) {
                blend_color(IDLE_NODE_COLOR, NEARBY_COLOR, 0.7)
            } else if extended.contains(&node.id) {
                blend_color(IDLE_NODE_COLOR, EXTENDED_COLOR, 0.7)
            } else {
                IDLE_NODE_COLOR
            };
            let dimmed = search_hits.is_some_and(|hits| !hits.contains(&node.id));
            let fill = if dimmed { with_alpha(base, 70) } else { base };

            painter.circle_filled(center, radius, fill);
            if hovered == Some(node.id) || self.dragging == Some(node.id) {
                painter.circle_stroke(center, radius + 2.0, Stroke::new(2.0, Color32::WHITE));
            } else if search_hits.is_some_and(|hits| hits.contains(&node.id)) {
                painter.circle_stroke(center, radius + 2.0, Stroke::new(1.5, ORIGIN_COLOR));
            }

            if self.show_labels && radius >= 8.0 {
                painter.text(
                    center + vec2(0.0, radius + 3.0),
                    Align2::CENTER_TOP,
                    truncate_label(&node.display_name(), 24),
                    FontId::proportional(12.0),
                    Color32::from_gray(210),
                );
            }
        }
    }

    fn draw_hover_card(&self, painter: &egui::Painter, id: NodeId, pointer: Pos2) {
        let Some(node) = self.scene.node(id) else {
            return;
        };

        let mut text = format!("{} {}\nscale {:.2}", node.display_name(), node.id, node.scale);
        if let Some(sensor) = &self.sensor
            && let Some(origin) = self.scene.node(sensor.origin())
            && origin.id != id
        {
            let distance = sensor.distance_to(&origin.sensor_node(), &node.sensor_node());
            text.push_str(&format!("\ndistance from origin {distance:.2}"));
        }

        painter.text(
            pointer + vec2(14.0, 14.0),
            Align2::LEFT_TOP,
            text,
            FontId::monospace(12.0),
            Color32::from_gray(235),
        );
    }
}
