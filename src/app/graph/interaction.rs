use eframe::egui::{self, Pos2, Rect, Ui};

use crate::sensor::NodeId;

use super::super::ViewModel;
use super::super::render_utils::circle_visible;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = self.projection(rect).to_world(pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.5, 2000.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    /// Secondary or middle drag pans; primary drag on empty canvas pans too.
    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        let primary_on_canvas =
            self.dragging.is_none() && response.dragged_by(egui::PointerButton::Primary);
        if primary_on_canvas
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Primary drag that starts on a node moves that node.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        rect: Rect,
        response: &egui::Response,
        hovered: Option<NodeId>,
    ) {
        if response.drag_started_by(egui::PointerButton::Primary) {
            self.dragging = hovered;
        }

        if let Some(id) = self.dragging {
            if let Some(pointer) = response.interact_pointer_pos() {
                let world = self.projection(rect).to_world(pointer);
                self.move_node(id, world);
            }
            if response.drag_stopped() {
                self.dragging = None;
            }
        }
    }

    pub(in crate::app) fn visible_indices_into(
        rect: Rect,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
        out: &mut Vec<usize>,
    ) {
        out.clear();
        out.extend(
            (0..screen_positions.len())
                .filter(|&index| circle_visible(rect, screen_positions[index], screen_radii[index])),
        );
    }

    pub(in crate::app) fn hovered_index(
        pointer: Option<Pos2>,
        visible_indices: &[usize],
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<usize> {
        let pointer = pointer?;
        visible_indices
            .iter()
            .filter_map(|&index| {
                let distance = screen_positions[index].distance(pointer);
                // small nodes stay clickable
                (distance <= screen_radii[index].max(6.0)).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}
