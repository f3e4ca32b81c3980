use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

use crate::sensor::geometry::Projection;

pub(super) const ORIGIN_COLOR: Color32 = Color32::from_rgb(242, 193, 78);
pub(super) const NEARBY_COLOR: Color32 = Color32::from_rgb(226, 84, 84);
pub(super) const EXTENDED_COLOR: Color32 = Color32::from_rgb(84, 132, 226);
pub(super) const IDLE_NODE_COLOR: Color32 = Color32::from_rgb(118, 138, 166);

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// Background fill plus a world-aligned grid one world unit per cell, thinned
/// out when zoomed away.
pub(super) fn draw_background(painter: &Painter, projection: Projection) {
    let rect = projection.rect;
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let mut step = projection.zoom.max(1.0e-3);
    while step < 20.0 {
        step *= 5.0;
    }
    let origin = projection.to_screen(eframe::egui::Vec2::ZERO);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn blend_mixes_channels() {
        let mixed = blend_color(Color32::BLACK, Color32::WHITE, 0.5);
        assert!((126..=128).contains(&mixed.r()));
        assert_eq!(blend_color(Color32::BLACK, Color32::WHITE, 2.0), Color32::WHITE);
    }

    #[test]
    fn visibility_checks_respect_bounds() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0));

        assert!(circle_visible(rect, pos2(-5.0, 50.0), 10.0));
        assert!(!circle_visible(rect, pos2(-20.0, 50.0), 10.0));
        assert!(segment_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(!segment_visible(rect, pos2(-50.0, -50.0), pos2(-10.0, -10.0), 2.0));
    }
}
