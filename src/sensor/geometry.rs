//! Screen-space shapes derived from a sensor's results.
//!
//! Everything here works on already projected points; [`Projection`] is the
//! world-to-screen mapping shared by the viewer and the SVG export.

use eframe::egui::{Pos2, Rect, Vec2};

/// Stroke width of a [`SearchArea`] per unit of the farthest node's scale.
pub const SEARCH_AREA_STROKE_FACTOR: f32 = 52.0;
/// Half-width of a [`SensorEdge`] per unit of node scale.
pub const EDGE_WIDTH_FACTOR: f32 = 20.0;
/// Extra widening applied at the target end of a [`SensorEdge`].
pub const EDGE_PERSPECTIVE_FACTOR: f32 = 1.5;
/// World-space size of one scale-derived width unit when drawing a scene.
pub const SENSOR_WORLD_UNIT: f32 = 0.004;
/// World-space radius of a node of scale 1.
pub const NODE_WORLD_RADIUS: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub rect: Rect,
    pub pan: Vec2,
    pub zoom: f32,
}

impl Projection {
    pub fn to_screen(self, world: Vec2) -> Pos2 {
        self.rect.center() + self.pan + world * self.zoom
    }

    pub fn to_world(self, screen: Pos2) -> Vec2 {
        (screen - self.rect.center() - self.pan) / self.zoom
    }

    /// Pan and zoom that fit `points` into `rect` with `margin` pixels spare.
    pub fn fit(rect: Rect, points: impl IntoIterator<Item = Vec2>, margin: f32) -> Self {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for point in points {
            if !point.x.is_finite() || !point.y.is_finite() {
                continue;
            }
            min = min.min(point);
            max = max.max(point);
        }

        if !min.x.is_finite() || !max.x.is_finite() {
            return Self {
                rect,
                pan: Vec2::ZERO,
                zoom: 1.0,
            };
        }

        let span = (max - min).max(Vec2::splat(1.0));
        let usable = (rect.size() - Vec2::splat(margin * 2.0)).max(Vec2::splat(1.0));
        let zoom = (usable.x / span.x).min(usable.y / span.y);
        let center = (min + max) * 0.5;

        Self {
            rect,
            pan: -center * zoom,
            zoom,
        }
    }
}

/// Circle around the origin reaching out to the farthest nearby node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchArea {
    pub center: Pos2,
    pub radius: f32,
    pub stroke_width: f32,
}

impl SearchArea {
    /// `unit` converts scale-derived widths to screen pixels.
    pub fn with_unit(origin: Pos2, farthest: Pos2, farthest_scale: f32, unit: f32) -> Self {
        Self {
            center: origin,
            radius: origin.distance(farthest),
            stroke_width: farthest_scale * SEARCH_AREA_STROKE_FACTOR * unit,
        }
    }

    pub fn to_svg(&self, stroke: &str) -> String {
        format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" stroke="{stroke}" stroke-width="{:.2}" fill="none"/>"#,
            self.center.x, self.center.y, self.radius, self.stroke_width
        )
    }
}

/// Tapered quad from the origin to a detected node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorEdge {
    /// Origin left, target left, target right, origin right.
    pub corners: [Pos2; 4],
}

impl SensorEdge {
    /// `None` when both ends coincide and no direction exists.
    pub fn with_unit(
        origin: Pos2,
        origin_scale: f32,
        target: Pos2,
        target_scale: f32,
        unit: f32,
    ) -> Option<Self> {
        let delta = target - origin;
        let length = delta.length();
        if length <= f32::EPSILON || !length.is_finite() {
            return None;
        }

        let perpendicular = (delta / length).rot90();
        let origin_offset = perpendicular * (origin_scale * EDGE_WIDTH_FACTOR * unit);
        let target_offset =
            perpendicular * (target_scale * EDGE_WIDTH_FACTOR * EDGE_PERSPECTIVE_FACTOR * unit);

        Some(Self {
            corners: [
                origin + origin_offset,
                target + target_offset,
                target - target_offset,
                origin - origin_offset,
            ],
        })
    }

    pub fn to_svg_path(&self) -> String {
        let points = self
            .corners
            .iter()
            .map(|corner| format!("{:.2},{:.2}", corner.x, corner.y))
            .collect::<Vec<_>>();
        format!("M {} Z", points.join(" L "))
    }
}
