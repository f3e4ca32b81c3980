//! Headless rendering of one sensor update to an SVG document.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use eframe::egui::{Rect, pos2, vec2};
use tracing::info;

use crate::scene::Scene;
use crate::sensor::geometry::{
    NODE_WORLD_RADIUS, Projection, SENSOR_WORLD_UNIT, SearchArea, SensorEdge,
};
use crate::sensor::{NodeId, NodePopulation, NodeSensor, SearchStats, SensorConfig, SensorNode};

pub const EXPORT_WIDTH: f32 = 1200.0;
pub const EXPORT_HEIGHT: f32 = 900.0;
const EXPORT_MARGIN: f32 = 48.0;

/// Runs one update for `origin` and writes the drawing to `path`.
pub fn export_svg(
    scene: &Scene,
    origin: NodeId,
    config: SensorConfig,
    path: &Path,
) -> Result<SearchStats> {
    let growth = config.growth.label();
    let mut population = NodePopulation::new(scene.sensor_nodes());
    let mut sensor = NodeSensor::new(origin, config).context("invalid sensor configuration")?;
    let stats = sensor
        .update(&mut population)
        .with_context(|| format!("sensor update failed for origin {origin}"))?;

    let document = render_svg(scene, &sensor)?;
    fs::write(path, document)
        .with_context(|| format!("failed to write SVG to {}", path.display()))?;

    info!(
        path = %path.display(),
        origin = %origin,
        nearby = sensor.nearby_nodes().len(),
        extended = sensor.nodes_within_extended_radius().len(),
        iterations = stats.iterations,
        growth,
        "exported sensor drawing"
    );
    Ok(stats)
}

pub fn render_svg(scene: &Scene, sensor: &NodeSensor) -> Result<String> {
    let origin_node = scene
        .node(sensor.origin())
        .ok_or_else(|| anyhow!("origin {} is not part of the scene", sensor.origin()))?
        .sensor_node();

    let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(EXPORT_WIDTH, EXPORT_HEIGHT));
    let projection = Projection::fit(
        rect,
        scene.nodes.iter().map(|node| node.pos),
        EXPORT_MARGIN,
    );
    let unit = projection.zoom * SENSOR_WORLD_UNIT;
    let origin_screen = projection.to_screen(origin_node.pos);

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{EXPORT_WIDTH}" height="{EXPORT_HEIGHT}" viewBox="0 0 {EXPORT_WIDTH} {EXPORT_HEIGHT}">"#
    )?;
    writeln!(
        svg,
        r##"<rect width="100%" height="100%" fill="#101217"/>"##
    )?;

    svg.push_str("<g class=\"links\" stroke=\"#3a4150\" stroke-width=\"1\">\n");
    for (from, to) in &scene.edges {
        let (Some(from), Some(to)) = (scene.node(*from), scene.node(*to)) else {
            continue;
        };
        let a = projection.to_screen(from.pos);
        let b = projection.to_screen(to.pos);
        writeln!(
            svg,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}"/>"#,
            a.x, a.y, b.x, b.y
        )?;
    }
    svg.push_str("</g>\n");

    svg.push_str("<g class=\"sensor\">\n");
    push_edges(&mut svg, projection, &origin_node, sensor.nearby_nodes(), unit, "red")?;
    push_edges(
        &mut svg,
        projection,
        &origin_node,
        sensor.nodes_within_extended_radius(),
        unit,
        "blue",
    )?;

    if let Some(farthest) = sensor.farthest_node_info() {
        let standard = SearchArea::with_unit(
            origin_screen,
            projection.to_screen(farthest.position),
            farthest.scale,
            unit,
        );
        writeln!(svg, "{}", standard.to_svg("red"))?;

        if let Some(extended_position) = sensor.extended_search_position() {
            let extended = SearchArea::with_unit(
                origin_screen,
                projection.to_screen(extended_position),
                farthest.scale,
                unit,
            );
            writeln!(svg, "{}", extended.to_svg("blue"))?;
        }
    }
    svg.push_str("</g>\n");

    svg.push_str("<g class=\"nodes\">\n");
    for node in &scene.nodes {
        let center = projection.to_screen(node.pos);
        let radius = (node.scale * NODE_WORLD_RADIUS * projection.zoom).max(1.5);
        let fill = if node.id == origin_node.id {
            "#f2c14e"
        } else {
            "#8fa3bf"
        };
        writeln!(
            svg,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{fill}"><title>{}</title></circle>"#,
            center.x,
            center.y,
            radius,
            escape_xml(&node.display_name())
        )?;
    }
    svg.push_str("</g>\n</svg>\n");

    Ok(svg)
}

fn push_edges(
    svg: &mut String,
    projection: Projection,
    origin: &SensorNode,
    targets: &[SensorNode],
    unit: f32,
    fill: &str,
) -> Result<()> {
    let origin_screen = projection.to_screen(origin.pos);
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
        writeln!(
            svg,
            r#"<path d="{}" fill="{fill}" stroke-width="0" fill-opacity="0.6"/>"#,
            edge.to_svg_path()
        )?;
    }
    Ok(())
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
