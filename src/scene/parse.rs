use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};
use eframe::egui::vec2;
use serde::Deserialize;
use tracing::warn;

use super::graph::{Scene, SceneNode};
use crate::sensor::{NodeId, SensorConfig};

#[derive(Debug, Deserialize)]
struct RawScene {
    nodes: Vec<RawNode>,
    #[serde(default)]
    edges: Vec<(u64, u64)>,
    #[serde(default)]
    sensor: Option<SensorConfig>,
    #[serde(default)]
    origin: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    text: String,
    x: f32,
    y: f32,
    #[serde(default = "default_scale")]
    scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

pub(super) fn parse_scene(raw: &str, label: &str) -> Result<Scene> {
    let raw: RawScene = serde_json::from_str(raw).context("invalid scene JSON")?;
    if raw.nodes.is_empty() {
        return Err(anyhow!("scene contains no nodes"));
    }

    let mut seen = HashSet::with_capacity(raw.nodes.len());
    let mut nodes = Vec::with_capacity(raw.nodes.len());
    for node in raw.nodes {
        if !seen.insert(node.id) {
            return Err(anyhow!("duplicate node id {} in scene", node.id));
        }

        nodes.push(SceneNode {
            id: NodeId(node.id),
            title: node.title,
            text: node.text,
            pos: vec2(node.x, node.y),
            scale: node.scale,
        });
    }

    let mut edges = Vec::with_capacity(raw.edges.len());
    for (from, to) in raw.edges {
        if !seen.contains(&from) || !seen.contains(&to) {
            warn!(from, to, "dropping scene edge with unknown endpoint");
            continue;
        }
        edges.push((NodeId(from), NodeId(to)));
    }

    if let Some(sensor) = &raw.sensor {
        sensor
            .validate()
            .context("invalid sensor block in scene")?;
    }

    let default_origin = match raw.origin {
        Some(id) if !seen.contains(&id) => {
            return Err(anyhow!("scene origin {id} is not a node of the scene"));
        }
        origin => origin.map(NodeId),
    };

    let mut scene = Scene::new(label, nodes, edges);
    scene.sensor = raw.sensor;
    scene.default_origin = default_origin;
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::RadiusGrowth;

    #[test]
    fn parses_nodes_edges_and_sensor_block() {
        let raw = r#"{
            "nodes": [
                {"id": 1, "title": "Root", "text": "hello", "x": 0, "y": 0, "scale": 2},
                {"id": 2, "x": 3.5, "y": -1}
            ],
            "edges": [[1, 2], [2, 99]],
            "sensor": {"max_node_count": 3, "growth": {"kind": "geometric", "factor": 3.0}},
            "origin": 2,
            "comment": "ignored"
        }"#;

        let scene = parse_scene(raw, "inline").expect("valid scene");

        assert_eq!(scene.node_count(), 2);
        assert_eq!(scene.nodes[0].scale, 2.0);
        assert_eq!(scene.nodes[1].scale, 1.0);
        assert_eq!(scene.nodes[1].pos, vec2(3.5, -1.0));
        assert_eq!(scene.edges, vec![(NodeId(1), NodeId(2))]);
        assert_eq!(scene.default_origin, Some(NodeId(2)));

        let sensor = scene.sensor.expect("sensor block");
        assert_eq!(sensor.max_node_count, 3);
        assert_eq!(sensor.growth, RadiusGrowth::Geometric { factor: 3.0 });
        assert_eq!(sensor.extended_radius_factor, 1.1);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let raw = r#"{"nodes": [{"id": 1, "x": 0, "y": 0}, {"id": 1, "x": 1, "y": 1}]}"#;
        let error = parse_scene(raw, "dup").expect_err("duplicate ids");
        assert!(error.to_string().contains("duplicate node id 1"));
    }

    #[test]
    fn rejects_bad_sensor_block_and_unknown_origin() {
        let bad_sensor = r#"{"nodes": [{"id": 1, "x": 0, "y": 0}], "sensor": {"max_node_count": 0}}"#;
        assert!(parse_scene(bad_sensor, "bad").is_err());

        let bad_origin = r#"{"nodes": [{"id": 1, "x": 0, "y": 0}], "origin": 5}"#;
        assert!(parse_scene(bad_origin, "bad").is_err());

        assert!(parse_scene(r#"{"nodes": []}"#, "empty").is_err());
        assert!(parse_scene("not json", "garbage").is_err());
    }
}
