use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use eframe::egui::{Vec2, vec2};
use tracing::info;

use super::graph::{Scene, SceneNode};
use super::parse::parse_scene;
use crate::sensor::NodeId;
use crate::util::stable_pair;
use crate::zetpath::{MAX_PATH_LENGTH, ZetPath, ZetPathOptions};

/// World distance between generated neighbours per unit of path offset.
const GENERATED_SPACING: f32 = 2.0;

#[derive(Clone, Debug, PartialEq)]
pub enum SceneSource {
    File(PathBuf),
    Generated {
        style: String,
        count: usize,
        options: ZetPathOptions,
    },
}

impl SceneSource {
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Generated { style, count, .. } => format!("{style} layout, {count} nodes"),
        }
    }
}

pub fn load_scene(source: &SceneSource) -> Result<Scene> {
    let scene = match source {
        SceneSource::File(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read scene file {}", path.display()))?;
            parse_scene(&raw, &path.display().to_string())
                .with_context(|| format!("failed to parse scene file {}", path.display()))?
        }
        SceneSource::Generated {
            style,
            count,
            options,
        } => generate_scene(style, *count, options)?,
    };

    info!(
        source = %source.describe(),
        nodes = scene.node_count(),
        edges = scene.edge_count(),
        "loaded scene"
    );
    Ok(scene)
}

/// A root node plus `count` nodes placed by the named layout.
pub fn generate_scene(style: &str, count: usize, options: &ZetPathOptions) -> Result<Scene> {
    if count > MAX_PATH_LENGTH {
        return Err(anyhow!(
            "cannot generate {count} nodes, the limit is {MAX_PATH_LENGTH}"
        ));
    }

    let (path, placement_override) = ZetPath::create(style, &options.with_path_length(count))
        .with_context(|| format!("cannot generate a {style} scene"))?;

    let root = SceneNode {
        id: NodeId(0),
        title: "Root".to_owned(),
        text: String::new(),
        pos: Vec2::ZERO,
        scale: 1.0,
    };

    let mut nodes = vec![root];
    let mut edges = Vec::new();

    if placement_override {
        let spread = (count as f32).sqrt() * GENERATED_SPACING + GENERATED_SPACING;
        for index in 0..count {
            let id = index as u64 + 1;
            let (x, y) = stable_pair(&format!("node-{id}"));
            let (size, _) = stable_pair(&format!("scale-{id}"));
            nodes.push(generated_node(id, vec2(x, y) * spread, 1.0 + size * 0.5));
        }
    } else {
        let path = path.generate_path();
        for (index, step) in path.iter().take(count).enumerate() {
            let parent_index = step.parent.map_or(0, |parent| parent + 1);
            let parent = nodes
                .get(parent_index)
                .ok_or_else(|| anyhow!("layout step {index} refers to a later node"))?;

            let base = if step.relative_to_parent {
                parent.pos
            } else {
                Vec2::ZERO
            };
            let id = index as u64 + 1;
            let pos = base + step.offset * GENERATED_SPACING;
            edges.push((parent.id, NodeId(id)));
            nodes.push(generated_node(id, pos, step.scale));
        }
    }

    let mut scene = Scene::new(format!("{} layout", path.style_name()), nodes, edges);
    scene.default_origin = Some(NodeId(0));
    Ok(scene)
}

fn generated_node(id: u64, pos: Vec2, scale: f32) -> SceneNode {
    SceneNode {
        id: NodeId(id),
        title: format!("Node {id}"),
        text: String::new(),
        pos,
        scale,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn generated_radial_scene_links_children_to_parents() {
        let scene = generate_scene("Radial", 20, &ZetPathOptions::default()).expect("known style");

        assert_eq!(scene.node_count(), 21);
        assert_eq!(scene.edge_count(), 20);
        assert_eq!(scene.default_origin, Some(NodeId(0)));
        // first ring hangs off the root at path distance 5
        assert_eq!(scene.edges[0], (NodeId(0), NodeId(1)));
        let first = &scene.nodes[1];
        assert!((first.pos.length() - 5.0 * GENERATED_SPACING).abs() < 1e-3);
    }

    #[test]
    fn generated_spiral_is_a_chain() {
        let scene = generate_scene("spiral", 10, &ZetPathOptions::default()).expect("known style");

        assert_eq!(scene.node_count(), 11);
        assert_eq!(scene.edges[3], (NodeId(3), NodeId(4)));
        for (from, to) in &scene.edges {
            let from = scene.node(*from).expect("edge endpoint");
            let to = scene.node(*to).expect("edge endpoint");
            assert!((from.pos - to.pos).length() < 2.0 * GENERATED_SPACING);
        }
    }

    #[test]
    fn random_scene_is_scattered_without_edges() {
        let first = generate_scene("Random", 30, &ZetPathOptions::default()).expect("known style");
        let second = generate_scene("Random", 30, &ZetPathOptions::default()).expect("known style");

        assert_eq!(first.node_count(), 31);
        assert!(first.edges.is_empty());
        assert_eq!(first.nodes, second.nodes);
        assert!(first.nodes.iter().all(|node| node.scale >= 0.5 && node.scale <= 1.5));
    }

    #[test]
    fn node_count_is_bounded() {
        for style in ZetPath::STYLE_NAMES {
            assert!(generate_scene(style, MAX_PATH_LENGTH + 1, &ZetPathOptions::default()).is_err());
        }

        let largest = generate_scene("Spiral", MAX_PATH_LENGTH, &ZetPathOptions::default())
            .expect("count at the limit");
        assert_eq!(largest.node_count(), MAX_PATH_LENGTH + 1);
    }

    #[test]
    fn unknown_layout_is_an_error() {
        assert!(generate_scene("Helix", 5, &ZetPathOptions::default()).is_err());
    }

    #[test]
    fn loads_scene_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"nodes": [{{"id": 7, "title": "Seven", "x": 1, "y": 2}}, {{"id": 8, "x": 4, "y": 6}}]}}"#
        )
        .expect("write scene");

        let scene = load_scene(&SceneSource::File(file.path().to_path_buf())).expect("valid scene");

        assert_eq!(scene.node_count(), 2);
        assert_eq!(scene.initial_origin(), Some(NodeId(7)));
        assert_eq!(scene.label, file.path().display().to_string());
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.json");

        let error = load_scene(&SceneSource::File(path.clone())).expect_err("missing file");
        assert!(format!("{error:#}").contains("absent.json"));
    }
}
