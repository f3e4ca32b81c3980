use std::collections::HashMap;

use eframe::egui::Vec2;

use crate::sensor::{NodeId, SensorConfig, SensorNode};

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub title: String,
    pub text: String,
    pub pos: Vec2,
    pub scale: f32,
}

impl SceneNode {
    pub fn sensor_node(&self) -> SensorNode {
        SensorNode::new(self.id.0, self.pos.x, self.pos.y, self.scale)
    }

    pub fn display_name(&self) -> String {
        if self.title.is_empty() {
            format!("Node {}", self.id.0)
        } else {
            self.title.clone()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Where the scene came from, for window titles and logs.
    pub label: String,
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<(NodeId, NodeId)>,
    /// Sensor settings carried by a scene file.
    pub sensor: Option<SensorConfig>,
    pub default_origin: Option<NodeId>,
    index_by_id: HashMap<NodeId, usize>,
}

impl Scene {
    /// Callers guarantee unique ids; later duplicates shadow earlier ones.
    pub fn new(label: impl Into<String>, nodes: Vec<SceneNode>, edges: Vec<(NodeId, NodeId)>) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id, index))
            .collect();

        Self {
            label: label.into(),
            nodes,
            edges,
            sensor: None,
            default_origin: None,
            index_by_id,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.index_by_id.get(&id).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn set_position(&mut self, id: NodeId, pos: Vec2) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.nodes[index].pos = pos;
        true
    }

    pub fn sensor_nodes(&self) -> Vec<SensorNode> {
        self.nodes.iter().map(SceneNode::sensor_node).collect()
    }

    /// Explicit default origin, else the first node.
    pub fn initial_origin(&self) -> Option<NodeId> {
        self.default_origin
            .filter(|id| self.index_by_id.contains_key(id))
            .or_else(|| self.nodes.first().map(|node| node.id))
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    fn node(id: u64, title: &str) -> SceneNode {
        SceneNode {
            id: NodeId(id),
            title: title.to_owned(),
            text: String::new(),
            pos: vec2(id as f32, 0.0),
            scale: 1.0,
        }
    }

    #[test]
    fn lookups_follow_ids() {
        let mut scene = Scene::new("test", vec![node(4, "four"), node(9, "")], Vec::new());

        assert_eq!(scene.index_of(NodeId(9)), Some(1));
        assert_eq!(scene.node(NodeId(4)).map(SceneNode::display_name), Some("four".to_owned()));
        assert_eq!(scene.nodes[1].display_name(), "Node 9");
        assert!(scene.set_position(NodeId(9), vec2(2.0, 2.0)));
        assert!(!scene.set_position(NodeId(1), Vec2::ZERO));
        assert_eq!(scene.sensor_nodes()[1].pos, vec2(2.0, 2.0));
    }

    #[test]
    fn initial_origin_falls_back_to_first_node() {
        let mut scene = Scene::new("test", vec![node(4, "a"), node(9, "b")], Vec::new());
        assert_eq!(scene.initial_origin(), Some(NodeId(4)));

        scene.default_origin = Some(NodeId(9));
        assert_eq!(scene.initial_origin(), Some(NodeId(9)));

        scene.default_origin = Some(NodeId(77));
        assert_eq!(scene.initial_origin(), Some(NodeId(4)));
        assert_eq!(Scene::default().initial_origin(), None);
    }
}
