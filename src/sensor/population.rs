use std::collections::HashMap;

use eframe::egui::Vec2;

use super::distance::{DistanceParams, distance_from, planar_distance_sq};
use super::quadtree::{QuadNode, QuadtreeCell, collect_quadtree_cells};
use super::{NodeId, SensorNode};

/// The population a [`super::NodeSensor`] searches.
pub trait CandidateSource {
    /// Bring derived state (indices, caches) in line with the node data.
    fn refresh(&mut self);

    /// Total number of nodes, origin included.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn node(&self, id: NodeId) -> Option<SensorNode>;

    /// Every node other than `origin` whose distance from `origin` is at
    /// most `radius`, in population order.
    fn query(&self, origin: &SensorNode, radius: f32, params: &DistanceParams) -> Vec<SensorNode>;
}

fn within(origin: &SensorNode, node: &SensorNode, radius: f32, params: &DistanceParams) -> bool {
    node.id != origin.id && distance_from(origin, node, params) <= radius
}

/// Plain linear scan, no index.
impl CandidateSource for Vec<SensorNode> {
    fn refresh(&mut self) {}

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn node(&self, id: NodeId) -> Option<SensorNode> {
        self.iter().find(|node| node.id == id).copied()
    }

    fn query(&self, origin: &SensorNode, radius: f32, params: &DistanceParams) -> Vec<SensorNode> {
        self.iter()
            .filter(|node| within(origin, node, radius, params))
            .copied()
            .collect()
    }
}

/// Node snapshot plus a quadtree over node positions.
///
/// Moves are applied through [`NodePopulation::set_position`]; the tree is
/// rebuilt lazily on the next [`CandidateSource::refresh`].
#[derive(Default)]
pub struct NodePopulation {
    nodes: Vec<SensorNode>,
    index_by_id: HashMap<NodeId, usize>,
    positions: Vec<Vec2>,
    tree: Option<QuadNode>,
    dirty: bool,
}

impl NodePopulation {
    pub fn new(nodes: impl IntoIterator<Item = SensorNode>) -> Self {
        let mut population = Self::default();
        for node in nodes {
            population.insert(node);
        }
        population.refresh();
        population
    }

    /// Adds a node, or replaces the node with the same id.
    pub fn insert(&mut self, node: SensorNode) {
        if let Some(&index) = self.index_by_id.get(&node.id) {
            self.nodes[index] = node;
        } else {
            self.index_by_id.insert(node.id, self.nodes.len());
            self.nodes.push(node);
        }
        self.dirty = true;
    }

    pub fn set_position(&mut self, id: NodeId, pos: Vec2) -> bool {
        let Some(&index) = self.index_by_id.get(&id) else {
            return false;
        };
        self.nodes[index].pos = pos;
        self.dirty = true;
        true
    }

    pub fn nodes(&self) -> &[SensorNode] {
        &self.nodes
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.index_by_id.get(&id).copied()
    }

    pub fn quadtree_cells(&self, cells: &mut Vec<QuadtreeCell>) {
        cells.clear();
        if let Some(tree) = &self.tree {
            collect_quadtree_cells(tree, 0, cells);
        }
    }
}

impl CandidateSource for NodePopulation {
    fn refresh(&mut self) {
        if !self.dirty {
            return;
        }

        self.positions.clear();
        self.positions.extend(self.nodes.iter().map(|node| node.pos));
        self.tree = QuadNode::build(&self.positions);
        self.dirty = false;
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, id: NodeId) -> Option<SensorNode> {
        self.index_of(id).map(|index| self.nodes[index])
    }

    fn query(&self, origin: &SensorNode, radius: f32, params: &DistanceParams) -> Vec<SensorNode> {
        // Planar pruning is only sound while the scale axis adds distance.
        let Some(tree) = self
            .tree
            .as_ref()
            .filter(|_| !self.dirty && params.scale_influence >= 0.0)
        else {
            return self
                .nodes
                .iter()
                .filter(|node| within(origin, node, radius, params))
                .copied()
                .collect();
        };

        let mut indices = Vec::new();
        tree.collect_candidates(origin.pos, radius, &mut indices);
        indices.sort_unstable();

        indices
            .into_iter()
            .map(|index| self.nodes[index])
            .filter(|node| {
                (!radius.is_finite() || planar_distance_sq(origin, node) <= radius * radius)
                    && within(origin, node, radius, params)
            })
            .collect()
    }
}
