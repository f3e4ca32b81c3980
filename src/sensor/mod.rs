//! Nearby-node sensing over a positioned, scaled node population.
//!
//! A [`NodeSensor`] is centred on one origin node and, once per frame, finds
//! the `max_node_count` nodes closest to it under the scale-aware distance in
//! [`distance`], then looks a little further out along the direction of the
//! farthest hit to collect an extended ring of nodes.

mod config;
pub mod distance;
pub mod geometry;
mod node_sensor;
mod population;
mod quadtree;

use std::fmt;

use eframe::egui::Vec2;
use thiserror::Error;

pub use config::{RadiusGrowth, SensorConfig, SensorOverrides};
pub use distance::{DistanceParams, distance_from};
pub use node_sensor::{FarthestNodeInfo, NodeSensor, SearchStats};
pub use population::{CandidateSource, NodePopulation};
pub use quadtree::QuadtreeCell;

/// Stable identity of a node, used for self-exclusion and de-duplication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read-only snapshot of a node as the sensor sees it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorNode {
    pub id: NodeId,
    pub pos: Vec2,
    pub scale: f32,
}

impl SensorNode {
    pub fn new(id: u64, x: f32, y: f32, scale: f32) -> Self {
        Self {
            id: NodeId(id),
            pos: Vec2::new(x, y),
            scale,
        }
    }
}

/// Errors emitted while configuring or running a sensor.
#[derive(Debug, Error, PartialEq)]
pub enum SensorError {
    /// Configuration values that cannot drive a search.
    #[error("invalid sensor configuration: {0}")]
    InvalidConfig(&'static str),
    /// The origin node is not part of the candidate population.
    #[error("origin node {0} is not present in the node population")]
    OriginNotFound(NodeId),
}
