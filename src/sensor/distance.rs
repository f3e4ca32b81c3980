//! Scale-aware distance between an origin node and a candidate.
//!
//! The scale difference acts as a third axis, so a node far larger than the
//! origin is pulled in ("fisheye") while a much smaller one is pushed away.
//! The measure is deliberately one-sided: the bias only applies when the
//! *candidate* is the larger node, so `distance_from(a, b)` and
//! `distance_from(b, a)` generally differ. Always measure from the origin.

use serde::{Deserialize, Serialize};

use super::SensorNode;

/// Tuning constants of [`distance_from`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceParams {
    /// Multiplier applied to the scale difference when the candidate is
    /// larger than the origin.
    pub larger_node_bias: f32,
    /// Weight of the squared scale difference against planar distance.
    pub scale_influence: f32,
}

impl Default for DistanceParams {
    fn default() -> Self {
        Self {
            larger_node_bias: 0.03,
            scale_influence: 1.0,
        }
    }
}

/// Distance from `origin` to `candidate`. Never symmetric in general.
///
/// Negative scales are not rejected; they flow through the arithmetic as-is.
pub fn distance_from(origin: &SensorNode, candidate: &SensorNode, params: &DistanceParams) -> f32 {
    let delta = origin.pos - candidate.pos;
    let mut ds = origin.scale - candidate.scale;
    if candidate.scale > origin.scale {
        ds *= params.larger_node_bias;
    }

    (delta.length_sq() + (ds * ds * params.scale_influence)).sqrt()
}

/// Planar part of [`distance_from`]; a lower bound for it whenever
/// `scale_influence` is non-negative.
pub(super) fn planar_distance_sq(origin: &SensorNode, candidate: &SensorNode) -> f32 {
    (origin.pos - candidate.pos).length_sq()
}
