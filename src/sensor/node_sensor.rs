use std::collections::HashSet;

use eframe::egui::{Vec2, vec2};
use tracing::{debug, warn};

use super::distance::distance_from;
use super::{CandidateSource, NodeId, SensorConfig, SensorError, SensorNode};

/// Where the farthest member of the nearby set sits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FarthestNodeInfo {
    pub id: NodeId,
    pub position: Vec2,
    pub scale: f32,
    /// Distance from the origin, under the sensor's distance params.
    pub distance: f32,
}

/// Diagnostics of one [`NodeSensor::update`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SearchStats {
    /// Radius probes issued; zero when the whole population qualified.
    pub iterations: usize,
    pub final_radius: f32,
    /// Candidates inside the final radius before truncation.
    pub candidates_considered: usize,
    /// The population was small enough to take every node.
    pub passthrough: bool,
    /// The radius stopped growing before filling up, so every candidate at a
    /// finite distance was ranked instead.
    pub capped: bool,
}

pub struct NodeSensor {
    origin: NodeId,
    config: SensorConfig,
    search_radius: f32,
    nearby_nodes: Vec<SensorNode>,
    nodes_within_extended_radius: Vec<SensorNode>,
    farthest_node_info: Option<FarthestNodeInfo>,
    extended_search_position: Option<Vec2>,
    extended_search_radius: Option<f32>,
}

impl NodeSensor {
    pub fn new(origin: NodeId, config: SensorConfig) -> Result<Self, SensorError> {
        config.validate()?;
        Ok(Self {
            origin,
            search_radius: config.initial_radius,
            config,
            nearby_nodes: Vec::new(),
            nodes_within_extended_radius: Vec::new(),
            farthest_node_info: None,
            extended_search_position: None,
            extended_search_radius: None,
        })
    }

    pub fn origin(&self) -> NodeId {
        self.origin
    }

    /// Re-centres the sensor; results are cleared until the next update.
    pub fn set_origin(&mut self, origin: NodeId) {
        if origin == self.origin {
            return;
        }
        self.origin = origin;
        self.search_radius = self.config.initial_radius;
        self.clear_results();
    }

    pub fn set_config(&mut self, config: SensorConfig) -> Result<(), SensorError> {
        config.validate()?;
        if config.initial_radius != self.config.initial_radius
            || config.growth != self.config.growth
        {
            self.search_radius = config.initial_radius;
        }
        self.config = config;
        Ok(())
    }

    pub fn search_radius(&self) -> f32 {
        self.search_radius
    }

    /// Closest nodes found by the last update, nearest first unless the
    /// whole population qualified.
    pub fn nearby_nodes(&self) -> &[SensorNode] {
        &self.nearby_nodes
    }

    /// Nodes inside the extended radius that are not already nearby.
    pub fn nodes_within_extended_radius(&self) -> &[SensorNode] {
        &self.nodes_within_extended_radius
    }

    pub fn farthest_node_info(&self) -> Option<FarthestNodeInfo> {
        self.farthest_node_info
    }

    pub fn extended_search_position(&self) -> Option<Vec2> {
        self.extended_search_position
    }

    pub fn extended_search_radius(&self) -> Option<f32> {
        self.extended_search_radius
    }

    pub fn distance_to(&self, origin: &SensorNode, node: &SensorNode) -> f32 {
        distance_from(origin, node, &self.config.distance)
    }

    /// Runs one full search episode against `source`.
    ///
    /// When the origin is missing every result is cleared before the error
    /// is returned, so renderers never draw a stale selection.
    pub fn update<S>(&mut self, source: &mut S) -> Result<SearchStats, SensorError>
    where
        S: CandidateSource + ?Sized,
    {
        source.refresh();

        let Some(origin) = source.node(self.origin) else {
            self.clear_results();
            warn!(origin = %self.origin, "sensor origin is not part of the population");
            return Err(SensorError::OriginNotFound(self.origin));
        };

        if !self.config.persist_search_radius {
            self.search_radius = self.config.initial_radius;
        }

        let stats = self.find_nearby_nodes(&origin, source);
        self.farthest_node_info = self.find_farthest_node(&origin);

        match self.farthest_node_info {
            Some(farthest) => self.update_extended_search(&origin, farthest, source),
            None => self.clear_extended_search(),
        }

        debug!(
            origin = %self.origin,
            nearby = self.nearby_nodes.len(),
            extended = self.nodes_within_extended_radius.len(),
            iterations = stats.iterations,
            radius = stats.final_radius,
            "sensor updated"
        );

        Ok(stats)
    }

    fn find_nearby_nodes<S>(&mut self, origin: &SensorNode, source: &S) -> SearchStats
    where
        S: CandidateSource + ?Sized,
    {
        let params = self.config.distance;
        let max_node_count = self.config.max_node_count;

        if source.len() <= max_node_count {
            self.nearby_nodes = source.query(origin, f32::INFINITY, &params);
            return SearchStats {
                iterations: 0,
                final_radius: f32::INFINITY,
                candidates_considered: self.nearby_nodes.len(),
                passthrough: true,
                capped: false,
            };
        }

        let max_radius = self.config.max_search_radius;
        let mut iterations = 0;
        loop {
            iterations += 1;
            let mut candidates = source.query(origin, self.search_radius, &params);
            let filled = candidates.len() >= max_node_count;
            // The radius can stop growing at the cap or once f32 no longer
            // resolves the step.
            let next_radius = self
                .config
                .growth
                .next_radius(self.search_radius)
                .min(max_radius);
            let capped = !filled && next_radius <= self.search_radius;

            if capped {
                warn!(
                    origin = %self.origin,
                    found = candidates.len(),
                    wanted = max_node_count,
                    radius = self.search_radius,
                    "search radius stopped growing, ranking every remaining candidate"
                );
                candidates = source.query(origin, f32::INFINITY, &params);
                candidates.retain(|node| distance_from(origin, node, &params).is_finite());
            }

            if filled || capped {
                let candidates_considered = candidates.len();
                sort_by_distance(origin, &mut candidates, &self.config);
                candidates.truncate(max_node_count);
                self.nearby_nodes = candidates;

                return SearchStats {
                    iterations,
                    final_radius: self.search_radius,
                    candidates_considered,
                    passthrough: false,
                    capped,
                };
            }

            self.search_radius = next_radius;
        }
    }

    /// Strict maximum over the nearby set, starting from zero: nodes sitting
    /// exactly on the origin never count as farthest.
    fn find_farthest_node(&self, origin: &SensorNode) -> Option<FarthestNodeInfo> {
        let mut farthest = None;
        let mut max_distance = 0.0;
        for node in &self.nearby_nodes {
            let distance = self.distance_to(origin, node);
            if distance > max_distance {
                max_distance = distance;
                farthest = Some(FarthestNodeInfo {
                    id: node.id,
                    position: node.pos,
                    scale: node.scale,
                    distance,
                });
            }
        }
        farthest
    }

    fn update_extended_search<S>(
        &mut self,
        origin: &SensorNode,
        farthest: FarthestNodeInfo,
        source: &S,
    ) where
        S: CandidateSource + ?Sized,
    {
        let to_farthest = farthest.position - origin.pos;
        let length = to_farthest.length();
        let direction = if length > 0.0001 {
            to_farthest / length
        } else {
            vec2(1.0, 0.0)
        };

        let extension = direction * (self.config.extended_radius_factor * origin.scale);
        let position = farthest.position + extension;
        let probe = SensorNode {
            id: origin.id,
            pos: position,
            scale: origin.scale,
        };

        let mut radius = self.distance_to(origin, &probe);
        // A much smaller farthest node can sit further out on the scale axis
        // than the planar probe reaches.
        if radius <= farthest.distance {
            radius = farthest.distance + extension.length();
        }

        let nearby_ids = self
            .nearby_nodes
            .iter()
            .map(|node| node.id)
            .collect::<HashSet<_>>();

        self.nodes_within_extended_radius = source
            .query(origin, radius, &self.config.distance)
            .into_iter()
            .filter(|node| !nearby_ids.contains(&node.id))
            .collect();
        self.extended_search_position = Some(position);
        self.extended_search_radius = Some(radius);
    }

    fn clear_extended_search(&mut self) {
        self.nodes_within_extended_radius.clear();
        self.extended_search_position = None;
        self.extended_search_radius = None;
    }

    fn clear_results(&mut self) {
        self.nearby_nodes.clear();
        self.farthest_node_info = None;
        self.clear_extended_search();
    }
}

/// Stable: equal distances keep population order.
fn sort_by_distance(origin: &SensorNode, nodes: &mut Vec<SensorNode>, config: &SensorConfig) {
    let mut keyed = nodes
        .drain(..)
        .map(|node| (distance_from(origin, &node, &config.distance), node))
        .collect::<Vec<_>>();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    nodes.extend(keyed.into_iter().map(|(_, node)| node));
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::super::config::MAX_SEARCH_RADIUS_LIMIT;
    use super::super::{NodePopulation, RadiusGrowth};
    use super::*;

    fn sensor(origin: u64, max_node_count: usize) -> NodeSensor {
        NodeSensor::new(
            NodeId(origin),
            SensorConfig {
                max_node_count,
                ..SensorConfig::default()
            },
        )
        .expect("valid config")
    }

    fn line_population() -> Vec<SensorNode> {
        let mut nodes = vec![SensorNode::new(0, 0.0, 0.0, 1.0)];
        nodes.extend((1..=5).map(|id| SensorNode::new(id, id as f32, 0.0, 1.0)));
        nodes
    }

    fn ids(nodes: &[SensorNode]) -> Vec<u64> {
        nodes.iter().map(|node| node.id.0).collect()
    }

    fn scattered(count: u64, seed: u64) -> Vec<SensorNode> {
        (0..count)
            .map(|id| {
                let mixed = id.wrapping_mul(2_654_435_761).wrapping_add(seed);
                let x = (mixed % 97) as f32 * 0.73 - 35.0;
                let y = ((mixed / 97) % 89) as f32 * 0.81 - 36.0;
                let scale = 0.25 + (mixed % 7) as f32 * 0.4;
                SensorNode::new(id, x, y, scale)
            })
            .collect()
    }

    #[test]
    fn picks_two_closest_on_a_line() {
        let mut population = line_population();
        let mut sensor = sensor(0, 2);

        let stats = sensor.update(&mut population).expect("origin present");

        assert_eq!(ids(sensor.nearby_nodes()), vec![1, 2]);
        assert_eq!(sensor.search_radius(), 2.0);
        assert_eq!(stats.iterations, 2);
        assert_eq!(stats.final_radius, 2.0);
        assert!(!stats.passthrough);
    }

    #[test]
    fn extended_ring_follows_farthest_node() {
        let mut population = line_population();
        let mut sensor = sensor(0, 2);
        sensor.update(&mut population).expect("origin present");

        let farthest = sensor.farthest_node_info().expect("nearby set is not empty");
        assert_eq!(farthest.id, NodeId(2));
        assert_eq!(farthest.position, vec2(2.0, 0.0));

        let position = sensor.extended_search_position().expect("extended probe");
        let radius = sensor.extended_search_radius().expect("extended probe");
        assert!((position.x - 3.1).abs() < 1e-5);
        assert!(position.y.abs() < 1e-5);
        assert!((radius - 3.1).abs() < 1e-5);
        assert_eq!(ids(sensor.nodes_within_extended_radius()), vec![3]);
    }

    #[test]
    fn small_population_is_taken_whole() {
        let mut population = vec![
            SensorNode::new(0, 0.0, 0.0, 1.0),
            SensorNode::new(1, 400.0, 0.0, 1.0),
            SensorNode::new(2, -3.0, 9.0, 0.2),
        ];
        let mut sensor = sensor(0, 3);

        let stats = sensor.update(&mut population).expect("origin present");

        assert!(stats.passthrough);
        assert_eq!(stats.iterations, 0);
        assert_eq!(ids(sensor.nearby_nodes()), vec![1, 2]);
        assert!(sensor.nodes_within_extended_radius().is_empty());
    }

    #[test]
    fn lone_origin_has_no_neighbours() {
        let mut population = vec![SensorNode::new(0, 0.0, 0.0, 1.0)];
        let mut sensor = sensor(0, 4);

        sensor.update(&mut population).expect("origin present");

        assert!(sensor.nearby_nodes().is_empty());
        assert!(sensor.farthest_node_info().is_none());
        assert!(sensor.extended_search_position().is_none());
        assert!(sensor.extended_search_radius().is_none());
    }

    #[test]
    fn extended_state_is_reset_when_neighbours_vanish() {
        let mut sensor = sensor(0, 2);
        let mut crowded = line_population();
        sensor.update(&mut crowded).expect("origin present");
        assert!(sensor.extended_search_radius().is_some());

        let mut alone = vec![SensorNode::new(0, 0.0, 0.0, 1.0)];
        sensor.update(&mut alone).expect("origin present");

        assert!(sensor.extended_search_position().is_none());
        assert!(sensor.extended_search_radius().is_none());
        assert!(sensor.nodes_within_extended_radius().is_empty());
    }

    #[test]
    fn missing_origin_clears_results() {
        let mut sensor = sensor(0, 2);
        let mut population = line_population();
        sensor.update(&mut population).expect("origin present");

        population.remove(0);
        let error = sensor.update(&mut population).expect_err("origin removed");

        assert_eq!(error, SensorError::OriginNotFound(NodeId(0)));
        assert!(sensor.nearby_nodes().is_empty());
        assert!(sensor.farthest_node_info().is_none());
        assert!(sensor.extended_search_radius().is_none());
    }

    #[test]
    fn coincident_neighbours_have_no_farthest_node() {
        let mut population = vec![
            SensorNode::new(0, 1.0, 1.0, 1.0),
            SensorNode::new(1, 1.0, 1.0, 1.0),
            SensorNode::new(2, 1.0, 1.0, 1.0),
            SensorNode::new(3, 50.0, 1.0, 1.0),
        ];
        let mut sensor = sensor(0, 2);

        sensor.update(&mut population).expect("origin present");

        assert_eq!(ids(sensor.nearby_nodes()), vec![1, 2]);
        assert!(sensor.farthest_node_info().is_none());
        assert!(sensor.extended_search_radius().is_none());
    }

    #[test]
    fn ties_resolve_in_population_order() {
        let mut population = vec![
            SensorNode::new(0, 0.0, 0.0, 1.0),
            SensorNode::new(7, 0.0, 3.0, 1.0),
            SensorNode::new(3, 3.0, 0.0, 1.0),
            SensorNode::new(5, -3.0, 0.0, 1.0),
            SensorNode::new(9, 0.0, -3.0, 1.0),
        ];
        let mut sensor = sensor(0, 2);

        sensor.update(&mut population).expect("origin present");

        assert_eq!(ids(sensor.nearby_nodes()), vec![7, 3]);
    }

    #[test]
    fn unmeasurable_nodes_are_never_selected() {
        let mut population = vec![
            SensorNode::new(0, 0.0, 0.0, 1.0),
            SensorNode::new(1, 1.0, 0.0, 1.0),
            SensorNode::new(2, f32::NAN, 0.0, 1.0),
            SensorNode::new(3, f32::NAN, 2.0, 1.0),
        ];
        let mut sensor = NodeSensor::new(
            NodeId(0),
            SensorConfig {
                max_node_count: 2,
                max_search_radius: 10.0,
                ..SensorConfig::default()
            },
        )
        .expect("valid config");

        let stats = sensor.update(&mut population).expect("origin present");

        assert!(stats.capped);
        assert_eq!(stats.final_radius, 10.0);
        assert_eq!(ids(sensor.nearby_nodes()), vec![1]);
    }

    #[test]
    fn population_beyond_radius_cap_still_fills() {
        let mut population = vec![
            SensorNode::new(0, 0.0, 0.0, 1.0),
            SensorNode::new(1, 3.0e6, 0.0, 1.0),
            SensorNode::new(2, 2.0e6, 0.0, 1.0),
        ];
        let mut sensor = sensor(0, 1);

        let stats = sensor.update(&mut population).expect("origin present");

        assert!(stats.capped);
        assert_eq!(stats.final_radius, SensorConfig::default().max_search_radius);
        assert_eq!(ids(sensor.nearby_nodes()), vec![2]);
        let farthest = sensor.farthest_node_info().expect("one neighbour");
        assert_eq!(farthest.id, NodeId(2));
        assert!(sensor.extended_search_radius().expect("extended radius") > 2.0e6);
    }

    #[test]
    fn stalled_linear_growth_terminates() {
        let mut population = vec![
            SensorNode::new(0, 0.0, 0.0, 1.0),
            SensorNode::new(1, 4.0e7, 0.0, 1.0),
            SensorNode::new(2, 3.0e7, 0.0, 1.0),
        ];
        // Above 2^23 a half step no longer changes an f32.
        let mut sensor = NodeSensor::new(
            NodeId(0),
            SensorConfig {
                max_node_count: 1,
                initial_radius: 8_388_000.0,
                max_search_radius: MAX_SEARCH_RADIUS_LIMIT,
                growth: RadiusGrowth::Linear { step: 0.5 },
                ..SensorConfig::default()
            },
        )
        .expect("valid config");

        let stats = sensor.update(&mut population).expect("origin present");

        assert!(stats.capped);
        assert_eq!(stats.final_radius, 8_388_608.0);
        assert_eq!(stats.iterations, 1217);
        assert_eq!(ids(sensor.nearby_nodes()), vec![2]);
    }

    #[test]
    fn persisted_radius_skips_known_probes() {
        let mut population = line_population();
        let mut sensor = NodeSensor::new(
            NodeId(0),
            SensorConfig {
                max_node_count: 3,
                persist_search_radius: true,
                ..SensorConfig::default()
            },
        )
        .expect("valid config");

        let first = sensor.update(&mut population).expect("origin present");
        let second = sensor.update(&mut population).expect("origin present");

        assert_eq!(first.iterations, 3);
        assert_eq!(second.iterations, 1);
        assert_eq!(ids(sensor.nearby_nodes()), vec![1, 2, 3]);
    }

    #[test]
    fn origin_switch_recentres() {
        let mut population = line_population();
        let mut sensor = sensor(0, 2);
        sensor.update(&mut population).expect("origin present");

        sensor.set_origin(NodeId(5));
        assert!(sensor.nearby_nodes().is_empty());

        sensor.update(&mut population).expect("origin present");
        assert_eq!(ids(sensor.nearby_nodes()), vec![4, 3]);
    }

    #[test]
    fn larger_nodes_win_close_calls() {
        let mut population = vec![
            SensorNode::new(0, 0.0, 0.0, 1.0),
            SensorNode::new(1, 5.0, 0.0, 0.5),
            SensorNode::new(2, 0.0, 5.0, 10.0),
            SensorNode::new(3, 30.0, 0.0, 1.0),
        ];
        let mut sensor = sensor(0, 1);

        sensor.update(&mut population).expect("origin present");

        assert_eq!(ids(sensor.nearby_nodes()), vec![2]);
    }

    #[test]
    fn extended_radius_clears_tiny_farthest_node() {
        let mut population = vec![
            SensorNode::new(0, 0.0, 0.0, 6.0),
            SensorNode::new(1, 0.5, 0.0, 0.1),
            SensorNode::new(2, 40.0, 0.0, 6.0),
            SensorNode::new(3, 45.0, 0.0, 6.0),
        ];
        let mut config = SensorConfig {
            max_node_count: 1,
            ..SensorConfig::default()
        };
        config.distance.scale_influence = 4.0;
        let mut sensor = NodeSensor::new(NodeId(0), config).expect("valid config");

        sensor.update(&mut population).expect("origin present");

        let farthest = sensor.farthest_node_info().expect("one neighbour");
        let radius = sensor.extended_search_radius().expect("extended probe");
        assert_eq!(farthest.id, NodeId(1));
        assert!(farthest.distance > 11.0);
        assert!((radius - (farthest.distance + 6.6)).abs() < 1e-4);
        assert!(sensor.nodes_within_extended_radius().is_empty());
    }

    proptest! {
        #[test]
        fn growth_strategy_does_not_change_selection(
            count in 2u64..120,
            seed in 0u64..10_000,
            max_node_count in 1usize..12,
            factor in 1.1f32..4.0,
        ) {
            let nodes = scattered(count, seed);
            let origin = nodes[(seed % count) as usize].id;

            let mut linear = NodeSensor::new(origin, SensorConfig {
                max_node_count,
                ..SensorConfig::default()
            }).expect("valid config");
            let mut geometric = NodeSensor::new(origin, SensorConfig {
                max_node_count,
                growth: RadiusGrowth::Geometric { factor },
                ..SensorConfig::default()
            }).expect("valid config");

            let mut linear_population = NodePopulation::new(nodes.clone());
            let mut geometric_population = NodePopulation::new(nodes);
            let linear_stats = linear.update(&mut linear_population).expect("origin present");
            let geometric_stats = geometric.update(&mut geometric_population).expect("origin present");

            prop_assert_eq!(ids(linear.nearby_nodes()), ids(geometric.nearby_nodes()));
            prop_assert_eq!(linear_stats.passthrough, geometric_stats.passthrough);
        }

        #[test]
        fn sparse_populations_select_the_true_nearest(
            count in 2u64..60,
            seed in 0u64..10_000,
            max_node_count in 1usize..8,
            spread in 1.0f32..1.0e7,
            geometric in any::<bool>(),
        ) {
            let nodes = scattered(count, seed)
                .into_iter()
                .map(|node| SensorNode { pos: node.pos * spread, ..node })
                .collect::<Vec<_>>();
            let origin = nodes[(seed % count) as usize];
            let growth = if geometric {
                RadiusGrowth::geometric()
            } else {
                RadiusGrowth::linear()
            };
            let mut sensor = NodeSensor::new(origin.id, SensorConfig {
                max_node_count,
                max_search_radius: 64.0,
                growth,
                ..SensorConfig::default()
            }).expect("valid config");

            let mut population = NodePopulation::new(nodes.clone());
            sensor.update(&mut population).expect("origin present");

            let mut ranked = nodes
                .iter()
                .filter(|node| node.id != origin.id)
                .map(|node| (sensor.distance_to(&origin, node), node.id.0))
                .collect::<Vec<_>>();
            ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
            let mut expected = ranked.into_iter().map(|(_, id)| id).collect::<Vec<_>>();
            let mut actual = ids(sensor.nearby_nodes());

            if nodes.len() > max_node_count {
                expected.truncate(max_node_count);
            } else {
                expected.sort_unstable();
                actual.sort_unstable();
            }
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn nearby_set_invariants(
            count in 1u64..120,
            seed in 0u64..10_000,
            max_node_count in 1usize..16,
        ) {
            let mut nodes = scattered(count, seed);
            let origin = nodes[(seed % count) as usize];
            let mut sensor = NodeSensor::new(origin.id, SensorConfig {
                max_node_count,
                ..SensorConfig::default()
            }).expect("valid config");

            sensor.update(&mut nodes).expect("origin present");
            let nearby = sensor.nearby_nodes();
            let extended = sensor.nodes_within_extended_radius();

            prop_assert!(nearby.iter().all(|node| node.id != origin.id));
            prop_assert_eq!(nearby.len(), max_node_count.min(nodes.len() - 1));

            let nearby_ids = nearby.iter().map(|node| node.id).collect::<HashSet<_>>();
            prop_assert!(extended.iter().all(|node| !nearby_ids.contains(&node.id)));

            if nodes.len() > max_node_count {
                let worst_selected = nearby
                    .iter()
                    .map(|node| sensor.distance_to(&origin, node))
                    .fold(0.0_f32, f32::max);
                for node in nodes.iter().filter(|node| node.id != origin.id && !nearby_ids.contains(&node.id)) {
                    prop_assert!(sensor.distance_to(&origin, node) >= worst_selected);
                }
            } else {
                let mut expected = nodes
                    .iter()
                    .filter(|node| node.id != origin.id)
                    .map(|node| node.id)
                    .collect::<Vec<_>>();
                let mut actual = nearby_ids.into_iter().collect::<Vec<_>>();
                expected.sort();
                actual.sort();
                prop_assert_eq!(actual, expected);
            }

            if let (Some(farthest), Some(radius)) =
                (sensor.farthest_node_info(), sensor.extended_search_radius())
            {
                prop_assert!(radius > farthest.distance);
            }
        }
    }
}
