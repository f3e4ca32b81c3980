use eframe::egui::{Rect, Vec2};
use tracing::{debug, warn};

use crate::sensor::geometry::Projection;
use crate::sensor::{NodeId, NodeSensor, SensorConfig};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn origin(&self) -> Option<NodeId> {
        self.sensor.as_ref().map(NodeSensor::origin)
    }

    /// Runs one sensor update against the current node positions.
    pub(in crate::app) fn run_sensor(&mut self) {
        let Some(sensor) = self.sensor.as_mut() else {
            return;
        };

        match sensor.update(&mut self.population) {
            Ok(stats) => {
                if self.last_stats != Some(stats) {
                    debug!(
                        origin = %sensor.origin(),
                        iterations = stats.iterations,
                        radius = stats.final_radius,
                        nearby = sensor.nearby_nodes().len(),
                        extended = sensor.nodes_within_extended_radius().len(),
                        "sensor results changed"
                    );
                }
                self.last_stats = Some(stats);
                self.sensor_error = None;
            }
            Err(error) => {
                let message = error.to_string();
                if self.sensor_error.as_deref() != Some(message.as_str()) {
                    warn!(%error, "sensor update failed");
                }
                self.last_stats = None;
                self.sensor_error = Some(message);
            }
        }

        let scratch = &mut self.view_scratch;
        scratch.nearby.clear();
        scratch.extended.clear();
        scratch
            .nearby
            .extend(sensor.nearby_nodes().iter().map(|node| node.id));
        scratch.extended.extend(
            sensor
                .nodes_within_extended_radius()
                .iter()
                .map(|node| node.id),
        );
    }

    pub(in crate::app) fn set_origin(&mut self, origin: NodeId) {
        if self.scene.node(origin).is_none() {
            return;
        }

        match self.sensor.as_mut() {
            Some(sensor) => sensor.set_origin(origin),
            None => match NodeSensor::new(origin, self.sensor_config) {
                Ok(sensor) => self.sensor = Some(sensor),
                Err(error) => {
                    self.config_error = Some(error.to_string());
                    return;
                }
            },
        }
        debug!(%origin, "sensor origin changed");
    }

    /// Pushes edited settings to the live sensor. Invalid settings are kept
    /// in the controls but not applied.
    pub(in crate::app) fn apply_sensor_config(&mut self) {
        let config: SensorConfig = self.sensor_config;
        let result = match self.sensor.as_mut() {
            Some(sensor) => sensor.set_config(config),
            None => config.validate(),
        };

        match result {
            Ok(()) => self.config_error = None,
            Err(error) => {
                warn!(%error, "rejected sensor settings");
                self.config_error = Some(error.to_string());
            }
        }
    }

    pub(in crate::app) fn move_node(&mut self, id: NodeId, pos: Vec2) {
        if self.scene.set_position(id, pos) {
            self.population.set_position(id, pos);
        }
    }

    pub(in crate::app) fn projection(&self, rect: Rect) -> Projection {
        Projection {
            rect,
            pan: self.pan,
            zoom: self.zoom,
        }
    }

    pub(in crate::app) fn fit_view(&mut self, rect: Rect) {
        let fitted = Projection::fit(rect, self.scene.nodes.iter().map(|node| node.pos), 40.0);
        self.pan = fitted.pan;
        self.zoom = fitted.zoom;
        self.fit_pending = false;
    }

    pub(in crate::app) fn focus_node(&mut self, id: NodeId) {
        if let Some(node) = self.scene.node(id) {
            self.pan = -node.pos * self.zoom;
        }
    }
}
