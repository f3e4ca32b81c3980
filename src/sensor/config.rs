use serde::{Deserialize, Serialize};

use super::{DistanceParams, SensorError};

/// Largest `max_search_radius` accepted; past 2^24 an f32 radius can no
/// longer take unit steps.
pub const MAX_SEARCH_RADIUS_LIMIT: f32 = 16_777_216.0;

/// How the search radius grows between probes of one search episode.
///
/// The selected neighbour set does not depend on the variant, only the number
/// of probes needed to reach it does.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RadiusGrowth {
    Linear { step: f32 },
    Geometric { factor: f32 },
}

impl RadiusGrowth {
    pub const fn linear() -> Self {
        Self::Linear { step: 1.0 }
    }

    pub const fn geometric() -> Self {
        Self::Geometric { factor: 2.0 }
    }

    pub fn next_radius(self, radius: f32) -> f32 {
        match self {
            Self::Linear { step } => radius + step,
            Self::Geometric { factor } => radius * factor,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Linear { .. } => "linear",
            Self::Geometric { .. } => "geometric",
        }
    }
}

impl Default for RadiusGrowth {
    fn default() -> Self {
        Self::linear()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Target size of the nearby set.
    pub max_node_count: usize,
    /// How far past the farthest nearby node the extended probe reaches, in
    /// multiples of the origin's scale.
    pub extended_radius_factor: f32,
    /// Radius of the first probe of every search episode.
    pub initial_radius: f32,
    /// Hard stop for the expansion loop.
    pub max_search_radius: f32,
    pub growth: RadiusGrowth,
    /// Carry the last radius over to the next update instead of restarting
    /// from `initial_radius`.
    pub persist_search_radius: bool,
    pub distance: DistanceParams,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            max_node_count: 6,
            extended_radius_factor: 1.1,
            initial_radius: 1.0,
            max_search_radius: 1.0e6,
            growth: RadiusGrowth::default(),
            persist_search_radius: false,
            distance: DistanceParams::default(),
        }
    }
}

impl SensorConfig {
    pub fn validate(&self) -> Result<(), SensorError> {
        if self.max_node_count == 0 {
            return Err(SensorError::InvalidConfig("max_node_count must be at least 1"));
        }
        if !self.extended_radius_factor.is_finite() || self.extended_radius_factor <= 0.0 {
            return Err(SensorError::InvalidConfig(
                "extended_radius_factor must be a positive finite number",
            ));
        }
        if !self.initial_radius.is_finite() || self.initial_radius <= 0.0 {
            return Err(SensorError::InvalidConfig(
                "initial_radius must be a positive finite number",
            ));
        }
        if self.max_search_radius.is_nan() || self.max_search_radius < self.initial_radius {
            return Err(SensorError::InvalidConfig(
                "max_search_radius must not be below initial_radius",
            ));
        }
        if self.max_search_radius > MAX_SEARCH_RADIUS_LIMIT {
            return Err(SensorError::InvalidConfig(
                "max_search_radius must not exceed 16777216",
            ));
        }
        match self.growth {
            RadiusGrowth::Linear { step } if !step.is_finite() || step <= 0.0 => Err(
                SensorError::InvalidConfig("linear growth step must be positive"),
            ),
            RadiusGrowth::Geometric { factor } if !factor.is_finite() || factor <= 1.0 => Err(
                SensorError::InvalidConfig("geometric growth factor must exceed 1"),
            ),
            _ => Ok(()),
        }
    }
}

/// Command-line values layered over a scene's sensor block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SensorOverrides {
    pub max_node_count: Option<usize>,
    pub extended_radius_factor: Option<f32>,
    pub growth: Option<RadiusGrowth>,
}

impl SensorOverrides {
    pub fn apply(&self, mut config: SensorConfig) -> SensorConfig {
        if let Some(max_node_count) = self.max_node_count {
            config.max_node_count = max_node_count;
        }
        if let Some(factor) = self.extended_radius_factor {
            config.extended_radius_factor = factor;
        }
        if let Some(growth) = self.growth {
            config.growth = growth;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SensorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_node_count() {
        let config = SensorConfig {
            max_node_count: 0,
            ..SensorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SensorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_non_expanding_growth() {
        let shrinking = SensorConfig {
            growth: RadiusGrowth::Geometric { factor: 1.0 },
            ..SensorConfig::default()
        };
        let stalled = SensorConfig {
            growth: RadiusGrowth::Linear { step: 0.0 },
            ..SensorConfig::default()
        };
        assert!(shrinking.validate().is_err());
        assert!(stalled.validate().is_err());
    }

    #[test]
    fn rejects_radius_cap_beyond_f32_precision() {
        for max_search_radius in [1.0e9, f32::INFINITY] {
            let config = SensorConfig {
                max_search_radius,
                ..SensorConfig::default()
            };
            assert_eq!(
                config.validate(),
                Err(SensorError::InvalidConfig(
                    "max_search_radius must not exceed 16777216"
                ))
            );
        }

        let at_limit = SensorConfig {
            max_search_radius: MAX_SEARCH_RADIUS_LIMIT,
            ..SensorConfig::default()
        };
        assert_eq!(at_limit.validate(), Ok(()));
    }

    #[test]
    fn growth_steps() {
        assert_eq!(RadiusGrowth::linear().next_radius(3.0), 4.0);
        assert_eq!(RadiusGrowth::geometric().next_radius(3.0), 6.0);
    }

    #[test]
    fn deserializes_partial_config() {
        let config: SensorConfig = serde_json::from_str(
            r#"{ "max_node_count": 3, "growth": { "kind": "geometric", "factor": 1.5 } }"#,
        )
        .expect("valid config json");

        assert_eq!(config.max_node_count, 3);
        assert_eq!(config.growth, RadiusGrowth::Geometric { factor: 1.5 });
        assert_eq!(config.extended_radius_factor, 1.1);
        assert_eq!(config.distance, DistanceParams::default());
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let base = SensorConfig {
            max_node_count: 3,
            persist_search_radius: true,
            ..SensorConfig::default()
        };
        let overrides = SensorOverrides {
            extended_radius_factor: Some(2.0),
            growth: Some(RadiusGrowth::geometric()),
            ..SensorOverrides::default()
        };

        let config = overrides.apply(base);

        assert_eq!(config.max_node_count, 3);
        assert_eq!(config.extended_radius_factor, 2.0);
        assert_eq!(config.growth, RadiusGrowth::geometric());
        assert!(config.persist_search_radius);
        assert_eq!(SensorOverrides::default().apply(base), base);
    }
}
