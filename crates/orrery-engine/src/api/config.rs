use serde::{Deserialize, Serialize};

use crate::core::scale::ScaleConfig;
use crate::renderer::camera::CameraConfig;
use crate::systems::labels::LabelConfig;
use crate::systems::trails::TrailConfig;

/// Configuration for the engine, provided by the simulation.
///
/// Every field has a default, so a JSON override only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial viewport width in CSS pixels.
    pub viewport_width: f32,
    /// Initial viewport height in CSS pixels.
    pub viewport_height: f32,
    pub scale: ScaleConfig,
    pub labels: LabelConfig,
    pub trails: TrailConfig,
    pub camera: CameraConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 720.0,
            scale: ScaleConfig::default(),
            labels: LabelConfig::default(),
            trails: TrailConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Apply a partial JSON override on top of the defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let config = EngineConfig::from_json(
            r#"{ "scale": { "au_scale": 20.0 }, "trails": { "max_trails": 8 } }"#,
        )
        .unwrap();
        assert_eq!(config.scale.au_scale, 20.0);
        assert_eq!(config.scale.linear_limit_au, 30.0);
        assert_eq!(config.trails.max_trails, 8);
        assert_eq!(config.trails.history_len, 100);
        assert_eq!(config.labels, LabelConfig::default());
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }
}
