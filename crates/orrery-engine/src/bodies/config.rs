//! Celestial-body configuration tree, loaded from JSON.
//!
//! ```json
//! { "bodies": [
//!     { "name": "Earth", "type": "planet",
//!       "physics": { "a": 1.0, "e": 0.0167, "i": 0.0, "omega": 102.9, "Omega": 0.0, "M0": 100.5 },
//!       "visual": { "size": 1.0, "color": "#3366cc" },
//!       "moons": [ ... ] },
//!     { "name": "Main Belt", "type": "asteroid",
//!       "distribution": { "minA": 2.2, "maxA": 3.2, "maxE": 0.15, "maxI": 20, "count": 2000 } }
//! ] }
//! ```

use serde::{Deserialize, Serialize};

use crate::api::types::BodyKind;
use crate::bodies::belt::BeltDistribution;
use crate::core::orbit::OrbitalElements;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed body configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("body `{body}` has invalid orbital elements: {reason}")]
    InvalidElements { body: String, reason: String },

    #[error("body `{body}` has invalid color `{value}`")]
    InvalidColor { body: String, value: String },

    #[error("body `{body}` has invalid distribution: {reason}")]
    InvalidDistribution { body: String, reason: String },
}

/// Planetary ring, radii in multiples of the body size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RingConfig {
    pub inner_radius: f32,
    pub outer_radius: f32,
    #[serde(default)]
    pub texture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    /// Render radius in scene units.
    pub size: f32,
    /// `#rrggbb` hex color.
    pub color: String,
    pub texture: Option<String>,
    pub ring: Option<RingConfig>,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            size: 1.0,
            color: "#ffffff".to_string(),
            texture: None,
            ring: None,
        }
    }
}

impl VisualConfig {
    /// Color as linear-ish RGB in [0, 1].
    pub fn rgb(&self) -> Option<[f32; 3]> {
        parse_hex_color(&self.color)
    }

    pub fn rgba(&self) -> Option<[f32; 4]> {
        self.rgb().map(|[r, g, b]| [r, g, b, 1.0])
    }
}

fn parse_hex_color(value: &str) -> Option<[f32; 3]> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| {
        u8::from_str_radix(hex.get(i..i + 2)?, 16)
            .ok()
            .map(|v| v as f32 / 255.0)
    };
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// One node of the configuration tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BodyKind,
    /// Orbital elements. Absent for the star and for belts.
    #[serde(default)]
    pub physics: Option<OrbitalElements>,
    #[serde(default)]
    pub visual: VisualConfig,
    #[serde(default)]
    pub moons: Vec<BodyConfig>,
    /// Present on debris belts, which spawn `count` particles instead of one body.
    #[serde(default)]
    pub distribution: Option<BeltDistribution>,
}

impl BodyConfig {
    pub fn is_belt(&self) -> bool {
        self.distribution.is_some()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(el) = &self.physics {
            validate_elements(el).map_err(|reason| ConfigError::InvalidElements {
                body: self.name.clone(),
                reason,
            })?;
        }
        if self.visual.rgb().is_none() {
            return Err(ConfigError::InvalidColor {
                body: self.name.clone(),
                value: self.visual.color.clone(),
            });
        }
        if let Some(dist) = &self.distribution {
            dist.validate()
                .map_err(|reason| ConfigError::InvalidDistribution {
                    body: self.name.clone(),
                    reason,
                })?;
        }
        self.moons.iter().try_for_each(BodyConfig::validate)
    }
}

fn validate_elements(el: &OrbitalElements) -> Result<(), String> {
    if !(el.a > 0.0 && el.a.is_finite()) {
        return Err(format!("semi-major axis must be positive, got {}", el.a));
    }
    if !(0.0..1.0).contains(&el.e) {
        return Err(format!("eccentricity must be in [0, 1), got {}", el.e));
    }
    let angles = [el.i, el.node, el.m0, el.arg_periapsis()];
    if angles.iter().any(|a| !a.is_finite()) {
        return Err("angles must be finite".to_string());
    }
    if let Some(p) = el.period {
        if !(p.is_finite() && p != 0.0) {
            return Err(format!("period must be finite and non-zero, got {p}"));
        }
    }
    Ok(())
}

/// Root of the configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub bodies: Vec<BodyConfig>,
}

impl SystemConfig {
    /// Parse and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SystemConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bodies.iter().try_for_each(BodyConfig::validate)
    }

    /// Every body in the tree, parents before their moons, paired with the parent.
    pub fn walk(&self) -> Vec<(&BodyConfig, Option<&BodyConfig>)> {
        let mut out = Vec::new();
        for body in &self.bodies {
            walk_into(body, None, &mut out);
        }
        out
    }

    pub fn find(&self, name: &str) -> Option<&BodyConfig> {
        self.walk().into_iter().map(|(b, _)| b).find(|b| b.name == name)
    }
}

fn walk_into<'a>(
    body: &'a BodyConfig,
    parent: Option<&'a BodyConfig>,
    out: &mut Vec<(&'a BodyConfig, Option<&'a BodyConfig>)>,
) {
    out.push((body, parent));
    for moon in &body.moons {
        walk_into(moon, Some(body), out);
    }
}
