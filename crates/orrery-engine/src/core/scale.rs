//! Physics space (AU) ↔ render space (scene units) distance compression.
//!
//! Three zones by heliocentric distance `r`:
//! ```text
//! [0, L1]     linear          r_vis = r · AU_SCALE
//! (L1, L2]    mild log        r_vis = V1 + ln(1 + (r − L1)) · AU_SCALE · K_mild
//! (L2, ∞)     aggressive log  r_vis = V2 + ln(1 + (r − L2)) · AU_SCALE · K_aggr
//! ```
//! `V1`/`V2` are the visual distances at the zone boundaries, so the mapping is
//! continuous and strictly increasing. Direction is always preserved.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Distance compression constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Scene units per AU inside the linear zone.
    pub au_scale: f64,
    /// End of the linear zone (AU).
    pub linear_limit_au: f64,
    /// End of the mild logarithmic zone (AU).
    pub mild_limit_au: f64,
    /// Log multiplier for the mild zone.
    pub mild_factor: f64,
    /// Log multiplier for the aggressive zone.
    pub aggressive_factor: f64,
    /// Extra multiplier for moon offsets around their parent (moons are scaled linearly).
    pub moon_distance_scale: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            au_scale: 40.0,
            linear_limit_au: 30.0,
            mild_limit_au: 50.0,
            mild_factor: 1.5,
            aggressive_factor: 4.0,
            moon_distance_scale: 50.0,
        }
    }
}

/// Bidirectional distance mapping with precomputed zone boundaries.
#[derive(Debug, Clone)]
pub struct DistanceScaler {
    config: ScaleConfig,
    /// Visual distance at `linear_limit_au`.
    v1: f64,
    /// Visual distance at `mild_limit_au`.
    v2: f64,
}

impl DistanceScaler {
    pub fn new(config: ScaleConfig) -> Self {
        let v1 = config.linear_limit_au * config.au_scale;
        let v2 = v1
            + (1.0 + (config.mild_limit_au - config.linear_limit_au)).ln()
                * config.au_scale
                * config.mild_factor;
        Self { config, v1, v2 }
    }

    pub fn config(&self) -> &ScaleConfig {
        &self.config
    }

    /// Visual distances at the two zone boundaries.
    pub fn zone_boundaries(&self) -> (f64, f64) {
        (self.v1, self.v2)
    }

    /// Forward scalar mapping of a non-negative physics distance.
    pub fn visual_distance(&self, r: f64) -> f64 {
        let c = &self.config;
        if r <= c.linear_limit_au {
            r * c.au_scale
        } else if r <= c.mild_limit_au {
            self.v1 + (1.0 + (r - c.linear_limit_au)).ln() * c.au_scale * c.mild_factor
        } else {
            self.v2 + (1.0 + (r - c.mild_limit_au)).ln() * c.au_scale * c.aggressive_factor
        }
    }

    /// Map a physics-space position to render space, preserving direction.
    pub fn physics_to_render(&self, v: DVec3) -> DVec3 {
        let mut out = DVec3::ZERO;
        self.physics_to_render_into(v, &mut out);
        out
    }

    /// Same as [`physics_to_render`](Self::physics_to_render), writing into `out`.
    /// Returns the reference it was given.
    pub fn physics_to_render_into<'a>(&self, v: DVec3, out: &'a mut DVec3) -> &'a mut DVec3 {
        let r = v.length();
        if r == 0.0 {
            *out = DVec3::ZERO;
            return out;
        }
        *out = v * (self.visual_distance(r) / r);
        out
    }

    /// Invert a render-space distance back to AU.
    ///
    /// `0 → 0`, `∞ → ∞`, `NaN → NaN`. Negative input is extrapolated with the
    /// linear branch (`d / AU_SCALE`), so it stays negative.
    pub fn render_to_physics_estimate(&self, d: f64) -> f64 {
        let c = &self.config;
        if d.is_nan() {
            return f64::NAN;
        }
        if d <= self.v1 {
            d / c.au_scale
        } else if d <= self.v2 {
            c.linear_limit_au + ((d - self.v1) / (c.au_scale * c.mild_factor)).exp() - 1.0
        } else {
            c.mild_limit_au + ((d - self.v2) / (c.au_scale * c.aggressive_factor)).exp() - 1.0
        }
    }

    /// Render-space offset of a moon relative to its parent.
    /// Moon orbits are far inside the linear zone, so they get a plain linear scale.
    pub fn moon_offset(&self, offset_au: DVec3) -> DVec3 {
        offset_au * (self.config.au_scale * self.config.moon_distance_scale)
    }
}

impl Default for DistanceScaler {
    fn default() -> Self {
        Self::new(ScaleConfig::default())
    }
}
