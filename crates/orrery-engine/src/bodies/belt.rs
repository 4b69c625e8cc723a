use serde::{Deserialize, Serialize};

use crate::core::orbit::OrbitalElements;
use crate::core::rng::Rng;

/// Parameter ranges for a debris belt (asteroid belt, Kuiper belt, Oort cloud).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeltDistribution {
    /// Semi-major axis range (AU).
    pub min_a: f64,
    pub max_a: f64,
    #[serde(default)]
    pub min_e: f64,
    #[serde(default)]
    pub max_e: f64,
    /// Inclination range (degrees).
    #[serde(default)]
    pub min_i: f64,
    #[serde(default)]
    pub max_i: f64,
    /// Particle count.
    pub count: usize,
    /// Whether particles are re-uploaded every frame. Static belts are placed once.
    #[serde(default = "default_dynamic")]
    pub dynamic: bool,
}

fn default_dynamic() -> bool {
    true
}

impl BeltDistribution {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.min_a > 0.0 && self.max_a >= self.min_a) {
            return Err(format!("semi-major axis range [{}, {}]", self.min_a, self.max_a));
        }
        if !(self.min_e >= 0.0 && self.max_e < 1.0 && self.max_e >= self.min_e) {
            return Err(format!("eccentricity range [{}, {}]", self.min_e, self.max_e));
        }
        if !(self.min_i.is_finite() && self.max_i.is_finite() && self.max_i >= self.min_i) {
            return Err(format!("inclination range [{}, {}]", self.min_i, self.max_i));
        }
        Ok(())
    }
}

/// Draw `count` orbits uniformly from the distribution's ranges.
///
/// Node, argument of periapsis and starting anomaly are uniform over the
/// full circle. Same seed, same belt.
pub fn sample_belt(dist: &BeltDistribution, seed: u64) -> Vec<OrbitalElements> {
    let mut rng = Rng::new(seed);
    (0..dist.count)
        .map(|_| {
            let a = rng.range(dist.min_a, dist.max_a);
            OrbitalElements::circular(a)
                .with_eccentricity(rng.range(dist.min_e, dist.max_e))
                .with_inclination(rng.range(dist.min_i, dist.max_i))
                .with_orientation(rng.range(0.0, 360.0), rng.range(0.0, 360.0))
                .with_mean_anomaly(rng.range(0.0, 360.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn main_belt() -> BeltDistribution {
        BeltDistribution {
            min_a: 2.2,
            max_a: 3.2,
            min_e: 0.0,
            max_e: 0.15,
            min_i: 0.0,
            max_i: 20.0,
            count: 500,
            dynamic: true,
        }
    }

    #[test]
    fn samples_stay_in_range() {
        let dist = main_belt();
        let orbits = sample_belt(&dist, 7);
        assert_eq!(orbits.len(), 500);
        for el in &orbits {
            assert!((2.2..3.2).contains(&el.a));
            assert!((0.0..0.15).contains(&el.e));
            assert!((0.0..20.0).contains(&el.i));
            assert!((0.0..360.0).contains(&el.m0));
        }
    }

    #[test]
    fn same_seed_same_belt() {
        let dist = main_belt();
        assert_eq!(sample_belt(&dist, 3), sample_belt(&dist, 3));
        assert_ne!(sample_belt(&dist, 3), sample_belt(&dist, 4));
    }

    #[test]
    fn parses_camel_case_block() {
        let json = r#"{"minA": 30, "maxA": 50, "maxE": 0.2, "maxI": 30, "count": 2000, "dynamic": false}"#;
        let dist: BeltDistribution = serde_json::from_str(json).unwrap();
        assert_eq!(dist.max_a, 50.0);
        assert_eq!(dist.min_e, 0.0);
        assert!(!dist.dynamic);
        assert!(dist.validate().is_ok());
    }

    #[test]
    fn rejects_bad_ranges() {
        let mut dist = main_belt();
        dist.max_e = 1.2;
        assert!(dist.validate().is_err());
        let mut dist = main_belt();
        dist.min_a = 0.0;
        assert!(dist.validate().is_err());
    }
}
