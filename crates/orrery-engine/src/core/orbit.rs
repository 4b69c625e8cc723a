//! Keplerian orbital mechanics: pure math, no scene dependencies.
//!
//! Uses f64 throughout (physics space is AU, time is Earth years).
//! Conversion to f32 render space happens in the distance scaler.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Maximum Newton-Raphson steps per Kepler solve.
pub const KEPLER_MAX_ITERATIONS: usize = 10;
/// Early-exit threshold on the eccentric anomaly correction (radians).
pub const KEPLER_TOLERANCE: f64 = 1e-6;
/// Eccentricity above which the solver seeds at π instead of M.
pub const HIGH_ECCENTRICITY: f64 = 0.8;

/// Keplerian elements of one body. Angles in degrees, `a` in AU, `period` in Earth years.
///
/// JSON field names follow the body configuration files (`Omega`, `M0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    /// Semi-major axis (AU), > 0.
    pub a: f64,
    /// Eccentricity, 0 ≤ e < 1.
    #[serde(default)]
    pub e: f64,
    /// Inclination (degrees).
    #[serde(default)]
    pub i: f64,
    /// Argument of periapsis (degrees).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omega: Option<f64>,
    /// Legacy alias of `omega`, used only when `omega` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    /// Longitude of the ascending node (degrees).
    #[serde(rename = "Omega", default)]
    pub node: f64,
    /// Mean anomaly at epoch (degrees).
    #[serde(rename = "M0", default)]
    pub m0: f64,
    /// Orbital period (Earth years). Derived from `a` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
}

impl OrbitalElements {
    /// Circular, uninclined orbit of radius `a` starting at periapsis.
    pub fn circular(a: f64) -> Self {
        Self {
            a,
            e: 0.0,
            i: 0.0,
            omega: None,
            w: None,
            node: 0.0,
            m0: 0.0,
            period: None,
        }
    }

    pub fn with_eccentricity(mut self, e: f64) -> Self {
        self.e = e;
        self
    }

    pub fn with_inclination(mut self, i: f64) -> Self {
        self.i = i;
        self
    }

    pub fn with_orientation(mut self, omega: f64, node: f64) -> Self {
        self.omega = Some(omega);
        self.node = node;
        self
    }

    pub fn with_mean_anomaly(mut self, m0: f64) -> Self {
        self.m0 = m0;
        self
    }

    pub fn with_period(mut self, period: f64) -> Self {
        self.period = Some(period);
        self
    }

    /// Argument of periapsis in degrees: `omega`, else `w`, else 0.
    pub fn arg_periapsis(&self) -> f64 {
        self.omega.or(self.w).unwrap_or(0.0)
    }

    /// Orbital period in Earth years (Kepler's third law with GM_sun = 1 when absent).
    pub fn period_years(&self) -> f64 {
        self.period.unwrap_or_else(|| self.a.powf(1.5))
    }

    /// Mean motion in degrees per year.
    pub fn mean_motion(&self) -> f64 {
        360.0 / self.period_years()
    }
}

/// Mean anomaly at `t_years`, normalized into [0, 360).
pub fn mean_anomaly_deg(elements: &OrbitalElements, t_years: f64) -> f64 {
    (elements.m0 + elements.mean_motion() * t_years).rem_euclid(360.0)
}

/// Solve Kepler's equation `M = E - e·sin(E)` for the eccentric anomaly.
///
/// Newton-Raphson with a fixed iteration cap. `mean_anomaly` in radians.
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let mut ea = if eccentricity > HIGH_ECCENTRICITY {
        PI
    } else {
        mean_anomaly
    };
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let delta = (ea - eccentricity * ea.sin() - mean_anomaly)
            / (1.0 - eccentricity * ea.cos());
        ea -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            break;
        }
    }
    ea
}

/// Heliocentric physics-space position (AU, Y-up) at `t_years`.
pub fn orbital_position(elements: &OrbitalElements, t_years: f64) -> DVec3 {
    let mut out = DVec3::ZERO;
    orbital_position_into(elements, t_years, &mut out);
    out
}

/// Same as [`orbital_position`], writing into a caller-owned vector.
/// Returns the reference it was given so calls can be chained in hot loops.
pub fn orbital_position_into<'a>(
    elements: &OrbitalElements,
    t_years: f64,
    out: &'a mut DVec3,
) -> &'a mut DVec3 {
    let e = elements.e;
    let m = mean_anomaly_deg(elements, t_years).to_radians();
    let ea = solve_kepler(m, e);

    let x_orb = elements.a * (ea.cos() - e);
    let y_orb = elements.a * (1.0 - e * e).sqrt() * ea.sin();

    *out = orbital_plane_to_render(elements, x_orb, y_orb);
    out
}

/// Rotate orbital-plane coordinates by ω, i, Ω into the ecliptic frame,
/// then swap to Y-up: ecliptic (x, y, z) → (x, z, y).
fn orbital_plane_to_render(elements: &OrbitalElements, x_orb: f64, y_orb: f64) -> DVec3 {
    let (sin_w, cos_w) = elements.arg_periapsis().to_radians().sin_cos();
    let (sin_i, cos_i) = elements.i.to_radians().sin_cos();
    let (sin_n, cos_n) = elements.node.to_radians().sin_cos();

    let x = (cos_w * cos_n - sin_w * sin_n * cos_i) * x_orb
        + (-sin_w * cos_n - cos_w * sin_n * cos_i) * y_orb;
    let y = (cos_w * sin_n + sin_w * cos_n * cos_i) * x_orb
        + (-sin_w * sin_n + cos_w * cos_n * cos_i) * y_orb;
    let z = (sin_w * sin_i) * x_orb + (cos_w * sin_i) * y_orb;

    DVec3::new(x, z, y)
}

/// Sample a full orbit ellipse by eccentric anomaly into `out` (cleared first).
/// Used for static orbit lines; evenly spaced in E gives denser points near periapsis.
pub fn orbit_path_points(elements: &OrbitalElements, samples: usize, out: &mut Vec<DVec3>) {
    out.clear();
    let a = elements.a;
    let e = elements.e;
    let b = a * (1.0 - e * e).sqrt();
    for k in 0..samples {
        let ea = (k as f64 / samples as f64) * TAU;
        out.push(orbital_plane_to_render(elements, a * (ea.cos() - e), b * ea.sin()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn kepler_circular_orbit() {
        // For e=0, eccentric anomaly = mean anomaly
        let ea = solve_kepler(1.0, 0.0);
        assert!((ea - 1.0).abs() < 1e-10);
    }

    #[test]
    fn kepler_mercury_eccentricity() {
        let m = 1.5;
        let ea = solve_kepler(m, 0.2056);
        let residual = ea - 0.2056 * ea.sin() - m;
        assert!(residual.abs() < 1e-9, "residual = {residual}");
    }

    #[test]
    fn kepler_high_eccentricity_converges() {
        for k in 0..36 {
            let m = k as f64 * 10.0_f64.to_radians();
            let ea = solve_kepler(m, 0.95);
            assert!(ea.is_finite());
            let residual = ea - 0.95 * ea.sin() - m;
            assert!(residual.abs() < 1e-6, "M = {m}: residual = {residual}");
        }
    }

    #[test]
    fn circular_orbit_keeps_radius() {
        let orbit = OrbitalElements::circular(5.2);
        for step in 0..50 {
            let t = step as f64 * 0.37;
            let r = orbital_position(&orbit, t).length();
            assert!(close(r, 5.2, 1e-2), "t = {t}: r = {r}");
        }
    }

    #[test]
    fn circular_inclined_orbit_keeps_radius() {
        let orbit = OrbitalElements::circular(2.0)
            .with_inclination(33.0)
            .with_orientation(40.0, 110.0);
        for step in 0..20 {
            let r = orbital_position(&orbit, step as f64 * 0.11).length();
            assert!(close(r, 2.0, 1e-2), "r = {r}");
        }
    }

    #[test]
    fn perihelion_and_aphelion_distances() {
        for &e in &[0.0, 0.2, 0.5, 0.8, 0.9, 0.95] {
            let orbit = OrbitalElements::circular(3.0).with_eccentricity(e);
            let period = orbit.period_years();

            let peri = orbital_position(&orbit, 0.0).length();
            assert!(close(peri, 3.0 * (1.0 - e), 1e-4), "e = {e}: peri = {peri}");

            let aphe = orbital_position(&orbit, period / 2.0).length();
            assert!(close(aphe, 3.0 * (1.0 + e), 1e-4), "e = {e}: aphe = {aphe}");
        }
    }

    #[test]
    fn eccentric_orbit_stays_finite() {
        let orbit = OrbitalElements::circular(40.0)
            .with_eccentricity(0.95)
            .with_inclination(17.0)
            .with_orientation(113.0, 110.0);
        for step in 0..200 {
            let p = orbital_position(&orbit, step as f64 * 1.3);
            assert!(p.is_finite(), "non-finite position at step {step}: {p:?}");
        }
    }

    #[test]
    fn quarter_orbit_axis_convention() {
        let orbit = OrbitalElements::circular(1.0);
        let p0 = orbital_position(&orbit, 0.0);
        assert!(p0.abs_diff_eq(DVec3::new(1.0, 0.0, 0.0), 1e-6), "{p0:?}");

        let p1 = orbital_position(&orbit, orbit.period_years() / 4.0);
        assert!(p1.abs_diff_eq(DVec3::new(0.0, 0.0, 1.0), 1e-6), "{p1:?}");
    }

    #[test]
    fn inclination_lifts_out_of_plane() {
        let orbit = OrbitalElements::circular(1.0).with_inclination(90.0);
        let p = orbital_position(&orbit, orbit.period_years() / 4.0);
        // Quarter orbit past the node on a polar orbit is straight up.
        assert!(p.abs_diff_eq(DVec3::new(0.0, 1.0, 0.0), 1e-6), "{p:?}");
    }

    #[test]
    fn into_variant_returns_same_reference() {
        let orbit = OrbitalElements::circular(1.0);
        let mut out = DVec3::splat(99.0);
        let ptr: *const DVec3 = &out;
        let returned = orbital_position_into(&orbit, 0.0, &mut out);
        assert!(std::ptr::eq(returned as *const DVec3, ptr));
        assert!(close(out.x, 1.0, 1e-9));
    }

    #[test]
    fn omega_takes_precedence_over_w() {
        let mut orbit = OrbitalElements::circular(1.0);
        orbit.w = Some(90.0);
        assert_eq!(orbit.arg_periapsis(), 90.0);
        orbit.omega = Some(45.0);
        assert_eq!(orbit.arg_periapsis(), 45.0);
    }

    #[test]
    fn period_defaults_to_keplers_third_law() {
        let orbit = OrbitalElements::circular(4.0);
        assert!(close(orbit.period_years(), 8.0, 1e-12));
        assert!(close(orbit.with_period(2.5).period_years(), 2.5, 1e-12));
    }

    #[test]
    fn mean_anomaly_wraps() {
        let orbit = OrbitalElements::circular(1.0).with_mean_anomaly(350.0);
        let m = mean_anomaly_deg(&orbit, 0.1);
        assert!(close(m, 26.0, 1e-9), "m = {m}");
        let back = mean_anomaly_deg(&orbit, -1.5);
        assert!((0.0..360.0).contains(&back));
    }

    #[test]
    fn parse_elements_from_json() {
        let json = r#"{ "a": 1.524, "e": 0.0934, "i": 1.85, "w": 286.5, "Omega": 49.56, "M0": 19.41 }"#;
        let el: OrbitalElements = serde_json::from_str(json).unwrap();
        assert_eq!(el.node, 49.56);
        assert_eq!(el.m0, 19.41);
        assert_eq!(el.arg_periapsis(), 286.5);
        assert!(el.period.is_none());
    }

    #[test]
    fn orbit_path_samples_ellipse() {
        let orbit = OrbitalElements::circular(2.0).with_eccentricity(0.5);
        let mut points = Vec::new();
        orbit_path_points(&orbit, 64, &mut points);
        assert_eq!(points.len(), 64);
        assert!(close(points[0].length(), 1.0, 1e-9));
        assert!(close(points[32].length(), 3.0, 1e-9));
    }
}
