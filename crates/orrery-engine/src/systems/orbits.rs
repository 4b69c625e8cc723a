use glam::{DVec3, Vec3};

use crate::api::types::BodyId;
use crate::core::orbit::{orbit_path_points, orbital_position_into};
use crate::core::scale::DistanceScaler;
use crate::core::scene::Scene;

/// Writes Keplerian positions into the scene each frame.
///
/// Heliocentric bodies go through the distance scaler; moons are offset
/// linearly from their parent. Scratch vectors live here so the per-body
/// loop does not allocate.
#[derive(Debug, Default)]
pub struct OrbitSystem {
    physics: DVec3,
    render: DVec3,
    path: Vec<DVec3>,
}

impl OrbitSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute every orbiting node at `t_years`, then resolve world positions.
    pub fn step(&mut self, scene: &mut Scene, scaler: &DistanceScaler, t_years: f64) {
        for node in scene.iter_mut() {
            let Some(elements) = node.meta.elements.as_ref() else {
                continue;
            };
            orbital_position_into(elements, t_years, &mut self.physics);
            if node.meta.moon_of.is_some() {
                self.render = scaler.moon_offset(self.physics);
            } else {
                scaler.physics_to_render_into(self.physics, &mut self.render);
            }
            node.local = self.render.as_vec3();
        }
        scene.propagate();
    }

    /// Physics-space position of one body at `t_years`, relative to what it orbits.
    pub fn physics_position(&self, scene: &Scene, id: BodyId, t_years: f64) -> Option<DVec3> {
        let elements = scene.get(id)?.meta.elements.as_ref()?;
        let mut out = DVec3::ZERO;
        orbital_position_into(elements, t_years, &mut out);
        Some(out)
    }

    /// Render-space polyline of a heliocentric orbit, appended to `out`.
    pub fn orbit_line(
        &mut self,
        scene: &Scene,
        scaler: &DistanceScaler,
        id: BodyId,
        samples: usize,
        out: &mut Vec<[f32; 3]>,
    ) -> bool {
        let Some(elements) = scene.get(id).and_then(|n| n.meta.elements) else {
            return false;
        };
        orbit_path_points(&elements, samples, &mut self.path);
        out.extend(self.path.iter().map(|&p| {
            let v: Vec3 = scaler.physics_to_render(p).as_vec3();
            v.to_array()
        }));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{BodyKind, BodyMeta};
    use crate::core::orbit::OrbitalElements;
    use crate::core::scene::{SceneNode, TransformSource};

    fn system() -> Scene {
        let mut scene = Scene::new();
        scene.spawn(SceneNode::new(BodyId(0), BodyMeta::new("Sun", BodyKind::Star)));
        scene.spawn(SceneNode::new(
            BodyId(1),
            BodyMeta::new("Earth", BodyKind::Planet).with_elements(OrbitalElements::circular(1.0)),
        ));
        scene.spawn(
            SceneNode::new(
                BodyId(2),
                BodyMeta::new("Moon", BodyKind::Moon)
                    .with_elements(OrbitalElements::circular(0.00257).with_period(0.0748))
                    .with_moon_of(BodyId(1)),
            )
            .with_parent(BodyId(1)),
        );
        scene
    }

    #[test]
    fn planets_are_scaled_into_render_space() {
        let mut scene = system();
        let mut orbits = OrbitSystem::new();
        orbits.step(&mut scene, &DistanceScaler::default(), 0.0);
        let earth = scene.world_position(BodyId(1)).unwrap();
        assert!(earth.abs_diff_eq(Vec3::new(40.0, 0.0, 0.0), 1e-4), "{earth:?}");
        assert_eq!(scene.world_position(BodyId(0)), Some(Vec3::ZERO));
    }

    #[test]
    fn moons_ride_on_their_parent() {
        let mut scene = system();
        let mut orbits = OrbitSystem::new();
        let scaler = DistanceScaler::default();
        orbits.step(&mut scene, &scaler, 0.25);
        let earth = scene.world_position(BodyId(1)).unwrap();
        let moon = scene.world_position(BodyId(2)).unwrap();
        let expected = (0.00257 * 40.0 * 50.0) as f32;
        assert!(((moon - earth).length() - expected).abs() < 1e-3);
    }

    #[test]
    fn orbit_line_follows_scaled_radius() {
        let scene = system();
        let mut orbits = OrbitSystem::new();
        let mut line = Vec::new();
        assert!(orbits.orbit_line(&scene, &DistanceScaler::default(), BodyId(1), 32, &mut line));
        assert!(!line.is_empty());
        for p in &line {
            assert!((Vec3::from_array(*p).length() - 40.0).abs() < 1e-3);
        }
        assert!(!orbits.orbit_line(&scene, &DistanceScaler::default(), BodyId(0), 32, &mut line));
    }

    #[test]
    fn physics_position_is_unscaled() {
        let scene = system();
        let orbits = OrbitSystem::new();
        let p = orbits.physics_position(&scene, BodyId(1), 0.0).unwrap();
        assert!(p.abs_diff_eq(DVec3::new(1.0, 0.0, 0.0), 1e-9));
        assert!(orbits.physics_position(&scene, BodyId(0), 0.0).is_none());
    }
}
