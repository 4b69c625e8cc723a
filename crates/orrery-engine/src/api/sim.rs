use glam::Vec2;

use crate::api::config::EngineConfig;
use crate::api::types::BodyId;
use crate::core::scale::DistanceScaler;
use crate::core::scene::{Scene, SceneNode, TransformSource};
use crate::input::queue::InputQueue;
use crate::renderer::camera::{project_with, Camera3D, Viewport};
use crate::renderer::instance::InstanceAggregator;
use crate::systems::labels::LabelPlacementEngine;
use crate::systems::orbits::OrbitSystem;
use crate::systems::trails::TrailAggregator;

/// The contract every simulation must fulfill.
pub trait Simulation {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> EngineConfig {
        EngineConfig::default()
    }

    /// Spawn bodies, register labels, trails and instances.
    fn init(&mut self, ctx: &mut EngineContext);

    /// Per-frame tick: handle input and advance `ctx.time_years`.
    /// The runner propagates orbits and calls [`EngineContext::end_frame`] afterwards.
    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue);

    /// Optional hook after orbits are resolved for this frame (camera follow, HUD state).
    fn late_update(&mut self, _ctx: &mut EngineContext) {}

    /// Optional static line-list geometry (orbit paths), render-space xyz triples.
    fn static_lines(&self) -> &[[f32; 3]] {
        &[]
    }
}

/// Mutable access to engine state, passed to `Simulation::init` and `Simulation::update`.
pub struct EngineContext {
    pub scene: Scene,
    pub scaler: DistanceScaler,
    pub orbits: OrbitSystem,
    pub labels: LabelPlacementEngine,
    pub trails: TrailAggregator,
    pub instances: InstanceAggregator,
    pub camera: Camera3D,
    pub viewport: Viewport,
    /// Wall-clock seconds since the previous frame.
    pub dt: f32,
    /// Simulation clock in Earth years.
    pub time_years: f64,
    /// Body the camera follows.
    pub focus: Option<BodyId>,
    /// Body the user picked.
    pub selected: Option<BodyId>,
    next_id: u32,
}

impl EngineContext {
    pub fn new(config: &EngineConfig) -> Self {
        let viewport = Viewport::new(config.viewport_width, config.viewport_height);
        Self {
            scene: Scene::new(),
            scaler: DistanceScaler::new(config.scale),
            orbits: OrbitSystem::new(),
            labels: LabelPlacementEngine::new(config.labels),
            trails: TrailAggregator::new(config.trails),
            instances: InstanceAggregator::new(),
            camera: Camera3D::new(config.camera, viewport),
            viewport,
            dt: 0.0,
            time_years: 0.0,
            focus: None,
            selected: None,
            next_id: 1,
        }
    }

    /// Generate the next unique body ID.
    pub fn next_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn spawn(&mut self, node: SceneNode) -> BodyId {
        let id = node.id;
        self.scene.spawn(node);
        id
    }

    /// Remove a body with its label and trail; its instances drop to zero scale.
    pub fn despawn(&mut self, id: BodyId) -> Option<SceneNode> {
        self.labels.remove(id);
        self.trails.unregister(id);
        self.instances.hide_source(id);
        if self.focus == Some(id) {
            self.focus = None;
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.scene.despawn(id)
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
        self.camera.resize(self.viewport);
    }

    /// Write orbital positions for `time_years` into the scene.
    pub fn advance_orbits(&mut self) {
        self.orbits
            .step(&mut self.scene, &self.scaler, self.time_years);
    }

    /// Run the per-frame consumers in order: trails, instances, labels.
    pub fn end_frame(&mut self) {
        self.trails.update(&self.scene);
        if self.instances.has_pending() {
            self.instances.build();
        }
        self.instances.update(&self.scene);
        self.labels.update(
            &self.scene,
            &self.camera,
            self.viewport,
            self.focus,
            self.selected,
        );
    }

    /// Nearest labelled body whose projection lies within `radius_px` of `screen`.
    pub fn pick(&self, screen: Vec2, radius_px: f32) -> Option<BodyId> {
        let view_proj = self.camera.view_projection();
        let mut best: Option<(BodyId, f32)> = None;
        for entry in self.labels.entries() {
            let Some(world) = self.scene.world_position(entry.body) else {
                continue;
            };
            let p = project_with(&view_proj, world, self.viewport);
            if !(0.0..=1.0).contains(&p.depth) || p.pos.distance(screen) > radius_px {
                continue;
            }
            if best.map_or(true, |(_, d)| p.depth < d) {
                best = Some((entry.body, p.depth));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Approximate heliocentric distance of a body in AU, recovered from render space.
    pub fn distance_au(&self, id: BodyId) -> Option<f64> {
        let world = self.scene.world_position(id)?;
        Some(self.scaler.render_to_physics_estimate(world.length() as f64))
    }

    /// Approximate distance of the camera from the origin in AU.
    pub fn camera_distance_au(&self) -> f64 {
        self.scaler
            .render_to_physics_estimate(self.camera.position().length() as f64)
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
