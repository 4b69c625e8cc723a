//! Solar System: 3D orrery with Keplerian orbits, compressed distances,
//! collision-aware labels and orbit trails.
//!
//! Camera: drag to orbit, scroll to zoom, click a label to focus a body.

use glam::{Vec2, Vec3};
use orrery_engine::*;

use crate::bodies::{self, SpawnedSystem};

/// Polyline samples per orbit path.
const ORBIT_SAMPLES: usize = 256;

/// Screen-pixel drag distance before a click becomes a drag.
const DRAG_THRESHOLD: f32 = 5.0;
/// Pick radius around a projected body, in pixels.
const PICK_RADIUS: f32 = 12.0;
/// Wheel delta that counts as one zoom step.
const WHEEL_STEP: f32 = 100.0;

/// Default clock rate: simulated years per real second.
const DEFAULT_SPEED: f64 = 0.1;

// ── Key codes (DOM keyCode) ─────────────────────────────────────────

const KEY_ESCAPE: u32 = 27;
const KEY_SPACE: u32 = 32;
const KEY_L: u32 = 76;
const KEY_T: u32 = 84;

// ── Custom event kinds from the host UI ─────────────────────────────

const CUSTOM_SET_SPEED: u32 = 1;
const CUSTOM_TOGGLE_PAUSE: u32 = 2;
const CUSTOM_TOGGLE_LABELS: u32 = 3;
const CUSTOM_TOGGLE_TRAILS: u32 = 4;
const CUSTOM_FOCUS: u32 = 5;
const CUSTOM_CLEAR_TRAILS: u32 = 6;

pub struct SolarSystem {
    /// Simulated years per real second.
    speed: f64,
    paused: bool,
    spawned: SpawnedSystem,
    /// Orbit paths as a line list.
    orbit_lines: Vec<[f32; 3]>,

    // Drag state
    dragging: bool,
    drag_moved: bool,
    drag_start: Vec2,
    drag_last: Vec2,
}

impl SolarSystem {
    pub fn new() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            paused: false,
            spawned: SpawnedSystem::default(),
            orbit_lines: Vec::new(),
            dragging: false,
            drag_moved: false,
            drag_start: Vec2::ZERO,
            drag_last: Vec2::ZERO,
        }
    }

    pub fn body(&self, name: &str) -> Option<BodyId> {
        self.spawned.ids.get(name).copied()
    }

    fn build_orbit_lines(&mut self, ctx: &mut EngineContext) {
        self.orbit_lines.clear();
        let mut path = Vec::with_capacity(ORBIT_SAMPLES);
        for &id in &self.spawned.orbiting {
            path.clear();
            if !ctx
                .orbits
                .orbit_line(&ctx.scene, &ctx.scaler, id, ORBIT_SAMPLES, &mut path)
            {
                continue;
            }
            // Closed loop as segment pairs.
            for k in 0..path.len() {
                self.orbit_lines.push(path[k]);
                self.orbit_lines.push(path[(k + 1) % path.len()]);
            }
        }
    }

    fn select(&mut self, ctx: &mut EngineContext, id: Option<BodyId>) {
        ctx.selected = id;
        ctx.focus = id;
        if let Some(node) = id.and_then(|id| ctx.scene.get(id)) {
            log::info!("selected {}", node.name());
        }
    }

    fn handle_key(&mut self, ctx: &mut EngineContext, key_code: u32) {
        match key_code {
            KEY_SPACE => self.paused = !self.paused,
            KEY_L => {
                ctx.labels.toggle();
            }
            KEY_T => {
                let visible = !ctx.trails.is_visible();
                ctx.trails.set_visible(visible);
            }
            KEY_ESCAPE => self.select(ctx, None),
            _ => {}
        }
    }

    fn handle_custom(&mut self, ctx: &mut EngineContext, kind: u32, a: f32) {
        match kind {
            CUSTOM_SET_SPEED => self.speed = a as f64,
            CUSTOM_TOGGLE_PAUSE => self.paused = !self.paused,
            CUSTOM_TOGGLE_LABELS => {
                ctx.labels.toggle();
            }
            CUSTOM_TOGGLE_TRAILS => {
                let visible = !ctx.trails.is_visible();
                ctx.trails.set_visible(visible);
            }
            CUSTOM_FOCUS => {
                let id = BodyId(a as u32);
                let target = ctx.scene.get(id).map(|_| id);
                self.select(ctx, target);
            }
            CUSTOM_CLEAR_TRAILS => ctx.trails.clear_history(),
            _ => log::debug!("unknown custom event {kind}"),
        }
    }
}

impl Default for SolarSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation for SolarSystem {
    fn init(&mut self, ctx: &mut EngineContext) {
        let config = match SystemConfig::from_json(bodies::DEFAULT_SYSTEM) {
            Ok(config) => config,
            Err(e) => {
                log::error!("solar-system: {e}");
                SystemConfig::default()
            }
        };
        self.spawned = bodies::spawn_system(ctx, &config);
        self.build_orbit_lines(ctx);
    }

    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        for event in input.iter() {
            match *event {
                InputEvent::PointerDown { x, y } => {
                    self.dragging = true;
                    self.drag_moved = false;
                    self.drag_start = Vec2::new(x, y);
                    self.drag_last = self.drag_start;
                }
                InputEvent::PointerMove { x, y } => {
                    if !self.dragging {
                        continue;
                    }
                    let p = Vec2::new(x, y);
                    if p.distance(self.drag_start) > DRAG_THRESHOLD {
                        self.drag_moved = true;
                    }
                    if self.drag_moved {
                        let d = p - self.drag_last;
                        ctx.camera.orbit(d.x, d.y);
                    }
                    self.drag_last = p;
                }
                InputEvent::PointerUp { x, y } => {
                    if self.dragging && !self.drag_moved {
                        let picked = ctx.pick(Vec2::new(x, y), PICK_RADIUS);
                        self.select(ctx, picked);
                    }
                    self.dragging = false;
                    self.drag_moved = false;
                }
                InputEvent::Wheel { delta } => ctx.camera.zoom(delta / WHEEL_STEP),
                InputEvent::KeyDown { key_code } => self.handle_key(ctx, key_code),
                InputEvent::Custom { kind, a, .. } => self.handle_custom(ctx, kind, a),
                _ => {}
            }
        }

        if !self.paused {
            ctx.time_years += ctx.dt as f64 * self.speed;
        }
    }

    fn late_update(&mut self, ctx: &mut EngineContext) {
        let target = ctx
            .focus
            .and_then(|id| ctx.scene.world_position(id))
            .unwrap_or(Vec3::ZERO);
        ctx.camera.look_at(target);
    }

    fn static_lines(&self) -> &[[f32; 3]] {
        &self.orbit_lines
    }
}
