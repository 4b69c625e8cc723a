use orrery_engine::renderer::camera::CameraUniform;
use orrery_engine::{
    BodyId, EngineConfig, EngineContext, InputEvent, InputQueue, LabelElement, Simulation,
};

/// Generic simulation runner that wires up the frame loop.
///
/// Each concrete simulation creates a `thread_local!` SimRunner and exports
/// free functions via `#[wasm_bindgen]`, because wasm-bindgen cannot export
/// generic structs directly.
pub struct SimRunner<S: Simulation> {
    sim: S,
    ctx: EngineContext,
    input: InputQueue,
    config: EngineConfig,
    camera_uniform: CameraUniform,
    initialized: bool,
}

impl<S: Simulation> SimRunner<S> {
    pub fn new(sim: S) -> Self {
        let config = sim.config();
        Self {
            sim,
            ctx: EngineContext::new(&config),
            input: InputQueue::new(),
            config,
            camera_uniform: CameraUniform {
                view_projection: [[0.0; 4]; 4],
                position: [0.0; 4],
            },
            initialized: false,
        }
    }

    /// Initialize the simulation and resolve the first frame. Call once after construction.
    pub fn init(&mut self) {
        self.sim.init(&mut self.ctx);
        self.ctx.advance_orbits();
        self.sim.late_update(&mut self.ctx);
        self.ctx.end_frame();
        self.camera_uniform = self.ctx.camera.uniform();
        self.initialized = true;
        log::info!(
            "{} bodies, {} labels, {} trails, {} instances in {} groups",
            self.ctx.scene.len(),
            self.ctx.labels.len(),
            self.ctx.trails.len(),
            self.ctx.instances.instance_count(),
            self.ctx.instances.groups().len()
        );
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one frame: simulation update, orbit propagation, then trails, instances and labels.
    pub fn tick(&mut self, dt: f32) {
        if !self.initialized {
            return;
        }
        if let Some((w, h)) = self.input.last_resize() {
            self.ctx.resize(w, h);
        }
        self.ctx.dt = dt;
        self.sim.update(&mut self.ctx, &self.input);
        self.input.clear();

        self.ctx.advance_orbits();
        self.sim.late_update(&mut self.ctx);
        self.ctx.end_frame();
        self.camera_uniform = self.ctx.camera.uniform();
    }

    /// Bind a host element to a body's label.
    pub fn attach_label(&mut self, body: u32, element: Box<dyn LabelElement>) -> bool {
        self.ctx.labels.attach_element(BodyId(body), element)
    }

    pub fn ctx(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn label_body_ids(&self) -> Vec<u32> {
        self.ctx.labels.entries().iter().map(|e| e.body.0).collect()
    }

    pub fn body_name(&self, body: u32) -> Option<String> {
        self.ctx
            .scene
            .get(BodyId(body))
            .map(|n| n.name().to_string())
    }

    pub fn time_years(&self) -> f64 {
        self.ctx.time_years
    }

    pub fn selected(&self) -> u32 {
        self.ctx.selected.map_or(0, |id| id.0)
    }

    pub fn camera_distance_au(&self) -> f64 {
        self.ctx.camera_distance_au()
    }

    // ---- Pointer accessors for SharedArrayBuffer reads ----

    pub fn camera_ptr(&self) -> *const f32 {
        &self.camera_uniform as *const CameraUniform as *const f32
    }

    pub fn instance_group_count(&self) -> u32 {
        self.ctx.instances.groups().len() as u32
    }

    pub fn instance_group_ptr(&self, group: u32) -> *const f32 {
        self.ctx
            .instances
            .groups()
            .get(group as usize)
            .map_or(std::ptr::null(), |g| g.instances_ptr())
    }

    pub fn instance_group_len(&self, group: u32) -> u32 {
        self.ctx
            .instances
            .groups()
            .get(group as usize)
            .map_or(0, |g| g.instance_count())
    }

    /// (geometry, material) of a group, packed as `geometry << 16 | material`.
    pub fn instance_group_key(&self, group: u32) -> u32 {
        self.ctx
            .instances
            .groups()
            .get(group as usize)
            .map_or(0, |g| (g.geometry().0 << 16) | (g.material().0 & 0xFFFF))
    }

    /// Change counter for a group; re-upload when it differs from last frame.
    pub fn instance_group_version(&self, group: u32) -> f64 {
        self.ctx
            .instances
            .groups()
            .get(group as usize)
            .map_or(0.0, |g| g.version() as f64)
    }

    pub fn static_lines_ptr(&self) -> *const f32 {
        self.sim.static_lines().as_ptr() as *const f32
    }

    pub fn static_line_vertex_count(&self) -> u32 {
        self.sim.static_lines().len() as u32
    }

    pub fn trail_positions_ptr(&self) -> *const f32 {
        self.ctx.trails.positions_ptr()
    }

    pub fn trail_colors_ptr(&self) -> *const f32 {
        self.ctx.trails.colors_ptr()
    }

    pub fn trail_indices_ptr(&self) -> *const u32 {
        self.ctx.trails.indices_ptr()
    }

    pub fn trail_index_count(&self) -> u32 {
        self.ctx.trails.draw_index_count()
    }

    pub fn trail_vertex_capacity(&self) -> u32 {
        (self.ctx.trails.capacity() * self.ctx.trails.history_len()) as u32
    }
}
