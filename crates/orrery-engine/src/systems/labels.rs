//! Screen-space label placement.
//!
//! Every frame each label is gated by visibility rules, culled against the
//! camera frustum, projected to pixels and given an edge-fade opacity. On
//! narrow viewports the surviving non-moon labels are additionally resolved
//! against each other, nearest first, through a [`SpatialGrid`].

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::BodyId;
use crate::core::scene::TransformSource;
use crate::renderer::camera::{project_with, Camera3D, Viewport};
use crate::renderer::frustum::Frustum;
use crate::systems::spatial_grid::{ScreenRect, SpatialGrid};

/// The host-side label widget (a DOM element in the browser).
pub trait LabelElement {
    fn set_opacity(&mut self, opacity: f32);
}

/// Label placement tuning, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Viewports narrower than this run overlap suppression.
    pub mobile_breakpoint_px: f32,
    /// Labels closer than this to any viewport edge are hidden.
    pub edge_margin_px: f32,
    /// Width of the linear fade band inside the margin.
    pub fade_zone_px: f32,
    /// Approximate label box, also the spatial grid cell size.
    pub label_width_px: f32,
    pub label_height_px: f32,
    /// Minimum opacity change worth writing to the element.
    pub opacity_epsilon: f32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint_px: 768.0,
            edge_margin_px: 20.0,
            fade_zone_px: 50.0,
            label_width_px: 100.0,
            label_height_px: 20.0,
            opacity_epsilon: 0.01,
        }
    }
}

pub struct LabelEntry {
    pub body: BodyId,
    /// Planet this label's body orbits, for moon labels.
    pub moon_of: Option<BodyId>,
    element: Option<Box<dyn LabelElement>>,
    /// Last opacity written to the element (NaN before the first write).
    last_opacity: f32,
    /// Opacity computed this frame, before overlap resolution.
    pending_opacity: f32,
}

impl LabelEntry {
    fn new(body: BodyId, moon_of: Option<BodyId>) -> Self {
        Self {
            body,
            moon_of,
            element: None,
            last_opacity: f32::NAN,
            pending_opacity: 0.0,
        }
    }

    pub fn has_element(&self) -> bool {
        self.element.is_some()
    }

    pub fn pending_opacity(&self) -> f32 {
        self.pending_opacity
    }
}

/// A label waiting for overlap resolution.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    entry: usize,
    rect: ScreenRect,
    depth: f32,
    opacity: f32,
}

pub struct LabelPlacementEngine {
    config: LabelConfig,
    entries: Vec<LabelEntry>,
    index: HashMap<BodyId, usize>,
    visible: bool,
    dirty: bool,
    candidates: Vec<Candidate>,
    /// Rects placed during the current collision pass, indexed by grid id.
    placed: Vec<ScreenRect>,
    grid: SpatialGrid,
    frustum: Frustum,
}

impl LabelPlacementEngine {
    pub fn new(config: LabelConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            index: HashMap::new(),
            visible: true,
            dirty: true,
            candidates: Vec::new(),
            placed: Vec::new(),
            grid: SpatialGrid::new(config.label_width_px, config.label_height_px),
            frustum: Frustum::default(),
        }
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    /// Track a label for `body`. Re-adding updates the moon relation.
    pub fn add(&mut self, body: BodyId, moon_of: Option<BodyId>) {
        match self.index.get(&body) {
            Some(&i) => self.entries[i].moon_of = moon_of,
            None => {
                self.index.insert(body, self.entries.len());
                self.entries.push(LabelEntry::new(body, moon_of));
            }
        }
        self.dirty = true;
    }

    /// Bind the host element for `body`. Returns `false` if no label is tracked.
    pub fn attach_element(&mut self, body: BodyId, element: Box<dyn LabelElement>) -> bool {
        let Some(&i) = self.index.get(&body) else {
            return false;
        };
        let entry = &mut self.entries[i];
        entry.element = Some(element);
        entry.last_opacity = f32::NAN;
        self.dirty = true;
        true
    }

    pub fn remove(&mut self, body: BodyId) -> bool {
        let Some(i) = self.index.remove(&body) else {
            return false;
        };
        self.entries.remove(i);
        for (k, entry) in self.entries.iter().enumerate().skip(i) {
            self.index.insert(entry.body, k);
        }
        self.dirty = true;
        true
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.dirty = true;
        }
    }

    pub fn toggle(&mut self) -> bool {
        self.set_visible(!self.visible);
        self.visible
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Opacity last written for `body`'s label, if it has been written at all.
    pub fn opacity_of(&self, body: BodyId) -> Option<f32> {
        let entry = &self.entries[*self.index.get(&body)?];
        Some(entry.last_opacity).filter(|o| !o.is_nan())
    }

    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-frame placement pass.
    ///
    /// A no-op while labels are hidden, except for the one pass right after a
    /// change that fades everything out.
    pub fn update<S: TransformSource + ?Sized>(
        &mut self,
        source: &S,
        camera: &Camera3D,
        viewport: Viewport,
        focus: Option<BodyId>,
        selected: Option<BodyId>,
    ) {
        if !self.visible && !self.dirty {
            return;
        }
        self.dirty = false;

        let view_proj = camera.view_projection();
        self.frustum.set_from(&view_proj);
        let mobile = viewport.width < self.config.mobile_breakpoint_px;
        let config = self.config;
        let visible = self.visible;
        let frustum = self.frustum;
        self.candidates.clear();

        for (i, entry) in self.entries.iter_mut().enumerate() {
            if entry.element.is_none() {
                continue;
            }
            let shown = match entry.moon_of {
                Some(parent) => visible && (focus == Some(parent) || selected == Some(parent)),
                None => visible,
            };
            let world = if shown { source.world_position(entry.body) } else { None };
            let Some(world) = world.filter(|w| frustum.contains_point(*w)) else {
                entry.pending_opacity = 0.0;
                apply_opacity(entry, 0.0, config.opacity_epsilon);
                continue;
            };

            let screen = project_with(&view_proj, world, viewport);
            let opacity = edge_opacity(screen.pos, screen.depth, viewport, &config);
            entry.pending_opacity = opacity;

            if mobile && entry.moon_of.is_none() && opacity > 0.0 {
                self.candidates.push(Candidate {
                    entry: i,
                    rect: ScreenRect::centered(
                        screen.pos.x,
                        screen.pos.y,
                        config.label_width_px,
                        config.label_height_px,
                    ),
                    depth: screen.depth,
                    opacity,
                });
            } else {
                apply_opacity(entry, opacity, config.opacity_epsilon);
            }
        }

        if !self.candidates.is_empty() {
            self.run_collision_detection(viewport);
        }
    }

    /// Resolve queued candidates nearest first; a label overlapping an
    /// already placed one is hidden.
    pub fn run_collision_detection(&mut self, viewport: Viewport) {
        self.candidates.sort_by(|a, b| a.depth.total_cmp(&b.depth));
        self.grid.prepare(viewport.width, viewport.height);
        self.placed.clear();
        let eps = self.config.opacity_epsilon;

        for c in &self.candidates {
            let placed = &self.placed;
            let blocked = self
                .grid
                .query(&c.rect, |id| placed[id as usize].overlaps(&c.rect));
            let entry = &mut self.entries[c.entry];
            if blocked {
                apply_opacity(entry, 0.0, eps);
            } else {
                apply_opacity(entry, c.opacity, eps);
                self.grid.insert(self.placed.len() as u32, &c.rect);
                self.placed.push(c.rect);
            }
        }
        self.candidates.clear();
    }
}

impl Default for LabelPlacementEngine {
    fn default() -> Self {
        Self::new(LabelConfig::default())
    }
}

/// Opacity from distance to the nearest viewport edge: 0 inside the margin,
/// linear across the fade band, 1 beyond it. Points behind the camera get 0.
fn edge_opacity(pos: Vec2, depth: f32, viewport: Viewport, config: &LabelConfig) -> f32 {
    if !(depth <= 1.0) {
        return 0.0;
    }
    let edge = pos
        .x
        .min(pos.y)
        .min(viewport.width - pos.x)
        .min(viewport.height - pos.y);
    if edge < config.edge_margin_px {
        0.0
    } else if edge < config.edge_margin_px + config.fade_zone_px {
        (edge - config.edge_margin_px) / config.fade_zone_px
    } else {
        1.0
    }
}

/// Write only when the change is worth a style update. Exact 0 and 1 always land.
fn apply_opacity(entry: &mut LabelEntry, opacity: f32, eps: f32) {
    let Some(element) = entry.element.as_mut() else {
        return;
    };
    let last = entry.last_opacity;
    let snap = (opacity == 0.0 || opacity == 1.0) && last != opacity;
    if last.is_nan() || snap || (opacity - last).abs() > eps {
        element.set_opacity(opacity);
        entry.last_opacity = opacity;
    }
}
