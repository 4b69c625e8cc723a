//! Orbit trails for every registered body, packed into one line-list draw.
//!
//! Each trail owns a fixed slot of `history_len` vertices in the shared
//! buffers. History is a ring inside one arena; `update` rewrites the slot's
//! vertices newest-first so per-vertex colors never change after registration.

use std::ops::Range;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::api::types::BodyId;
use crate::core::scene::TransformSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// Trail slots allocated up front.
    pub max_trails: usize,
    /// Positions kept per trail (at least 2).
    pub history_len: usize,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            max_trails: 256,
            history_len: 100,
        }
    }
}

/// Stable slot index of a registered trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrailHandle(pub u32);

#[derive(Debug, Clone)]
struct TrailSlot {
    target: BodyId,
    /// Ring index of the newest sample.
    head: usize,
    /// False until the target reported a position.
    seeded: bool,
    /// False once unregistered; the slot is free for reuse.
    live: bool,
}

pub struct TrailAggregator {
    max_trails: usize,
    history_len: usize,
    slots: Vec<TrailSlot>,
    /// Ring buffers, `history_len` samples per slot.
    history: Vec<Vec3>,
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
    /// Line-list indices for every slot, built once.
    indices: Vec<u32>,
    visible: bool,
}

impl TrailAggregator {
    pub fn new(config: TrailConfig) -> Self {
        let history_len = config.history_len.max(2);
        let max_trails = config.max_trails;
        let vertices = max_trails * history_len;

        let mut indices = Vec::with_capacity(max_trails * (history_len - 1) * 2);
        for slot in 0..max_trails {
            let base = (slot * history_len) as u32;
            for k in 0..(history_len as u32 - 1) {
                indices.push(base + k);
                indices.push(base + k + 1);
            }
        }

        Self {
            max_trails,
            history_len,
            slots: Vec::with_capacity(max_trails),
            history: vec![Vec3::ZERO; vertices],
            positions: vec![[0.0; 3]; vertices],
            colors: vec![[0.0; 3]; vertices],
            indices,
            visible: true,
        }
    }

    /// Start tracking `target`, seeding its whole history with its current position.
    /// Freed slots are reused lowest first.
    ///
    /// Returns `None` (with a warning) once every slot is taken.
    pub fn register<S: TransformSource + ?Sized>(
        &mut self,
        source: &S,
        target: BodyId,
        color: [f32; 3],
    ) -> Option<TrailHandle> {
        let index = self.next_trail_index();
        if index >= self.max_trails {
            log::warn!(
                "trail capacity reached ({}), dropping trail for body {:?}",
                self.max_trails,
                target
            );
            return None;
        }
        let start = source.world_position(target);
        let slot = TrailSlot {
            target,
            head: 0,
            seeded: start.is_some(),
            live: true,
        };
        if index == self.slots.len() {
            self.slots.push(slot);
        } else {
            self.slots[index] = slot;
        }
        self.fill(index, start.unwrap_or(Vec3::ZERO));

        // Newest vertex at full color, oldest black.
        let range = self.vertex_range(index);
        let last = (self.history_len - 1) as f32;
        for (k, c) in self.colors[range].iter_mut().enumerate() {
            let fade = 1.0 - k as f32 / last;
            *c = [color[0] * fade, color[1] * fade, color[2] * fade];
        }
        Some(TrailHandle(index as u32))
    }

    /// Push every trail's current target position and rewrite its vertices.
    ///
    /// A trail whose target lost its transform collapses to a point and is
    /// re-seeded when the target comes back.
    pub fn update<S: TransformSource + ?Sized>(&mut self, source: &S) {
        for index in 0..self.slots.len() {
            if !self.slots[index].live {
                continue;
            }
            let Some(pos) = source.world_position(self.slots[index].target) else {
                if self.slots[index].seeded {
                    self.slots[index].seeded = false;
                    self.fill(index, Vec3::ZERO);
                }
                continue;
            };
            if !self.slots[index].seeded {
                self.slots[index].seeded = true;
                self.fill(index, pos);
                continue;
            }
            let len = self.history_len;
            let slot = &mut self.slots[index];
            slot.head = (slot.head + 1) % len;
            let head = slot.head;
            let base = index * len;
            self.history[base + head] = pos;

            for k in 0..len {
                let sample = self.history[base + (head + len - k) % len];
                self.positions[base + k] = sample.to_array();
            }
        }
    }

    /// Stop tracking `target` and free its slots. Returns `false` if it had no trail.
    pub fn unregister(&mut self, target: BodyId) -> bool {
        let mut found = false;
        for index in 0..self.slots.len() {
            let slot = &self.slots[index];
            if !slot.live || slot.target != target {
                continue;
            }
            self.slots[index].live = false;
            self.fill(index, Vec3::ZERO);
            let range = self.vertex_range(index);
            self.colors[range].fill([0.0; 3]);
            found = true;
        }
        while self.slots.last().is_some_and(|s| !s.live) {
            self.slots.pop();
        }
        found
    }

    /// Forget past positions but keep registrations; each trail restarts
    /// from its target's position on the next update.
    pub fn clear_history(&mut self) {
        for slot in &mut self.slots {
            slot.seeded = false;
        }
    }

    /// Drop every registration. Buffers stay allocated.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.history.fill(Vec3::ZERO);
        self.positions.fill([0.0; 3]);
        self.colors.fill([0.0; 3]);
    }

    fn fill(&mut self, index: usize, pos: Vec3) {
        let range = self.vertex_range(index);
        self.history[range.clone()].fill(pos);
        self.positions[range].fill(pos.to_array());
        self.slots[index].head = 0;
    }

    fn vertex_range(&self, index: usize) -> Range<usize> {
        let base = index * self.history_len;
        base..base + self.history_len
    }

    /// Slot that the next registration will take.
    pub fn next_trail_index(&self) -> usize {
        self.slots
            .iter()
            .position(|s| !s.live)
            .unwrap_or(self.slots.len())
    }

    /// Number of trails currently tracked.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.live).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.max_trails
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    /// Vertices of one trail, newest first.
    pub fn trail_positions(&self, handle: TrailHandle) -> Option<&[[f32; 3]]> {
        let index = handle.0 as usize;
        if !self.slots.get(index).is_some_and(|s| s.live) {
            return None;
        }
        Some(&self.positions[self.vertex_range(index)])
    }

    pub fn trail_colors(&self, handle: TrailHandle) -> Option<&[[f32; 3]]> {
        let index = handle.0 as usize;
        if !self.slots.get(index).is_some_and(|s| s.live) {
            return None;
        }
        Some(&self.colors[self.vertex_range(index)])
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Indices to draw this frame: up to the last live slot, none when hidden.
    /// Freed slots below it are collapsed to a point and draw nothing.
    pub fn draw_index_count(&self) -> u32 {
        if !self.visible {
            return 0;
        }
        (self.slots.len() * (self.history_len - 1) * 2) as u32
    }

    pub fn positions_f32(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn colors_f32(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Raw pointers for SharedArrayBuffer reads.
    pub fn positions_ptr(&self) -> *const f32 {
        self.positions.as_ptr() as *const f32
    }

    pub fn colors_ptr(&self) -> *const f32 {
        self.colors.as_ptr() as *const f32
    }

    pub fn indices_ptr(&self) -> *const u32 {
        self.indices.as_ptr()
    }
}

impl Default for TrailAggregator {
    fn default() -> Self {
        Self::new(TrailConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{BodyKind, BodyMeta};
    use crate::core::scene::{Scene, SceneNode};

    const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

    fn small() -> TrailAggregator {
        TrailAggregator::new(TrailConfig {
            max_trails: 2,
            history_len: 4,
        })
    }

    fn scene(bodies: &[(u32, Vec3)]) -> Scene {
        let mut scene = Scene::new();
        for &(id, pos) in bodies {
            scene.spawn(
                SceneNode::new(BodyId(id), BodyMeta::new(format!("p{id}"), BodyKind::Planet))
                    .with_local(pos),
            );
        }
        scene
    }

    fn move_to(scene: &mut Scene, id: u32, pos: Vec3) {
        scene.get_mut(BodyId(id)).unwrap().local = pos;
        scene.propagate();
    }

    #[test]
    fn register_seeds_history_with_current_position() {
        let scene = scene(&[(1, Vec3::new(1.0, 2.0, 3.0))]);
        let mut trails = small();
        let h = trails.register(&scene, BodyId(1), WHITE).unwrap();
        assert_eq!(h, TrailHandle(0));
        let verts = trails.trail_positions(h).unwrap();
        assert!(verts.iter().all(|v| *v == [1.0, 2.0, 3.0]));
    }

    #[test]
    fn update_shifts_newest_first() {
        let mut scene = scene(&[(1, Vec3::ZERO)]);
        let mut trails = small();
        let h = trails.register(&scene, BodyId(1), WHITE).unwrap();

        move_to(&mut scene, 1, Vec3::new(1.0, 0.0, 0.0));
        trails.update(&scene);
        move_to(&mut scene, 1, Vec3::new(2.0, 0.0, 0.0));
        trails.update(&scene);

        let verts = trails.trail_positions(h).unwrap();
        assert_eq!(verts[0], [2.0, 0.0, 0.0]);
        assert_eq!(verts[1], [1.0, 0.0, 0.0]);
        assert_eq!(verts[2], [0.0, 0.0, 0.0]);
        assert_eq!(verts[3], [0.0, 0.0, 0.0]);

        for _ in 0..4 {
            trails.update(&scene);
        }
        let verts = trails.trail_positions(h).unwrap();
        assert!(verts.iter().all(|v| *v == [2.0, 0.0, 0.0]));
    }

    #[test]
    fn colors_fade_by_recency() {
        let scene = scene(&[(1, Vec3::ZERO)]);
        let mut trails = small();
        let h = trails.register(&scene, BodyId(1), [0.0, 0.6, 0.9]).unwrap();
        let colors = trails.trail_colors(h).unwrap();
        assert_eq!(colors[0], [0.0, 0.6, 0.9]);
        assert_eq!(colors[3], [0.0, 0.0, 0.0]);
        assert!(colors[1][1] > colors[2][1]);
    }

    #[test]
    fn capacity_overflow_is_refused_without_corruption() {
        let scene = scene(&[
            (1, Vec3::X),
            (2, Vec3::Y),
            (3, Vec3::Z),
        ]);
        let mut trails = small();
        let a = trails.register(&scene, BodyId(1), WHITE).unwrap();
        let b = trails.register(&scene, BodyId(2), WHITE).unwrap();
        assert!(trails.register(&scene, BodyId(3), WHITE).is_none());
        assert!(trails.register(&scene, BodyId(3), WHITE).is_none());
        assert_eq!(trails.next_trail_index(), 2);
        assert!(trails.trail_positions(a).unwrap().iter().all(|v| *v == [1.0, 0.0, 0.0]));
        assert!(trails.trail_positions(b).unwrap().iter().all(|v| *v == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn clear_history_collapses_to_current_position() {
        let mut scene = scene(&[(1, Vec3::X)]);
        let mut trails = small();
        let h = trails.register(&scene, BodyId(1), WHITE).unwrap();
        scene.get_mut(BodyId(1)).unwrap().local = Vec3::Y;
        scene.propagate();
        trails.update(&scene);
        assert_ne!(trails.trail_positions(h).unwrap()[1], Vec3::Y.to_array());

        trails.clear_history();
        trails.update(&scene);
        assert!(trails
            .trail_positions(h)
            .unwrap()
            .iter()
            .all(|p| *p == Vec3::Y.to_array()));
        assert_eq!(trails.next_trail_index(), 1);
    }

    #[test]
    fn missing_target_collapses_then_reseeds() {
        let mut scene = scene(&[(1, Vec3::X)]);
        let mut trails = small();
        let h = trails.register(&scene, BodyId(1), WHITE).unwrap();
        move_to(&mut scene, 1, Vec3::Y);
        trails.update(&scene);

        scene.get_mut(BodyId(1)).unwrap().active = false;
        trails.update(&scene);
        assert!(trails.trail_positions(h).unwrap().iter().all(|v| *v == [0.0; 3]));

        scene.get_mut(BodyId(1)).unwrap().active = true;
        trails.update(&scene);
        assert!(trails.trail_positions(h).unwrap().iter().all(|v| *v == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn unregister_frees_and_reuses_slots() {
        let scene = scene(&[(1, Vec3::X), (2, Vec3::Y), (3, Vec3::Z)]);
        let mut trails = small();
        let a = trails.register(&scene, BodyId(1), WHITE).unwrap();
        let b = trails.register(&scene, BodyId(2), WHITE).unwrap();
        assert_eq!(trails.draw_index_count(), 12);

        assert!(trails.unregister(BodyId(1)));
        assert!(!trails.unregister(BodyId(1)));
        assert_eq!(trails.trail_positions(a), None);
        assert_eq!(trails.len(), 1);
        // Slot 0 is free but slot 1 still draws.
        assert_eq!(trails.draw_index_count(), 12);
        assert!(trails.positions_f32()[..12].iter().all(|&f| f == 0.0));

        assert_eq!(trails.register(&scene, BodyId(3), WHITE), Some(a));
        assert_eq!(trails.trail_colors(a).unwrap()[0], WHITE);

        assert!(trails.unregister(BodyId(3)));
        assert!(trails.unregister(BodyId(2)));
        assert_eq!(trails.trail_positions(b), None);
        assert_eq!(trails.draw_index_count(), 0);
        assert!(trails.is_empty());
    }

    #[test]
    fn reset_frees_slots_but_keeps_buffers() {
        let scene = scene(&[(1, Vec3::X)]);
        let mut trails = small();
        trails.register(&scene, BodyId(1), WHITE);
        let ptr = trails.positions_ptr();
        trails.reset();
        assert_eq!(trails.next_trail_index(), 0);
        assert_eq!(trails.draw_index_count(), 0);
        assert_eq!(trails.positions_ptr(), ptr);
        assert_eq!(trails.positions_f32().len(), 2 * 4 * 3);
        assert_eq!(trails.register(&scene, BodyId(1), WHITE), Some(TrailHandle(0)));
    }

    #[test]
    fn index_buffer_covers_all_slots() {
        let scene = scene(&[(1, Vec3::X)]);
        let mut trails = small();
        assert_eq!(trails.indices().len(), 2 * 3 * 2);
        assert_eq!(&trails.indices()[..6], &[0, 1, 1, 2, 2, 3]);
        assert_eq!(trails.indices()[6], 4);
        trails.register(&scene, BodyId(1), WHITE);
        assert_eq!(trails.draw_index_count(), 6);
        trails.set_visible(false);
        assert_eq!(trails.draw_index_count(), 0);
    }

    #[test]
    fn late_target_is_seeded_on_first_sighting() {
        let mut scene = Scene::new();
        let mut trails = small();
        let h = trails.register(&scene, BodyId(5), WHITE).unwrap();
        trails.update(&scene);
        scene.spawn(
            SceneNode::new(BodyId(5), BodyMeta::new("late", BodyKind::Comet))
                .with_local(Vec3::new(7.0, 0.0, 0.0)),
        );
        trails.update(&scene);
        let verts = trails.trail_positions(h).unwrap();
        assert!(verts.iter().all(|v| *v == [7.0, 0.0, 0.0]));
    }
}
