use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use crate::api::types::{BodyId, BodyMeta};

/// Anything that can report a body's current world transform.
///
/// Trails, instances and labels read positions through this every frame.
pub trait TransformSource {
    fn world_position(&self, id: BodyId) -> Option<Vec3>;
    fn world_matrix(&self, id: BodyId) -> Option<Mat4>;
}

/// One logical body in the scene graph.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: BodyId,
    pub meta: BodyMeta,
    /// Whether this node is active (inactive nodes report no transform).
    pub active: bool,
    /// Parent node; `local` is relative to its world position.
    pub parent: Option<BodyId>,
    /// Position relative to the parent (or world origin).
    pub local: Vec3,
    /// Resolved world position, written by [`Scene::propagate`].
    pub world: Vec3,
    pub rotation: Quat,
    /// Uniform render radius.
    pub scale: f32,
}

impl SceneNode {
    pub fn new(id: BodyId, meta: BodyMeta) -> Self {
        Self {
            id,
            meta,
            active: true,
            parent: None,
            local: Vec3::ZERO,
            world: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }

    pub fn with_parent(mut self, parent: BodyId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_local(mut self, local: Vec3) -> Self {
        self.local = local;
        self.world = local;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation, self.world)
    }
}

/// Flat node storage with an id index.
/// Sized for thousands of bodies; lookups by id are O(1).
pub struct Scene {
    nodes: Vec<SceneNode>,
    index: HashMap<BodyId, usize>,
    /// Scratch for `propagate` (node indices in parent-first order).
    order: Vec<usize>,
    order_dirty: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            order_dirty: true,
        }
    }

    /// Add a node to the scene. A node with an existing id replaces the old one.
    pub fn spawn(&mut self, node: SceneNode) {
        if let Some(&idx) = self.index.get(&node.id) {
            self.nodes[idx] = node;
        } else {
            self.index.insert(node.id, self.nodes.len());
            self.nodes.push(node);
        }
        self.order_dirty = true;
    }

    /// Remove a node by id. Children keep their (now dangling) parent and
    /// resolve to their local position.
    pub fn despawn(&mut self, id: BodyId) -> Option<SceneNode> {
        let idx = self.index.remove(&id)?;
        let removed = self.nodes.swap_remove(idx);
        if idx < self.nodes.len() {
            let moved = self.nodes[idx].id;
            self.index.insert(moved, idx);
        }
        self.order_dirty = true;
        Some(removed)
    }

    pub fn get(&self, id: BodyId) -> Option<&SceneNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut SceneNode> {
        match self.index.get(&id) {
            Some(&i) => Some(&mut self.nodes[i]),
            None => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneNode> {
        self.nodes.iter_mut()
    }

    /// Find the first node with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.meta.name == name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.order.clear();
        self.order_dirty = true;
    }

    /// Resolve world positions from local offsets, parents before children.
    pub fn propagate(&mut self) {
        if self.order_dirty {
            self.rebuild_order();
        }
        for k in 0..self.order.len() {
            let i = self.order[k];
            let parent_world = self.nodes[i]
                .parent
                .and_then(|p| self.index.get(&p))
                .map(|&pi| self.nodes[pi].world)
                .unwrap_or(Vec3::ZERO);
            let node = &mut self.nodes[i];
            node.world = parent_world + node.local;
        }
    }

    /// Depth-first ordering so each parent is resolved before its children.
    fn rebuild_order(&mut self) {
        self.order.clear();
        let mut depth: Vec<u32> = vec![0; self.nodes.len()];
        for (i, d) in depth.iter_mut().enumerate() {
            let mut hops = 0;
            let mut cursor = self.nodes[i].parent;
            while let Some(p) = cursor {
                match self.index.get(&p) {
                    // Guard against cycles in malformed hierarchies.
                    Some(&pi) if hops < self.nodes.len() => {
                        hops += 1;
                        cursor = self.nodes[pi].parent;
                    }
                    _ => break,
                }
            }
            *d = hops as u32;
        }
        self.order.extend(0..self.nodes.len());
        self.order.sort_by_key(|&i| depth[i]);
        self.order_dirty = false;
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformSource for Scene {
    fn world_position(&self, id: BodyId) -> Option<Vec3> {
        self.get(id).filter(|n| n.active).map(|n| n.world)
    }

    fn world_matrix(&self, id: BodyId) -> Option<Mat4> {
        self.get(id).filter(|n| n.active).map(SceneNode::world_matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::BodyKind;

    fn node(id: u32, name: &str) -> SceneNode {
        SceneNode::new(BodyId(id), BodyMeta::new(name, BodyKind::Planet))
    }

    #[test]
    fn spawn_and_get() {
        let mut scene = Scene::new();
        scene.spawn(node(1, "Earth").with_local(Vec3::new(10.0, 0.0, 20.0)));
        let n = scene.get(BodyId(1)).unwrap();
        assert_eq!(n.world, Vec3::new(10.0, 0.0, 20.0));
    }

    #[test]
    fn despawn_keeps_index_consistent() {
        let mut scene = Scene::new();
        scene.spawn(node(1, "A"));
        scene.spawn(node(2, "B"));
        scene.spawn(node(3, "C"));
        assert!(scene.despawn(BodyId(1)).is_some());
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.get(BodyId(3)).unwrap().name(), "C");
        assert_eq!(scene.get(BodyId(2)).unwrap().name(), "B");
        assert!(scene.get(BodyId(1)).is_none());
    }

    #[test]
    fn find_by_name() {
        let mut scene = Scene::new();
        scene.spawn(node(1, "Mars"));
        scene.spawn(node(2, "Phobos"));
        assert_eq!(scene.find_by_name("Phobos").unwrap().id, BodyId(2));
        assert!(scene.find_by_name("Vulcan").is_none());
    }

    #[test]
    fn propagate_resolves_children_after_parents() {
        let mut scene = Scene::new();
        // Child spawned before its parent on purpose.
        scene.spawn(node(2, "Moon").with_parent(BodyId(1)).with_local(Vec3::new(1.0, 0.0, 0.0)));
        scene.spawn(node(1, "Earth").with_local(Vec3::new(40.0, 0.0, 0.0)));
        scene.propagate();
        assert_eq!(scene.world_position(BodyId(2)), Some(Vec3::new(41.0, 0.0, 0.0)));

        scene.get_mut(BodyId(1)).unwrap().local = Vec3::new(0.0, 0.0, 40.0);
        scene.propagate();
        assert_eq!(scene.world_position(BodyId(2)), Some(Vec3::new(1.0, 0.0, 40.0)));
    }

    #[test]
    fn inactive_nodes_report_no_transform() {
        let mut scene = Scene::new();
        scene.spawn(node(1, "Ghost"));
        scene.get_mut(BodyId(1)).unwrap().active = false;
        assert!(scene.world_position(BodyId(1)).is_none());
        assert!(scene.world_matrix(BodyId(1)).is_none());
    }

    #[test]
    fn world_matrix_carries_scale_and_translation() {
        let mut scene = Scene::new();
        scene.spawn(node(1, "Jupiter").with_local(Vec3::new(5.0, 1.0, 2.0)).with_scale(3.0));
        let m = scene.world_matrix(BodyId(1)).unwrap();
        let p = m.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!(p.abs_diff_eq(Vec3::new(8.0, 1.0, 2.0), 1e-6));
    }
}
