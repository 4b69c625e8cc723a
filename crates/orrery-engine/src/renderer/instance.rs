use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::api::types::BodyId;
use crate::core::scene::TransformSource;

/// Shared geometry handle (sphere LOD, debris rock, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u32);

/// Shared material handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

/// Per-instance metadata supplied at registration.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceMeta {
    pub name: String,
    /// Linear RGBA tint.
    pub color: [f32; 4],
    /// Extra uniform scale on top of the source transform.
    pub scale: f32,
}

impl InstanceMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: [1.0, 1.0, 1.0, 1.0],
            scale: 1.0,
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

/// Per-instance GPU record: column-major model matrix + tint.
/// 20 floats = 80 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl InstanceRaw {
    pub const FLOATS: usize = 20;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.model[3][0], self.model[3][1], self.model[3][2])
    }
}

#[derive(Debug, Clone)]
struct InstanceSlot {
    source: BodyId,
    meta: InstanceMeta,
    dynamic: bool,
    uploaded: bool,
}

struct PendingInstance {
    source: BodyId,
    geometry: GeometryId,
    material: MaterialId,
    meta: InstanceMeta,
    dynamic: bool,
}

/// One instanced draw: every body sharing a (geometry, material) pair.
#[derive(Debug)]
pub struct InstanceGroup {
    geometry: GeometryId,
    material: MaterialId,
    slots: Vec<InstanceSlot>,
    instances: Vec<InstanceRaw>,
    /// Bumped whenever `instances` changes; the host re-uploads on change.
    version: u64,
}

impl InstanceGroup {
    fn new(geometry: GeometryId, material: MaterialId) -> Self {
        Self {
            geometry,
            material,
            slots: Vec::new(),
            instances: Vec::new(),
            version: 0,
        }
    }

    pub fn geometry(&self) -> GeometryId {
        self.geometry
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn instances(&self) -> &[InstanceRaw] {
        &self.instances
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Raw pointer to instance data for SharedArrayBuffer reads.
    pub fn instances_ptr(&self) -> *const f32 {
        self.instances.as_ptr() as *const f32
    }

    /// Body behind instance `index`, in draw order.
    pub fn source_of(&self, index: usize) -> Option<BodyId> {
        self.slots.get(index).map(|s| s.source)
    }
}

/// Batches logical bodies into one instance buffer per (geometry, material).
///
/// Registrations are queued until [`build`](Self::build); [`update`](Self::update)
/// then refreshes dynamic instances every call and static ones only once.
pub struct InstanceAggregator {
    pending: Vec<PendingInstance>,
    groups: Vec<InstanceGroup>,
    group_index: HashMap<(GeometryId, MaterialId), usize>,
    names: HashMap<String, BodyId>,
}

impl InstanceAggregator {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            groups: Vec::new(),
            group_index: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Queue a body for instanced drawing. The first registration of a name wins lookups.
    pub fn add_instance(
        &mut self,
        source: BodyId,
        geometry: GeometryId,
        material: MaterialId,
        meta: InstanceMeta,
        dynamic: bool,
    ) {
        self.names.entry(meta.name.clone()).or_insert(source);
        self.pending.push(PendingInstance {
            source,
            geometry,
            material,
            meta,
            dynamic,
        });
    }

    /// Move queued registrations into their groups.
    ///
    /// Safe to call repeatedly: with nothing queued this is a no-op, and
    /// registrations added after a build are picked up by the next one.
    pub fn build(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let added = self.pending.len();
        for p in self.pending.drain(..) {
            let key = (p.geometry, p.material);
            let idx = match self.group_index.get(&key) {
                Some(&idx) => idx,
                None => {
                    self.groups.push(InstanceGroup::new(p.geometry, p.material));
                    self.group_index.insert(key, self.groups.len() - 1);
                    self.groups.len() - 1
                }
            };
            let group = &mut self.groups[idx];
            group.slots.push(InstanceSlot {
                source: p.source,
                meta: p.meta,
                dynamic: p.dynamic,
                uploaded: false,
            });
            // Zero scale keeps the instance invisible until its first upload.
            group.instances.push(InstanceRaw::zeroed());
            group.version += 1;
        }
        log::debug!(
            "instances: built {} new, {} groups, {} total",
            added,
            self.groups.len(),
            self.instance_count()
        );
    }

    /// Refresh instance transforms from `source`.
    /// Dynamic slots are rewritten every call; static slots only until first upload.
    /// A dynamic slot whose source has no transform drops back to zero scale.
    pub fn update<S: TransformSource + ?Sized>(&mut self, source: &S) {
        for group in &mut self.groups {
            let mut changed = false;
            for (slot, raw) in group.slots.iter_mut().zip(group.instances.iter_mut()) {
                if slot.uploaded && !slot.dynamic {
                    continue;
                }
                let Some(world) = source.world_matrix(slot.source) else {
                    if slot.uploaded {
                        *raw = InstanceRaw::zeroed();
                        slot.uploaded = false;
                        changed = true;
                    }
                    continue;
                };
                let model = world * Mat4::from_scale(Vec3::splat(slot.meta.scale));
                raw.model = model.to_cols_array_2d();
                raw.color = slot.meta.color;
                slot.uploaded = true;
                changed = true;
            }
            if changed {
                group.version += 1;
            }
        }
    }

    /// Zero every instance drawn from `source`, static ones included.
    /// They upload again if the source reappears. Returns the number hidden.
    pub fn hide_source(&mut self, source: BodyId) -> usize {
        let mut hidden = 0;
        for group in &mut self.groups {
            let mut changed = false;
            for (slot, raw) in group.slots.iter_mut().zip(group.instances.iter_mut()) {
                if slot.source != source || !slot.uploaded {
                    continue;
                }
                *raw = InstanceRaw::zeroed();
                slot.uploaded = false;
                changed = true;
                hidden += 1;
            }
            if changed {
                group.version += 1;
            }
        }
        hidden
    }

    /// Look up the body registered under `name`.
    pub fn find_instance_by_name(&self, name: &str) -> Option<BodyId> {
        self.names.get(name).copied()
    }

    pub fn groups(&self) -> &[InstanceGroup] {
        &self.groups
    }

    pub fn group(&self, geometry: GeometryId, material: MaterialId) -> Option<&InstanceGroup> {
        self.group_index
            .get(&(geometry, material))
            .map(|&i| &self.groups[i])
    }

    pub fn instance_count(&self) -> usize {
        self.groups.iter().map(|g| g.instances.len()).sum()
    }

    /// Whether registrations are waiting for [`build`](Self::build).
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Release every group, buffer and name mapping.
    pub fn dispose(&mut self) {
        self.pending = Vec::new();
        self.groups = Vec::new();
        self.group_index = HashMap::new();
        self.names = HashMap::new();
    }
}

impl Default for InstanceAggregator {
    fn default() -> Self {
        Self::new()
    }
}
