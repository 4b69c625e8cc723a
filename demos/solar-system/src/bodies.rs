//! Turns a [`SystemConfig`] into scene nodes, labels, trails and instances.

use std::collections::HashMap;

use orrery_engine::*;

/// Default body table shipped with the demo.
pub const DEFAULT_SYSTEM: &str = include_str!("../assets/system.json");

// ── Geometry / material ids shared with the host renderer ───────────

pub const GEOMETRY_SPHERE: GeometryId = GeometryId(0);
pub const GEOMETRY_DEBRIS: GeometryId = GeometryId(1);
pub const GEOMETRY_RING: GeometryId = GeometryId(2);

pub const MATERIAL_SUN: MaterialId = MaterialId(0);
pub const MATERIAL_PLAIN: MaterialId = MaterialId(1);
pub const MATERIAL_DEBRIS: MaterialId = MaterialId(2);
/// Textured materials are numbered from here in order of first appearance.
pub const MATERIAL_TEXTURED_BASE: u32 = 16;

/// What [`spawn_system`] created.
#[derive(Debug, Default)]
pub struct SpawnedSystem {
    /// Every named body (belt particles excluded).
    pub ids: HashMap<String, BodyId>,
    /// Heliocentric bodies that get an orbit line.
    pub orbiting: Vec<BodyId>,
    /// Texture paths; index `k` is material `MATERIAL_TEXTURED_BASE + k`.
    pub textures: Vec<String>,
    pub belt_particles: usize,
}

impl SpawnedSystem {
    fn material_for_texture(&mut self, path: &str) -> MaterialId {
        let k = match self.textures.iter().position(|t| t == path) {
            Some(k) => k,
            None => {
                self.textures.push(path.to_string());
                self.textures.len() - 1
            }
        };
        MaterialId(MATERIAL_TEXTURED_BASE + k as u32)
    }
}

/// FNV-1a, so each belt gets a stable seed from its name.
fn name_seed(name: &str) -> u64 {
    name.bytes().fold(0xcbf2_9ce4_8422_2325, |h, b| {
        (h ^ b as u64).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Spawn every body in `config` into `ctx`. Parents are always spawned before their moons.
pub fn spawn_system(ctx: &mut EngineContext, config: &SystemConfig) -> SpawnedSystem {
    let mut out = SpawnedSystem::default();

    for (body, parent) in config.walk() {
        if let Some(dist) = body.distribution.as_ref() {
            out.belt_particles += spawn_belt(ctx, body, dist);
            continue;
        }

        let parent_id = parent.and_then(|p| out.ids.get(&p.name).copied());
        let mut meta = BodyMeta::new(body.name.clone(), body.kind);
        if let Some(elements) = body.physics {
            meta = meta.with_elements(elements);
        }
        let id = ctx.next_id();
        let mut node = SceneNode::new(id, match parent_id {
            Some(p) => meta.with_moon_of(p),
            None => meta,
        })
        .with_scale(body.visual.size);
        if let Some(p) = parent_id {
            node = node.with_parent(p);
        }
        ctx.spawn(node);
        out.ids.insert(body.name.clone(), id);

        ctx.labels.add(id, parent_id);

        let rgb = body.visual.rgb().unwrap_or([1.0, 1.0, 1.0]);
        if body.kind.has_trail() {
            ctx.trails.register(&ctx.scene, id, rgb);
        }
        if parent_id.is_none() && body.physics.is_some() {
            out.orbiting.push(id);
        }

        let material = if body.kind == BodyKind::Star {
            MATERIAL_SUN
        } else if let Some(texture) = body.visual.texture.as_deref() {
            out.material_for_texture(texture)
        } else {
            MATERIAL_PLAIN
        };
        let rgba = body.visual.rgba().unwrap_or([1.0; 4]);
        ctx.instances.add_instance(
            id,
            GEOMETRY_SPHERE,
            material,
            InstanceMeta::new(body.name.clone()).with_color(rgba),
            true,
        );

        if let Some(ring) = body.visual.ring.as_ref() {
            let material = match ring.texture.as_deref() {
                Some(texture) => out.material_for_texture(texture),
                None => MATERIAL_PLAIN,
            };
            ctx.instances.add_instance(
                id,
                GEOMETRY_RING,
                material,
                InstanceMeta::new(format!("{} ring", body.name))
                    .with_color(rgba)
                    .with_scale(ring.outer_radius),
                true,
            );
        }
    }

    log::info!(
        "spawned {} bodies, {} belt particles, {} textures",
        out.ids.len(),
        out.belt_particles,
        out.textures.len()
    );
    out
}

fn spawn_belt(ctx: &mut EngineContext, body: &BodyConfig, dist: &BeltDistribution) -> usize {
    let rgba = body.visual.rgba().unwrap_or([0.5, 0.5, 0.5, 1.0]);
    let particles = sample_belt(dist, name_seed(&body.name));
    for (k, elements) in particles.iter().enumerate() {
        let id = ctx.next_id();
        let meta =
            BodyMeta::new(format!("{} #{k}", body.name), body.kind).with_elements(*elements);
        ctx.spawn(SceneNode::new(id, meta).with_scale(body.visual.size));
        ctx.instances.add_instance(
            id,
            GEOMETRY_DEBRIS,
            MATERIAL_DEBRIS,
            InstanceMeta::new(body.name.clone()).with_color(rgba),
            dist.dynamic,
        );
    }
    log::debug!("{}: {} particles", body.name, particles.len());
    particles.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r##"{
        "bodies": [
            { "name": "Sun", "type": "star", "visual": { "size": 5.0, "color": "#ffcc00" } },
            { "name": "Earth", "type": "planet",
              "physics": { "a": 1.0, "e": 0.0167 },
              "visual": { "size": 0.6, "color": "#3366cc", "texture": "earth.jpg" },
              "moons": [
                { "name": "Moon", "type": "moon",
                  "physics": { "a": 0.00257, "period": 0.0748 },
                  "visual": { "size": 0.2 } }
              ] },
            { "name": "Belt", "type": "asteroid",
              "distribution": { "minA": 2.0, "maxA": 3.0, "count": 10 } }
        ]
    }"##;

    #[test]
    fn default_system_parses() {
        let config = SystemConfig::from_json(DEFAULT_SYSTEM).unwrap();
        assert!(config.find("Earth").is_some());
        assert!(config.find("Titan").is_some());
        assert!(config.bodies.iter().any(|b| b.is_belt()));
    }

    #[test]
    fn spawns_bodies_moons_and_belts() {
        let config = SystemConfig::from_json(SMALL).unwrap();
        let mut ctx = EngineContext::default();
        let spawned = spawn_system(&mut ctx, &config);

        assert_eq!(spawned.ids.len(), 3);
        assert_eq!(spawned.belt_particles, 10);
        assert_eq!(ctx.scene.len(), 13);
        assert_eq!(spawned.orbiting, vec![spawned.ids["Earth"]]);
        assert_eq!(spawned.textures, vec!["earth.jpg".to_string()]);

        let earth = spawned.ids["Earth"];
        let moon = ctx.scene.get(spawned.ids["Moon"]).unwrap();
        assert_eq!(moon.parent, Some(earth));
        assert_eq!(moon.meta.moon_of, Some(earth));

        // Labels for named bodies only; moons and the star get no trail.
        assert_eq!(ctx.labels.len(), 3);
        assert_eq!(ctx.trails.len(), 1);

        ctx.instances.build();
        let debris = ctx.instances.group(GEOMETRY_DEBRIS, MATERIAL_DEBRIS).unwrap();
        assert_eq!(debris.instance_count(), 10);
        assert!(ctx
            .instances
            .group(GEOMETRY_SPHERE, MaterialId(MATERIAL_TEXTURED_BASE))
            .is_some());
        assert_eq!(ctx.instances.find_instance_by_name("Earth"), Some(earth));
    }

    #[test]
    fn belt_seed_is_stable_per_name() {
        assert_eq!(name_seed("Main Belt"), name_seed("Main Belt"));
        assert_ne!(name_seed("Main Belt"), name_seed("Kuiper Belt"));
    }
}
