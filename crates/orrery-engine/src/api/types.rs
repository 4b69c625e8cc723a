use serde::{Deserialize, Serialize};

use crate::core::orbit::OrbitalElements;

/// Unique identifier for a logical body in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

/// Body category from the configuration tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyKind {
    Star,
    Planet,
    Moon,
    DwarfPlanet,
    Asteroid,
    Comet,
}

impl BodyKind {
    /// Whether bodies of this kind get an orbit trail by default.
    pub fn has_trail(self) -> bool {
        matches!(self, Self::Planet | Self::DwarfPlanet | Self::Comet)
    }
}

/// Typed per-body metadata carried by scene nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyMeta {
    pub name: String,
    pub kind: BodyKind,
    /// Orbital elements; `None` for the star at the origin.
    pub elements: Option<OrbitalElements>,
    /// Body this one orbits, for moons.
    pub moon_of: Option<BodyId>,
}

impl BodyMeta {
    pub fn new(name: impl Into<String>, kind: BodyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            elements: None,
            moon_of: None,
        }
    }

    pub fn with_elements(mut self, elements: OrbitalElements) -> Self {
        self.elements = Some(elements);
        self
    }

    pub fn with_moon_of(mut self, parent: BodyId) -> Self {
        self.moon_of = Some(parent);
        self
    }
}
