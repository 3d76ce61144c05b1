//! Object kinds
//!
//! The `kind` tag of a params bag selects which object gets built. The set of
//! kinds is closed; unknown tags are rejected.

use std::fmt;
use std::str::FromStr;

use nacht_core::{NachtError, State};
use serde::{Deserialize, Serialize};

/// Every kind of object the scene controller can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Geometry plus material, positioned in space
    Mesh,
    /// Box geometry
    Cube,
    /// Sphere geometry
    Sphere,
    /// Surface material
    Material,
    /// Root container
    Scene,
    /// Perspective camera
    Camera,
    /// Output surface
    Renderer,
}

impl Kind {
    /// All kinds, in tag table order.
    pub const ALL: [Kind; 7] = [
        Kind::Mesh,
        Kind::Cube,
        Kind::Sphere,
        Kind::Material,
        Kind::Scene,
        Kind::Camera,
        Kind::Renderer,
    ];

    /// The params tag for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Mesh => "mesh",
            Kind::Cube => "cube",
            Kind::Sphere => "sphere",
            Kind::Material => "material",
            Kind::Scene => "scene",
            Kind::Camera => "camera",
            Kind::Renderer => "renderer",
        }
    }

    /// Read the `kind` tag from a params bag.
    pub fn of(params: &State) -> Result<Self, NachtError> {
        match params.get("kind") {
            Some(serde_json::Value::String(tag)) => tag.parse(),
            Some(other) => Err(NachtError::unsupported_kind(other.to_string())),
            None => Err(NachtError::unsupported_kind("")),
        }
    }

    /// Whether objects of this kind can stand in for a mesh's geometry.
    pub fn is_geometry(self) -> bool {
        matches!(self, Kind::Cube | Kind::Sphere)
    }
}

impl FromStr for Kind {
    type Err = NachtError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| NachtError::unsupported_kind(tag))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
