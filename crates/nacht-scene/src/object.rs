//! Scene objects
//!
//! A [`SceneObject`] is the concrete object the scene controller owns: an id,
//! the params it was built and patched with, and a kind-specific payload.

use std::fmt;

use nacht_core::{Patch, SceneNode, State};
use serde::{Deserialize, Serialize};

use crate::kind::Kind;
use crate::schema::{MaterialKind, Vec3};

/// Unique identifier of a built object. A rebuilt object gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Get the raw value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object-{}", self.0)
    }
}

/// Geometry plus material, positioned in space.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Built `cube` or `sphere`, if the params carried one
    pub geometry: Option<Box<SceneObject>>,
    /// Built material, if the params carried one
    pub material: Option<Box<SceneObject>>,
    /// World position
    pub position: Vec3,
    /// Nested objects
    pub children: Vec<SceneObject>,
}

/// Axis-aligned box geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxGeometry {
    /// Extent along each axis
    pub size: Vec3,
}

/// UV sphere geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereGeometry {
    /// Sphere radius
    pub radius: f64,
    /// Horizontal segments
    pub width_segments: u32,
    /// Vertical segments
    pub height_segments: u32,
}

/// Surface material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Shading model
    pub material_kind: MaterialKind,
    /// RGB color, components in `0.0..=1.0`
    pub color: Vec3,
}

/// Root container.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Offset applied to every child
    pub position: Vec3,
    /// Top-level objects
    pub children: Vec<SceneObject>,
}

/// Perspective camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees
    pub fov: f64,
    /// Width over height
    pub aspect: f64,
    /// Near clipping plane
    pub near: f64,
    /// Far clipping plane
    pub far: f64,
    /// World position
    pub position: Vec3,
    /// Objects attached to the camera
    pub children: Vec<SceneObject>,
}

/// Output surface. Every key rebuilds it.
#[derive(Debug, Clone, PartialEq)]
pub struct Renderer {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Whether edges are smoothed
    pub antialias: bool,
}

/// Kind-specific payload of a [`SceneObject`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `mesh`
    Mesh(Mesh),
    /// `cube`
    Cube(BoxGeometry),
    /// `sphere`
    Sphere(SphereGeometry),
    /// `material`
    Material(Material),
    /// `scene`
    Scene(Scene),
    /// `camera`
    Camera(Camera),
    /// `renderer`
    Renderer(Renderer),
}

impl Node {
    /// The kind this payload was built for.
    pub fn kind(&self) -> Kind {
        match self {
            Node::Mesh(_) => Kind::Mesh,
            Node::Cube(_) => Kind::Cube,
            Node::Sphere(_) => Kind::Sphere,
            Node::Material(_) => Kind::Material,
            Node::Scene(_) => Kind::Scene,
            Node::Camera(_) => Kind::Camera,
            Node::Renderer(_) => Kind::Renderer,
        }
    }
}

/// A built object and the params it reflects.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    id: ObjectId,
    params: State,
    node: Node,
}

impl SceneObject {
    pub(crate) fn new(id: ObjectId, params: State, node: Node) -> Self {
        Self { id, params, node }
    }

    /// Identifier of this build.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Kind of the payload.
    pub fn kind(&self) -> Kind {
        self.node.kind()
    }

    /// Params this object was built with, plus every patch applied in place
    /// since.
    pub fn params(&self) -> &State {
        &self.params
    }

    /// Kind-specific payload.
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub(crate) fn record(&mut self, patch: &Patch) {
        self.params.merge(patch);
    }

    /// Position of positioned kinds.
    pub fn position(&self) -> Option<Vec3> {
        match &self.node {
            Node::Mesh(mesh) => Some(mesh.position),
            Node::Scene(scene) => Some(scene.position),
            Node::Camera(camera) => Some(camera.position),
            _ => None,
        }
    }

    /// Returns false when this kind has no position.
    pub fn set_position(&mut self, position: Vec3) -> bool {
        match &mut self.node {
            Node::Mesh(mesh) => mesh.position = position,
            Node::Scene(scene) => scene.position = position,
            Node::Camera(camera) => camera.position = position,
            _ => return false,
        }
        true
    }

    /// Color of a material, or of a mesh's material.
    pub fn color(&self) -> Option<Vec3> {
        match &self.node {
            Node::Material(material) => Some(material.color),
            Node::Mesh(mesh) => mesh.material.as_ref().and_then(|m| m.color()),
            _ => None,
        }
    }

    /// Returns false when there is no material to color.
    pub fn set_color(&mut self, color: Vec3) -> bool {
        match &mut self.node {
            Node::Material(material) => {
                material.color = color;
                true
            }
            Node::Mesh(mesh) => match mesh.material.as_deref_mut() {
                Some(material) => {
                    if material.set_color(color) {
                        material.record(&Patch::new().with("color", color.to_vec()));
                        true
                    } else {
                        false
                    }
                }
                None => false,
            },
            _ => false,
        }
    }
}

impl SceneNode for SceneObject {
    fn children(&self) -> Option<&[Self]> {
        match &self.node {
            Node::Mesh(mesh) => Some(&mesh.children),
            Node::Scene(scene) => Some(&scene.children),
            Node::Camera(camera) => Some(&camera.children),
            _ => None,
        }
    }

    fn children_mut(&mut self) -> Option<&mut [Self]> {
        match &mut self.node {
            Node::Mesh(mesh) => Some(&mut mesh.children),
            Node::Scene(scene) => Some(&mut scene.children),
            Node::Camera(camera) => Some(&mut camera.children),
            _ => None,
        }
    }
}

impl fmt::Display for SceneObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id)?;
        if let Some([x, y, z]) = self.position() {
            write!(f, " at ({x:.2}, {y:.2}, {z:.2})")?;
        }
        if let Some([r, g, b]) = self.color() {
            write!(f, " rgb({r:.2}, {g:.2}, {b:.2})")?;
        }
        Ok(())
    }
}
