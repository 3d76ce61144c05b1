//! Per-kind params schemas
//!
//! Params bags are untyped at the core boundary. Each kind deserializes its
//! bag into one of these structs before building, so malformed values are
//! rejected with [`NachtError::InvalidParams`] naming the kind. Keys not
//! listed in a schema are ignored.

use nacht_core::{NachtError, Result, State, Value};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::kind::Kind;

/// Three components: a position, a size or an RGB color.
pub type Vec3 = [f64; 3];

fn unit() -> Vec3 {
    [1.0, 1.0, 1.0]
}

/// Deserialize a params bag into the schema for `kind`.
pub fn parse<T: DeserializeOwned>(kind: Kind, params: &State) -> Result<T> {
    serde_json::from_value(params.clone().into_value())
        .map_err(|e| NachtError::invalid_params(kind.as_str(), e.to_string()))
}

/// Deserialize a single value, as an updater receives it.
pub fn parse_value<T: DeserializeOwned>(kind: Kind, key: &str, value: &Value) -> Result<T> {
    T::deserialize(value)
        .map_err(|e| NachtError::invalid_params(kind.as_str(), format!("{key}: {e}")))
}

/// `kind: "mesh"`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeshParams {
    /// Nested `cube` or `sphere` params
    pub geometry: Option<Value>,
    /// Nested `material` params
    pub material: Option<Value>,
    /// World position
    pub position: Vec3,
    /// Overrides the material's color
    pub color: Option<Vec3>,
    /// Nested params bags
    pub children: Vec<Value>,
}

/// `kind: "cube"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CubeParams {
    /// Extent along each axis
    pub size: Vec3,
}

impl Default for CubeParams {
    fn default() -> Self {
        Self { size: unit() }
    }
}

/// `kind: "sphere"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SphereParams {
    /// Sphere radius
    pub radius: f64,
    /// Horizontal segments
    pub width_segments: u32,
    /// Vertical segments
    pub height_segments: u32,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            width_segments: 32,
            height_segments: 16,
        }
    }
}

/// Shading model of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    /// Diffuse shading
    Lambert,
    /// Unlit flat color
    Basic,
}

/// `kind: "material"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialParams {
    /// Shading model, required
    pub material_kind: MaterialKind,
    /// RGB color, white when missing
    #[serde(default = "unit")]
    pub color: Vec3,
}

/// `kind: "scene"`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneParams {
    /// Offset applied to every child
    pub position: Vec3,
    /// Nested params bags
    pub children: Vec<Value>,
}

/// `kind: "camera"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraParams {
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
    /// Nested params bags
    pub children: Vec<Value>,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            fov: 50.0,
            aspect: 1.0,
            near: 0.1,
            far: 2000.0,
            position: [0.0; 3],
            children: Vec::new(),
        }
    }
}

/// `kind: "renderer"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RendererParams {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Whether edges are smoothed
    pub antialias: bool,
}

impl Default for RendererParams {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            antialias: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(value: Value) -> State {
        State::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_keys() {
        let sphere: SphereParams = parse(Kind::Sphere, &state(json!({"kind": "sphere"}))).unwrap();
        assert_eq!(sphere, SphereParams::default());

        let cube: CubeParams = parse(Kind::Cube, &state(json!({"kind": "cube"}))).unwrap();
        assert_eq!(cube.size, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_camel_case_keys() {
        let sphere: SphereParams = parse(
            Kind::Sphere,
            &state(json!({"radius": 2.5, "widthSegments": 8, "heightSegments": 4})),
        )
        .unwrap();
        assert_eq!(sphere.width_segments, 8);
        assert_eq!(sphere.height_segments, 4);
    }

    #[test]
    fn test_material_kind_is_required() {
        let err = parse::<MaterialParams>(Kind::Material, &state(json!({"color": [1, 0, 0]})))
            .unwrap_err();
        assert!(matches!(err, NachtError::InvalidParams { ref kind, .. } if kind == "material"));
    }

    #[test]
    fn test_malformed_vector_rejected() {
        let err = parse_value::<Vec3>(Kind::Mesh, "position", &json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("position"));
    }
}
