//! Params builders
//!
//! Shorthand for the params bags each kind expects. Every field is a
//! [`ParamValue`], so any of them may be a literal, a derivation, or a
//! producer; nested geometry and material bags must be literal.

use nacht_core::{ParamValue, Params, State, Value};

use crate::schema::{MaterialKind, Vec3};

fn vec3(v: Vec3) -> Value {
    Value::from(v.to_vec())
}

/// A mesh from geometry and material bags.
///
/// ```rust,ignore
/// let params = mesh(cube([1.0, 1.0, 1.0]), material(MaterialKind::Basic, [0.7, 0.2, 1.0]), [0.0; 3]);
/// ```
pub fn mesh(geometry: State, material: State, position: impl Into<ParamValue>) -> Params {
    Params::new()
        .set("kind", "mesh")
        .set("geometry", geometry)
        .set("material", material)
        .set("position", position)
}

/// Box geometry of the given size.
pub fn cube(size: Vec3) -> State {
    State::new().with("kind", "cube").with("size", vec3(size))
}

/// Sphere geometry. Missing segment counts take the schema defaults.
pub fn sphere(radius: f64, width_segments: Option<u32>, height_segments: Option<u32>) -> State {
    let mut state = State::new().with("kind", "sphere").with("radius", radius);
    if let Some(segments) = width_segments {
        state = state.with("widthSegments", segments);
    }
    if let Some(segments) = height_segments {
        state = state.with("heightSegments", segments);
    }
    state
}

/// A material of the given shading model and color.
pub fn material(material_kind: MaterialKind, color: Vec3) -> State {
    let tag = match material_kind {
        MaterialKind::Lambert => "lambert",
        MaterialKind::Basic => "basic",
    };
    State::new()
        .with("kind", "material")
        .with("materialKind", tag)
        .with("color", vec3(color))
}

/// A scene holding `children`.
pub fn scene(children: impl IntoIterator<Item = State>) -> Params {
    let children: Vec<Value> = children.into_iter().map(State::into_value).collect();
    Params::new().set("kind", "scene").set("children", children)
}

/// A perspective camera.
pub fn camera(fov: f64, aspect: f64, position: impl Into<ParamValue>) -> Params {
    Params::new()
        .set("kind", "camera")
        .set("fov", fov)
        .set("aspect", aspect)
        .set("position", position)
}

/// An output surface.
pub fn renderer(width: u32, height: u32, antialias: bool) -> Params {
    Params::new()
        .set("kind", "renderer")
        .set("width", width)
        .set("height", height)
        .set("antialias", antialias)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cube_defaults_shape() {
        assert_eq!(
            cube([1.0, 1.0, 1.0]).into_value(),
            json!({"kind": "cube", "size": [1.0, 1.0, 1.0]})
        );
    }

    #[test]
    fn test_sphere_omits_missing_segments() {
        let state = sphere(2.0, Some(8), None);
        assert_eq!(state.get("widthSegments"), Some(&json!(8)));
        assert_eq!(state.get("heightSegments"), None);
    }

    #[test]
    fn test_material_tag() {
        let state = material(MaterialKind::Lambert, [1.0, 0.0, 0.0]);
        assert_eq!(state.get_str("materialKind"), Some("lambert"));
    }

    #[test]
    fn test_mesh_keys() {
        let params = mesh(
            cube([1.0; 3]),
            material(MaterialKind::Basic, [1.0; 3]),
            [0.0, 1.0, 0.0],
        );
        assert_eq!(
            params.keys().collect::<Vec<_>>(),
            vec!["kind", "geometry", "material", "position"]
        );
    }
}
