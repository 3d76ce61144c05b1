//! Scene controller
//!
//! Builds [`SceneObject`]s from params and patches them in place through
//! the `position` and `color` updaters. Dispatch on the `kind` tag goes
//! through an explicit constructor table.

use std::sync::atomic::{AtomicU64, Ordering};

use nacht_core::{NachtError, ObjectController, Patch, Result, State, UpdaterTable, Value};

use crate::kind::Kind;
use crate::object::{
    BoxGeometry, Camera, Material, Mesh, Node, ObjectId, Renderer, Scene, SceneObject,
    SphereGeometry,
};
use crate::schema::{
    parse, parse_value, CameraParams, CubeParams, MaterialParams, MeshParams, RendererParams,
    SceneParams, SphereParams, Vec3,
};

type Constructor = fn(&SceneController, &State) -> Result<Node>;

/// Tag to constructor table. Every [`Kind`] has exactly one entry.
const CONSTRUCTORS: [(Kind, Constructor); 7] = [
    (Kind::Mesh, SceneController::build_mesh),
    (Kind::Cube, SceneController::build_cube),
    (Kind::Sphere, SceneController::build_sphere),
    (Kind::Material, SceneController::build_material),
    (Kind::Scene, SceneController::build_scene),
    (Kind::Camera, SceneController::build_camera),
    (Kind::Renderer, SceneController::build_renderer),
];

/// Controller for the in-memory scene graph.
#[derive(Debug)]
pub struct SceneController {
    next_id: AtomicU64,
    updaters: UpdaterTable<SceneObject>,
}

impl Default for SceneController {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneController {
    /// Controller with the `position` and `color` updaters registered.
    pub fn new() -> Self {
        let updaters = UpdaterTable::new()
            .with("position", |object: &mut SceneObject, value: &Value| {
                let kind = object.kind();
                let position: Vec3 = parse_value(kind, "position", value)?;
                if object.set_position(position) {
                    Ok(())
                } else {
                    Err(NachtError::invalid_params(kind.as_str(), "has no position"))
                }
            })
            .with("color", |object: &mut SceneObject, value: &Value| {
                let kind = object.kind();
                let color: Vec3 = parse_value(kind, "color", value)?;
                if object.set_color(color) {
                    Ok(())
                } else {
                    Err(NachtError::invalid_params(kind.as_str(), "has no material to color"))
                }
            });
        Self {
            next_id: AtomicU64::new(1),
            updaters,
        }
    }

    /// Build an object from a complete params bag.
    pub fn build(&self, params: &State) -> Result<SceneObject> {
        let kind = Kind::of(params)?;
        let constructor = CONSTRUCTORS
            .iter()
            .find_map(|(k, f)| (*k == kind).then_some(*f))
            .ok_or_else(|| NachtError::internal(format!("no constructor for {kind}")))?;
        let node = constructor(self, params)?;
        let id = ObjectId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::trace!(%id, %kind, "built object");
        Ok(SceneObject::new(id, params.clone(), node))
    }

    /// Build a nested object from a params value, requiring one of `allowed`.
    fn build_nested(
        &self,
        value: &Value,
        parent: Kind,
        allowed: fn(Kind) -> bool,
    ) -> Result<SceneObject> {
        let params = State::from_value(value.clone())?;
        let kind = Kind::of(&params)?;
        if !allowed(kind) {
            return Err(NachtError::invalid_params(
                parent.as_str(),
                format!("{kind} cannot be nested here"),
            ));
        }
        self.build(&params)
    }

    fn build_children(&self, children: &[Value]) -> Result<Vec<SceneObject>> {
        children
            .iter()
            .map(|child| self.build(&State::from_value(child.clone())?))
            .collect()
    }

    fn build_mesh(&self, params: &State) -> Result<Node> {
        let p: MeshParams = parse(Kind::Mesh, params)?;
        let geometry = p
            .geometry
            .as_ref()
            .map(|g| self.build_nested(g, Kind::Mesh, Kind::is_geometry))
            .transpose()?;
        let mut material = p
            .material
            .as_ref()
            .map(|m| self.build_nested(m, Kind::Mesh, |k| k == Kind::Material))
            .transpose()?;
        if let (Some(color), Some(material)) = (p.color, material.as_mut()) {
            material.set_color(color);
        }
        Ok(Node::Mesh(Mesh {
            geometry: geometry.map(Box::new),
            material: material.map(Box::new),
            position: p.position,
            children: self.build_children(&p.children)?,
        }))
    }

    fn build_cube(&self, params: &State) -> Result<Node> {
        let p: CubeParams = parse(Kind::Cube, params)?;
        Ok(Node::Cube(BoxGeometry { size: p.size }))
    }

    fn build_sphere(&self, params: &State) -> Result<Node> {
        let p: SphereParams = parse(Kind::Sphere, params)?;
        Ok(Node::Sphere(SphereGeometry {
            radius: p.radius,
            width_segments: p.width_segments,
            height_segments: p.height_segments,
        }))
    }

    fn build_material(&self, params: &State) -> Result<Node> {
        let p: MaterialParams = parse(Kind::Material, params)?;
        Ok(Node::Material(Material {
            material_kind: p.material_kind,
            color: p.color,
        }))
    }

    fn build_scene(&self, params: &State) -> Result<Node> {
        let p: SceneParams = parse(Kind::Scene, params)?;
        Ok(Node::Scene(Scene {
            position: p.position,
            children: self.build_children(&p.children)?,
        }))
    }

    fn build_camera(&self, params: &State) -> Result<Node> {
        let p: CameraParams = parse(Kind::Camera, params)?;
        Ok(Node::Camera(Camera {
            fov: p.fov,
            aspect: p.aspect,
            near: p.near,
            far: p.far,
            position: p.position,
            children: self.build_children(&p.children)?,
        }))
    }

    fn build_renderer(&self, params: &State) -> Result<Node> {
        let p: RendererParams = parse(Kind::Renderer, params)?;
        Ok(Node::Renderer(Renderer {
            width: p.width,
            height: p.height,
            antialias: p.antialias,
        }))
    }
}

impl ObjectController for SceneController {
    type Object = SceneObject;

    fn create(&self, params: &State, previous: Option<&SceneObject>) -> Result<SceneObject> {
        match previous {
            Some(previous) => {
                let mut merged = previous.params().clone();
                merged.merge_state(params);
                self.build(&merged)
            }
            None => self.build(params),
        }
    }

    fn get_params(&self, object: &SceneObject) -> State {
        object.params().clone()
    }

    fn updaters(&self) -> &UpdaterTable<SceneObject> {
        &self.updaters
    }

    fn after_update(&self, object: &mut SceneObject, patch: &Patch) {
        object.record(patch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MaterialKind;
    use nacht_core::Applied;
    use serde_json::json;

    fn state(value: Value) -> State {
        State::from_value(value).unwrap()
    }

    #[test]
    fn test_every_kind_has_a_constructor() {
        for kind in Kind::ALL {
            assert_eq!(CONSTRUCTORS.iter().filter(|(k, _)| *k == kind).count(), 1);
        }
    }

    #[test]
    fn test_builds_mesh_with_nested_parts() {
        let controller = SceneController::new();
        let object = controller
            .build(&state(json!({
                "kind": "mesh",
                "geometry": {"kind": "sphere", "radius": 2},
                "material": {"kind": "material", "materialKind": "lambert", "color": [0, 1, 0]},
                "position": [1, 2, 3],
            })))
            .unwrap();

        assert_eq!(object.kind(), Kind::Mesh);
        assert_eq!(object.position(), Some([1.0, 2.0, 3.0]));
        assert_eq!(object.color(), Some([0.0, 1.0, 0.0]));
        let Node::Mesh(mesh) = object.node() else {
            panic!("expected mesh");
        };
        let Node::Sphere(sphere) = mesh.geometry.as_ref().unwrap().node() else {
            panic!("expected sphere");
        };
        assert_eq!(sphere.radius, 2.0);
        assert_eq!(sphere.width_segments, 32);
        let Node::Material(material) = mesh.material.as_ref().unwrap().node() else {
            panic!("expected material");
        };
        assert_eq!(material.material_kind, MaterialKind::Lambert);
    }

    #[test]
    fn test_geometry_slot_rejects_other_kinds() {
        let controller = SceneController::new();
        let err = controller
            .build(&state(json!({
                "kind": "mesh",
                "geometry": {"kind": "camera"},
            })))
            .unwrap_err();
        assert!(matches!(err, NachtError::InvalidParams { ref kind, .. } if kind == "mesh"));
    }

    #[test]
    fn test_ids_are_fresh_per_build() {
        let controller = SceneController::new();
        let params = state(json!({"kind": "cube"}));
        let a = controller.build(&params).unwrap();
        let b = controller.build(&params).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_position_updates_in_place() {
        let controller = SceneController::new();
        let params = state(json!({"kind": "camera", "fov": 45}));
        let mut camera = controller.create(&params, None).unwrap();
        let id = camera.id();

        let patch = Patch::new().with("position", json!([0, 0, 10]));
        let mut full = params.clone();
        full.merge(&patch);
        let applied = controller.apply(&mut camera, &patch, &full).unwrap();

        assert_eq!(applied, Applied::InPlace);
        assert_eq!(camera.id(), id);
        assert_eq!(camera.position(), Some([0.0, 0.0, 10.0]));
        assert_eq!(controller.get_params(&camera), full);
    }

    #[test]
    fn test_position_on_geometry_is_rejected() {
        let controller = SceneController::new();
        let mut cube = controller.build(&state(json!({"kind": "cube"}))).unwrap();
        let patch = Patch::new().with("position", json!([1, 1, 1]));
        let err = controller
            .apply(&mut cube, &patch, &State::new())
            .unwrap_err();
        assert_eq!(err, NachtError::invalid_params("cube", "has no position"));
    }

    #[test]
    fn test_recreation_merges_recorded_params() {
        let controller = SceneController::new();
        let sphere = controller
            .build(&state(json!({"kind": "sphere", "radius": 3})))
            .unwrap();
        let rebuilt = controller
            .create(&state(json!({"widthSegments": 8})), Some(&sphere))
            .unwrap();

        let Node::Sphere(geometry) = rebuilt.node() else {
            panic!("expected sphere");
        };
        assert_eq!(geometry.radius, 3.0);
        assert_eq!(geometry.width_segments, 8);
        assert_ne!(rebuilt.id(), sphere.id());
    }
}
