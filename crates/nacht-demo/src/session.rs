//! Demo sessions
//!
//! `run` animates a mesh through a producer and samples it once per frame;
//! `build` reconciles a single params bag read from JSON.

use std::fmt::Write as _;
use std::time::Duration;

use futures::StreamExt;
use nacht_core::{NachtError, Params, Producer, Result, SceneNode, Value};
use nacht_scene::builders::{camera, cube, material, mesh, renderer};
use nacht_scene::{MaterialKind, Node, SceneController, SceneEntity, SceneManager, SceneObject};

use crate::animation::staircase;
use crate::config::DemoConfig;

/// Outcome of [`run`].
#[derive(Debug)]
pub struct RunReport {
    /// Frames sampled
    pub frames: u32,
    /// Mesh position at the last frame
    pub final_position: Option<[f64; 3]>,
    /// Times the mesh object was built; 1 when every frame patched in place
    pub generation: u64,
    /// Patches merged into the mesh's state, initial build included
    pub patches_applied: u64,
    /// Background failures collected from the mesh
    pub errors: Vec<NachtError>,
}

/// Create a manager for the scene controller.
pub fn manager(config: &DemoConfig) -> Result<SceneManager> {
    SceneManager::new(SceneController::new()).with_config(config.manager.clone())
}

/// Animate a purple box for `config.frames` frames, calling `on_frame` with
/// the mesh each frame, then cancel the animation.
pub async fn run<F>(config: &DemoConfig, mut on_frame: F) -> Result<RunReport>
where
    F: FnMut(u32, &SceneObject),
{
    let manager = manager(config)?;
    let interval = Duration::from_millis(config.interval_ms);

    let output = manager.create(renderer(config.width, config.height, true))?;
    let eye = manager.create(camera(45.0, config.aspect(), [0.0, 0.0, 10.0]))?;
    let positions = staircase(config.step, interval).map(|p| p.to_vec());
    let subject = manager.create(mesh(
        cube([1.0, 1.0, 1.0]),
        material(MaterialKind::Basic, [0.7, 0.2, 1.0]),
        Producer::new(positions),
    ))?;
    tracing::info!(
        renderer = %output.id(),
        camera = %eye.id(),
        mesh = %subject.id(),
        frames = config.frames,
        "starting animation"
    );

    let mut ticker = tokio::time::interval(interval);
    for frame in 0..config.frames {
        ticker.tick().await;
        subject.with_object(|object| {
            if let Some(object) = object {
                on_frame(frame, object);
            }
        });
    }
    subject.cancel();

    let report = RunReport {
        frames: config.frames,
        final_position: subject.with_object(|o| o.and_then(SceneObject::position)),
        generation: subject.generation(),
        patches_applied: subject.patches_applied(),
        errors: subject.take_errors(),
    };
    tracing::info!(
        generation = report.generation,
        patches = report.patches_applied,
        "animation stopped"
    );
    Ok(report)
}

/// Reconcile one JSON params object into a new entity.
pub fn build(manager: &SceneManager, params: Value) -> Result<SceneEntity> {
    manager.create(Params::from_value(params)?)
}

/// Indented outline of an object, its mesh parts and its children.
pub fn describe(object: &SceneObject) -> String {
    let mut out = String::new();
    outline(object, 0, &mut out);
    out
}

fn outline(object: &SceneObject, depth: usize, out: &mut String) {
    let _ = writeln!(out, "{:indent$}{object}", "", indent = depth * 2);
    if let Node::Mesh(parts) = object.node() {
        for part in [&parts.geometry, &parts.material].into_iter().flatten() {
            outline(part, depth + 1, out);
        }
    }
    for child in object.children().unwrap_or_default() {
        outline(child, depth + 1, out);
    }
}
