//! # Nacht Scene - Reference Scene Graph
//!
//! An in-memory scene graph driven through `nacht-core`. It plays the part
//! a rendering library would: it owns concrete objects, knows how to build
//! each kind from params, and patches the few properties that can change
//! without a rebuild.
//!
//! ## Kinds
//!
//! `mesh`, `cube`, `sphere`, `material`, `scene`, `camera`, `renderer`.
//! A mesh builds its geometry and material from nested params bags; scenes,
//! meshes and cameras hold children reachable through selectors.
//!
//! ## In-place keys
//!
//! - `position` on meshes, scenes and cameras
//! - `color` on materials, and on meshes through their material
//!
//! Any other key rebuilds the object from its full params.
//!
//! # Example
//!
//! ```rust,ignore
//! use nacht_core::StateManager;
//! use nacht_scene::{builders, MaterialKind, SceneController};
//!
//! let manager = StateManager::new(SceneController::new());
//! let mesh = manager.create(builders::mesh(
//!     builders::cube([1.0, 1.0, 1.0]),
//!     builders::material(MaterialKind::Basic, [0.7, 0.2, 1.0]),
//!     [0.0, 0.0, 0.0],
//! ))?;
//! manager.update(&mesh, Params::new().set("position", [0.1, 0.0, 0.0]))?;
//! ```

#![deny(missing_docs)]
#![forbid(unsafe_code)]

/// Params builders for every kind
pub mod builders;

/// Scene controller and constructor table
pub mod controller;

/// Closed set of object kinds
pub mod kind;

/// Built objects
pub mod object;

/// Per-kind params schemas
pub mod schema;

pub use controller::SceneController;
pub use kind::Kind;
pub use object::{Node, ObjectId, SceneObject};
pub use schema::{MaterialKind, Vec3};

/// Manager specialised to the scene controller.
pub type SceneManager = nacht_core::StateManager<SceneController>;

/// Entity holding a scene object.
pub type SceneEntity = nacht_core::Entity<SceneController>;
