//! # Nacht Core - Reconciliation Engine
//!
//! **Purpose**: Keep an externally owned object in step with a declarative
//! description of it.
//!
//! Callers describe the state they want as a bag of params. Values may be
//! plain literals, derivations of the previous value, or asynchronous streams
//! that keep delivering values over time (animations, live feeds). The
//! manager resolves each request into concrete patches and applies them one
//! at a time, patching the object in place where possible and rebuilding it
//! from the full accumulated state where not.
//!
//! ## Core Concepts
//!
//! - **Params / Patch / State**: requested values, resolved partial updates,
//!   and the cumulative merge of every applied patch
//! - **Resolver**: expands a request into an ordered lazy sequence of patches
//! - **ObjectController**: boundary to the library owning concrete objects;
//!   decides in-place update versus recreation per patch
//! - **Entity / StateManager**: per-object lifecycle, atomic patch
//!   application, cancellable background consumption of producers
//! - **Selector**: path-based handle to a nested object, re-resolved on
//!   every use
//!
//! ## What's NOT in this crate
//!
//! - Building any concrete object kind (see `nacht-scene`)
//! - Rendering, frame scheduling, persistence
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::stream;
//! use nacht_core::{DetachedManager, Params};
//!
//! let manager = DetachedManager::detached();
//! let entity = manager.create(Params::new().set("counter", 100))?;
//! manager.update(&entity, Params::new().derive("counter", |prev| {
//!     serde_json::json!(prev.and_then(|v| v.as_i64()).unwrap_or(0) + 123)
//! }))?;
//! assert_eq!(entity.get("counter"), Some(serde_json::json!(223)));
//!
//! manager.update(&entity, Params::new().stream("counter", stream::iter(vec![1, 2, 3])))?;
//! entity.settle().await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Manager configuration
pub mod config;

/// Object controller interface
pub mod controller;

/// Entities and their lifecycle
pub mod entity;

/// Unified error types
pub mod errors;

/// Path-based selectors
pub mod locator;

/// Entity creation and update routing
pub mod manager;

/// Params, patches and state
pub mod params;

/// Value resolution
pub mod resolver;

mod tasks;

pub use config::ManagerConfig;
pub use controller::{Applied, ObjectController, Updater, UpdaterTable};
pub use entity::{Entity, EntityId, ErrorHook};
pub use errors::{NachtError, Result};
pub use locator::{locate, locate_mut, SceneNode, Selector};
pub use manager::{DetachedManager, NoController, StateManager};
pub use params::{value_type_name, Derivation, ParamValue, Params, Patch, Producer, State};
pub use resolver::{resolve, KeyedProducer, Resolution};

// Re-export serde_json::Value for convenience
pub use serde_json::Value;
