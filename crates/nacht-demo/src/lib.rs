//! Nacht demo host
//!
//! Library half of the `nacht` binary: layered configuration, position
//! animations, and the `run` / `build` sessions the CLI dispatches to.

#![deny(missing_docs)]

pub mod animation;
pub mod config;
pub mod session;

pub use config::DemoConfig;
pub use session::{describe, RunReport};
