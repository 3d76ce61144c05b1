//! Demo configuration
//!
//! Layered: defaults, then the TOML file (if present), then `NACHT_*`
//! environment variables, then command-line flags.

use std::path::Path;
use std::str::FromStr;

use nacht_core::{ManagerConfig, NachtError, Result};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "NACHT_";

/// Settings for the `nacht` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Frames rendered by `nacht run`
    pub frames: u32,
    /// Milliseconds between frames
    pub interval_ms: u64,
    /// Distance the mesh moves per animation step
    pub step: f64,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Settings handed to the state manager
    pub manager: ManagerConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 20,
            interval_ms: 16,
            step: 0.1,
            width: 640,
            height: 480,
            manager: ManagerConfig::default(),
        }
    }
}

impl DemoConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            NachtError::internal(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| NachtError::invalid(format!("Invalid config {}: {e}", path.display())))
    }

    /// Apply `NACHT_*` variables from the process environment.
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `NACHT_*` overrides from `vars`; other variables are ignored.
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "FRAMES" => self.frames = parse_var(&key, &value)?,
                "INTERVAL_MS" => self.interval_ms = parse_var(&key, &value)?,
                "STEP" => self.step = parse_var(&key, &value)?,
                "WIDTH" => self.width = parse_var(&key, &value)?,
                "HEIGHT" => self.height = parse_var(&key, &value)?,
                "CANCEL_ON_DROP" => self.manager.cancel_on_drop = parse_var(&key, &value)?,
                "ERROR_BUFFER" => self.manager.error_buffer = parse_var(&key, &value)?,
                "TRACE_PATCHES" => self.manager.trace_patches = parse_var(&key, &value)?,
                _ => tracing::debug!(%key, "ignoring unknown variable"),
            }
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.frames == 0 {
            return Err(NachtError::invalid("frames must be at least 1"));
        }
        if self.interval_ms == 0 {
            return Err(NachtError::invalid("interval_ms cannot be 0"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(NachtError::invalid("output size cannot be empty"));
        }
        if !self.step.is_finite() {
            return Err(NachtError::invalid("step must be finite"));
        }
        self.manager.validate()
    }

    /// Width over height.
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| NachtError::invalid(format!("{key}={value}: {e}")))
}
