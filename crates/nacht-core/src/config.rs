//! Manager configuration

use serde::{Deserialize, Serialize};

use crate::errors::{NachtError, Result};

/// Tuning for a [`StateManager`](crate::StateManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Cancel background producer consumption when the last handle to an
    /// entity is dropped.
    pub cancel_on_drop: bool,
    /// Number of background errors retained per entity. Oldest are
    /// discarded first; every error is logged regardless.
    pub error_buffer: usize,
    /// Emit a trace event for every applied patch.
    pub trace_patches: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            cancel_on_drop: true,
            error_buffer: 64,
            trace_patches: false,
        }
    }
}

impl ManagerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.error_buffer == 0 {
            return Err(NachtError::invalid("error_buffer cannot be 0"));
        }
        Ok(())
    }
}
