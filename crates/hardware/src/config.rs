//! Configuration system for the multicore simulator.
//!
//! This module defines the configuration structures used to parameterize the
//! simulator. It provides:
//! 1. **Defaults:** Baseline timing constants of the modeled machine.
//! 2. **Structures:** Hierarchical config for the memory subsystem.
//!
//! Configuration is supplied as JSON (`Config::from_json`) or via
//! `Config::default()`. The machine geometry (cache, block, and memory sizes)
//! is fixed by the address-field widths and lives in `common::constants`.

use serde::Deserialize;

use crate::common::SimError;
use crate::common::constants::MEM_LATENCY;

/// Default configuration constants for the simulator.
mod defaults {
    /// Main-memory access latency in bus cycles; a block transfer served by
    /// memory takes this plus one cycle per block word.
    pub const MEM_LATENCY_CYCLES: u64 = super::MEM_LATENCY;
}

/// Main-memory timing configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Cycles between a request reaching memory and the first word of the
    /// block appearing on the bus.
    pub latency_cycles: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            latency_cycles: defaults::MEM_LATENCY_CYCLES,
        }
    }
}

/// Root configuration type.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Main-memory timing.
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses a configuration from a JSON document.
    ///
    /// Missing sections and fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] when the document is not valid JSON or a
    /// field has the wrong type.
    pub fn from_json(text: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(text)?)
    }
}
