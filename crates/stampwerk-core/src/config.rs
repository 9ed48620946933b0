// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StampwerkError};
use crate::types::{ExecutionStrategy, Rgb};

/// Environment variable naming a settings file.
pub const CONFIG_ENV_VAR: &str = "STAMPWERK_CONFIG";

/// Persistent tool settings. Every field has a default so a partial JSON file
/// is enough.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StampwerkConfig {
    /// Standard font used when a text edit names none.
    pub default_font: String,
    /// Font size in points used when a text edit gives none.
    pub default_font_size: f32,
    /// Text colour used when a text edit gives none.
    pub default_color: Rgb,
    /// File-name glob for batch discovery when `--pattern` is not given.
    pub batch_pattern: String,
    /// Scheduling used by `batch-modify` when `--parallel` is not given.
    pub default_strategy: ExecutionStrategy,
    /// Run the file safety validator on every batch input before opening it.
    pub validate_batch_inputs: bool,
    /// Files larger than this are rejected by the safety validator.
    pub max_file_size_bytes: u64,
}

impl Default for StampwerkConfig {
    fn default() -> Self {
        Self {
            default_font: "Helvetica".into(),
            default_font_size: 12.0,
            default_color: Rgb::BLACK,
            batch_pattern: "*.pdf".into(),
            default_strategy: ExecutionStrategy::Sequential,
            validate_batch_inputs: false,
            max_file_size_bytes: 200 * 1024 * 1024,
        }
    }
}

impl StampwerkConfig {
    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StampwerkError::ConfigParseError(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            StampwerkError::ConfigParseError(format!("{}: {e}", path.display()))
        })
    }

    /// Load from an explicit path, else from `STAMPWERK_CONFIG`, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
