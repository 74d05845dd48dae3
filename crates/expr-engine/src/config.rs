// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Engine configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! backend = "cpu"
//! tile_size = 4096
//! tiles_per_task = 64
//! num_threads = 4
//! log_plan = true
//! ```
//!
//! `tile_size` and `tiles_per_task` are optional overrides of the backend's
//! tiling preset. An unbounded task size (the GPU default) is expressed by
//! leaving `tiles_per_task` unset.

use crate::EngineError;
use std::path::Path;
use tile_planner::{Backend, TilingConfig};

/// Configuration for an [`ArithmeticEngine`](crate::ArithmeticEngine).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Execution backend: `"cpu"` or `"gpu"`.
    #[serde(default)]
    pub backend: Backend,
    /// Override for the backend's nominal tile size, in elements.
    pub tile_size: Option<usize>,
    /// Override for the backend's maximum tiles per task.
    ///
    /// TOML integers are `i64`, so larger values are written as `i64::MAX`,
    /// which is just as unbounded for any batch.
    #[serde(serialize_with = "serialize_task_limit")]
    pub tiles_per_task: Option<usize>,
    /// Number of CPU worker threads (defaults to number of online CPU cores).
    pub num_threads: Option<usize>,
    /// Whether every setup logs the cover summary at `info` level.
    #[serde(default = "default_true")]
    pub log_plan: bool,
}

fn default_true() -> bool {
    true
}

fn serialize_task_limit<S: serde::Serializer>(
    value: &Option<usize>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::Serialize;
    value
        .map(|v| v.min(i64::MAX as usize))
        .serialize(serializer)
}

impl EngineConfig {
    /// Default configuration for `backend`.
    pub fn for_backend(backend: Backend) -> Self {
        Self {
            backend,
            ..Default::default()
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str)
            .map_err(|e| EngineError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self)
            .map_err(|e| EngineError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// The backend preset with any overrides applied.
    pub fn resolve_tiling(&self) -> Result<TilingConfig, EngineError> {
        let preset = TilingConfig::for_backend(self.backend);
        TilingConfig::new(
            self.tile_size.unwrap_or(preset.tile_size),
            self.tiles_per_task.unwrap_or(preset.tiles_per_task),
        )
        .map_err(|e| EngineError::ConfigError(format!("invalid tiling: {e}")))
    }

    /// Resolves the number of worker threads.
    pub fn resolve_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Cpu,
            tile_size: None,
            tiles_per_task: None,
            num_threads: None,
            log_plan: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = EngineConfig::default();
        assert_eq!(c.backend, Backend::Cpu);
        assert!(c.log_plan);
        assert_eq!(c.resolve_tiling().unwrap(), TilingConfig::cpu());
    }

    #[test]
    fn test_gpu_preset() {
        let c = EngineConfig::for_backend(Backend::Gpu);
        let tiling = c.resolve_tiling().unwrap();
        assert_eq!(tiling.tile_size, TilingConfig::GPU_TILE_SIZE);
        assert_eq!(tiling.tiles_per_task, usize::MAX);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
backend = "gpu"
tile_size = 1024
num_threads = 2
log_plan = false
"#;
        let c = EngineConfig::from_toml(toml).unwrap();
        assert_eq!(c.backend, Backend::Gpu);
        assert_eq!(c.tile_size, Some(1024));
        assert_eq!(c.tiles_per_task, None);
        assert_eq!(c.resolve_threads(), 2);
        assert!(!c.log_plan);

        let tiling = c.resolve_tiling().unwrap();
        assert_eq!(tiling.tile_size, 1024);
        assert_eq!(tiling.tiles_per_task, usize::MAX);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let c = EngineConfig::from_toml("").unwrap();
        assert_eq!(c, EngineConfig::default());
    }

    #[test]
    fn test_invalid_override() {
        let c = EngineConfig {
            tiles_per_task: Some(0),
            ..Default::default()
        };
        assert!(matches!(c.resolve_tiling(), Err(EngineError::ConfigError(_))));
    }

    #[test]
    fn test_bad_backend() {
        assert!(EngineConfig::from_toml("backend = \"tpu\"").is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let c = EngineConfig {
            backend: Backend::Gpu,
            tile_size: Some(8192),
            tiles_per_task: None,
            num_threads: Some(8),
            log_plan: false,
        };
        let toml_str = c.to_toml().unwrap();
        let c2 = EngineConfig::from_toml(&toml_str).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn test_unbounded_task_limit_serialises() {
        let c = EngineConfig {
            tiles_per_task: Some(usize::MAX),
            ..EngineConfig::for_backend(Backend::Cpu)
        };
        let toml_str = c.to_toml().unwrap();
        let back = EngineConfig::from_toml(&toml_str).unwrap();
        assert_eq!(back.tiles_per_task, Some(i64::MAX as usize));
        assert_eq!(back.backend, Backend::Cpu);
        assert_eq!(back.resolve_tiling().unwrap().tile_size, TilingConfig::CPU_TILE_SIZE);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "backend = \"cpu\"\ntiles_per_task = 8\n").unwrap();
        let c = EngineConfig::from_file(&path).unwrap();
        assert_eq!(c.resolve_tiling().unwrap().tiles_per_task, 8);

        let missing = EngineConfig::from_file(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(EngineError::ConfigError(_))));
    }
}
