// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Backend selection and per-backend tiling constants.
//!
//! | Backend | `tile_size` | `tiles_per_task` | Effect |
//! |---|---|---|---|
//! | CPU | 4096 | 64 | many balanced tasks for a thread pool, small working set |
//! | GPU | 16384 | unbounded | one task, one launch per function node |

use crate::PlannerError;
use std::fmt;
use std::str::FromStr;

/// Where the planned work will run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Host thread pool.
    #[default]
    Cpu,
    /// Device stream.
    Gpu,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Cpu => "cpu",
            Backend::Gpu => "gpu",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" | "host" => Ok(Backend::Cpu),
            "gpu" | "cuda" | "device" => Ok(Backend::Gpu),
            other => Err(PlannerError::UnknownBackend(other.to_string())),
        }
    }
}

/// Tile size and task grouping for one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TilingConfig {
    /// Elements per tile.
    pub tile_size: usize,
    /// Maximum tiles grouped into one task.
    pub tiles_per_task: usize,
}

impl TilingConfig {
    /// Host defaults: small tiles bound the per-task working set.
    pub const CPU_TILE_SIZE: usize = 4096;
    /// Host defaults: tens of tiles per task keep the pool balanced.
    pub const CPU_TILES_PER_TASK: usize = 64;
    /// Device defaults: large tiles amortise per-invocation overhead.
    pub const GPU_TILE_SIZE: usize = 16384;

    /// Creates a config, rejecting zero parameters.
    pub fn new(tile_size: usize, tiles_per_task: usize) -> Result<Self, PlannerError> {
        let config = Self {
            tile_size,
            tiles_per_task,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn cpu() -> Self {
        Self {
            tile_size: Self::CPU_TILE_SIZE,
            tiles_per_task: Self::CPU_TILES_PER_TASK,
        }
    }

    /// The whole cover collapses into a single task.
    pub fn gpu() -> Self {
        Self {
            tile_size: Self::GPU_TILE_SIZE,
            tiles_per_task: usize::MAX,
        }
    }

    pub fn for_backend(backend: Backend) -> Self {
        match backend {
            Backend::Cpu => Self::cpu(),
            Backend::Gpu => Self::gpu(),
        }
    }

    /// Checks that both parameters are positive.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.tile_size == 0 || self.tiles_per_task == 0 {
            return Err(PlannerError::InvalidTiling {
                tile_size: self.tile_size,
                tiles_per_task: self.tiles_per_task,
            });
        }
        Ok(())
    }
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self::cpu()
    }
}
