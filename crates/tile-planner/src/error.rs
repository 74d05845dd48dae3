// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the tile planner.

/// Errors that can occur during tile partitioning.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// A tiling parameter is zero.
    #[error("invalid tiling: tile_size={tile_size}, tiles_per_task={tiles_per_task} (both must be positive)")]
    InvalidTiling {
        tile_size: usize,
        tiles_per_task: usize,
    },

    /// A tile cover does not satisfy its coverage or partition invariants.
    #[error("invalid tile cover: {0}")]
    CoverViolation(String),

    /// The batch holds more elements than can be addressed.
    #[error("cannot tile batch: {0}")]
    Shape(#[from] tensor_meta::MetaError),

    /// The backend name is not recognised.
    #[error("unknown backend '{0}'; expected 'cpu' or 'gpu'")]
    UnknownBackend(String),
}
