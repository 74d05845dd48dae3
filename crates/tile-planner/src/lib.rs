// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tile-planner
//!
//! Partitions the output of an element-wise expression into linear tiles
//! and groups the tiles into tasks.
//!
//! There are three levels of work:
//!
//! | Level | Unit | Consumer |
//! |---|---|---|
//! | Tile | contiguous slice of one sample, at most `tile_size` elements | a kernel's inner loop |
//! | Task | consecutive tiles, at most `tiles_per_task` | one thread-pool job or one kernel launch |
//! | Cover | all tasks for the batch | the dispatcher |
//!
//! Tiling is purely algorithmic (no I/O, no allocation of tensor data),
//! which keeps it trivially unit-testable and amenable to property-based
//! testing.
//!
//! # Example
//! ```
//! use tensor_meta::{Shape, ShapeList};
//! use tile_planner::{plan_cover, Backend, TilingConfig};
//!
//! let shapes = ShapeList::uniform(8, Shape::new(vec![480, 640, 3]));
//! let cover = plan_cover(&shapes, TilingConfig::for_backend(Backend::Gpu)).unwrap();
//! assert_eq!(cover.num_tasks(), 1);
//! println!("{}", cover.summary());
//! ```

mod config;
mod cover;
mod error;
mod tile;

pub use config::{Backend, TilingConfig};
pub use cover::{get_tiled_cover, TileCover};
pub use error::PlannerError;
pub use tile::{TileDesc, TileRange};

/// Builds the cover for `shapes` with a backend's tiling constants.
pub fn plan_cover(
    shapes: &tensor_meta::ShapeList,
    config: TilingConfig,
) -> Result<TileCover, PlannerError> {
    get_tiled_cover(shapes, config.tile_size, config.tiles_per_task)
}
