// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tile cover: the output of the tile planner.
//!
//! A cover is the ordered list of [`TileDesc`]s spanning every sample of a
//! batch, plus the [`TileRange`]s that group consecutive tiles into tasks.
//! The cover is the contract between the planner and whatever dispatches
//! the work: each task processes exactly the tiles in its range.

use crate::{PlannerError, TileDesc, TileRange, TilingConfig};
use tensor_meta::ShapeList;

/// The tiles covering a batch and their grouping into tasks.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct TileCover {
    /// Tiles in (sample, extent) order.
    pub tiles: Vec<TileDesc>,
    /// Task ranges over `tiles`, in ascending order.
    pub ranges: Vec<TileRange>,
}

impl TileCover {
    /// Total number of tiles.
    pub fn num_tiles(&self) -> usize {
        self.tiles.len()
    }

    /// Total number of tasks.
    pub fn num_tasks(&self) -> usize {
        self.ranges.len()
    }

    /// Tiles owned by task `task`.
    pub fn task_tiles(&self, task: usize) -> Option<&[TileDesc]> {
        let range = self.ranges.get(task)?;
        self.tiles.get(range.as_range())
    }

    /// Total elements covered across all tiles.
    pub fn covered_elements(&self) -> usize {
        self.tiles.iter().map(|t| t.size).sum()
    }

    /// Validates the cover against the shapes it was built for.
    ///
    /// Checks:
    /// - Tiles appear in (sample, extent) order with no gaps in extents.
    /// - No tile is empty or larger than its nominal size.
    /// - Per sample, tile sizes sum to the sample's element count.
    /// - Ranges are non-empty, contiguous, ascending and cover every tile
    ///   exactly once.
    pub fn validate(&self, shapes: &ShapeList) -> Result<(), PlannerError> {
        let mut covered = vec![0usize; shapes.num_samples()];
        let mut prev: Option<&TileDesc> = None;

        for (i, tile) in self.tiles.iter().enumerate() {
            if tile.size == 0 || tile.size > tile.tile_size {
                return Err(PlannerError::CoverViolation(format!(
                    "tile {i} has size {} with nominal size {}",
                    tile.size, tile.tile_size,
                )));
            }
            let expected_extent = match prev {
                Some(p) if p.sample_idx == tile.sample_idx => p.extent_idx + 1,
                Some(p) if p.sample_idx > tile.sample_idx => {
                    return Err(PlannerError::CoverViolation(format!(
                        "tile {i} for sample {} follows sample {}",
                        tile.sample_idx, p.sample_idx,
                    )));
                }
                _ => 0,
            };
            if tile.extent_idx != expected_extent {
                return Err(PlannerError::CoverViolation(format!(
                    "tile {i} has extent {}, expected {expected_extent}",
                    tile.extent_idx,
                )));
            }
            let slot = covered.get_mut(tile.sample_idx).ok_or_else(|| {
                PlannerError::CoverViolation(format!(
                    "tile {i} references sample {} of {}",
                    tile.sample_idx,
                    shapes.num_samples(),
                ))
            })?;
            *slot += tile.size;
            prev = Some(tile);
        }

        for (sample, (got, shape)) in covered.iter().zip(shapes.iter()).enumerate() {
            if *got != shape.num_elements() {
                return Err(PlannerError::CoverViolation(format!(
                    "sample {sample} covers {got} of {} elements",
                    shape.num_elements(),
                )));
            }
        }

        let mut expected_begin = 0;
        for (task, range) in self.ranges.iter().enumerate() {
            if range.begin != expected_begin || range.is_empty() {
                return Err(PlannerError::CoverViolation(format!(
                    "task {task} has range [{}, {}), expected to start at {expected_begin}",
                    range.begin, range.end,
                )));
            }
            expected_begin = range.end;
        }
        if expected_begin != self.tiles.len() {
            return Err(PlannerError::CoverViolation(format!(
                "tasks cover {expected_begin} of {} tiles",
                self.tiles.len(),
            )));
        }

        Ok(())
    }

    /// Returns a human-readable summary of the cover.
    pub fn summary(&self) -> String {
        let partial = self.tiles.iter().filter(|t| t.is_partial()).count();
        let tile_size = self.tiles.first().map_or(0, |t| t.tile_size);
        let largest_task = self.ranges.iter().map(TileRange::len).max().unwrap_or(0);
        format!(
            "Cover: {} tiles of {} elements ({} partial), {} elements total, \
             {} tasks (largest {} tiles)",
            self.num_tiles(),
            tile_size,
            partial,
            self.covered_elements(),
            self.num_tasks(),
            largest_task,
        )
    }
}

/// Builder helper for constructing a `TileCover` incrementally.
pub(crate) struct CoverBuilder {
    tile_size: usize,
    tiles: Vec<TileDesc>,
}

impl CoverBuilder {
    pub fn new(tile_size: usize) -> Self {
        Self {
            tile_size,
            tiles: Vec::new(),
        }
    }

    /// Emits the tiles for one sample of `elements` elements.
    pub fn add_sample(&mut self, sample_idx: usize, elements: usize) {
        let mut covered = 0;
        let mut extent_idx = 0;
        while covered < elements {
            let size = self.tile_size.min(elements - covered);
            self.tiles.push(TileDesc {
                sample_idx,
                extent_idx,
                size,
                tile_size: self.tile_size,
            });
            covered += size;
            extent_idx += 1;
        }
    }

    /// Groups the tiles into tasks and returns the finished cover.
    pub fn build(self, tiles_per_task: usize) -> TileCover {
        let num_tiles = self.tiles.len();
        let num_tasks = num_tiles.div_ceil(tiles_per_task);
        let mut ranges = Vec::with_capacity(num_tasks);
        let mut begin = 0;
        while begin < num_tiles {
            let end = begin + tiles_per_task.min(num_tiles - begin);
            ranges.push(TileRange::new(begin, end));
            begin = end;
        }
        TileCover {
            tiles: self.tiles,
            ranges,
        }
    }
}

/// Divides every sample into linear tiles and groups them into tasks.
///
/// Each sample is cut into consecutive tiles of `tile_size` elements, the
/// last one taking the remainder. Tiles are then grouped, in order, into
/// tasks of at most `tiles_per_task` tiles.
///
/// # Example
/// ```
/// use tensor_meta::{Shape, ShapeList};
/// use tile_planner::get_tiled_cover;
///
/// let shapes = ShapeList::new(vec![Shape::vector(200)]);
/// let cover = get_tiled_cover(&shapes, 128, 64).unwrap();
/// assert_eq!(cover.tiles.iter().map(|t| t.size).collect::<Vec<_>>(), vec![128, 72]);
/// assert_eq!(cover.num_tasks(), 1);
/// ```
pub fn get_tiled_cover(
    shapes: &ShapeList,
    tile_size: usize,
    tiles_per_task: usize,
) -> Result<TileCover, PlannerError> {
    TilingConfig::new(tile_size, tiles_per_task)?;
    shapes.element_count()?;

    let mut builder = CoverBuilder::new(tile_size);
    for (sample_idx, shape) in shapes.iter().enumerate() {
        builder.add_sample(sample_idx, shape.num_elements());
    }
    let cover = builder.build(tiles_per_task);

    tracing::debug!(
        "tiled {} samples into {} tiles / {} tasks (tile_size={tile_size}, tiles_per_task={tiles_per_task})",
        shapes.num_samples(),
        cover.num_tiles(),
        cover.num_tasks(),
    );
    Ok(cover)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_meta::Shape;

    fn shapes(dims: &[&[usize]]) -> ShapeList {
        ShapeList::new(dims.iter().map(|d| Shape::new(d.to_vec())).collect())
    }

    #[test]
    fn test_remainder_tile() {
        let s = shapes(&[&[200]]);
        let cover = get_tiled_cover(&s, 128, 64).unwrap();
        assert_eq!(cover.num_tiles(), 2);
        assert_eq!(cover.tiles[0].size, 128);
        assert_eq!(cover.tiles[1].size, 72);
        assert_eq!(cover.tiles[1].extent_idx, 1);
        assert_eq!(cover.ranges, vec![TileRange::new(0, 2)]);
        cover.validate(&s).unwrap();
    }

    #[test]
    fn test_tiles_never_straddle_samples() {
        let s = shapes(&[&[5], &[3], &[4]]);
        let cover = get_tiled_cover(&s, 4, 2).unwrap();
        let layout: Vec<(usize, usize, usize)> = cover
            .tiles
            .iter()
            .map(|t| (t.sample_idx, t.extent_idx, t.size))
            .collect();
        assert_eq!(
            layout,
            vec![(0, 0, 4), (0, 1, 1), (1, 0, 3), (2, 0, 4)]
        );
        assert_eq!(cover.ranges, vec![TileRange::new(0, 2), TileRange::new(2, 4)]);
        cover.validate(&s).unwrap();
    }

    #[test]
    fn test_last_task_may_be_short() {
        let s = shapes(&[&[10, 10]]);
        let cover = get_tiled_cover(&s, 10, 3).unwrap();
        assert_eq!(cover.num_tiles(), 10);
        assert_eq!(cover.num_tasks(), 4);
        assert_eq!(cover.ranges[3], TileRange::new(9, 10));
        assert_eq!(cover.task_tiles(3).unwrap().len(), 1);
        assert!(cover.task_tiles(4).is_none());
    }

    #[test]
    fn test_unbounded_tasks_collapse() {
        let s = shapes(&[&[100_000], &[50_000]]);
        let cover = get_tiled_cover(&s, 16384, usize::MAX).unwrap();
        assert_eq!(cover.num_tasks(), 1);
        assert_eq!(cover.ranges[0], TileRange::new(0, cover.num_tiles()));
        assert_eq!(cover.covered_elements(), 150_000);
    }

    #[test]
    fn test_empty_samples() {
        let s = shapes(&[&[0, 4], &[6]]);
        let cover = get_tiled_cover(&s, 4, 8).unwrap();
        assert_eq!(cover.num_tiles(), 2);
        assert!(cover.tiles.iter().all(|t| t.sample_idx == 1));
        cover.validate(&s).unwrap();

        let none = get_tiled_cover(&ShapeList::default(), 4, 8).unwrap();
        assert_eq!(none.num_tiles(), 0);
        assert_eq!(none.num_tasks(), 0);
        none.validate(&ShapeList::default()).unwrap();
    }

    #[test]
    fn test_invalid_tiling() {
        let s = shapes(&[&[8]]);
        assert!(matches!(
            get_tiled_cover(&s, 0, 8),
            Err(PlannerError::InvalidTiling { .. })
        ));
        assert!(get_tiled_cover(&s, 8, 0).is_err());
    }

    #[test]
    fn test_overflowing_shapes_rejected_before_tiling() {
        let s = shapes(&[&[4], &[1 << 33, 1 << 33]]);
        let err = get_tiled_cover(&s, 4096, 64).unwrap_err();
        assert!(matches!(err, PlannerError::Shape(_)));
        assert!(err.to_string().contains("sample 1"));
    }

    #[test]
    fn test_validate_detects_gap() {
        let s = shapes(&[&[8]]);
        let mut cover = get_tiled_cover(&s, 4, 1).unwrap();
        cover.ranges[1] = TileRange::new(2, 2);
        assert!(cover.validate(&s).is_err());
    }

    #[test]
    fn test_validate_detects_undercover() {
        let s = shapes(&[&[8]]);
        let mut cover = get_tiled_cover(&s, 4, 4).unwrap();
        cover.tiles[1].size = 3;
        let err = cover.validate(&s).unwrap_err();
        assert!(err.to_string().contains("covers 7 of 8"));
    }

    #[test]
    fn test_validate_detects_reordering() {
        let s = shapes(&[&[4], &[4]]);
        let mut cover = get_tiled_cover(&s, 4, 4).unwrap();
        cover.tiles.swap(0, 1);
        assert!(cover.validate(&s).is_err());
    }

    #[test]
    fn test_summary() {
        let s = shapes(&[&[200]]);
        let summary = get_tiled_cover(&s, 128, 64).unwrap().summary();
        assert!(summary.contains("2 tiles"));
        assert!(summary.contains("1 partial"));
        assert!(summary.contains("1 tasks"));
    }
}
