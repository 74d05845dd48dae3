// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Property-based tests for tile covers.
//!
//! For arbitrary batches and tiling parameters, a cover must:
//! - sum each sample's tile sizes to its element count,
//! - never exceed the nominal tile size or mix samples within a tile,
//! - partition the tile list into in-order, gap-free task ranges.

use proptest::prelude::*;
use tensor_meta::{Shape, ShapeList};
use tile_planner::get_tiled_cover;

/// Generate a batch of 0..6 samples, each of rank 0..=3 with small extents.
fn arb_shapes() -> impl Strategy<Value = ShapeList> {
    prop::collection::vec(prop::collection::vec(0usize..40, 0..=3), 0..6)
        .prop_map(|samples| ShapeList::new(samples.into_iter().map(Shape::new).collect()))
}

proptest! {
    #[test]
    fn prop_tiles_cover_each_sample(
        shapes in arb_shapes(),
        tile_size in 1usize..300,
        tiles_per_task in 1usize..20,
    ) {
        let cover = get_tiled_cover(&shapes, tile_size, tiles_per_task).unwrap();

        let mut per_sample = vec![0usize; shapes.num_samples()];
        for tile in &cover.tiles {
            prop_assert!(tile.size >= 1 && tile.size <= tile_size);
            prop_assert_eq!(tile.tile_size, tile_size);
            per_sample[tile.sample_idx] += tile.size;
        }
        for (got, shape) in per_sample.iter().zip(shapes.iter()) {
            prop_assert_eq!(*got, shape.num_elements());
        }
        prop_assert!(cover.validate(&shapes).is_ok());
    }

    #[test]
    fn prop_task_ranges_partition_tiles(
        shapes in arb_shapes(),
        tile_size in 1usize..64,
        tiles_per_task in 1usize..10,
    ) {
        let cover = get_tiled_cover(&shapes, tile_size, tiles_per_task).unwrap();

        let concatenated: Vec<usize> = cover
            .ranges
            .iter()
            .flat_map(|r| r.as_range())
            .collect();
        let expected: Vec<usize> = (0..cover.num_tiles()).collect();
        prop_assert_eq!(concatenated, expected);

        for (i, range) in cover.ranges.iter().enumerate() {
            prop_assert!(range.len() <= tiles_per_task);
            if i + 1 < cover.ranges.len() {
                prop_assert_eq!(range.len(), tiles_per_task);
            }
        }
    }

    #[test]
    fn prop_cover_is_deterministic(shapes in arb_shapes(), tile_size in 1usize..100) {
        let a = get_tiled_cover(&shapes, tile_size, 4).unwrap();
        let b = get_tiled_cover(&shapes, tile_size, 4).unwrap();
        prop_assert_eq!(a, b);
    }
}
