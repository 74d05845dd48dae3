// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tiles and tile ranges: the two units of work assignment.

use std::ops::Range;

/// A contiguous linear slice of one sample's elements.
///
/// A tile never spans two samples. Its first element sits at
/// `extent_idx * tile_size` within the sample's flat buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TileDesc {
    /// Sample this tile belongs to.
    pub sample_idx: usize,
    /// Index of this tile within its sample.
    pub extent_idx: usize,
    /// Number of elements actually covered (`<= tile_size`).
    pub size: usize,
    /// Nominal tile size the cover was built with.
    pub tile_size: usize,
}

impl TileDesc {
    /// Offset of the tile's first element within its sample.
    pub fn offset(&self) -> usize {
        self.extent_idx * self.tile_size
    }

    /// Element range covered within the sample.
    pub fn element_range(&self) -> Range<usize> {
        let start = self.offset();
        start..start + self.size
    }

    /// Returns `true` when the tile is shorter than nominal (a sample tail).
    pub fn is_partial(&self) -> bool {
        self.size < self.tile_size
    }
}

/// A task's half-open range `[begin, end)` into the ordered tile list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TileRange {
    pub begin: usize,
    pub end: usize,
}

impl TileRange {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    /// Number of tiles in the range.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The range as a slice index.
    pub fn as_range(&self) -> Range<usize> {
        self.begin..self.end
    }
}
