// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-sample shapes and batch shape lists.

use crate::MetaError;
use std::fmt;
use std::str::FromStr;

/// Describes the dimensionality of one sample.
///
/// Shapes are immutable once created and compare by exact dimension list,
/// so `[10, 20]` and `[20, 10]` are different shapes even though both hold
/// 200 elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_meta::Shape;
    /// let s = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(s.dims(), &[2, 3, 4]);
    /// assert_eq!(s.num_elements(), 24);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a scalar shape (rank 0).
    pub fn scalar() -> Self {
        Self { dims: vec![] }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Returns the total number of elements, or `None` if it does not fit
    /// in `usize`.
    ///
    /// For a scalar shape (rank 0), returns 1.
    pub fn checked_num_elements(&self) -> Option<usize> {
        if self.dims.contains(&0) {
            return Some(0);
        }
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Returns the total number of elements, saturating at `usize::MAX`.
    ///
    /// Shapes coming from outside should go through
    /// [`ShapeList::element_count`] first.
    pub fn num_elements(&self) -> usize {
        self.checked_num_elements().unwrap_or(usize::MAX)
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

impl FromStr for Shape {
    type Err = MetaError;

    /// Parses `"[10, 20]"`, `"10,20"` or `"[]"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s.trim().trim_start_matches('[').trim_end_matches(']').trim();
        if inner.is_empty() {
            return Ok(Shape::scalar());
        }
        let dims = inner
            .split(',')
            .map(|d| {
                d.trim().parse::<usize>().map_err(|e| MetaError::InvalidShape {
                    literal: s.to_string(),
                    detail: format!("bad extent '{}': {e}", d.trim()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Shape::new(dims))
    }
}

/// The per-sample shapes of a batch.
///
/// Each sample of a batch may have its own shape; a `ShapeList` keeps them
/// in sample order. Two lists are equal only when they have the same number
/// of samples and every sample shape matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ShapeList {
    samples: Vec<Shape>,
}

impl ShapeList {
    /// Creates a shape list from per-sample shapes.
    pub fn new(samples: Vec<Shape>) -> Self {
        Self { samples }
    }

    /// A batch of `num_samples` samples that all share `shape`.
    pub fn uniform(num_samples: usize, shape: Shape) -> Self {
        Self {
            samples: vec![shape; num_samples],
        }
    }

    /// The degenerate single-sample, single-element shape `{[1]}`.
    ///
    /// Used for constants and for expressions whose operands are all
    /// scalar-like.
    pub fn single_element() -> Self {
        Self {
            samples: vec![Shape::vector(1)],
        }
    }

    /// Number of samples in the batch.
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Returns the shape of one sample.
    pub fn sample(&self, index: usize) -> Option<&Shape> {
        self.samples.get(index)
    }

    /// Iterates over per-sample shapes in order.
    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.samples.iter()
    }

    /// Total number of elements across all samples, saturating at
    /// `usize::MAX`.
    pub fn num_elements(&self) -> usize {
        self.element_count().unwrap_or(usize::MAX)
    }

    /// Total number of elements across all samples.
    ///
    /// Fails when a sample's element count, or the batch total, overflows
    /// `usize`.
    pub fn element_count(&self) -> Result<usize, MetaError> {
        self.samples.iter().enumerate().try_fold(0usize, |total, (i, shape)| {
            shape
                .checked_num_elements()
                .and_then(|n| total.checked_add(n))
                .ok_or_else(|| MetaError::ElementCountOverflow {
                    shape: shape.to_string(),
                    sample: i,
                })
        })
    }

    /// Returns `true` when there is at least one sample and every sample
    /// holds exactly one element.
    ///
    /// Scalar-like operands broadcast against any other shape.
    pub fn is_scalar_like(&self) -> bool {
        !self.samples.is_empty() && self.samples.iter().all(|s| s.num_elements() == 1)
    }
}

impl fmt::Display for ShapeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, s) in self.samples.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{s}")?;
        }
        write!(f, "}}")
    }
}

impl From<Vec<Shape>> for ShapeList {
    fn from(samples: Vec<Shape>) -> Self {
        Self::new(samples)
    }
}

impl FromStr for ShapeList {
    type Err = MetaError;

    /// Parses semicolon-separated sample shapes, e.g. `"[200]; [10, 20]"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(';')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse::<Shape>)
            .collect::<Result<Vec<_>, _>>()
            .map(ShapeList::new)
    }
}
