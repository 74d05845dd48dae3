// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Axis layout descriptors.

use std::fmt;

/// A string naming the meaning of each tensor axis, e.g. `"HWC"`.
///
/// The empty layout means "don't care" and is compatible with any other
/// layout. Layouts are only compared, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct TensorLayout(String);

impl TensorLayout {
    /// Creates a layout from its axis string.
    pub fn new(axes: impl Into<String>) -> Self {
        Self(axes.into())
    }

    /// The empty ("don't care") layout.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Returns `true` for the "don't care" layout.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the axis string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two layouts are compatible when either is empty or both are equal.
    pub fn is_compatible(&self, other: &TensorLayout) -> bool {
        self.is_empty() || other.is_empty() || self == other
    }
}

impl fmt::Display for TensorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TensorLayout {
    fn from(axes: &str) -> Self {
        Self::new(axes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_compatible_with_anything() {
        let hwc = TensorLayout::from("HWC");
        assert!(TensorLayout::empty().is_compatible(&hwc));
        assert!(hwc.is_compatible(&TensorLayout::empty()));
        assert!(hwc.is_compatible(&TensorLayout::new("HWC")));
        assert!(!hwc.is_compatible(&TensorLayout::new("CHW")));
    }

    #[test]
    fn test_display() {
        assert_eq!(TensorLayout::from("NHWC").to_string(), "NHWC");
        assert_eq!(TensorLayout::default().as_str(), "");
    }
}
