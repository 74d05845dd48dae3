// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor metadata.

/// Errors that can occur when parsing or combining tensor metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// The given name does not denote a supported element type.
    #[error("unknown dtype '{0}'; expected one of u8, u16, u32, u64, i8, i16, i32, i64, f16, bf16, f32, f64")]
    UnknownDType(String),

    /// A shape literal could not be parsed.
    #[error("invalid shape literal '{literal}': {detail}")]
    InvalidShape { literal: String, detail: String },

    /// A sample's element count, or the batch total, does not fit in `usize`.
    #[error("element count of sample {sample} with shape {shape} overflows")]
    ElementCountOverflow { shape: String, sample: usize },
}
