// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-meta
//!
//! Metadata types shared by the expression planner.
//!
//! This crate provides:
//! - [`DType`]: the element types an expression operand can hold, with
//!   numeric promotion helpers.
//! - [`Shape`]: a single sample's dimensions.
//! - [`ShapeList`]: the per-sample shapes of a whole batch (a tensor list).
//! - [`TensorLayout`]: the axis-meaning string (`"HWC"`, `"CHW"`, ...).
//!
//! No tensor data lives here. The planner only reasons about metadata, so
//! everything in this crate is cheap to clone and compare.

mod dtype;
mod error;
mod layout;
mod shape;

pub use dtype::DType;
pub use error::MetaError;
pub use layout::TensorLayout;
pub use shape::{Shape, ShapeList};
