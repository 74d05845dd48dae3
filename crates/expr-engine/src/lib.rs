// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # expr-engine
//!
//! Plans element-wise arithmetic over batches of tensors.
//!
//! The engine takes:
//! - An expression tree from `expr-ir` (one function over tensor and
//!   constant operands).
//! - A [`Workspace`](expr_ir::Workspace) describing the bound inputs.
//! - A [`KernelFactory`] that turns operator signatures into kernels.
//!
//! And produces, per batch, the result type/shape/layout, a tile cover from
//! `tile-planner`, and per-tile argument locations that the kernels consume.
//!
//! # Two Phases
//! ```text
//! setup(&workspace) → OutputDesc     (shapes, tiles, kernels)
//! run()             → RunPlan        (per-tile argument locations)
//! dispatch(plan)    → DispatchMetrics
//! ```
//!
//! # Async Execution
//! CPU work units run on tokio's blocking pool, bounded by the configured
//! thread count. GPU kernels are issued in order on the caller's thread.

mod args;
mod cache;
mod config;
mod constants;
mod dispatch;
mod engine;
mod error;
mod metrics;
mod tasks;

pub use args::{transform_descs, ArgRef, ExtendedTileDesc, OutputRef};
pub use cache::{ExprImpl, ExprImplCache, KernelFactory, KernelKey};
pub use config::EngineConfig;
pub use constants::{ConstantClass, ConstantRef, ConstantStorage};
pub use engine::{ArithmeticEngine, KernelCall, OutputDesc, RunPlan, WorkUnit};
pub use error::{EngineError, KernelError};
pub use metrics::{DispatchMetrics, UnitMetrics};
pub use tasks::{create_execution_tasks, ExprImplContext, ExprImplTask};
