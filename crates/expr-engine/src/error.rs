// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the expression engine.

/// A failure reported by a kernel implementation or kernel factory.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct KernelError(pub String);

/// Errors that can occur while setting up or running an expression.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The expression tree failed validation or inference.
    #[error("expression error: {0}")]
    Expr(#[from] expr_ir::ExprError),

    /// The tile planner rejected the output shape or tiling.
    #[error("planner error: {0}")]
    Planner(#[from] tile_planner::PlannerError),

    /// Constant indices do not line up with the constant nodes of the tree.
    #[error(
        "{class} constant index {index} does not fit the {count} {class} constant node(s) \
         in the tree (indices must be unique and dense)"
    )]
    ConstantCountMismatch {
        class: &'static str,
        index: usize,
        count: usize,
    },

    /// A kernel could not be created or failed while executing.
    #[error("kernel error in '{op}': {source}")]
    Kernel {
        op: String,
        #[source]
        source: KernelError,
    },

    /// `run` or `dispatch` was called before a successful `setup`.
    #[error("engine has not been set up for the current batch")]
    NotSetUp,

    /// Dispatching work to the backend failed.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
