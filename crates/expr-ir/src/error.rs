// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for expression-tree construction and inference.

use tensor_meta::{ShapeList, TensorLayout};

/// Errors that can occur while validating or inferring an expression tree.
#[derive(Debug, thiserror::Error)]
pub enum ExprError {
    /// A function node has a subexpression count outside `{1, 2}`.
    #[error("only unary and binary expressions are supported: operator '{op}' has {count} subexpressions")]
    Arity { op: String, count: usize },

    /// The operator name is not a known arithmetic operator.
    #[error("unknown arithmetic operator '{0}'")]
    UnknownOperator(String),

    /// A known operator was applied to the wrong number of operands.
    #[error("operator '{op}' expects {expected} operand(s), got {actual}")]
    OperandCount {
        op: String,
        expected: usize,
        actual: usize,
    },

    /// Two non-scalar-like operand shapes differ.
    #[error(
        "input shapes of element-wise arithmetic operator \"{op}\" do not match. \
         Expected equal shapes, got: {op}({expected}, {actual})"
    )]
    ShapeMismatch {
        op: String,
        expected: ShapeList,
        actual: ShapeList,
    },

    /// Two non-empty operand layouts differ.
    #[error(
        "layouts of subexpressions {expected_index} and {actual_index} for arithmetic operation \
         '{op}' do not match: expected '{expected}', got '{actual}'"
    )]
    LayoutConflict {
        op: String,
        expected_index: usize,
        expected: TensorLayout,
        actual_index: usize,
        actual: TensorLayout,
    },

    /// The tree is deeper than the engine can execute.
    #[error("unsupported expression shape: {0}")]
    UnsupportedExpressionShape(String),

    /// An input's sample count does not match the batch size.
    #[error("argument '{argument}' has {actual} samples, expected {expected}")]
    BindingCount {
        argument: String,
        expected: usize,
        actual: usize,
    },

    /// A tensor node references an input that is not bound.
    #[error("tensor node references input {index}, but only {available} input(s) are bound")]
    MissingInput { index: usize, available: usize },

    /// A bound input's shapes are unusable.
    #[error("input {index}: {source}")]
    InvalidInputShape {
        index: usize,
        #[source]
        source: tensor_meta::MetaError,
    },

    /// A serialized tree or workspace could not be read.
    #[error("failed to read expression file: {0}")]
    Read(#[from] std::io::Error),

    /// A serialized tree or workspace is malformed.
    #[error("failed to parse expression file: {0}")]
    Parse(#[from] serde_json::Error),
}
