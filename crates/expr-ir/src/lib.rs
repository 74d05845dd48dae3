// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # expr-ir
//!
//! A small intermediate representation for element-wise arithmetic
//! expressions over batched tensors.
//!
//! - [`ExprNode`]: a tagged variant over constants, input tensors and
//!   function nodes. Function nodes own their children, so a tree can
//!   never share nodes or contain a cycle.
//! - [`ExprTree`]: a root node with a **type-state** (`Parsed` → `Validated`)
//!   that gates which trees may be planned.
//! - [`Workspace`]: the binding context (input dtypes, shapes and layouts,
//!   stream handle) a tree is evaluated against.
//! - [`propagate`]: post-order inference of result type, layout and shape.
//! - [`ArithmeticOp`]: the operator set and its type-promotion rules.
//!
//! # Example
//! ```
//! use expr_ir::{propagate, ExprNode, ExprTree, InputBinding, Workspace};
//! use tensor_meta::{DType, Shape, ShapeList};
//!
//! let mut tree = ExprTree::new(ExprNode::func(
//!     "add",
//!     vec![ExprNode::tensor(0), ExprNode::tensor(1)],
//! ))
//! .validate()
//! .unwrap();
//!
//! let ws = Workspace::new(1)
//!     .with_input(InputBinding::new(DType::U8, ShapeList::uniform(1, Shape::new(vec![10, 20])), "HW"))
//!     .with_input(InputBinding::new(DType::I8, ShapeList::uniform(1, Shape::vector(1)), ""));
//!
//! assert_eq!(propagate::propagate_types(tree.root_mut(), &ws).unwrap(), DType::I16);
//! let shape = propagate::propagate_shapes(tree.root_mut(), &ws).unwrap();
//! assert_eq!(shape.sample(0).unwrap().dims(), &[10, 20]);
//! ```

mod error;
mod node;
pub mod op;
pub mod propagate;
pub mod tree;
mod workspace;

pub use error::ExprError;
pub use node::{ConstantValue, ExprConstant, ExprFunc, ExprNode, ExprTensor, Inferred, NodeKind};
pub use op::{type_promotion, ArithmeticOp};
pub use tree::{ExprTree, NodeId};
pub use workspace::{InputBinding, StreamHandle, Workspace};
