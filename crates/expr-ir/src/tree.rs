// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Expression tree: a single root node owning its subexpressions.
//!
//! # Type-State Pattern
//!
//! ```text
//! ExprTree<Parsed>     : built by a producer or loaded from JSON.
//!       │  .validate()
//!       ▼
//! ExprTree<Validated>  : one function node over leaf operands, ready to plan.
//! ```
//!
//! The executor only runs single-function trees: no intermediate buffers are
//! ever allocated. Deeper trees are rejected by `validate()`, so a planner
//! holding an `ExprTree<Validated>` never sees one.

use crate::{ExprConstant, ExprError, ExprFunc, ExprNode, NodeKind};
use std::fmt;
use std::path::Path;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: tree has been built but not checked.
#[derive(Debug, Clone)]
pub struct Parsed;

/// Marker: tree has the shape the executor supports.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for tree states.
pub trait TreeState: fmt::Debug + Clone {}
impl TreeState for Parsed {}
impl TreeState for Validated {}

/// Stable reference to a function node: its position in post-order among
/// the tree's function nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

// ── ExprTree ───────────────────────────────────────────────────────

/// An expression tree in state `S`.
#[derive(Debug, Clone)]
pub struct ExprTree<S: TreeState = Parsed> {
    root: ExprNode,
    _state: std::marker::PhantomData<S>,
}

// ── Parsed state ───────────────────────────────────────────────────

impl ExprTree<Parsed> {
    /// Wraps a root node.
    pub fn new(root: ExprNode) -> Self {
        Self {
            root,
            _state: std::marker::PhantomData,
        }
    }

    /// Deserializes a tree from its JSON form.
    ///
    /// ```
    /// use expr_ir::ExprTree;
    /// let tree = ExprTree::from_json(
    ///     r#"{"kind": "function", "op": "add",
    ///         "args": [{"kind": "tensor", "input": 0}, {"kind": "tensor", "input": 1}]}"#,
    /// ).unwrap();
    /// assert_eq!(tree.to_string(), "add(&0, &1)");
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ExprError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Reads a tree from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ExprError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Checks the tree shape and transitions to `Validated`.
    ///
    /// # Checks
    /// - The root is a function node.
    /// - Every operand of the root is a leaf (constant or tensor).
    /// - At least one operand is a tensor; there is no kernel for constant-only
    ///   expressions.
    ///
    /// Operand counts are checked later, during type propagation.
    pub fn validate(self) -> Result<ExprTree<Validated>, ExprError> {
        let ExprNode::Function(func) = &self.root else {
            return Err(ExprError::UnsupportedExpressionShape(format!(
                "expression root must be a function node, got {:?} '{}'",
                self.root.kind(),
                self.root,
            )));
        };

        if func.args.iter().any(|arg| !arg.is_leaf()) {
            return Err(ExprError::UnsupportedExpressionShape(format!(
                "complex expression trees are not supported: '{}' has {} function nodes; \
                 only one function node with one or two inputs is supported",
                self.root,
                self.root.count_functions(),
            )));
        }

        if !func.args.is_empty() && func.args.iter().all(|a| a.kind() == NodeKind::Constant) {
            return Err(ExprError::UnsupportedExpressionShape(format!(
                "expression '{}' has only constant operands",
                self.root,
            )));
        }

        tracing::debug!("validated expression '{}'", self.root);

        Ok(ExprTree {
            root: self.root,
            _state: std::marker::PhantomData,
        })
    }
}

// ── Validated state ────────────────────────────────────────────────

impl ExprTree<Validated> {
    /// Function nodes in post-order, each with its [`NodeId`].
    pub fn function_nodes(&self) -> Vec<(NodeId, &ExprFunc)> {
        fn walk<'a>(expr: &'a ExprNode, out: &mut Vec<(NodeId, &'a ExprFunc)>) {
            if let ExprNode::Function(func) = expr {
                for arg in &func.args {
                    walk(arg, out);
                }
                out.push((NodeId(out.len()), func));
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }

    /// Looks up a function node by id.
    pub fn function(&self, id: NodeId) -> Option<&ExprFunc> {
        self.function_nodes()
            .into_iter()
            .find(|(nid, _)| *nid == id)
            .map(|(_, f)| f)
    }

    /// Every constant node, in depth-first order.
    pub fn constants(&self) -> Vec<&ExprConstant> {
        crate::propagate::constant_nodes(&self.root)
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: TreeState> ExprTree<S> {
    /// Returns the root node.
    pub fn root(&self) -> &ExprNode {
        &self.root
    }

    /// Returns the root node for the inference passes to annotate.
    pub fn root_mut(&mut self) -> &mut ExprNode {
        &mut self.root
    }

    /// Serializes the tree (without inferred metadata) to JSON.
    pub fn to_json(&self) -> Result<String, ExprError> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }
}

impl<S: TreeState> fmt::Display for ExprTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConstantValue;
    use tensor_meta::DType;

    fn simple() -> ExprNode {
        ExprNode::func(
            "add",
            vec![
                ExprNode::tensor(0),
                ExprNode::constant(0, DType::F32, ConstantValue::Real(1.5)),
            ],
        )
    }

    #[test]
    fn test_validate_ok() {
        let tree = ExprTree::new(simple()).validate().unwrap();
        let funcs = tree.function_nodes();
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].0, NodeId(0));
        assert_eq!(funcs[0].1.op, "add");
        assert_eq!(tree.constants().len(), 1);
        assert_eq!(tree.function(NodeId(0)).unwrap().op, "add");
        assert!(tree.function(NodeId(1)).is_none());
    }

    #[test]
    fn test_validate_nested_function() {
        let nested = ExprNode::func("minus", vec![simple()]);
        let err = ExprTree::new(nested).validate().unwrap_err();
        assert!(matches!(err, ExprError::UnsupportedExpressionShape(_)));
        assert!(err.to_string().contains("2 function nodes"));
    }

    #[test]
    fn test_validate_leaf_root() {
        let err = ExprTree::new(ExprNode::tensor(0)).validate().unwrap_err();
        assert!(matches!(err, ExprError::UnsupportedExpressionShape(_)));
    }

    #[test]
    fn test_validate_constant_only() {
        let tree = ExprTree::new(ExprNode::func(
            "add",
            vec![
                ExprNode::constant(0, DType::I32, ConstantValue::Int(1)),
                ExprNode::constant(1, DType::I32, ConstantValue::Int(2)),
            ],
        ));
        assert!(matches!(
            tree.validate(),
            Err(ExprError::UnsupportedExpressionShape(_))
        ));
    }

    #[test]
    fn test_validate_leaves_arity_to_inference() {
        let three = ExprNode::func(
            "add",
            vec![ExprNode::tensor(0), ExprNode::tensor(1), ExprNode::tensor(2)],
        );
        assert!(ExprTree::new(three).validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let tree = ExprTree::new(simple());
        let json = tree.to_json().unwrap();
        let back = ExprTree::from_json(&json).unwrap();
        assert_eq!(back.to_string(), tree.to_string());
    }

    #[test]
    fn test_from_json_integer_constant() {
        let tree = ExprTree::from_json(
            r#"{"kind": "function", "op": "mul", "args": [
                {"kind": "tensor", "input": 0},
                {"kind": "constant", "index": 0, "dtype": "i32", "value": 3}
            ]}"#,
        )
        .unwrap();
        let tree = tree.validate().unwrap();
        let c = tree.constants()[0];
        assert_eq!(c.value, ConstantValue::Int(3));
        assert_eq!(c.dtype, DType::I32);
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(
            ExprTree::from_json(r#"{"kind": "lambda"}"#),
            Err(ExprError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expr.json");
        std::fs::write(&path, ExprTree::new(simple()).to_json().unwrap()).unwrap();
        let tree = ExprTree::load(&path).unwrap();
        assert_eq!(tree.to_string(), "add(&0, $0:f32=1.5)");
        assert!(matches!(
            ExprTree::load(&dir.path().join("missing.json")),
            Err(ExprError::Read(_))
        ));
    }
}
