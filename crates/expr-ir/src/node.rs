// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Expression-tree nodes.
//!
//! A tree is built from three node kinds: literal constants, references to
//! bound input tensors, and function nodes applying an arithmetic operator
//! to one or two owned children. Each node carries the metadata inferred by
//! the propagation passes ([`Inferred`]); the metadata is not part of the
//! serialized form.

use std::fmt;
use tensor_meta::{DType, ShapeList, TensorLayout};

/// Metadata written onto a node by the propagation passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inferred {
    /// Result element type, once types have been propagated.
    pub dtype: Option<DType>,
    /// Result per-sample shapes, refreshed on every shape pass.
    pub shape: Option<ShapeList>,
    /// Result layout, once layouts have been propagated.
    pub layout: Option<TensorLayout>,
}

/// Discriminates the node variants without borrowing their payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Constant,
    Tensor,
    Function,
}

impl NodeKind {
    /// Single-letter tag used in kernel keys and plan dumps.
    pub fn tag(self) -> char {
        match self {
            NodeKind::Constant => 'C',
            NodeKind::Tensor => 'T',
            NodeKind::Function => 'F',
        }
    }
}

/// A literal value as written by the expression producer.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ConstantValue {
    Int(i64),
    Real(f64),
}

impl ConstantValue {
    /// The value as a signed integer (reals truncate toward zero).
    pub fn as_i64(self) -> i64 {
        match self {
            ConstantValue::Int(v) => v,
            ConstantValue::Real(v) => v as i64,
        }
    }

    /// The value as a double.
    pub fn as_f64(self) -> f64 {
        match self {
            ConstantValue::Int(v) => v as f64,
            ConstantValue::Real(v) => v,
        }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Int(v) => write!(f, "{v}"),
            ConstantValue::Real(v) => write!(f, "{v:?}"),
        }
    }
}

/// A literal operand with a predetermined type.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExprConstant {
    /// Slot of this constant within its class (integer or real).
    pub index: usize,
    /// Element type the literal is stored as.
    pub dtype: DType,
    /// The literal itself.
    pub value: ConstantValue,
    #[serde(skip)]
    pub(crate) inferred: Inferred,
}

impl ExprConstant {
    pub fn new(index: usize, dtype: DType, value: ConstantValue) -> Self {
        Self {
            index,
            dtype,
            value,
            inferred: Inferred::default(),
        }
    }
}

/// A reference to one of the bound input tensors.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExprTensor {
    /// Index into the workspace's inputs.
    pub input: usize,
    #[serde(skip)]
    pub(crate) inferred: Inferred,
}

impl ExprTensor {
    pub fn new(input: usize) -> Self {
        Self {
            input,
            inferred: Inferred::default(),
        }
    }
}

/// An operator applied to owned subexpressions.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExprFunc {
    /// Operator name, e.g. `"add"`.
    pub op: String,
    /// Operands, in order.
    pub args: Vec<ExprNode>,
    #[serde(skip)]
    pub(crate) inferred: Inferred,
}

impl ExprFunc {
    pub fn new(op: impl Into<String>, args: Vec<ExprNode>) -> Self {
        Self {
            op: op.into(),
            args,
            inferred: Inferred::default(),
        }
    }

    /// Inferred dtype of every operand, or `None` if any is still unknown.
    pub fn operand_dtypes(&self) -> Option<Vec<DType>> {
        self.args.iter().map(ExprNode::dtype).collect()
    }

    /// Node kind of every operand.
    pub fn operand_kinds(&self) -> Vec<NodeKind> {
        self.args.iter().map(ExprNode::kind).collect()
    }

    /// Inferred result type of this node.
    pub fn result_dtype(&self) -> Option<DType> {
        self.inferred.dtype
    }
}

/// A node of an expression tree.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExprNode {
    Constant(ExprConstant),
    Tensor(ExprTensor),
    Function(ExprFunc),
}

impl ExprNode {
    /// Shorthand for a constant leaf.
    pub fn constant(index: usize, dtype: DType, value: ConstantValue) -> Self {
        ExprNode::Constant(ExprConstant::new(index, dtype, value))
    }

    /// Shorthand for a tensor leaf.
    pub fn tensor(input: usize) -> Self {
        ExprNode::Tensor(ExprTensor::new(input))
    }

    /// Shorthand for a function node.
    pub fn func(op: impl Into<String>, args: Vec<ExprNode>) -> Self {
        ExprNode::Function(ExprFunc::new(op, args))
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            ExprNode::Constant(_) => NodeKind::Constant,
            ExprNode::Tensor(_) => NodeKind::Tensor,
            ExprNode::Function(_) => NodeKind::Function,
        }
    }

    /// Returns `true` for constants and tensors.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, ExprNode::Function(_))
    }

    /// Subexpressions of this node (empty for leaves).
    pub fn children(&self) -> &[ExprNode] {
        match self {
            ExprNode::Function(f) => &f.args,
            _ => &[],
        }
    }

    pub fn inferred(&self) -> &Inferred {
        match self {
            ExprNode::Constant(c) => &c.inferred,
            ExprNode::Tensor(t) => &t.inferred,
            ExprNode::Function(f) => &f.inferred,
        }
    }

    pub(crate) fn inferred_mut(&mut self) -> &mut Inferred {
        match self {
            ExprNode::Constant(c) => &mut c.inferred,
            ExprNode::Tensor(t) => &mut t.inferred,
            ExprNode::Function(f) => &mut f.inferred,
        }
    }

    /// The node's type: fixed for constants, inferred otherwise.
    pub fn dtype(&self) -> Option<DType> {
        match self {
            ExprNode::Constant(c) => Some(c.dtype),
            _ => self.inferred().dtype,
        }
    }

    /// The most recently inferred shape.
    pub fn shape(&self) -> Option<&ShapeList> {
        self.inferred().shape.as_ref()
    }

    /// The inferred layout.
    pub fn layout(&self) -> Option<&TensorLayout> {
        self.inferred().layout.as_ref()
    }

    /// Number of function nodes in this subtree.
    pub fn count_functions(&self) -> usize {
        let own = usize::from(!self.is_leaf());
        own + self
            .children()
            .iter()
            .map(ExprNode::count_functions)
            .sum::<usize>()
    }
}

impl fmt::Display for ExprNode {
    /// Renders `add(&0, $0:f32=2.5)`: `&i` is input `i`, `$i` is constant `i`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprNode::Constant(c) => write!(f, "${}:{}={}", c.index, c.dtype, c.value),
            ExprNode::Tensor(t) => write!(f, "&{}", t.input),
            ExprNode::Function(func) => {
                write!(f, "{}(", func.op)?;
                for (i, arg) in func.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_tensor_constant() -> ExprNode {
        ExprNode::func(
            "add",
            vec![
                ExprNode::tensor(0),
                ExprNode::constant(0, DType::F32, ConstantValue::Real(2.5)),
            ],
        )
    }

    #[test]
    fn test_kinds() {
        let e = add_tensor_constant();
        assert_eq!(e.kind(), NodeKind::Function);
        assert!(!e.is_leaf());
        assert_eq!(e.children().len(), 2);
        assert_eq!(e.children()[1].kind(), NodeKind::Constant);
        assert!(e.children()[0].children().is_empty());
    }

    #[test]
    fn test_constant_dtype_is_fixed() {
        let c = ExprNode::constant(3, DType::I16, ConstantValue::Int(-4));
        assert_eq!(c.dtype(), Some(DType::I16));
        assert_eq!(ExprNode::tensor(0).dtype(), None);
    }

    #[test]
    fn test_counts() {
        let leaf = ExprNode::tensor(1);
        assert_eq!(leaf.count_functions(), 0);

        let nested = ExprNode::func("minus", vec![add_tensor_constant()]);
        assert_eq!(nested.count_functions(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(add_tensor_constant().to_string(), "add(&0, $0:f32=2.5)");
    }

    #[test]
    fn test_constant_value_conversions() {
        assert_eq!(ConstantValue::Real(-2.7).as_i64(), -2);
        assert_eq!(ConstantValue::Int(3).as_f64(), 3.0);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(add_tensor_constant()).unwrap();
        assert_eq!(json["kind"], "function");
        assert_eq!(json["op"], "add");
        assert_eq!(json["args"][0]["kind"], "tensor");
        assert_eq!(json["args"][0]["input"], 0);
        assert_eq!(json["args"][1]["dtype"], "f32");
    }
}
