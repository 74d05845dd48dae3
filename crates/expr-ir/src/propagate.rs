// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Post-order inference passes over an expression tree.
//!
//! Three passes write their results onto the nodes they visit:
//!
//! | Pass | Leaves | Function nodes |
//! |---|---|---|
//! | [`propagate_types`] | constant: own dtype, tensor: input dtype | [`type_promotion`] |
//! | [`common_layout`] | constant: `""`, tensor: input layout | all non-empty layouts must agree |
//! | [`propagate_shapes`] | constant: `{[1]}`, tensor: input shapes | [`shape_promotion`] |
//!
//! Types and layouts depend only on which inputs are bound, so callers run
//! them once per binding. Shapes change with every batch and are
//! recomputed on every call.

use crate::op::type_promotion;
use crate::{ExprConstant, ExprError, ExprNode, Workspace};
use tensor_meta::{DType, ShapeList, TensorLayout};

fn check_arity(op: &str, count: usize) -> Result<(), ExprError> {
    if count == 1 || count == 2 {
        Ok(())
    } else {
        Err(ExprError::Arity {
            op: op.to_string(),
            count,
        })
    }
}

/// Infers and stores the result type of every node under `expr`.
pub fn propagate_types(expr: &mut ExprNode, ws: &Workspace) -> Result<DType, ExprError> {
    let dtype = match expr {
        ExprNode::Constant(c) => c.dtype,
        ExprNode::Tensor(t) => ws.input(t.input)?.dtype,
        ExprNode::Function(func) => {
            check_arity(&func.op, func.args.len())?;
            let operands = func
                .args
                .iter_mut()
                .map(|arg| propagate_types(arg, ws))
                .collect::<Result<Vec<_>, _>>()?;
            type_promotion(&func.op, &operands)?
        }
    };
    expr.inferred_mut().dtype = Some(dtype);
    Ok(dtype)
}

/// Returns the one layout shared by every tensor under `expr`.
///
/// Empty layouts are "don't care" and never conflict. The first pair of
/// differing non-empty layouts among a function's operands is an error.
pub fn common_layout(expr: &mut ExprNode, ws: &Workspace) -> Result<TensorLayout, ExprError> {
    let layout = match expr {
        ExprNode::Constant(_) => TensorLayout::empty(),
        ExprNode::Tensor(t) => ws.input(t.input)?.layout.clone(),
        ExprNode::Function(func) => {
            let mut result = TensorLayout::empty();
            let mut result_index = 0;
            for (i, arg) in func.args.iter_mut().enumerate() {
                let next = common_layout(arg, ws)?;
                if next.is_empty() {
                    continue;
                }
                if result.is_empty() {
                    result = next;
                    result_index = i;
                } else if result != next {
                    return Err(ExprError::LayoutConflict {
                        op: func.op.clone(),
                        expected_index: result_index,
                        expected: result,
                        actual_index: i,
                        actual: next,
                    });
                }
            }
            result
        }
    };
    expr.inferred_mut().layout = Some(layout.clone());
    Ok(layout)
}

/// Combines operand shapes of an element-wise operator.
///
/// Scalar-like operands (one element per sample) broadcast; every other
/// operand must match the first non-scalar-like one exactly. Axis-wise
/// broadcasting is not supported. With only scalar-like operands the
/// result is `{[1]}`.
pub fn shape_promotion(op: &str, shapes: &[&ShapeList]) -> Result<ShapeList, ExprError> {
    let mut out: Option<&ShapeList> = None;
    for &shape in shapes {
        if shape.is_scalar_like() {
            continue;
        }
        match out {
            None => out = Some(shape),
            Some(expected) if expected != shape => {
                return Err(ExprError::ShapeMismatch {
                    op: op.to_string(),
                    expected: expected.clone(),
                    actual: shape.clone(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(out.cloned().unwrap_or_else(ShapeList::single_element))
}

/// Infers and stores the per-sample shapes of every node under `expr`.
pub fn propagate_shapes(expr: &mut ExprNode, ws: &Workspace) -> Result<ShapeList, ExprError> {
    let shape = match expr {
        ExprNode::Constant(_) => ShapeList::single_element(),
        ExprNode::Tensor(t) => ws.input(t.input)?.shapes.clone(),
        ExprNode::Function(func) => {
            check_arity(&func.op, func.args.len())?;
            for arg in func.args.iter_mut() {
                propagate_shapes(arg, ws)?;
            }
            let operand_shapes: Vec<&ShapeList> = func
                .args
                .iter()
                .filter_map(ExprNode::shape)
                .collect();
            let promoted = shape_promotion(&func.op, &operand_shapes)?;
            if operand_shapes.iter().all(|s| s.is_scalar_like()) {
                tracing::warn!(
                    "all operands of '{}' are scalar-like; result degenerates to {}",
                    func.op,
                    promoted,
                );
            }
            promoted
        }
    };
    expr.inferred_mut().shape = Some(shape.clone());
    Ok(shape)
}

/// Collects every constant node under `expr`, in depth-first order.
pub fn constant_nodes(expr: &ExprNode) -> Vec<&ExprConstant> {
    fn walk<'a>(expr: &'a ExprNode, out: &mut Vec<&'a ExprConstant>) {
        match expr {
            ExprNode::Constant(c) => out.push(c),
            ExprNode::Tensor(_) => {}
            ExprNode::Function(func) => {
                for arg in &func.args {
                    walk(arg, out);
                }
            }
        }
    }
    let mut out = Vec::new();
    walk(expr, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConstantValue, InputBinding};
    use tensor_meta::Shape;

    fn list(dims: &[usize]) -> ShapeList {
        ShapeList::new(vec![Shape::new(dims.to_vec())])
    }

    fn binding(dtype: DType, dims: &[usize], layout: &str) -> InputBinding {
        InputBinding::new(dtype, list(dims), layout)
    }

    #[test]
    fn test_types_tensor_constant() {
        let ws = Workspace::new(1).with_input(binding(DType::I32, &[4], ""));
        let mut e = ExprNode::func(
            "mul",
            vec![
                ExprNode::tensor(0),
                ExprNode::constant(0, DType::F32, ConstantValue::Real(0.5)),
            ],
        );
        assert_eq!(propagate_types(&mut e, &ws).unwrap(), DType::F32);
        assert_eq!(e.dtype(), Some(DType::F32));
        assert_eq!(e.children()[0].dtype(), Some(DType::I32));
    }

    #[test]
    fn test_types_arity_error_names_operator() {
        let ws = Workspace::new(1).with_input(binding(DType::F32, &[4], ""));
        let mut e = ExprNode::func(
            "add",
            vec![ExprNode::tensor(0), ExprNode::tensor(0), ExprNode::tensor(0)],
        );
        let err = propagate_types(&mut e, &ws).unwrap_err();
        assert!(matches!(err, ExprError::Arity { count: 3, .. }));
        assert!(err.to_string().contains("'add'"));
    }

    #[test]
    fn test_types_missing_input() {
        let ws = Workspace::new(1);
        let mut e = ExprNode::func("plus", vec![ExprNode::tensor(0)]);
        assert!(matches!(
            propagate_types(&mut e, &ws),
            Err(ExprError::MissingInput { index: 0, available: 0 })
        ));
    }

    #[test]
    fn test_layout_empty_is_compatible() {
        let ws = Workspace::new(1)
            .with_input(binding(DType::F32, &[4], ""))
            .with_input(binding(DType::F32, &[4], "HWC"));
        let mut e = ExprNode::func("add", vec![ExprNode::tensor(0), ExprNode::tensor(1)]);
        assert_eq!(common_layout(&mut e, &ws).unwrap().as_str(), "HWC");
        assert_eq!(e.layout().map(TensorLayout::as_str), Some("HWC"));

        let mut c = ExprNode::func(
            "sub",
            vec![
                ExprNode::constant(0, DType::U8, ConstantValue::Int(1)),
                ExprNode::tensor(1),
            ],
        );
        assert_eq!(common_layout(&mut c, &ws).unwrap().as_str(), "HWC");
    }

    #[test]
    fn test_layout_conflict() {
        let ws = Workspace::new(1)
            .with_input(binding(DType::F32, &[4], "HWC"))
            .with_input(binding(DType::F32, &[4], "CHW"));
        let mut e = ExprNode::func("add", vec![ExprNode::tensor(0), ExprNode::tensor(1)]);
        let err = common_layout(&mut e, &ws).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("HWC") && msg.contains("CHW"), "{msg}");
        assert!(matches!(
            err,
            ExprError::LayoutConflict { expected_index: 0, actual_index: 1, .. }
        ));
    }

    #[test]
    fn test_shape_promotion_scalar_broadcast() {
        let s = list(&[10, 20]);
        let one = list(&[1]);
        assert_eq!(shape_promotion("add", &[&s, &one]).unwrap(), s);
        assert_eq!(shape_promotion("add", &[&one, &s]).unwrap(), s);
    }

    #[test]
    fn test_shape_promotion_mismatch() {
        let a = list(&[10, 20]);
        let b = list(&[5, 5]);
        let err = shape_promotion("add", &[&a, &b]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("\"add\""), "{msg}");
        assert!(msg.contains("[10, 20]") && msg.contains("[5, 5]"), "{msg}");
    }

    #[test]
    fn test_shape_promotion_rejects_axis_broadcast() {
        let a = list(&[10, 20]);
        let b = list(&[1, 20]);
        assert!(shape_promotion("mul", &[&a, &b]).is_err());
    }

    #[test]
    fn test_shape_promotion_all_scalar() {
        let one = list(&[1]);
        let unit = list(&[1, 1]);
        assert_eq!(
            shape_promotion("add", &[&one, &unit]).unwrap(),
            ShapeList::single_element()
        );
    }

    #[test]
    fn test_shapes_recomputed_per_batch() {
        let mut e = ExprNode::func(
            "add",
            vec![
                ExprNode::tensor(0),
                ExprNode::constant(0, DType::F32, ConstantValue::Real(1.0)),
            ],
        );
        let ws1 = Workspace::new(1).with_input(binding(DType::F32, &[3, 3], ""));
        let ws2 = Workspace::new(2).with_input(InputBinding::new(
            DType::F32,
            ShapeList::new(vec![Shape::vector(7), Shape::vector(2)]),
            "",
        ));
        assert_eq!(propagate_shapes(&mut e, &ws1).unwrap(), list(&[3, 3]));
        let second = propagate_shapes(&mut e, &ws2).unwrap();
        assert_eq!(second.num_samples(), 2);
        assert_eq!(e.shape(), Some(&second));
        assert_eq!(e.children()[1].shape(), Some(&ShapeList::single_element()));
    }

    #[test]
    fn test_constant_nodes() {
        let e = ExprNode::func(
            "add",
            vec![
                ExprNode::constant(0, DType::I32, ConstantValue::Int(4)),
                ExprNode::constant(0, DType::F64, ConstantValue::Real(0.25)),
            ],
        );
        let constants = constant_nodes(&e);
        assert_eq!(constants.len(), 2);
        assert_eq!(constants[1].dtype, DType::F64);
        assert!(constant_nodes(&ExprNode::tensor(0)).is_empty());
    }
}
