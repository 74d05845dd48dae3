// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Arithmetic operators and their result-type rules.

use crate::ExprError;
use tensor_meta::DType;

/// The element-wise operators a function node may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArithmeticOp {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// Division in the operand type (integer division for integers).
    Div,
    /// Floating-point division; integer operands produce `f32`.
    Fdiv,
    /// Remainder.
    Mod,
    /// Unary `+a`.
    Plus,
    /// Unary `-a`.
    Minus,
}

impl ArithmeticOp {
    /// Every supported operator.
    pub const ALL: [ArithmeticOp; 8] = [
        ArithmeticOp::Add,
        ArithmeticOp::Sub,
        ArithmeticOp::Mul,
        ArithmeticOp::Div,
        ArithmeticOp::Fdiv,
        ArithmeticOp::Mod,
        ArithmeticOp::Plus,
        ArithmeticOp::Minus,
    ];

    /// Looks up an operator by the name a function node carries.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    /// Returns the operator's name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Fdiv => "fdiv",
            Self::Mod => "mod",
            Self::Plus => "plus",
            Self::Minus => "minus",
        }
    }

    /// Number of operands the operator takes.
    pub fn arity(self) -> usize {
        match self {
            Self::Plus | Self::Minus => 1,
            _ => 2,
        }
    }

    /// Computes the result type of applying this operator to `operands`.
    ///
    /// Pure and total: every operator/dtype combination of the right arity
    /// yields a type.
    pub fn result_type(self, operands: &[DType]) -> Result<DType, ExprError> {
        if operands.len() != self.arity() {
            return Err(ExprError::OperandCount {
                op: self.as_str().to_string(),
                expected: self.arity(),
                actual: operands.len(),
            });
        }
        let ty = match self {
            Self::Plus => operands[0],
            Self::Minus => operands[0].to_signed(),
            Self::Fdiv if operands[0].is_integral() && operands[1].is_integral() => DType::F32,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Fdiv | Self::Mod => {
                operands[0].promote(operands[1])
            }
        };
        Ok(ty)
    }
}

impl std::fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the result type for a named operator.
///
/// Checks the operand count against `{1, 2}` first, then the operator name,
/// then the operator's own arity.
pub fn type_promotion(op_name: &str, operands: &[DType]) -> Result<DType, ExprError> {
    if !(1..=2).contains(&operands.len()) {
        return Err(ExprError::Arity {
            op: op_name.to_string(),
            count: operands.len(),
        });
    }
    let op = ArithmeticOp::from_name(op_name)
        .ok_or_else(|| ExprError::UnknownOperator(op_name.to_string()))?;
    op.result_type(operands)
}
