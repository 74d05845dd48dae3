// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `exprplan promote` command: result type of an operator.
//!
//! With one operand type and a binary operator, prints the result against
//! every type instead.

use expr_ir::{type_promotion, ArithmeticOp};
use tensor_meta::DType;

pub fn execute(op: &str, types: &str) -> anyhow::Result<()> {
    let operands = types
        .split(',')
        .map(|s| s.trim().parse::<DType>())
        .collect::<Result<Vec<_>, _>>()?;

    let binary = ArithmeticOp::from_name(op).is_some_and(|o| o.arity() == 2);
    if binary && operands.len() == 1 {
        let lhs = operands[0];
        println!("  {:<8} {}", "rhs", format!("{op}({lhs}, rhs)"));
        println!("  {}", "-".repeat(24));
        for rhs in DType::ALL {
            println!("  {:<8} {}", rhs.as_str(), type_promotion(op, &[lhs, rhs])?);
        }
        return Ok(());
    }

    let result = type_promotion(op, &operands)?;
    let names: Vec<&str> = operands.iter().map(|d| d.as_str()).collect();
    println!("{op}({}) -> {result}", names.join(", "));
    Ok(())
}
