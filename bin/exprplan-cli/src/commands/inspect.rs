// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `exprplan inspect` command: display an expression with inferred metadata.
//!
//! Runs type, layout and shape inference against a workspace and prints
//! every node, the kernel signature each backend would request, and the
//! constant storage layout.

use super::banner;
use expr_engine::{ConstantClass, ConstantStorage, KernelKey};
use expr_ir::propagate::{common_layout, propagate_shapes, propagate_types};
use expr_ir::{ExprNode, ExprTree, Workspace};
use std::path::PathBuf;
use tile_planner::Backend;

pub fn execute(expr: PathBuf, inputs: PathBuf) -> anyhow::Result<()> {
    banner("Expression Inspector");

    let mut tree = ExprTree::load(&expr)
        .map_err(|e| anyhow::anyhow!("failed to load expression from '{}': {e}", expr.display()))?
        .validate()?;
    let ws = Workspace::load(&inputs)
        .map_err(|e| anyhow::anyhow!("failed to load workspace from '{}': {e}", inputs.display()))?;
    ws.validate_bindings()?;

    propagate_types(tree.root_mut(), &ws)?;
    common_layout(tree.root_mut(), &ws)?;
    propagate_shapes(tree.root_mut(), &ws)?;

    // ── Inputs ─────────────────────────────────────────────────
    println!("  Inputs ({} samples):", ws.batch_size());
    for (i, input) in ws.inputs().enumerate() {
        println!("   &{i}: {} {} layout '{}'", input.dtype, input.shapes, input.layout);
    }
    println!();

    // ── Nodes ──────────────────────────────────────────────────
    println!("  {:<28} {:<6} {:<8} {}", "Node", "Type", "Layout", "Shape");
    println!("  {}", "-".repeat(70));
    print_node(tree.root(), 0);
    println!();

    // ── Kernels ────────────────────────────────────────────────
    println!("  Kernel signatures:");
    for (id, func) in tree.function_nodes() {
        for backend in [Backend::Cpu, Backend::Gpu] {
            println!("   {id}: {}", KernelKey::for_function(func, backend)?);
        }
    }
    println!();

    // ── Constants ──────────────────────────────────────────────
    let mut storage = ConstantStorage::new();
    storage.initialize(&tree.constants(), Backend::Cpu, ws.stream())?;
    println!(
        "  Constants: {} integer bytes, {} real bytes",
        storage.buffer(ConstantClass::Integer).len(),
        storage.buffer(ConstantClass::Real).len(),
    );
    for constant in tree.constants() {
        let slot = storage.slot(constant.index, constant.dtype);
        let bytes = storage.read(slot).unwrap_or_default();
        println!(
            "   ${} = {} as {} → {}[{}] {:02x?}",
            constant.index, constant.value, constant.dtype, slot.class, slot.offset, bytes,
        );
    }
    println!();
    Ok(())
}

fn print_node(node: &ExprNode, depth: usize) {
    let label = match node {
        ExprNode::Function(func) => format!("{}{}", "  ".repeat(depth), func.op),
        leaf => format!("{}{leaf}", "  ".repeat(depth)),
    };
    let dtype = node.dtype().map_or("?".to_string(), |d| d.to_string());
    let layout = node.layout().map_or("?".to_string(), |l| format!("'{l}'"));
    let shape = node.shape().map_or("?".to_string(), |s| s.to_string());
    println!("  {label:<28} {dtype:<6} {layout:<8} {shape}");
    for child in node.children() {
        print_node(child, depth + 1);
    }
}
