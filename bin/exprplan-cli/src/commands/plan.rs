// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `exprplan plan` command: set up, run and dry-run dispatch one batch.
//!
//! Walks the engine's two phases:
//! ```text
//! ArithmeticEngine::new → setup(workspace) → run() → dispatch(plan)
//! ```
//! with kernels that only log what they would compute.

use super::{banner, DryRunFactory};
use expr_engine::{ArgRef, ArithmeticEngine, EngineConfig, RunPlan};
use expr_ir::{ExprTree, Workspace};
use std::path::PathBuf;
use std::sync::Arc;

pub async fn execute(
    expr: PathBuf,
    inputs: PathBuf,
    config: Option<PathBuf>,
    backend: Option<String>,
    show_tiles: bool,
) -> anyhow::Result<()> {
    banner("Expression Planner");

    // ── Configuration ──────────────────────────────────────────
    let mut config = match &config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(backend) = backend {
        config.backend = backend.parse()?;
    }
    let tiling = config.resolve_tiling()?;

    let tree = ExprTree::load(&expr).map_err(|e| {
        anyhow::anyhow!("failed to load expression from '{}': {e}", expr.display())
    })?;
    let ws = Workspace::load(&inputs).map_err(|e| {
        anyhow::anyhow!("failed to load workspace from '{}': {e}", inputs.display())
    })?;

    println!("  Config:");
    println!("   Expression: {tree}");
    println!("   Batch:      {} samples, {} inputs", ws.batch_size(), ws.num_inputs());
    println!("   Backend:    {}", config.backend);
    println!("   Tiling:     {} elements/tile, {} tiles/task", tiling.tile_size, tasks_label(tiling.tiles_per_task));
    println!();

    let mut engine = ArithmeticEngine::new(config, tree, Arc::new(DryRunFactory))?;

    // ── Setup ──────────────────────────────────────────────────
    println!("  [1/3] Setting up...");
    let output = engine.setup(&ws)?;
    println!("        Result: {} {} layout '{}'", output.dtype, output.shape, output.layout);
    for task in engine.tasks() {
        println!("        Kernel: {} for {}", task.ctx.key, task.ctx.node);
    }
    println!();

    // ── Run ────────────────────────────────────────────────────
    println!("  [2/3] Resolving tile arguments...");
    let plan = engine.run()?;
    println!("        {}", plan.cover.summary());
    println!(
        "        {} work units, {} kernel calls",
        plan.num_units(),
        plan.num_calls(),
    );
    if show_tiles {
        println!();
        print_tiles(&plan);
    }
    println!();

    // ── Dispatch ───────────────────────────────────────────────
    println!("  [3/3] Dispatching (dry run)...");
    let metrics = engine.dispatch(plan).await?;
    println!("        {}", metrics.summary());
    println!();

    Ok(())
}

fn tasks_label(tiles_per_task: usize) -> String {
    if tiles_per_task == usize::MAX {
        "unbounded".to_string()
    } else {
        tiles_per_task.to_string()
    }
}

fn print_tiles(plan: &RunPlan) {
    println!(
        "  {:<5} {:<7} {:<7} {:>7} {:>10}  {}",
        "Unit", "Sample", "Extent", "Size", "Out byte", "Operands",
    );
    println!("  {}", "-".repeat(76));
    for (u, unit) in plan.units.iter().enumerate() {
        for call in &unit.calls {
            for tile in &call.tiles {
                let operands: Vec<String> = tile.args.iter().map(describe).collect();
                println!(
                    "  {:<5} {:<7} {:<7} {:>7} {:>10}  {}",
                    u,
                    tile.desc.sample_idx,
                    tile.desc.extent_idx,
                    tile.desc.size,
                    tile.output.byte_offset,
                    operands.join(", "),
                );
            }
        }
    }
}

fn describe(arg: &ArgRef) -> String {
    match arg {
        ArgRef::Constant(c) => format!("{}[{}]:{}", c.class, c.offset, c.dtype),
        ArgRef::Input {
            input,
            sample,
            byte_offset,
            dtype,
            broadcast,
        } => {
            let mark = if *broadcast { "*" } else { "" };
            format!("&{input}.{sample}+{byte_offset}:{dtype}{mark}")
        }
    }
}
