// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # exprplan
//!
//! Command-line interface for the element-wise expression planner.
//!
//! ## Usage
//! ```bash
//! # Set up, run and dry-run dispatch an expression over a workspace
//! exprplan plan --expr add.json --inputs batch.json --backend gpu
//!
//! # Show the tile cover for a list of sample shapes
//! exprplan cover --shapes "[200];[10,20]" --tile-size 128 --tiles-per-task 4
//!
//! # Show inferred types, shapes and layouts node by node
//! exprplan inspect --expr add.json --inputs batch.json
//!
//! # Compute the result type of an operator
//! exprplan promote --op add --types i8,u8
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "exprplan",
    about = "Setup/run planner for element-wise tensor expressions",
    version,
    author
)]
struct Cli {
    /// Path to an engine TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan an expression over a workspace and dry-run the dispatch.
    Plan {
        /// Expression tree (JSON).
        #[arg(short, long)]
        expr: PathBuf,

        /// Workspace with the bound inputs (JSON).
        #[arg(short, long)]
        inputs: PathBuf,

        /// Backend override: cpu or gpu.
        #[arg(short, long)]
        backend: Option<String>,

        /// Print every tile's resolved arguments.
        #[arg(long)]
        tiles: bool,
    },

    /// Print the tile cover of a batch of sample shapes.
    Cover {
        /// Sample shapes separated by ';', e.g. "[200];[10,20]".
        #[arg(short, long)]
        shapes: String,

        /// Nominal tile size in elements.
        #[arg(short, long, default_value_t = tile_planner::TilingConfig::CPU_TILE_SIZE)]
        tile_size: usize,

        /// Maximum tiles per task.
        #[arg(short = 'n', long, default_value_t = tile_planner::TilingConfig::CPU_TILES_PER_TASK)]
        tiles_per_task: usize,
    },

    /// Show the inferred metadata of every node of an expression.
    Inspect {
        /// Expression tree (JSON).
        #[arg(short, long)]
        expr: PathBuf,

        /// Workspace with the bound inputs (JSON).
        #[arg(short, long)]
        inputs: PathBuf,
    },

    /// Compute the result type of an operator over operand types.
    Promote {
        /// Operator name, e.g. add, fdiv, minus.
        #[arg(short, long)]
        op: String,

        /// Comma-separated operand types, e.g. "i8,u8".
        #[arg(short, long)]
        types: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Plan {
            expr,
            inputs,
            backend,
            tiles,
        } => commands::plan::execute(expr, inputs, cli.config, backend, tiles).await,
        Commands::Cover {
            shapes,
            tile_size,
            tiles_per_task,
        } => commands::cover::execute(&shapes, tile_size, tiles_per_task),
        Commands::Inspect { expr, inputs } => commands::inspect::execute(expr, inputs),
        Commands::Promote { op, types } => commands::promote::execute(&op, &types),
    }
}
