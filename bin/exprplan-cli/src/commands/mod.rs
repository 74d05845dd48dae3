// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared helpers.

pub mod cover;
pub mod inspect;
pub mod plan;
pub mod promote;

use expr_engine::{
    ExprImpl, ExprImplContext, ExtendedTileDesc, KernelError, KernelFactory, KernelKey,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Kernel that logs what it would compute and touches no memory.
#[derive(Debug)]
pub struct DryRunKernel {
    key: KernelKey,
}

impl ExprImpl for DryRunKernel {
    fn execute(&self, ctx: &ExprImplContext, tiles: &[ExtendedTileDesc]) -> Result<(), KernelError> {
        let elements: usize = tiles.iter().map(|t| t.desc.size).sum();
        tracing::debug!(
            "{} on {} ({}): {} tiles, {elements} elements",
            self.key,
            ctx.node,
            ctx.stream,
            tiles.len(),
        );
        Ok(())
    }
}

/// Factory handing out [`DryRunKernel`]s for every signature.
pub struct DryRunFactory;

impl KernelFactory for DryRunFactory {
    fn create(&self, key: &KernelKey) -> Result<Arc<dyn ExprImpl>, KernelError> {
        Ok(Arc::new(DryRunKernel { key: key.clone() }))
    }
}

/// Prints the boxed banner used at the top of every command.
pub fn banner(title: &str) {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║  {:<52}║", format!("exprplan · {title}"));
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
}
