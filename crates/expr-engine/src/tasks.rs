// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Execution tasks: one kernel invocation per function node.

use crate::{EngineError, ExprImpl, ExprImplCache, KernelFactory, KernelKey};
use expr_ir::{tree::Validated, ExprTree, NodeId, StreamHandle};
use std::sync::Arc;
use tile_planner::Backend;

/// What a kernel is told about the node it evaluates.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprImplContext {
    /// Stream the kernel should enqueue on; `StreamHandle::NONE` on the CPU.
    pub stream: StreamHandle,
    /// Function node this kernel evaluates.
    pub node: NodeId,
    /// Signature the kernel was selected for.
    pub key: KernelKey,
}

/// A kernel paired with its context.
#[derive(Debug, Clone)]
pub struct ExprImplTask {
    pub kernel: Arc<dyn ExprImpl>,
    pub ctx: ExprImplContext,
}

/// Creates one task per function node, children before parents.
///
/// Kernels come from `cache`; `factory` is consulted only for signatures
/// the cache has not seen.
pub fn create_execution_tasks(
    tree: &ExprTree<Validated>,
    backend: Backend,
    stream: StreamHandle,
    cache: &mut ExprImplCache,
    factory: &dyn KernelFactory,
) -> Result<Vec<ExprImplTask>, EngineError> {
    tree.function_nodes()
        .into_iter()
        .map(|(node, func)| {
            let key = KernelKey::for_function(func, backend)?;
            let kernel = cache.get_or_create(&key, factory)?;
            Ok(ExprImplTask {
                kernel,
                ctx: ExprImplContext { stream, node, key },
            })
        })
        .collect()
}
