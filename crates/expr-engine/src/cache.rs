// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Kernel implementations and the cache that deduplicates them.
//!
//! Kernels themselves live outside this crate. The engine only knows the
//! [`ExprImpl`] trait, asks a [`KernelFactory`] for an instance the first
//! time a [`KernelKey`] is seen, and reuses the same `Arc` afterwards.

use crate::{EngineError, ExprImplContext, ExtendedTileDesc, KernelError};
use expr_ir::{ArithmeticOp, ExprError, ExprFunc, NodeKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tensor_meta::DType;
use tile_planner::Backend;

/// A compiled element-wise kernel for one operator signature.
///
/// `execute` processes a contiguous run of tiles. On the CPU backend it is
/// called from blocking worker threads, so implementations must be
/// `Send + Sync`.
pub trait ExprImpl: Send + Sync + fmt::Debug {
    fn execute(&self, ctx: &ExprImplContext, tiles: &[ExtendedTileDesc]) -> Result<(), KernelError>;
}

/// Creates kernels on a cache miss.
pub trait KernelFactory: Send + Sync {
    fn create(&self, key: &KernelKey) -> Result<Arc<dyn ExprImpl>, KernelError>;
}

/// Everything that selects a kernel: operator, backend and operand signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelKey {
    pub op: ArithmeticOp,
    pub backend: Backend,
    pub operand_kinds: Vec<NodeKind>,
    pub operand_dtypes: Vec<DType>,
    /// Result type; derived from the other fields.
    pub result: DType,
}

impl KernelKey {
    /// Builds the key for a function node whose types have been inferred.
    pub fn for_function(func: &ExprFunc, backend: Backend) -> Result<Self, EngineError> {
        let op = ArithmeticOp::from_name(&func.op)
            .ok_or_else(|| ExprError::UnknownOperator(func.op.clone()))?;
        let operand_dtypes = func.operand_dtypes().ok_or_else(|| EngineError::Kernel {
            op: func.op.clone(),
            source: KernelError("operand types have not been inferred".into()),
        })?;
        let result = op.result_type(&operand_dtypes)?;
        Ok(Self {
            op,
            backend,
            operand_kinds: func.operand_kinds(),
            operand_dtypes,
            result,
        })
    }
}

impl fmt::Display for KernelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}](", self.op, self.backend)?;
        for (i, (kind, dtype)) in self.operand_kinds.iter().zip(&self.operand_dtypes).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{dtype}", kind.tag())?;
        }
        write!(f, ") -> {}", self.result)
    }
}

/// Per-engine cache of kernel instances.
#[derive(Debug, Default)]
pub struct ExprImplCache {
    entries: HashMap<KernelKey, Arc<dyn ExprImpl>>,
    hits: usize,
    misses: usize,
}

impl ExprImplCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached kernel for `key`, creating it with `factory` on a miss.
    pub fn get_or_create(
        &mut self,
        key: &KernelKey,
        factory: &dyn KernelFactory,
    ) -> Result<Arc<dyn ExprImpl>, EngineError> {
        if let Some(kernel) = self.entries.get(key) {
            self.hits += 1;
            return Ok(Arc::clone(kernel));
        }

        let kernel = factory.create(key).map_err(|source| EngineError::Kernel {
            op: key.op.to_string(),
            source,
        })?;
        self.misses += 1;
        tracing::debug!("created kernel {key}");
        self.entries.insert(key.clone(), Arc::clone(&kernel));
        Ok(kernel)
    }

    /// Number of distinct kernels held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
