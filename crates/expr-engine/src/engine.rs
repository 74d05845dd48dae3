// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The arithmetic engine: a two-phase setup/run planner.
//!
//! ```text
//! ArithmeticEngine::new(config, tree, factory)   validates the tree shape
//!     │
//!     │  .setup(&workspace)     per batch: infer, tile, pick kernels
//!     ▼
//!   OutputDesc
//!     │
//!     │  .run()                 resolve every tile's argument locations
//!     ▼
//!   RunPlan
//!     │
//!     │  .dispatch(plan).await  hand the work units to the backend
//!     ▼
//!   DispatchMetrics
//! ```
//!
//! Types, the result layout and constant storage are computed by the first
//! setup and cached; later setups only redo shapes, tiling and tasks.
//! [`ArithmeticEngine::reset_bindings`] drops the cache.

use crate::dispatch::{dispatch_cpu, dispatch_gpu};
use crate::{
    create_execution_tasks, transform_descs, ConstantStorage, DispatchMetrics, EngineConfig,
    EngineError, ExprImpl, ExprImplCache, ExprImplContext, ExprImplTask, ExtendedTileDesc,
    KernelFactory,
};
use expr_ir::propagate::{common_layout, propagate_shapes, propagate_types};
use expr_ir::tree::{Parsed, Validated};
use expr_ir::{ExprTree, Workspace};
use std::sync::Arc;
use tensor_meta::{DType, ShapeList, TensorLayout};
use tile_planner::{plan_cover, Backend, TileCover, TileRange, TilingConfig};

/// Description of the expression's result for one batch.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OutputDesc {
    pub dtype: DType,
    pub shape: ShapeList,
    pub layout: TensorLayout,
}

/// One kernel invocation over one task's tiles.
#[derive(Debug, Clone)]
pub struct KernelCall {
    pub kernel: Arc<dyn ExprImpl>,
    pub ctx: ExprImplContext,
    pub tiles: Vec<ExtendedTileDesc>,
}

/// The work for one task range: every kernel, in task order.
#[derive(Debug, Clone)]
pub struct WorkUnit {
    pub range: TileRange,
    pub calls: Vec<KernelCall>,
}

/// Everything `dispatch` needs to execute one batch.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub cover: TileCover,
    pub units: Vec<WorkUnit>,
}

impl RunPlan {
    pub fn num_units(&self) -> usize {
        self.units.len()
    }

    /// Total kernel invocations across all units.
    pub fn num_calls(&self) -> usize {
        self.units.iter().map(|u| u.calls.len()).sum()
    }
}

#[derive(Debug, Clone)]
struct Inference {
    dtype: DType,
    layout: TensorLayout,
}

#[derive(Debug)]
struct Prepared {
    output: OutputDesc,
    cover: TileCover,
    tasks: Vec<ExprImplTask>,
}

/// Plans element-wise evaluation of one expression over batches of inputs.
///
/// # Example
/// ```no_run
/// use expr_engine::{ArithmeticEngine, EngineConfig, KernelFactory};
/// use expr_ir::{ExprTree, Workspace};
/// use std::sync::Arc;
///
/// # async fn example(
/// #     tree: ExprTree,
/// #     ws: Workspace,
/// #     factory: Arc<dyn KernelFactory>,
/// # ) -> Result<(), expr_engine::EngineError> {
/// let mut engine = ArithmeticEngine::new(EngineConfig::default(), tree, factory)?;
/// let output = engine.setup(&ws)?;
/// println!("result: {} {}", output.dtype, output.shape);
/// let metrics = engine.dispatch(engine.run()?).await?;
/// println!("{}", metrics.summary());
/// # Ok(())
/// # }
/// ```
pub struct ArithmeticEngine {
    config: EngineConfig,
    tiling: TilingConfig,
    tree: ExprTree<Validated>,
    factory: Arc<dyn KernelFactory>,
    cache: ExprImplCache,
    constants: ConstantStorage,
    inference: Option<Inference>,
    prepared: Option<Prepared>,
}

impl ArithmeticEngine {
    /// Creates an engine for `tree`.
    ///
    /// Fails if the configuration's tiling is invalid or the tree is not a
    /// single function over leaf operands.
    pub fn new(
        config: EngineConfig,
        tree: ExprTree<Parsed>,
        factory: Arc<dyn KernelFactory>,
    ) -> Result<Self, EngineError> {
        let tiling = config.resolve_tiling()?;
        let tree = tree.validate()?;
        tracing::info!(
            "engine created for '{}' on {} (tile_size={}, tiles_per_task={})",
            tree,
            config.backend,
            tiling.tile_size,
            tiling.tiles_per_task,
        );
        Ok(Self {
            config,
            tiling,
            tree,
            factory,
            cache: ExprImplCache::new(),
            constants: ConstantStorage::new(),
            inference: None,
            prepared: None,
        })
    }

    /// Prepares the engine for the batch bound in `ws`.
    ///
    /// Steps:
    /// 1. Check every input's sample count against the batch size.
    /// 2. On the first call (or after `reset_bindings`): infer types and the
    ///    result layout, then lay out constant storage.
    /// 3. Infer shapes.
    /// 4. Tile the output and group tiles into tasks.
    /// 5. Create one execution task per function node.
    ///
    /// Any failure leaves the engine without a plan; `run` then fails with
    /// [`EngineError::NotSetUp`].
    pub fn setup(&mut self, ws: &Workspace) -> Result<OutputDesc, EngineError> {
        self.prepared = None;
        ws.validate_bindings()?;

        let inference = match self.inference.clone() {
            Some(inference) => inference,
            None => self.infer_bindings(ws)?,
        };

        let shape = propagate_shapes(self.tree.root_mut(), ws)?;
        let cover = plan_cover(&shape, self.tiling)?;
        if self.config.log_plan {
            tracing::info!("{}", cover.summary());
        } else {
            tracing::debug!("{}", cover.summary());
        }

        let tasks = create_execution_tasks(
            &self.tree,
            self.config.backend,
            ws.stream(),
            &mut self.cache,
            self.factory.as_ref(),
        )?;

        let output = OutputDesc {
            dtype: inference.dtype,
            shape,
            layout: inference.layout,
        };
        self.prepared = Some(Prepared {
            output: output.clone(),
            cover,
            tasks,
        });
        Ok(output)
    }

    /// Infers types and layout and materializes constants, then caches the
    /// result for later setups.
    fn infer_bindings(&mut self, ws: &Workspace) -> Result<Inference, EngineError> {
        let dtype = propagate_types(self.tree.root_mut(), ws)?;
        let layout = common_layout(self.tree.root_mut(), ws)?;
        self.constants
            .initialize(&self.tree.constants(), self.config.backend, ws.stream())?;
        tracing::info!("inferred result type {dtype}, layout '{layout}'");
        let inference = Inference { dtype, layout };
        self.inference = Some(inference.clone());
        Ok(inference)
    }

    /// Resolves the argument locations of every tile of the current batch.
    pub fn run(&self) -> Result<RunPlan, EngineError> {
        let prepared = self.prepared.as_ref().ok_or(EngineError::NotSetUp)?;

        let mut per_task = Vec::with_capacity(prepared.tasks.len());
        for task in &prepared.tasks {
            let func = self.tree.function(task.ctx.node).ok_or(EngineError::NotSetUp)?;
            per_task.push(transform_descs(func, &prepared.cover.tiles, &self.constants)?);
        }

        let units = prepared
            .cover
            .ranges
            .iter()
            .map(|range| WorkUnit {
                range: *range,
                calls: prepared
                    .tasks
                    .iter()
                    .zip(&per_task)
                    .map(|(task, tiles)| KernelCall {
                        kernel: Arc::clone(&task.kernel),
                        ctx: task.ctx.clone(),
                        tiles: tiles[range.as_range()].to_vec(),
                    })
                    .collect(),
            })
            .collect();

        Ok(RunPlan {
            cover: prepared.cover.clone(),
            units,
        })
    }

    /// Executes `plan` on the configured backend.
    pub async fn dispatch(&self, plan: RunPlan) -> Result<DispatchMetrics, EngineError> {
        let metrics = match self.config.backend {
            Backend::Cpu => dispatch_cpu(plan, self.config.resolve_threads()).await?,
            Backend::Gpu => dispatch_gpu(plan)?,
        };
        tracing::debug!("{}", metrics.summary());
        Ok(metrics)
    }

    /// Forgets inferred types, layout and constants; the next `setup`
    /// recomputes them. Cached kernels are kept.
    pub fn reset_bindings(&mut self) {
        self.inference = None;
        self.prepared = None;
        self.constants = ConstantStorage::new();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> Backend {
        self.config.backend
    }

    pub fn tiling(&self) -> TilingConfig {
        self.tiling
    }

    pub fn tree(&self) -> &ExprTree<Validated> {
        &self.tree
    }

    pub fn cache(&self) -> &ExprImplCache {
        &self.cache
    }

    pub fn constants(&self) -> &ConstantStorage {
        &self.constants
    }

    /// Whether types have been inferred since creation or the last reset.
    pub fn types_inferred(&self) -> bool {
        self.inference.is_some()
    }

    pub fn result_dtype(&self) -> Option<DType> {
        self.inference.as_ref().map(|i| i.dtype)
    }

    pub fn result_layout(&self) -> Option<&TensorLayout> {
        self.inference.as_ref().map(|i| &i.layout)
    }

    /// Output of the last successful setup.
    pub fn output(&self) -> Option<&OutputDesc> {
        self.prepared.as_ref().map(|p| &p.output)
    }

    /// Cover of the last successful setup.
    pub fn cover(&self) -> Option<&TileCover> {
        self.prepared.as_ref().map(|p| &p.cover)
    }

    /// Execution tasks of the last successful setup.
    pub fn tasks(&self) -> &[ExprImplTask] {
        self.prepared.as_ref().map_or(&[], |p| p.tasks.as_slice())
    }
}

impl std::fmt::Debug for ArithmeticEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArithmeticEngine")
            .field("expression", &self.tree.to_string())
            .field("backend", &self.config.backend)
            .field("tiling", &self.tiling)
            .field("types_inferred", &self.types_inferred())
            .field("set_up", &self.prepared.is_some())
            .field("cached_kernels", &self.cache.len())
            .finish()
    }
}
