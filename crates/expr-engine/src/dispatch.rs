// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Handing a [`RunPlan`] to the backend.
//!
//! On the CPU every work unit becomes one blocking job; at most
//! `num_threads` jobs run at once. Within a unit the kernel calls run in
//! task order. After the first failing unit no further unit starts, and
//! the error is returned only once every started unit has finished. On the GPU the kernel calls are issued in plan order on the
//! calling thread; each kernel enqueues its work on the stream in its
//! context and returns without waiting for completion.

use crate::{DispatchMetrics, EngineError, KernelCall, RunPlan, WorkUnit};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tile_planner::Backend;
use tokio::sync::Semaphore;

pub(crate) async fn dispatch_cpu(
    plan: RunPlan,
    num_threads: usize,
) -> Result<DispatchMetrics, EngineError> {
    let start = Instant::now();
    let elements = plan.cover.covered_elements();
    let mut metrics = DispatchMetrics::new(Backend::Cpu);
    let permits = Arc::new(Semaphore::new(num_threads.max(1)));
    let failed = Arc::new(AtomicBool::new(false));

    let mut first_error = None;
    let mut handles = Vec::with_capacity(plan.units.len());
    for (index, unit) in plan.units.into_iter().enumerate() {
        let permit = match Arc::clone(&permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                first_error = Some(EngineError::Dispatch(format!("worker pool closed: {e}")));
                break;
            }
        };
        if failed.load(Ordering::SeqCst) {
            break;
        }
        let failed = Arc::clone(&failed);
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            if failed.load(Ordering::SeqCst) {
                return Ok(None);
            }
            match run_unit(&unit) {
                Ok(stats) => Ok(Some(stats)),
                Err(e) => {
                    failed.store(true, Ordering::SeqCst);
                    Err(e)
                }
            }
        });
        handles.push((index, handle));
    }

    // Every spawned unit is joined before returning, so no kernel is still
    // writing to the outputs once the caller sees the result.
    for (index, handle) in handles {
        let outcome = handle.await.map_err(|e| {
            EngineError::Dispatch(format!("work unit {index} panicked or was cancelled: {e}"))
        });
        match outcome.and_then(|result| result) {
            Ok(Some((tiles, calls, duration))) => {
                metrics.record_unit(index, tiles, calls, duration);
            }
            Ok(None) => {}
            Err(e) => {
                failed.store(true, Ordering::SeqCst);
                if first_error.is_none() {
                    tracing::warn!("work unit {index} failed: {e}");
                    first_error = Some(e);
                }
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    metrics.finalise(start.elapsed(), elements);
    Ok(metrics)
}

pub(crate) fn dispatch_gpu(plan: RunPlan) -> Result<DispatchMetrics, EngineError> {
    let start = Instant::now();
    let elements = plan.cover.covered_elements();
    let mut metrics = DispatchMetrics::new(Backend::Gpu);

    for (index, unit) in plan.units.iter().enumerate() {
        let (tiles, calls, duration) = run_unit(unit)?;
        metrics.record_unit(index, tiles, calls, duration);
    }

    metrics.finalise(start.elapsed(), elements);
    Ok(metrics)
}

/// Runs every kernel call of `unit` in order.
fn run_unit(unit: &WorkUnit) -> Result<(usize, usize, Duration), EngineError> {
    let start = Instant::now();
    for call in &unit.calls {
        execute(call)?;
    }
    Ok((unit.range.len(), unit.calls.len(), start.elapsed()))
}

fn execute(call: &KernelCall) -> Result<(), EngineError> {
    call.kernel
        .execute(&call.ctx, &call.tiles)
        .map_err(|source| EngineError::Kernel {
            op: call.ctx.key.op.to_string(),
            source,
        })
}
