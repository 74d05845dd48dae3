// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-tile argument resolution.
//!
//! A [`TileDesc`] only says which elements of the output to produce. Before
//! a kernel can run, each tile is extended with where its output goes and
//! where every operand's elements come from. Locations are byte offsets
//! into the bound buffers, computed with each operand's own element size.

use crate::{ConstantRef, ConstantStorage, EngineError};
use expr_ir::{ExprError, ExprFunc, ExprNode};
use tensor_meta::DType;
use tile_planner::TileDesc;

/// Where an operand's elements for one tile live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArgRef {
    /// A literal in constant storage.
    Constant(ConstantRef),
    /// A slice of a bound input.
    Input {
        input: usize,
        sample: usize,
        /// Offset of the tile's first element within the sample.
        byte_offset: usize,
        dtype: DType,
        /// The sample holds a single element that applies to the whole tile.
        broadcast: bool,
    },
}

/// Where a tile's results are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct OutputRef {
    pub sample: usize,
    pub byte_offset: usize,
    pub dtype: DType,
}

/// A tile with its output and operand locations resolved.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ExtendedTileDesc {
    pub desc: TileDesc,
    pub output: OutputRef,
    pub args: Vec<ArgRef>,
}

/// Resolves every tile of `tiles` for the function node `func`.
///
/// `func` must have been through type and shape propagation.
pub fn transform_descs(
    func: &ExprFunc,
    tiles: &[TileDesc],
    constants: &ConstantStorage,
) -> Result<Vec<ExtendedTileDesc>, EngineError> {
    let result_dtype = func.result_dtype().ok_or(EngineError::NotSetUp)?;

    tiles
        .iter()
        .map(|tile| {
            let args = func
                .args
                .iter()
                .map(|arg| resolve_arg(&func.op, arg, tile, constants))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ExtendedTileDesc {
                desc: *tile,
                output: OutputRef {
                    sample: tile.sample_idx,
                    byte_offset: tile.offset() * result_dtype.size_bytes(),
                    dtype: result_dtype,
                },
                args,
            })
        })
        .collect()
}

fn resolve_arg(
    op: &str,
    arg: &ExprNode,
    tile: &TileDesc,
    constants: &ConstantStorage,
) -> Result<ArgRef, EngineError> {
    match arg {
        ExprNode::Constant(c) => Ok(ArgRef::Constant(constants.slot(c.index, c.dtype))),
        ExprNode::Tensor(t) => {
            let dtype = arg.dtype().ok_or(EngineError::NotSetUp)?;
            let shapes = arg.shape().ok_or(EngineError::NotSetUp)?;
            if shapes.is_scalar_like() {
                let sample = if shapes.num_samples() == 1 { 0 } else { tile.sample_idx };
                Ok(ArgRef::Input {
                    input: t.input,
                    sample,
                    byte_offset: 0,
                    dtype,
                    broadcast: true,
                })
            } else {
                Ok(ArgRef::Input {
                    input: t.input,
                    sample: tile.sample_idx,
                    byte_offset: tile.offset() * dtype.size_bytes(),
                    dtype,
                    broadcast: false,
                })
            }
        }
        ExprNode::Function(_) => Err(ExprError::UnsupportedExpressionShape(format!(
            "operand of '{op}' is itself a function; nested expressions are not supported"
        ))
        .into()),
    }
}
