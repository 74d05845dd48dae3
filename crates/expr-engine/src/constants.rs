// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Storage for the literal operands of an expression.
//!
//! Constants are split into two classes, integers and reals, each with its
//! own dense index space. Every constant occupies one 8-byte slot in its
//! class's buffer at `index * 8`; the value is written little-endian in its
//! own dtype at the start of the slot. Kernels read constants through
//! [`ConstantRef`]s, never through the tree.

use crate::EngineError;
use expr_ir::{ExprConstant, StreamHandle};
use half::{bf16, f16};
use std::fmt;
use tensor_meta::DType;
use tile_planner::Backend;

/// The two index spaces constants live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstantClass {
    Integer,
    Real,
}

impl ConstantClass {
    pub fn of(dtype: DType) -> Self {
        if dtype.is_float() {
            ConstantClass::Real
        } else {
            ConstantClass::Integer
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConstantClass::Integer => "integer",
            ConstantClass::Real => "real",
        }
    }
}

impl fmt::Display for ConstantClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of one constant's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ConstantRef {
    pub class: ConstantClass,
    /// Byte offset of the slot within the class buffer.
    pub offset: usize,
    pub dtype: DType,
}

/// Padded, per-class buffers holding every constant of a tree.
#[derive(Debug, Default)]
pub struct ConstantStorage {
    integers: Vec<u8>,
    reals: Vec<u8>,
    backend: Option<Backend>,
    stream: StreamHandle,
}

impl ConstantStorage {
    /// Bytes reserved per constant.
    pub const SLOT_BYTES: usize = 8;

    pub fn new() -> Self {
        Self::default()
    }

    /// Lays out and encodes `constants`, replacing any previous contents.
    ///
    /// Within each class the indices must be exactly `0..count`, each used
    /// once. On the GPU backend the buffers are staged for upload on
    /// `stream`; on the CPU they are used as-is.
    pub fn initialize(
        &mut self,
        constants: &[&ExprConstant],
        backend: Backend,
        stream: StreamHandle,
    ) -> Result<(), EngineError> {
        let integer_count = constants
            .iter()
            .filter(|c| ConstantClass::of(c.dtype) == ConstantClass::Integer)
            .count();
        let real_count = constants.len() - integer_count;

        let mut integers = vec![0u8; integer_count * Self::SLOT_BYTES];
        let mut reals = vec![0u8; real_count * Self::SLOT_BYTES];
        let mut seen_integers = vec![false; integer_count];
        let mut seen_reals = vec![false; real_count];

        for constant in constants {
            let class = ConstantClass::of(constant.dtype);
            let (buffer, seen) = match class {
                ConstantClass::Integer => (&mut integers, &mut seen_integers),
                ConstantClass::Real => (&mut reals, &mut seen_reals),
            };
            let count = seen.len();
            match seen.get_mut(constant.index) {
                Some(used) if !*used => *used = true,
                _ => {
                    return Err(EngineError::ConstantCountMismatch {
                        class: class.as_str(),
                        index: constant.index,
                        count,
                    });
                }
            }
            let offset = constant.index * Self::SLOT_BYTES;
            let bytes = encode(constant);
            buffer[offset..offset + bytes.len()].copy_from_slice(&bytes);
        }

        self.integers = integers;
        self.reals = reals;
        self.backend = Some(backend);
        self.stream = stream;

        match backend {
            Backend::Cpu => tracing::debug!(
                "stored {integer_count} integer and {real_count} real constants on the host"
            ),
            Backend::Gpu => tracing::debug!(
                "staged {} bytes of constants for upload on {stream}",
                self.integers.len() + self.reals.len(),
            ),
        }
        Ok(())
    }

    /// Whether `initialize` has succeeded at least once.
    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    /// Backend the buffers were prepared for.
    pub fn backend(&self) -> Option<Backend> {
        self.backend
    }

    /// Stream the upload was staged on.
    pub fn stream(&self) -> StreamHandle {
        self.stream
    }

    /// Location of the constant with class-local `index` and type `dtype`.
    pub fn slot(&self, index: usize, dtype: DType) -> ConstantRef {
        ConstantRef {
            class: ConstantClass::of(dtype),
            offset: index * Self::SLOT_BYTES,
            dtype,
        }
    }

    /// The whole buffer of one class.
    pub fn buffer(&self, class: ConstantClass) -> &[u8] {
        match class {
            ConstantClass::Integer => &self.integers,
            ConstantClass::Real => &self.reals,
        }
    }

    /// The encoded bytes of one constant, or `None` if out of range.
    pub fn read(&self, cref: ConstantRef) -> Option<&[u8]> {
        self.buffer(cref.class)
            .get(cref.offset..cref.offset + cref.dtype.size_bytes())
    }
}

/// Little-endian encoding of a constant in its own dtype.
fn encode(constant: &ExprConstant) -> Vec<u8> {
    let v = constant.value;
    match constant.dtype {
        DType::U8 => (v.as_i64() as u8).to_le_bytes().to_vec(),
        DType::U16 => (v.as_i64() as u16).to_le_bytes().to_vec(),
        DType::U32 => (v.as_i64() as u32).to_le_bytes().to_vec(),
        DType::U64 => (v.as_i64() as u64).to_le_bytes().to_vec(),
        DType::I8 => (v.as_i64() as i8).to_le_bytes().to_vec(),
        DType::I16 => (v.as_i64() as i16).to_le_bytes().to_vec(),
        DType::I32 => (v.as_i64() as i32).to_le_bytes().to_vec(),
        DType::I64 => v.as_i64().to_le_bytes().to_vec(),
        DType::F16 => f16::from_f64(v.as_f64()).to_le_bytes().to_vec(),
        DType::BF16 => bf16::from_f64(v.as_f64()).to_le_bytes().to_vec(),
        DType::F32 => (v.as_f64() as f32).to_le_bytes().to_vec(),
        DType::F64 => v.as_f64().to_le_bytes().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expr_ir::ConstantValue;

    fn constant(index: usize, dtype: DType, value: ConstantValue) -> ExprConstant {
        ExprConstant::new(index, dtype, value)
    }

    #[test]
    fn test_layout_per_class() {
        let cs = [
            constant(0, DType::F32, ConstantValue::Real(2.5)),
            constant(0, DType::I32, ConstantValue::Int(-7)),
            constant(1, DType::F64, ConstantValue::Real(0.125)),
        ];
        let refs: Vec<&ExprConstant> = cs.iter().collect();
        let mut storage = ConstantStorage::new();
        storage.initialize(&refs, Backend::Cpu, StreamHandle::NONE).unwrap();

        assert!(storage.is_initialized());
        assert_eq!(storage.buffer(ConstantClass::Integer).len(), 8);
        assert_eq!(storage.buffer(ConstantClass::Real).len(), 16);

        let r0 = storage.slot(0, DType::F32);
        assert_eq!(r0.offset, 0);
        assert_eq!(storage.read(r0).unwrap(), 2.5f32.to_le_bytes());

        let r1 = storage.slot(1, DType::F64);
        assert_eq!(r1.offset, 8);
        assert_eq!(storage.read(r1).unwrap(), 0.125f64.to_le_bytes());

        let i0 = storage.slot(0, DType::I32);
        assert_eq!(i0.class, ConstantClass::Integer);
        assert_eq!(storage.read(i0).unwrap(), (-7i32).to_le_bytes());
    }

    #[test]
    fn test_half_precision() {
        let cs = [
            constant(0, DType::F16, ConstantValue::Real(1.5)),
            constant(1, DType::BF16, ConstantValue::Int(3)),
        ];
        let refs: Vec<&ExprConstant> = cs.iter().collect();
        let mut storage = ConstantStorage::new();
        storage.initialize(&refs, Backend::Gpu, StreamHandle(9)).unwrap();

        assert_eq!(storage.backend(), Some(Backend::Gpu));
        assert_eq!(storage.stream(), StreamHandle(9));
        let h = storage.read(storage.slot(0, DType::F16)).unwrap();
        assert_eq!(f16::from_le_bytes([h[0], h[1]]), f16::from_f32(1.5));
        let b = storage.read(storage.slot(1, DType::BF16)).unwrap();
        assert_eq!(bf16::from_le_bytes([b[0], b[1]]), bf16::from_f32(3.0));
    }

    #[test]
    fn test_index_out_of_range() {
        let cs = [constant(1, DType::F32, ConstantValue::Real(1.0))];
        let refs: Vec<&ExprConstant> = cs.iter().collect();
        let err = ConstantStorage::new()
            .initialize(&refs, Backend::Cpu, StreamHandle::NONE)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::ConstantCountMismatch { class: "real", index: 1, count: 1 }
        ));
    }

    #[test]
    fn test_duplicate_index() {
        let cs = [
            constant(0, DType::I64, ConstantValue::Int(1)),
            constant(0, DType::U8, ConstantValue::Int(2)),
        ];
        let refs: Vec<&ExprConstant> = cs.iter().collect();
        let err = ConstantStorage::new()
            .initialize(&refs, Backend::Cpu, StreamHandle::NONE)
            .unwrap_err();
        assert!(matches!(err, EngineError::ConstantCountMismatch { class: "integer", .. }));
    }

    #[test]
    fn test_no_constants() {
        let mut storage = ConstantStorage::new();
        storage.initialize(&[], Backend::Cpu, StreamHandle::NONE).unwrap();
        assert!(storage.buffer(ConstantClass::Real).is_empty());
        assert!(storage.read(storage.slot(0, DType::F32)).is_none());
    }
}
