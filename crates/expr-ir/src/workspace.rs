// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The binding context a tree is evaluated against.
//!
//! A [`Workspace`] describes, for one batch, every input tensor the tree may
//! reference: its element type, per-sample shapes and layout. It also
//! carries the opaque stream handle of the caller's execution context. The
//! planner never touches tensor data, so no buffers live here.

use crate::ExprError;
use std::fmt;
use std::path::Path;
use tensor_meta::{DType, ShapeList, TensorLayout};

/// Opaque token for a backend stream or worker context.
///
/// The planner threads it through execution tasks without inspecting it.
/// `StreamHandle::NONE` stands for "no stream" (host execution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StreamHandle(pub u64);

impl StreamHandle {
    pub const NONE: StreamHandle = StreamHandle(0);
}

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{:x}", self.0)
    }
}

/// Metadata of one bound input.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputBinding {
    /// Element type of every sample.
    pub dtype: DType,
    /// Per-sample shapes.
    pub shapes: ShapeList,
    /// Axis layout; empty when the producer did not set one.
    #[serde(default)]
    pub layout: TensorLayout,
}

impl InputBinding {
    pub fn new(dtype: DType, shapes: ShapeList, layout: impl Into<TensorLayout>) -> Self {
        Self {
            dtype,
            shapes,
            layout: layout.into(),
        }
    }
}

/// Inputs bound for one batch, plus the execution stream.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Workspace {
    batch_size: usize,
    inputs: Vec<InputBinding>,
    #[serde(default)]
    stream: Option<StreamHandle>,
}

impl Workspace {
    /// Creates an empty workspace for a batch of `batch_size` samples.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            inputs: Vec::new(),
            stream: None,
        }
    }

    /// Appends an input binding (builder style).
    pub fn with_input(mut self, input: InputBinding) -> Self {
        self.inputs.push(input);
        self
    }

    /// Sets the stream handle (builder style).
    pub fn with_stream(mut self, stream: StreamHandle) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Replaces the input at `index`, e.g. when the next batch arrives.
    pub fn rebind(&mut self, index: usize, input: InputBinding) -> Result<(), ExprError> {
        let available = self.inputs.len();
        let slot = self
            .inputs
            .get_mut(index)
            .ok_or(ExprError::MissingInput { index, available })?;
        *slot = input;
        Ok(())
    }

    /// Number of samples in the batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of bound inputs.
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Returns the binding for input `index`.
    pub fn input(&self, index: usize) -> Result<&InputBinding, ExprError> {
        self.inputs.get(index).ok_or(ExprError::MissingInput {
            index,
            available: self.inputs.len(),
        })
    }

    /// Iterates over the bound inputs.
    pub fn inputs(&self) -> impl Iterator<Item = &InputBinding> {
        self.inputs.iter()
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// The stream to run on, or [`StreamHandle::NONE`].
    pub fn stream(&self) -> StreamHandle {
        self.stream.unwrap_or(StreamHandle::NONE)
    }

    /// Checks that every input carries exactly one shape per sample.
    pub fn validate_bindings(&self) -> Result<(), ExprError> {
        for (i, input) in self.inputs.iter().enumerate() {
            if input.shapes.num_samples() != self.batch_size {
                return Err(ExprError::BindingCount {
                    argument: format!("input {i}"),
                    expected: self.batch_size,
                    actual: input.shapes.num_samples(),
                });
            }
            input
                .shapes
                .element_count()
                .map_err(|source| ExprError::InvalidInputShape { index: i, source })?;
        }
        Ok(())
    }

    /// Parses a workspace from JSON.
    pub fn from_json(json: &str) -> Result<Self, ExprError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a workspace from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ExprError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_meta::Shape;

    fn workspace() -> Workspace {
        Workspace::new(2)
            .with_input(InputBinding::new(
                DType::F32,
                ShapeList::uniform(2, Shape::new(vec![4, 4])),
                "HW",
            ))
            .with_input(InputBinding::new(
                DType::U8,
                ShapeList::uniform(2, Shape::vector(1)),
                "",
            ))
    }

    #[test]
    fn test_input_lookup() {
        let ws = workspace();
        assert_eq!(ws.num_inputs(), 2);
        assert_eq!(ws.input(1).unwrap().dtype, DType::U8);
        assert!(matches!(
            ws.input(5),
            Err(ExprError::MissingInput { index: 5, available: 2 })
        ));
    }

    #[test]
    fn test_stream_defaults_to_none() {
        let ws = workspace();
        assert!(!ws.has_stream());
        assert_eq!(ws.stream(), StreamHandle::NONE);
        let ws = ws.with_stream(StreamHandle(0xbeef));
        assert_eq!(ws.stream(), StreamHandle(0xbeef));
    }

    #[test]
    fn test_validate_bindings() {
        let ws = workspace();
        ws.validate_bindings().unwrap();

        let ws = ws.with_input(InputBinding::new(
            DType::F32,
            ShapeList::uniform(3, Shape::vector(8)),
            "",
        ));
        let err = ws.validate_bindings().unwrap_err();
        assert!(matches!(
            err,
            ExprError::BindingCount { expected: 2, actual: 3, .. }
        ));
        assert!(err.to_string().contains("input 2"));

        let huge = Workspace::new(1).with_input(InputBinding::new(
            DType::U8,
            ShapeList::new(vec![Shape::new(vec![1 << 40, 1 << 40])]),
            "",
        ));
        assert!(matches!(
            huge.validate_bindings(),
            Err(ExprError::InvalidInputShape { index: 0, .. })
        ));
    }

    #[test]
    fn test_rebind() {
        let mut ws = workspace();
        let next = InputBinding::new(DType::F32, ShapeList::uniform(2, Shape::vector(9)), "");
        ws.rebind(0, next.clone()).unwrap();
        assert_eq!(ws.input(0).unwrap(), &next);
        assert!(ws.rebind(7, next).is_err());
    }

    #[test]
    fn test_from_json() {
        let ws = Workspace::from_json(
            r#"{
                "batch_size": 1,
                "inputs": [
                    { "dtype": "i32", "shapes": [[10, 20]], "layout": "HW" },
                    { "dtype": "f32", "shapes": [[1]] }
                ],
                "stream": 7
            }"#,
        )
        .unwrap();
        assert_eq!(ws.batch_size(), 1);
        assert_eq!(ws.input(0).unwrap().layout.as_str(), "HW");
        assert!(ws.input(1).unwrap().layout.is_empty());
        assert_eq!(ws.stream(), StreamHandle(7));
    }
}
