// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The scene-description contract.
//!
//! Scene data arrives as a generic graph of typed blocks. Each block has a type
//! name (`"NiMaterialProperty"`, `"NiParticlesData"`, ...), a revision counter
//! that moves whenever its content changes, and a set of named fields.
//! Consumers address blocks through opaque, generational [`BlockHandle`]s and
//! read fields through the [`SceneSource`] trait.
//!
//! Every lookup can fail: blocks disappear, fields go missing, values arrive
//! with the wrong shape. These failures are reported as [`SourceError`]s, and
//! the evaluation code turns them into empty or default state.

mod error;
mod memory;

pub use error::SourceError;
pub use memory::MemorySource;

use crate::math::{LinearRgba, Vec3};
use std::fmt;

/// Upper bound on type-inheritance walks, guarding against cyclic parent tables.
const MAX_INHERITANCE_DEPTH: usize = 16;

/// An opaque, stable reference to one block of a scene-description source.
///
/// It combines a slot index with a generation count. When a block is removed
/// its slot may be recycled, but the generation is bumped, so handles to the
/// old block never resolve to the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle {
    /// The slot index of the block inside its source.
    pub index: u32,
    /// The generation of the slot when the handle was issued.
    pub generation: u32,
}

impl BlockHandle {
    /// Creates a handle from its raw parts.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for BlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// A single typed value stored in a block field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A boolean flag.
    Bool(bool),
    /// An integer, also used for bit-packed flag words and enum selectors.
    Int(i64),
    /// A scalar.
    Float(f32),
    /// A color. RGB colors are stored with `a = 1.0`.
    Color(LinearRgba),
    /// A single 3D vector.
    Vector(Vec3),
    /// An array of 3D vectors.
    Vectors(Vec<Vec3>),
    /// An array of colors.
    Colors(Vec<LinearRgba>),
    /// An array of scalars.
    Floats(Vec<f32>),
    /// A reference to another block; `None` is a null link.
    Link(Option<BlockHandle>),
    /// A list of references to other blocks.
    Links(Vec<BlockHandle>),
    /// Free-form text.
    Text(String),
}

impl FieldValue {
    /// A short name for the value's shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Color(_) => "color",
            FieldValue::Vector(_) => "vector",
            FieldValue::Vectors(_) => "vector array",
            FieldValue::Colors(_) => "color array",
            FieldValue::Floats(_) => "float array",
            FieldValue::Link(_) => "link",
            FieldValue::Links(_) => "link array",
            FieldValue::Text(_) => "text",
        }
    }
}

/// Read access to a scene-description graph.
///
/// Implementors supply the five required lookups; the typed getters are
/// provided on top of [`SceneSource::field`] and accept the lenient coercions
/// the source format relies on (integers as booleans, integers as floats).
pub trait SceneSource {
    /// Returns `true` if `block` still refers to a live block.
    fn contains(&self, block: BlockHandle) -> bool;

    /// Returns the declared type name of `block`.
    fn block_type(&self, block: BlockHandle) -> Option<&str>;

    /// Returns the parent of a block type in the type hierarchy, if any.
    fn parent_type(&self, type_name: &str) -> Option<&str>;

    /// Returns the content revision of `block`. It changes whenever any field
    /// of the block is written.
    fn revision(&self, block: BlockHandle) -> Option<u64>;

    /// Returns the raw value of the field `name` of `block`.
    fn field(&self, block: BlockHandle, name: &str) -> Result<&FieldValue, SourceError>;

    /// Returns `true` if the type of `block` is `ancestor` or derives from it.
    fn inherits(&self, block: BlockHandle, ancestor: &str) -> bool {
        let mut current = self.block_type(block);
        for _ in 0..MAX_INHERITANCE_DEPTH {
            match current {
                Some(name) if name == ancestor => return true,
                Some(name) => current = self.parent_type(name),
                None => return false,
            }
        }
        false
    }

    /// Reads a boolean. Integers are accepted, non-zero meaning `true`.
    fn get_bool(&self, block: BlockHandle, name: &str) -> Result<bool, SourceError> {
        match self.field(block, name)? {
            FieldValue::Bool(v) => Ok(*v),
            FieldValue::Int(v) => Ok(*v != 0),
            other => Err(SourceError::mismatch(block, name, "bool", other)),
        }
    }

    /// Reads an integer. Booleans are accepted as `0` / `1`.
    fn get_int(&self, block: BlockHandle, name: &str) -> Result<i64, SourceError> {
        match self.field(block, name)? {
            FieldValue::Int(v) => Ok(*v),
            FieldValue::Bool(v) => Ok(i64::from(*v)),
            other => Err(SourceError::mismatch(block, name, "int", other)),
        }
    }

    /// Reads a scalar. Integers are converted.
    fn get_f32(&self, block: BlockHandle, name: &str) -> Result<f32, SourceError> {
        match self.field(block, name)? {
            FieldValue::Float(v) => Ok(*v),
            FieldValue::Int(v) => Ok(*v as f32),
            other => Err(SourceError::mismatch(block, name, "float", other)),
        }
    }

    /// Reads a color.
    fn get_color(&self, block: BlockHandle, name: &str) -> Result<LinearRgba, SourceError> {
        match self.field(block, name)? {
            FieldValue::Color(v) => Ok(*v),
            other => Err(SourceError::mismatch(block, name, "color", other)),
        }
    }

    /// Reads a single link, `Ok(None)` for a null link.
    fn get_link(&self, block: BlockHandle, name: &str) -> Result<Option<BlockHandle>, SourceError> {
        match self.field(block, name)? {
            FieldValue::Link(v) => Ok(*v),
            other => Err(SourceError::mismatch(block, name, "link", other)),
        }
    }

    /// Reads a list of links.
    fn get_links(&self, block: BlockHandle, name: &str) -> Result<&[BlockHandle], SourceError> {
        match self.field(block, name)? {
            FieldValue::Links(v) => Ok(v.as_slice()),
            other => Err(SourceError::mismatch(block, name, "link array", other)),
        }
    }

    /// Reads an array of vectors.
    fn get_vectors(&self, block: BlockHandle, name: &str) -> Result<&[Vec3], SourceError> {
        match self.field(block, name)? {
            FieldValue::Vectors(v) => Ok(v.as_slice()),
            other => Err(SourceError::mismatch(block, name, "vector array", other)),
        }
    }

    /// Reads an array of colors.
    fn get_colors(&self, block: BlockHandle, name: &str) -> Result<&[LinearRgba], SourceError> {
        match self.field(block, name)? {
            FieldValue::Colors(v) => Ok(v.as_slice()),
            other => Err(SourceError::mismatch(block, name, "color array", other)),
        }
    }

    /// Reads an array of scalars.
    fn get_floats(&self, block: BlockHandle, name: &str) -> Result<&[f32], SourceError> {
        match self.field(block, name)? {
            FieldValue::Floats(v) => Ok(v.as_slice()),
            other => Err(SourceError::mismatch(block, name, "float array", other)),
        }
    }
}
