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

//! Errors reported by scene-description lookups.

use super::{BlockHandle, FieldValue};
use thiserror::Error;

/// A failed lookup in a [`SceneSource`](super::SceneSource).
///
/// None of these are fatal to rendering. Callers in this workspace log them
/// and fall back to empty or default state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The block was removed, or the handle belongs to a recycled slot.
    #[error("block {0} no longer exists")]
    MissingBlock(BlockHandle),
    /// The block exists but has no field with this name.
    #[error("block {block} has no field '{field}'")]
    MissingField {
        /// The block that was queried.
        block: BlockHandle,
        /// The requested field name.
        field: String,
    },
    /// The field exists but holds a value of a different shape.
    #[error("field '{field}' of block {block} holds a {found}, expected a {expected}")]
    TypeMismatch {
        /// The block that was queried.
        block: BlockHandle,
        /// The requested field name.
        field: String,
        /// The shape the caller asked for.
        expected: &'static str,
        /// The shape actually stored.
        found: &'static str,
    },
}

impl SourceError {
    pub(crate) fn mismatch(
        block: BlockHandle,
        field: &str,
        expected: &'static str,
        found: &FieldValue,
    ) -> Self {
        SourceError::TypeMismatch {
            block,
            field: field.to_owned(),
            expected,
            found: found.kind_name(),
        }
    }

    /// Returns `true` if the error means the block itself is gone.
    pub fn is_missing_block(&self) -> bool {
        matches!(self, SourceError::MissingBlock(_))
    }
}
