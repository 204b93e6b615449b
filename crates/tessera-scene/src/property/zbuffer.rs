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

//! Depth testing and depth writes.

use super::{compare_from_index, read_or_default};
use tessera_core::renderer::CompareFunction;
use tessera_core::{BlockHandle, SceneSource};

/// Depth buffer state of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct ZBufferProperty {
    pub(crate) depth_test: bool,
    pub(crate) depth_mask: bool,
    pub(crate) function: CompareFunction,
}

impl Default for ZBufferProperty {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_mask: true,
            function: CompareFunction::LessEqual,
        }
    }
}

impl ZBufferProperty {
    pub(crate) fn read(&mut self, source: &dyn SceneSource, block: BlockHandle) {
        let flags = read_or_default(source.get_int(block, "Flags"), 3);
        // Older data packs the function into the flags word, newer data has
        // a dedicated field. Absent both, keep the usual less-or-equal test.
        let function = match source.get_int(block, "Function") {
            Ok(index) => compare_from_index(index),
            Err(_) if flags & 0x3C != 0 => compare_from_index((flags >> 2) & 0x07),
            Err(_) => CompareFunction::LessEqual,
        };
        self.depth_test = flags & 1 != 0;
        self.depth_mask = flags & 2 != 0;
        self.function = function;
    }

    /// Returns `true` if depth testing is enabled.
    pub fn test(&self) -> bool {
        self.depth_test
    }

    /// Returns `true` if depth writes are enabled.
    pub fn mask(&self) -> bool {
        self.depth_mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::scene::{FieldValue, MemorySource};

    #[test]
    fn test_flag_bits() {
        let mut source = MemorySource::new();
        let read_only = source.insert_with("NiZBufferProperty", [("Flags", FieldValue::Int(1))]);
        let disabled = source.insert_with("NiZBufferProperty", [("Flags", FieldValue::Int(0))]);

        let mut zbuffer = ZBufferProperty::default();
        zbuffer.read(&source, read_only);
        assert!(zbuffer.test());
        assert!(!zbuffer.mask());
        assert_eq!(zbuffer.function, CompareFunction::LessEqual);

        zbuffer.read(&source, disabled);
        assert!(!zbuffer.test());
        assert!(!zbuffer.mask());
    }

    #[test]
    fn test_explicit_function_field() {
        let mut source = MemorySource::new();
        let block = source.insert_with(
            "NiZBufferProperty",
            [("Flags", FieldValue::Int(3)), ("Function", FieldValue::Int(1))],
        );

        let mut zbuffer = ZBufferProperty::default();
        zbuffer.read(&source, block);
        assert_eq!(zbuffer.function, CompareFunction::Less);
    }
}
