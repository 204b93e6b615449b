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

//! An in-memory scene-description source.

use super::{BlockHandle, FieldValue, SceneSource, SourceError};
use std::collections::HashMap;

/// Block-type inheritance of the particle families, child first.
const PARTICLE_TYPE_PARENTS: &[(&str, &str)] = &[
    ("NiAutoNormalParticles", "NiParticles"),
    ("NiRotatingParticles", "NiParticles"),
    ("NiParticleSystem", "NiParticles"),
    ("NiAutoNormalParticlesData", "NiParticlesData"),
    ("NiRotatingParticlesData", "NiParticlesData"),
    ("NiPSysData", "NiRotatingParticlesData"),
];

#[derive(Debug, Clone)]
struct BlockEntry {
    type_name: String,
    fields: HashMap<String, FieldValue>,
    revision: u64,
}

/// A scene-description graph held entirely in memory.
///
/// Blocks live in slots; removed slots go on a free list and are reused with a
/// bumped generation, so stale [`BlockHandle`]s stop resolving instead of
/// aliasing the new block. Every field write bumps the block's revision.
#[derive(Debug, Clone)]
pub struct MemorySource {
    slots: Vec<(BlockHandle, Option<BlockEntry>)>,
    freed: Vec<u32>,
    type_parents: HashMap<String, String>,
}

impl MemorySource {
    /// Creates an empty source that knows the particle type families.
    pub fn new() -> Self {
        let type_parents = PARTICLE_TYPE_PARENTS
            .iter()
            .map(|(child, parent)| ((*child).to_owned(), (*parent).to_owned()))
            .collect();
        Self {
            slots: Vec::new(),
            freed: Vec::new(),
            type_parents,
        }
    }

    /// Declares that blocks of type `child` also count as `parent`.
    pub fn set_type_parent(&mut self, child: impl Into<String>, parent: impl Into<String>) {
        self.type_parents.insert(child.into(), parent.into());
    }

    /// Adds an empty block of the given type and returns its handle.
    pub fn insert(&mut self, type_name: impl Into<String>) -> BlockHandle {
        let entry = BlockEntry {
            type_name: type_name.into(),
            fields: HashMap::new(),
            revision: 0,
        };
        if let Some(index) = self.freed.pop() {
            let (handle, slot) = &mut self.slots[index as usize];
            handle.generation += 1;
            *slot = Some(entry);
            *handle
        } else {
            let handle = BlockHandle::new(self.slots.len() as u32, 0);
            self.slots.push((handle, Some(entry)));
            handle
        }
    }

    /// Adds a block and fills in its fields in one call.
    pub fn insert_with<I, S>(&mut self, type_name: impl Into<String>, fields: I) -> BlockHandle
    where
        I: IntoIterator<Item = (S, FieldValue)>,
        S: Into<String>,
    {
        let handle = self.insert(type_name);
        if let Some(entry) = self.entry_mut(handle) {
            entry
                .fields
                .extend(fields.into_iter().map(|(name, value)| (name.into(), value)));
        }
        handle
    }

    /// Writes a field and bumps the block's revision.
    pub fn set_field(
        &mut self,
        block: BlockHandle,
        name: impl Into<String>,
        value: FieldValue,
    ) -> Result<(), SourceError> {
        let entry = self
            .entry_mut(block)
            .ok_or(SourceError::MissingBlock(block))?;
        entry.fields.insert(name.into(), value);
        entry.revision += 1;
        Ok(())
    }

    /// Removes a field and bumps the block's revision. Returns the old value.
    pub fn remove_field(&mut self, block: BlockHandle, name: &str) -> Option<FieldValue> {
        let entry = self.entry_mut(block)?;
        let old = entry.fields.remove(name);
        if old.is_some() {
            entry.revision += 1;
        }
        old
    }

    /// Removes a block. Returns `false` if the handle was already stale.
    pub fn remove(&mut self, block: BlockHandle) -> bool {
        match self.slots.get_mut(block.index as usize) {
            Some((handle, slot)) if *handle == block && slot.is_some() => {
                *slot = None;
                self.freed.push(block.index);
                log::trace!("Removed block {block}");
                true
            }
            _ => false,
        }
    }

    /// Returns the number of live blocks.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|(_, slot)| slot.is_some()).count()
    }

    /// Returns `true` if the source holds no live blocks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, block: BlockHandle) -> Option<&BlockEntry> {
        self.slots
            .get(block.index as usize)
            .and_then(|(handle, slot)| if *handle == block { slot.as_ref() } else { None })
    }

    fn entry_mut(&mut self, block: BlockHandle) -> Option<&mut BlockEntry> {
        self.slots
            .get_mut(block.index as usize)
            .and_then(|(handle, slot)| if *handle == block { slot.as_mut() } else { None })
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneSource for MemorySource {
    fn contains(&self, block: BlockHandle) -> bool {
        self.entry(block).is_some()
    }

    fn block_type(&self, block: BlockHandle) -> Option<&str> {
        self.entry(block).map(|entry| entry.type_name.as_str())
    }

    fn parent_type(&self, type_name: &str) -> Option<&str> {
        self.type_parents.get(type_name).map(String::as_str)
    }

    fn revision(&self, block: BlockHandle) -> Option<u64> {
        self.entry(block).map(|entry| entry.revision)
    }

    fn field(&self, block: BlockHandle, name: &str) -> Result<&FieldValue, SourceError> {
        let entry = self.entry(block).ok_or(SourceError::MissingBlock(block))?;
        entry
            .fields
            .get(name)
            .ok_or_else(|| SourceError::MissingField {
                block,
                field: name.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn test_recycled_slot_invalidates_old_handle() {
        let mut source = MemorySource::new();
        let first = source.insert("NiNode");
        assert!(source.remove(first));
        assert!(
            !source.remove(first),
            "Removing twice should report a stale handle"
        );

        let second = source.insert("NiNode");
        assert_eq!(second.index, first.index, "The slot should be reused");
        assert_eq!(second.generation, first.generation + 1);
        assert!(!source.contains(first));
        assert!(source.contains(second));
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_set_field_bumps_revision() {
        let mut source = MemorySource::new();
        let block = source.insert_with("NiSpecularProperty", [("Flags", FieldValue::Int(1))]);
        assert_eq!(source.revision(block), Some(0));

        source.set_field(block, "Flags", FieldValue::Int(0)).unwrap();
        assert_eq!(source.revision(block), Some(1));
        assert_eq!(source.get_int(block, "Flags"), Ok(0));

        assert!(source.remove_field(block, "Flags").is_some());
        assert_eq!(source.revision(block), Some(2));
        assert!(source.remove_field(block, "Flags").is_none());
        assert_eq!(source.revision(block), Some(2));
    }

    #[test]
    fn test_typed_getters_and_coercions() {
        let mut source = MemorySource::new();
        let block = source.insert_with(
            "NiParticlesData",
            [
                ("Num Valid", FieldValue::Int(3)),
                ("Active Radius", FieldValue::Int(2)),
                ("Enabled", FieldValue::Int(1)),
                ("Vertices", FieldValue::Vectors(vec![Vec3::ZERO, Vec3::X])),
            ],
        );

        assert_eq!(source.get_f32(block, "Active Radius"), Ok(2.0));
        assert_eq!(source.get_bool(block, "Enabled"), Ok(true));
        assert_eq!(source.get_vectors(block, "Vertices").unwrap().len(), 2);

        let err = source.get_colors(block, "Vertices").unwrap_err();
        assert!(matches!(
            err,
            SourceError::TypeMismatch {
                expected: "color array",
                found: "vector array",
                ..
            }
        ));

        let missing = source.get_int(block, "Nope").unwrap_err();
        assert!(matches!(missing, SourceError::MissingField { .. }));
    }

    #[test]
    fn test_missing_block_error() {
        let mut source = MemorySource::new();
        let block = source.insert("NiAlphaProperty");
        source.remove(block);
        let err = source.get_int(block, "Flags").unwrap_err();
        assert!(err.is_missing_block());
        assert!(source.set_field(block, "Flags", FieldValue::Int(1)).is_err());
    }

    #[test]
    fn test_inherits_walks_type_parents() {
        let mut source = MemorySource::new();
        let data = source.insert("NiPSysData");
        let other = source.insert("NiTriShapeData");
        assert!(source.inherits(data, "NiPSysData"));
        assert!(source.inherits(data, "NiParticlesData"));
        assert!(!source.inherits(other, "NiParticlesData"));

        source.set_type_parent("NiTriShapeData", "NiTriShapeData");
        assert!(
            !source.inherits(other, "NiParticlesData"),
            "A cyclic parent table must terminate"
        );
    }
}
