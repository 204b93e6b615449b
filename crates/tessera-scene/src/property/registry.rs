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

use super::{Property, PropertyHandle, PropertyKind};
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Weak;
use tessera_core::{BlockHandle, SceneSource};

/// Builds properties from blocks and hands out one shared instance per block.
///
/// The cache only holds weak references, so it never keeps a property alive
/// and never counts towards [`PropertyHandle::ref_count`].
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    cache: AHashMap<BlockHandle, Weak<RefCell<Property>>>,
}

impl PropertyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the property for `block`, building and reading it on first use.
    ///
    /// Returns `None` if the block is missing or its type is not a known
    /// property kind.
    pub fn create(
        &mut self,
        source: &dyn SceneSource,
        block: BlockHandle,
    ) -> Option<PropertyHandle> {
        if !source.contains(block) {
            log::debug!("Skipping missing property block {block}");
            return None;
        }
        if let Some(existing) = self.cached(block) {
            return Some(existing);
        }

        let Some(kind) = PropertyKind::classify(source, block) else {
            log::debug!(
                "Skipping block {block} of unknown property type {:?}",
                source.block_type(block)
            );
            return None;
        };

        let handle = PropertyHandle::new(Property::new(kind, block));
        handle.update(source, block);
        self.cache.insert(block, handle.downgrade());
        log::trace!("Created {kind} for {block}");
        Some(handle)
    }

    fn cached(&self, block: BlockHandle) -> Option<PropertyHandle> {
        self.cache
            .get(&block)
            .and_then(Weak::upgrade)
            .map(PropertyHandle::from_rc)
    }

    /// Re-reads every live cached property once. Returns how many were
    /// refreshed.
    pub fn refresh(&mut self, source: &dyn SceneSource) -> usize {
        let mut refreshed = 0;
        self.cache.retain(|block, weak| match weak.upgrade() {
            Some(property) => {
                property.borrow_mut().update(source, *block);
                refreshed += 1;
                true
            }
            None => false,
        });
        refreshed
    }

    /// Forgets properties that are no longer held anywhere. Returns how many
    /// entries were dropped.
    pub fn prune(&mut self) -> usize {
        let before = self.cache.len();
        self.cache.retain(|_, weak| weak.strong_count() > 0);
        before - self.cache.len()
    }

    /// Returns the number of cache entries, live or not.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns `true` if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
