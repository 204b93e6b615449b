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

use super::{AlphaProperty, PropertyHandle, PropertyKind, PropertyType};
use std::cell::Ref;
use tessera_core::{BlockHandle, SceneSource};

/// The properties attached to one node, at most one per kind.
///
/// Members are shared [`PropertyHandle`]s. Cloning a list clones the handles,
/// so both lists reference the same instances and every reference count goes
/// up by one.
#[derive(Debug, Clone, Default)]
pub struct PropertyList {
    properties: Vec<PropertyHandle>,
}

impl PropertyList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property.
    ///
    /// If the same instance is already present nothing changes. If another
    /// property of the same kind is present it is released and replaced in
    /// place. Otherwise the property is appended.
    pub fn add(&mut self, property: PropertyHandle) {
        if self.properties.iter().any(|p| p.ptr_eq(&property)) {
            return;
        }
        let kind = property.kind();
        match self.properties.iter_mut().find(|p| p.kind() == kind) {
            Some(slot) => {
                log::trace!(
                    "Replacing {kind} from {} with {}",
                    slot.block(),
                    property.block()
                );
                *slot = property;
            }
            None => self.properties.push(property),
        }
    }

    /// Removes `property` if this list holds that exact instance. Returns
    /// `true` if it was removed.
    pub fn del(&mut self, property: &PropertyHandle) -> bool {
        let before = self.properties.len();
        self.properties.retain(|p| !p.ptr_eq(property));
        self.properties.len() != before
    }

    /// Returns the property built from `block`.
    pub fn get_block(&self, block: BlockHandle) -> Option<&PropertyHandle> {
        self.properties.iter().find(|p| p.block() == block)
    }

    /// Returns the property of `kind`.
    pub fn get_kind(&self, kind: PropertyKind) -> Option<&PropertyHandle> {
        self.properties.iter().find(|p| p.kind() == kind)
    }

    /// Returns the first member that narrows to `T`.
    pub fn get<T: PropertyType>(&self) -> Option<Ref<'_, T>> {
        self.properties.iter().find_map(|p| p.cast::<T>())
    }

    /// Drops members whose block no longer exists in `source`. Returns the
    /// number of members dropped.
    pub fn validate(&mut self, source: &dyn SceneSource) -> usize {
        let before = self.properties.len();
        self.properties.retain(|p| {
            let alive = source.contains(p.block());
            if !alive {
                log::debug!("Dropping stale {} {}", p.kind(), p.block());
            }
            alive
        });
        before - self.properties.len()
    }

    /// Releases every member.
    pub fn clear(&mut self) {
        self.properties.clear();
    }

    /// Returns the members in insertion order.
    pub fn list(&self) -> &[PropertyHandle] {
        &self.properties
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Returns `true` if the alpha property of this list enables blending,
    /// which calls for back-to-front second-pass drawing.
    pub fn is_translucent(&self) -> bool {
        self.get::<AlphaProperty>().is_some_and(|alpha| alpha.blend())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{MaterialProperty, Property, WireframeProperty};
    use tessera_core::scene::{FieldValue, MemorySource};

    fn property(kind: PropertyKind, index: u32) -> PropertyHandle {
        PropertyHandle::new(Property::new(kind, BlockHandle::new(index, 0)))
    }

    #[test]
    fn test_add_same_instance_is_a_no_op() {
        let material = property(PropertyKind::Material, 1);
        let mut list = PropertyList::new();

        list.add(material.clone());
        list.add(material.clone());

        assert_eq!(list.len(), 1);
        // One for `material`, one for the list.
        assert_eq!(material.ref_count(), 2);
    }

    #[test]
    fn test_add_same_kind_replaces_in_place() {
        let wire = property(PropertyKind::Wireframe, 1);
        let first = property(PropertyKind::Material, 2);
        let second = property(PropertyKind::Material, 3);
        let mut list = PropertyList::new();

        list.add(wire.clone());
        list.add(first.clone());
        list.add(second.clone());

        assert_eq!(list.len(), 2);
        assert!(list.list()[1].ptr_eq(&second));
        assert_eq!(first.ref_count(), 1);
        assert_eq!(second.ref_count(), 2);
        assert!(list.get_block(BlockHandle::new(2, 0)).is_none());
    }

    #[test]
    fn test_del_releases_only_the_exact_instance() {
        let held = property(PropertyKind::Material, 1);
        let other = property(PropertyKind::Material, 1);
        let mut list = PropertyList::new();
        list.add(held.clone());

        assert!(!list.del(&other));
        assert_eq!(list.len(), 1);
        assert!(list.del(&held));
        assert!(list.is_empty());
        assert_eq!(held.ref_count(), 1);
    }

    #[test]
    fn test_typed_lookup() {
        let mut list = PropertyList::new();
        list.add(property(PropertyKind::Material, 1));
        list.add(property(PropertyKind::Wireframe, 2));

        assert!(list.get::<MaterialProperty>().is_some());
        assert!(list.get::<WireframeProperty>().is_some());
        assert!(list.get::<AlphaProperty>().is_none());
        assert_eq!(
            list.get_kind(PropertyKind::Wireframe).map(|p| p.block()),
            Some(BlockHandle::new(2, 0))
        );
    }

    #[test]
    fn test_clone_shares_instances() {
        let material = property(PropertyKind::Material, 1);
        let mut list = PropertyList::new();
        list.add(material.clone());

        let copy = list.clone();
        assert_eq!(material.ref_count(), 3);
        assert!(copy.list()[0].ptr_eq(&material));

        drop(copy);
        list.clear();
        assert_eq!(material.ref_count(), 1);
    }

    #[test]
    fn test_validate_drops_stale_members() {
        let mut source = MemorySource::new();
        let kept = source.insert("NiMaterialProperty");
        let removed = source.insert("NiWireframeProperty");

        let mut list = PropertyList::new();
        list.add(PropertyHandle::new(Property::new(PropertyKind::Material, kept)));
        list.add(PropertyHandle::new(Property::new(PropertyKind::Wireframe, removed)));
        source.remove(removed);

        assert_eq!(list.validate(&source), 1);
        assert_eq!(list.len(), 1);
        assert!(list.get_block(kept).is_some());
    }

    #[test]
    fn test_translucency_follows_alpha_blend_flag() {
        let mut source = MemorySource::new();
        let opaque = source.insert_with("NiAlphaProperty", [("Flags", FieldValue::Int(0))]);
        let blended = source.insert_with("NiAlphaProperty", [("Flags", FieldValue::Int(0x00ED))]);

        let mut list = PropertyList::new();
        assert!(!list.is_translucent());

        let alpha = PropertyHandle::new(Property::new(PropertyKind::Alpha, opaque));
        alpha.refresh(&source);
        list.add(alpha.clone());
        assert!(!list.is_translucent());

        alpha.update(&source, blended);
        assert!(list.is_translucent());
    }
}
