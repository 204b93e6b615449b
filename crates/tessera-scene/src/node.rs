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

//! The node base and the per-frame node contract.

use crate::property::{read_or_default, PropertyList, PropertyRegistry};
use crate::render::DeferredList;
use tessera_core::math::{Aabb, AffineTransform, Vec3};
use tessera_core::renderer::GraphicsContext;
use tessera_core::{BlockHandle, SceneSource};

/// State every scene node carries: its block, its accumulated scene-space
/// transform and its resolved properties.
#[derive(Debug, Clone)]
pub struct NodeBase {
    block: BlockHandle,
    world: AffineTransform,
    properties: PropertyList,
    hidden: bool,
}

impl NodeBase {
    /// Creates a visible node at the identity transform with no properties.
    pub fn new(block: BlockHandle) -> Self {
        Self {
            block,
            world: AffineTransform::IDENTITY,
            properties: PropertyList::new(),
            hidden: false,
        }
    }

    /// Returns the block this node reads from.
    pub fn block(&self) -> BlockHandle {
        self.block
    }

    pub(crate) fn set_block(&mut self, block: BlockHandle) {
        self.block = block;
    }

    /// Returns the accumulated scene-space transform.
    pub fn world(&self) -> &AffineTransform {
        &self.world
    }

    /// Sets the accumulated scene-space transform. Call
    /// [`Drawable::transform`] afterwards.
    pub fn set_world(&mut self, world: AffineTransform) {
        self.world = world;
    }

    /// Returns the node's properties.
    pub fn properties(&self) -> &PropertyList {
        &self.properties
    }

    /// Returns the node's properties for modification. The next
    /// [`update_properties`](Self::update_properties) rebuilds them from the
    /// source.
    pub fn properties_mut(&mut self) -> &mut PropertyList {
        &mut self.properties
    }

    /// Returns `true` if the node is hidden and must not be drawn.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Rebuilds the node's properties from its `Properties` links, resolved
    /// through `registry`, and reads the hidden bit.
    ///
    /// The list always mirrors the links: unlinked or removed blocks drop
    /// out, and a later link replaces an earlier one of the same kind.
    pub fn update_properties(&mut self, source: &dyn SceneSource, registry: &mut PropertyRegistry) {
        let mut resolved = PropertyList::new();
        if source.contains(self.block) {
            let links =
                read_or_default::<&[BlockHandle]>(source.get_links(self.block, "Properties"), &[]);
            for &link in links {
                if let Some(property) = registry.create(source, link) {
                    resolved.add(property);
                }
            }
            self.hidden = read_or_default(source.get_int(self.block, "Flags"), 0) & 1 != 0;
        }
        if resolved.len() != self.properties.len() {
            log::trace!(
                "Node {} now has {} properties, was {}",
                self.block,
                resolved.len(),
                self.properties.len()
            );
        }
        self.properties = resolved;
    }
}

/// The four-stage contract every drawable node follows each frame.
///
/// A scene traversal calls, per node and in this order: [`update`],
/// [`transform`], [`transform_shapes`], then [`boundaries`] or
/// [`draw_shapes`]. Calling them out of order yields stale content, never
/// invalid memory access.
///
/// [`update`]: Drawable::update
/// [`transform`]: Drawable::transform
/// [`transform_shapes`]: Drawable::transform_shapes
/// [`boundaries`]: Drawable::boundaries
/// [`draw_shapes`]: Drawable::draw_shapes
pub trait Drawable {
    /// Returns the node base.
    fn base(&self) -> &NodeBase;

    /// Returns the node base for modification.
    fn base_mut(&mut self) -> &mut NodeBase;

    /// Pulls geometry from `block` if the node is dirty.
    fn update(&mut self, source: &dyn SceneSource, block: BlockHandle);

    /// Moves the node's center into scene space.
    fn transform(&mut self);

    /// Moves the node's geometry into scene space.
    fn transform_shapes(&mut self);

    /// Returns the scene-space bounds, or [`Aabb::INVALID`] when the node has
    /// no geometry.
    fn boundaries(&self) -> Aabb;

    /// Returns the scene-space center.
    fn center(&self) -> Vec3;

    /// Draws the node's geometry with its resolved property state.
    ///
    /// When `deferred` is given and the node needs translucent compositing,
    /// the node is queued there instead of drawn.
    fn draw_shapes(&self, ctx: &mut dyn GraphicsContext, deferred: Option<&mut DeferredList>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::MaterialProperty;
    use tessera_core::scene::{FieldValue, MemorySource};

    #[test]
    fn test_update_properties_resolves_links_and_flags() {
        let mut source = MemorySource::new();
        let material = source.insert("NiMaterialProperty");
        let unknown = source.insert("NiFooProperty");
        let node = source.insert_with(
            "NiNode",
            [
                ("Properties", FieldValue::Links(vec![material, unknown])),
                ("Flags", FieldValue::Int(1)),
            ],
        );
        let mut registry = PropertyRegistry::new();
        let mut base = NodeBase::new(node);

        base.update_properties(&source, &mut registry);

        assert_eq!(base.properties().len(), 1);
        assert!(base.properties().get::<MaterialProperty>().is_some());
        assert!(base.is_hidden());
    }

    #[test]
    fn test_update_properties_reclaims_removed_blocks() {
        let mut source = MemorySource::new();
        let material = source.insert("NiMaterialProperty");
        let node =
            source.insert_with(
                "NiNode",
                [("Properties", FieldValue::Links(vec![material]))],
            );
        let mut registry = PropertyRegistry::new();
        let mut base = NodeBase::new(node);
        base.update_properties(&source, &mut registry);

        source.remove(material);
        base.update_properties(&source, &mut registry);

        assert!(base.properties().is_empty());
    }

    #[test]
    fn test_update_properties_follows_unlinked_blocks() {
        // --- 1. SETUP ---
        let mut source = MemorySource::new();
        let alpha = source.insert_with("NiAlphaProperty", [("Flags", FieldValue::Int(0x00ED))]);
        let material = source.insert("NiMaterialProperty");
        let node = source.insert_with(
            "NiNode",
            [("Properties", FieldValue::Links(vec![alpha, material]))],
        );
        let mut registry = PropertyRegistry::new();
        let mut base = NodeBase::new(node);
        base.update_properties(&source, &mut registry);
        assert!(base.properties().is_translucent());
        let shared = base.properties().get_block(material).cloned().expect("material");

        // --- 2. ACTION ---
        source
            .set_field(node, "Properties", FieldValue::Links(vec![material]))
            .unwrap();
        base.update_properties(&source, &mut registry);

        // --- 3. ASSERTIONS ---
        assert!(
            source.contains(alpha),
            "The alpha block itself should still exist"
        );
        assert_eq!(base.properties().len(), 1);
        assert!(
            !base.properties().is_translucent(),
            "An unlinked alpha property should no longer make the node translucent"
        );
        assert!(
            base.properties().get_block(material).expect("material").ptr_eq(&shared),
            "Properties that stay linked should keep their instance"
        );
        assert_eq!(shared.ref_count(), 2);
    }
}
