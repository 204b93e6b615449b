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

//! One scene of particle nodes and the per-frame driver.

use crate::node::Drawable;
use crate::particles::ParticleNode;
use crate::property::PropertyRegistry;
use crate::render::DeferredList;
use tessera_core::math::{Aabb, AffineTransform};
use tessera_core::renderer::GraphicsContext;
use tessera_core::{BlockHandle, SceneSettings, SceneSource};

/// Block type every particle node derives from.
const PARTICLES_TYPE: &str = "NiParticles";

/// What one [`Scene::draw`] call issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Nodes drawn during the opaque pass.
    pub opaque: usize,
    /// Nodes drawn back to front during the translucent pass.
    pub deferred: usize,
}

/// The nodes of one scene, the property registry they share and the frame
/// driver.
///
/// A frame is [`update`](Scene::update), then [`transform`](Scene::transform),
/// then [`draw`](Scene::draw) or [`bounds`](Scene::bounds).
#[derive(Debug)]
pub struct Scene {
    settings: SceneSettings,
    registry: PropertyRegistry,
    nodes: Vec<ParticleNode>,
    view: AffineTransform,
    deferred: DeferredList,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new(settings: SceneSettings) -> Self {
        Self {
            settings,
            registry: PropertyRegistry::new(),
            nodes: Vec::new(),
            view: AffineTransform::IDENTITY,
            deferred: DeferredList::default(),
        }
    }

    /// Returns the settings the scene was built with.
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// Returns the shared property registry.
    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    /// Adds a particle node for `block`. Returns `false` if the block is not
    /// a particle node or is already part of the scene.
    pub fn add_particles(&mut self, source: &dyn SceneSource, block: BlockHandle) -> bool {
        if !source.inherits(block, PARTICLES_TYPE) {
            log::warn!(
                "Block {block} of type {:?} is not a particle node",
                source.block_type(block)
            );
            return false;
        }
        if self.node(block).is_some() {
            return false;
        }
        self.nodes.push(ParticleNode::new(block, &self.settings));
        true
    }

    /// Removes the node for `block`, releasing its properties.
    pub fn remove_node(&mut self, block: BlockHandle) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|node| node.base().block() != block);
        before != self.nodes.len()
    }

    /// Returns the node for `block`.
    pub fn node(&self, block: BlockHandle) -> Option<&ParticleNode> {
        self.nodes.iter().find(|node| node.base().block() == block)
    }

    /// Returns the node for `block` for modification, for instance to push
    /// controller values into it.
    pub fn node_mut(&mut self, block: BlockHandle) -> Option<&mut ParticleNode> {
        self.nodes
            .iter_mut()
            .find(|node| node.base().block() == block)
    }

    /// Returns every node, in insertion order.
    pub fn nodes(&self) -> &[ParticleNode] {
        &self.nodes
    }

    /// Sets the accumulated scene-space transform of a node.
    pub fn set_transform(&mut self, block: BlockHandle, world: AffineTransform) -> bool {
        match self.node_mut(block) {
            Some(node) => {
                node.base_mut().set_world(world);
                true
            }
            None => false,
        }
    }

    /// Sets the view transform used to order translucent nodes.
    pub fn set_view(&mut self, view: AffineTransform) {
        self.view = view;
    }

    /// Runs the update pass.
    ///
    /// Every live property is re-read once, then each node picks up revision
    /// changes, re-reads its particles if dirty and resolves its properties.
    pub fn update(&mut self, source: &dyn SceneSource) {
        let refreshed = self.registry.refresh(source);
        for node in &mut self.nodes {
            let block = node.base().block();
            node.sync_revision(source);
            node.update(source, block);
            node.base_mut().update_properties(source, &mut self.registry);
        }
        let pruned = self.registry.prune();
        log::trace!(
            "Update pass: {} nodes, {refreshed} properties refreshed, {pruned} pruned",
            self.nodes.len()
        );
    }

    /// Runs the transform pass.
    pub fn transform(&mut self) {
        for node in &mut self.nodes {
            node.transform();
            node.transform_shapes();
        }
    }

    /// Draws opaque nodes, then translucent nodes back to front.
    pub fn draw(&mut self, ctx: &mut dyn GraphicsContext) -> DrawStats {
        let mut stats = DrawStats::default();
        self.deferred.set_view(self.view);
        let mut deferred = self
            .settings
            .deferred_translucency
            .then_some(&mut self.deferred);

        for node in &self.nodes {
            if node.base().is_hidden() || node.active() == 0 {
                continue;
            }
            let queued = deferred.as_ref().map_or(0, |list| list.len());
            node.draw_shapes(ctx, deferred.as_deref_mut());
            if deferred.as_ref().map_or(0, |list| list.len()) == queued {
                stats.opaque += 1;
            }
        }

        self.deferred.sort_back_to_front();
        for entry in self.deferred.drain() {
            if let Some(node) = self.nodes.iter().find(|n| n.base().block() == entry.node) {
                node.draw_shapes(ctx, None);
                stats.deferred += 1;
            }
        }
        stats
    }

    /// Returns the union of every node's scene-space bounds, or
    /// [`Aabb::INVALID`] if no node has particles.
    pub fn bounds(&self) -> Aabb {
        self.nodes
            .iter()
            .fold(Aabb::INVALID, |bounds, node| bounds.merge(&node.boundaries()))
    }
}
