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

//! The animation-controller attachment point.
//!
//! Controllers live outside this workspace: they sample their curves each
//! frame and push the results into the objects they drive. This module only
//! defines how a receiver records which controllers drive it
//! ([`ControllerSet`]) and the narrow interface the controllers write through
//! ([`Animatable`]). Receivers store the current sampled value, never the
//! curve.

use crate::math::{LinearRgba, Vec3};
use crate::scene::{BlockHandle, SceneSource};

/// Field linking a controller to the next one in its chain.
const NEXT_CONTROLLER_FIELD: &str = "Next Controller";
/// Upper bound on chain walks, guarding against cyclic chains.
const MAX_CHAIN_LENGTH: usize = 64;

/// What a controller drives, derived from its block type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlTarget {
    /// The opacity of a material property.
    MaterialAlpha,
    /// The base texture of a texturing property (flip-book animation).
    TextureFlip,
    /// Particle count and per-particle attributes of a particle node.
    Particles,
}

impl ControlTarget {
    /// Classifies a controller block, or returns `None` for controller types
    /// nothing in this workspace can be driven by.
    pub fn classify(source: &dyn SceneSource, controller: BlockHandle) -> Option<Self> {
        if source.inherits(controller, "NiAlphaController") {
            Some(ControlTarget::MaterialAlpha)
        } else if source.inherits(controller, "NiFlipController") {
            Some(ControlTarget::TextureFlip)
        } else if source.inherits(controller, "NiParticleSystemController")
            || source.inherits(controller, "NiPSysUpdateCtlr")
        {
            Some(ControlTarget::Particles)
        } else {
            None
        }
    }
}

/// A controller registered on a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerBinding {
    /// The controller block.
    pub block: BlockHandle,
    /// What it drives.
    pub target: ControlTarget,
}

/// A sampled value pushed by a controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    /// New material opacity.
    Alpha(f32),
    /// New base-texture source, `None` to unbind.
    BaseTexture(Option<BlockHandle>),
    /// New number of live particles.
    ParticleCount(usize),
    /// New position of one particle, in local space.
    ParticlePosition {
        /// Particle index.
        index: usize,
        /// Local-space position.
        position: Vec3,
    },
    /// New color of one particle.
    ParticleColor {
        /// Particle index.
        index: usize,
        /// Particle color.
        color: LinearRgba,
    },
    /// New size of one particle.
    ParticleSize {
        /// Particle index.
        index: usize,
        /// Particle size.
        size: f32,
    },
}

/// The mutation interface controllers write through.
pub trait Animatable {
    /// Applies a sampled value. Returns `false` if the value does not apply to
    /// this receiver (wrong kind, index out of range); the receiver is then
    /// left untouched.
    fn apply(&mut self, value: ControlValue) -> bool;
}

/// The controllers registered on one receiver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerSet {
    bindings: Vec<ControllerBinding>,
}

impl ControllerSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `controller` if it drives `accepts`. Unknown or unrelated
    /// controller types are skipped.
    pub fn attach(
        &mut self,
        source: &dyn SceneSource,
        controller: BlockHandle,
        accepts: ControlTarget,
    ) {
        if ControlTarget::classify(source, controller) != Some(accepts) {
            log::trace!(
                "Skipping controller {controller} ({:?}) for {accepts:?}",
                source.block_type(controller)
            );
            return;
        }
        if self.bindings.iter().any(|b| b.block == controller) {
            return;
        }
        self.bindings.push(ControllerBinding {
            block: controller,
            target: accepts,
        });
    }

    /// Registers every controller of the chain starting at `head`, following
    /// each controller's `Next Controller` link.
    pub fn attach_chain(
        &mut self,
        source: &dyn SceneSource,
        head: Option<BlockHandle>,
        accepts: ControlTarget,
    ) {
        let mut current = head;
        for _ in 0..MAX_CHAIN_LENGTH {
            let Some(controller) = current else {
                return;
            };
            if !source.contains(controller) {
                log::debug!("Controller chain points at missing block {controller}");
                return;
            }
            self.attach(source, controller, accepts);
            current = source
                .get_link(controller, NEXT_CONTROLLER_FIELD)
                .ok()
                .flatten();
        }
        log::warn!("Controller chain longer than {MAX_CHAIN_LENGTH} entries, truncated");
    }

    /// Drops every registration.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Returns the registered controllers, in registration order.
    pub fn bindings(&self) -> &[ControllerBinding] {
        &self.bindings
    }

    /// Returns `true` if no controller is registered.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{FieldValue, MemorySource};

    #[test]
    fn test_attach_filters_by_target() {
        let mut source = MemorySource::new();
        let alpha = source.insert("NiAlphaController");
        let flip = source.insert("NiFlipController");

        let mut set = ControllerSet::new();
        set.attach(&source, alpha, ControlTarget::MaterialAlpha);
        set.attach(&source, flip, ControlTarget::MaterialAlpha);
        set.attach(&source, alpha, ControlTarget::MaterialAlpha);

        assert_eq!(
            set.bindings(),
            &[ControllerBinding {
                block: alpha,
                target: ControlTarget::MaterialAlpha
            }]
        );
    }

    #[test]
    fn test_attach_chain_follows_next_links() {
        let mut source = MemorySource::new();
        let last = source.insert_with(
            "NiAlphaController",
            [("Next Controller", FieldValue::Link(None))],
        );
        let middle = source.insert_with(
            "NiVisController",
            [("Next Controller", FieldValue::Link(Some(last)))],
        );
        let head = source.insert_with(
            "NiAlphaController",
            [("Next Controller", FieldValue::Link(Some(middle)))],
        );

        let mut set = ControllerSet::new();
        set.attach_chain(&source, Some(head), ControlTarget::MaterialAlpha);
        let blocks: Vec<_> = set.bindings().iter().map(|b| b.block).collect();
        assert_eq!(blocks, vec![head, last]);
    }

    #[test]
    fn test_attach_chain_terminates_on_cycle() {
        let mut source = MemorySource::new();
        let a = source.insert("NiFlipController");
        let b = source.insert_with(
            "NiFlipController",
            [("Next Controller", FieldValue::Link(Some(a)))],
        );
        source
            .set_field(a, "Next Controller", FieldValue::Link(Some(b)))
            .unwrap();

        let mut set = ControllerSet::new();
        set.attach_chain(&source, Some(a), ControlTarget::TextureFlip);
        assert_eq!(set.bindings().len(), 2);
    }

    #[test]
    fn test_classify_particle_controllers() {
        let mut source = MemorySource::new();
        let legacy = source.insert("NiParticleSystemController");
        let modern = source.insert("NiPSysUpdateCtlr");
        let unknown = source.insert("NiFooController");
        assert_eq!(
            ControlTarget::classify(&source, legacy),
            Some(ControlTarget::Particles)
        );
        assert_eq!(
            ControlTarget::classify(&source, modern),
            Some(ControlTarget::Particles)
        );
        assert_eq!(ControlTarget::classify(&source, unknown), None);
    }
}
