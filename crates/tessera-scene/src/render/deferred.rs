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

use tessera_core::math::{AffineTransform, Vec3};
use tessera_core::BlockHandle;

/// A node queued for the second, translucent pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferredEntry {
    /// The node to draw.
    pub node: BlockHandle,
    /// View-space depth of the node's center. More negative is farther away.
    pub depth: f32,
}

/// Translucent nodes collected during the opaque pass.
///
/// Depth is measured in view space, where the camera looks down negative Z.
/// Sorting by ascending depth therefore yields back-to-front order.
#[derive(Debug, Clone, Default)]
pub struct DeferredList {
    view: AffineTransform,
    entries: Vec<DeferredEntry>,
}

impl DeferredList {
    /// Creates a list measuring depth through the given view transform.
    pub fn new(view: AffineTransform) -> Self {
        Self {
            view,
            entries: Vec::new(),
        }
    }

    /// Queues `node`, whose center lies at `scene_center`.
    pub fn push(&mut self, node: BlockHandle, scene_center: Vec3) {
        let depth = self.view.transform_point(scene_center).z;
        self.entries.push(DeferredEntry { node, depth });
    }

    /// Orders the queue back to front. The sort is stable, so nodes at equal
    /// depth keep their queueing order.
    pub fn sort_back_to_front(&mut self) {
        self.entries.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    }

    /// Takes the queued entries in their current order, leaving the list
    /// empty but keeping its allocation.
    pub fn drain(&mut self) -> std::vec::Drain<'_, DeferredEntry> {
        self.entries.drain(..)
    }

    /// Returns the queued entries.
    pub fn entries(&self) -> &[DeferredEntry] {
        &self.entries
    }

    /// Returns the number of queued entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces the view transform used for subsequent pushes.
    pub fn set_view(&mut self, view: AffineTransform) {
        self.view = view;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_to_front_order() {
        let mut list = DeferredList::new(AffineTransform::IDENTITY);
        let near = BlockHandle::new(0, 0);
        let far = BlockHandle::new(1, 0);
        let middle = BlockHandle::new(2, 0);

        list.push(near, Vec3::new(0.0, 0.0, -1.0));
        list.push(far, Vec3::new(0.0, 0.0, -10.0));
        list.push(middle, Vec3::new(0.0, 0.0, -5.0));
        list.sort_back_to_front();

        let order: Vec<_> = list.drain().map(|e| e.node).collect();
        assert_eq!(order, vec![far, middle, near]);
        assert!(list.is_empty());
    }

    #[test]
    fn test_depth_uses_view_transform() {
        let mut list =
            DeferredList::new(AffineTransform::from_translation(Vec3::new(0.0, 0.0, -3.0)));
        list.push(BlockHandle::new(0, 0), Vec3::ZERO);
        assert_eq!(list.entries()[0].depth, -3.0);
    }
}
