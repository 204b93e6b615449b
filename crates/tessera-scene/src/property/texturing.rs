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

//! Base texture selection and sampling.

use super::read_or_default;
use tessera_core::animation::{Animatable, ControlTarget, ControlValue, ControllerSet};
use tessera_core::renderer::{AddressMode, TextureBinding, TextureFilter};
use tessera_core::{BlockHandle, SceneSource};

/// Texture filters of the source format, by index.
const FILTER_MAP: [TextureFilter; 6] = [
    TextureFilter::Nearest,
    TextureFilter::Bilinear,
    TextureFilter::Trilinear,
    TextureFilter::NearestMipNearest,
    TextureFilter::NearestMipLinear,
    TextureFilter::BilinearMipNearest,
];

fn filter_from_index(index: i64) -> TextureFilter {
    usize::try_from(index)
        .ok()
        .and_then(|i| FILTER_MAP.get(i).copied())
        .unwrap_or_default()
}

/// Maps the clamp mode selector to (S, T) addressing.
fn wrap_from_index(index: i64) -> (AddressMode, AddressMode) {
    use AddressMode::{ClampToEdge, Repeat};
    match index {
        0 => (ClampToEdge, ClampToEdge),
        1 => (ClampToEdge, Repeat),
        2 => (Repeat, ClampToEdge),
        _ => (Repeat, Repeat),
    }
}

/// The base texture of a node and how it is sampled.
///
/// A flip controller may swap the base texture every frame; the swapped-in
/// source is kept separately and wins while a controller is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct TexturingProperty {
    base_texture: Option<BlockHandle>,
    flipped_texture: Option<Option<BlockHandle>>,
    pub(crate) filter: TextureFilter,
    pub(crate) wrap_s: AddressMode,
    pub(crate) wrap_t: AddressMode,
    base_set: u32,
    controllers: ControllerSet,
}

impl Default for TexturingProperty {
    fn default() -> Self {
        Self {
            base_texture: None,
            flipped_texture: None,
            filter: TextureFilter::Trilinear,
            wrap_s: AddressMode::Repeat,
            wrap_t: AddressMode::Repeat,
            base_set: 0,
            controllers: ControllerSet::new(),
        }
    }
}

impl TexturingProperty {
    pub(crate) fn read(&mut self, source: &dyn SceneSource, block: BlockHandle) {
        let has_base = read_or_default(source.get_bool(block, "Has Base Texture"), true);
        self.base_texture = if has_base {
            read_or_default(source.get_link(block, "Base Texture Source"), None)
        } else {
            None
        };
        self.filter = filter_from_index(read_or_default(source.get_int(block, "Filter Mode"), 2));
        (self.wrap_s, self.wrap_t) =
            wrap_from_index(read_or_default(source.get_int(block, "Clamp Mode"), 3));
        let uv_set = read_or_default(source.get_int(block, "UV Set"), 0);
        self.base_set = u32::try_from(uv_set).unwrap_or_else(|_| {
            log::warn!("Texture coordinate set {uv_set} out of range on {block}, using 0");
            0
        });

        self.controllers.clear();
        let head = read_or_default(source.get_link(block, "Controller"), None);
        self.set_controller_chain(source, head);
    }

    pub(crate) fn set_controller_chain(
        &mut self,
        source: &dyn SceneSource,
        head: Option<BlockHandle>,
    ) {
        self.controllers
            .attach_chain(source, head, ControlTarget::TextureFlip);
        if self.controllers.is_empty() {
            self.flipped_texture = None;
        }
    }

    /// Registers one flip controller.
    pub(crate) fn set_controller(&mut self, source: &dyn SceneSource, controller: BlockHandle) {
        self.controllers
            .attach(source, controller, ControlTarget::TextureFlip);
    }

    /// Returns the controllers currently driving this texturing property.
    pub fn controllers(&self) -> &ControllerSet {
        &self.controllers
    }

    /// Returns the texture-coordinate set used by the base texture.
    pub fn base_set(&self) -> u32 {
        self.base_set
    }

    /// Returns the source-texture block currently bound as base texture.
    pub fn base_texture(&self) -> Option<BlockHandle> {
        self.flipped_texture.unwrap_or(self.base_texture)
    }

    pub(crate) fn binding(&self) -> Option<TextureBinding> {
        self.base_texture().map(|source| TextureBinding {
            source,
            filter: self.filter,
            wrap_s: self.wrap_s,
            wrap_t: self.wrap_t,
            coord_set: self.base_set,
        })
    }
}

impl Animatable for TexturingProperty {
    fn apply(&mut self, value: ControlValue) -> bool {
        match value {
            ControlValue::BaseTexture(texture) => {
                self.flipped_texture = Some(texture);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::scene::{FieldValue, MemorySource};

    #[test]
    fn test_sampling_fields() {
        let mut source = MemorySource::new();
        let image = source.insert("NiSourceTexture");
        let block = source.insert_with(
            "NiTexturingProperty",
            [
                ("Base Texture Source", FieldValue::Link(Some(image))),
                ("Filter Mode", FieldValue::Int(0)),
                ("Clamp Mode", FieldValue::Int(1)),
                ("UV Set", FieldValue::Int(2)),
            ],
        );

        let mut texturing = TexturingProperty::default();
        texturing.read(&source, block);

        assert_eq!(
            texturing.binding(),
            Some(TextureBinding {
                source: image,
                filter: TextureFilter::Nearest,
                wrap_s: AddressMode::ClampToEdge,
                wrap_t: AddressMode::Repeat,
                coord_set: 2,
            })
        );
        assert_eq!(texturing.base_set(), 2);
    }

    #[test]
    fn test_unknown_filter_falls_back_to_trilinear() {
        assert_eq!(filter_from_index(42), TextureFilter::Trilinear);
        assert_eq!(filter_from_index(-1), TextureFilter::Trilinear);
        assert_eq!(
            wrap_from_index(2),
            (AddressMode::Repeat, AddressMode::ClampToEdge)
        );
    }

    #[test]
    fn test_flip_controller_swaps_base_texture() {
        let mut source = MemorySource::new();
        let first = source.insert("NiSourceTexture");
        let second = source.insert("NiSourceTexture");
        let flip = source.insert("NiFlipController");
        let block = source.insert_with(
            "NiTexturingProperty",
            [
                ("Base Texture Source", FieldValue::Link(Some(first))),
                ("Controller", FieldValue::Link(Some(flip))),
            ],
        );

        let mut texturing = TexturingProperty::default();
        texturing.read(&source, block);
        assert_eq!(texturing.base_texture(), Some(first));

        assert!(texturing.apply(ControlValue::BaseTexture(Some(second))));
        assert_eq!(texturing.base_texture(), Some(second));
        assert!(!texturing.apply(ControlValue::Alpha(0.5)));
    }

    #[test]
    fn test_disabled_base_texture_has_no_binding() {
        let mut source = MemorySource::new();
        let image = source.insert("NiSourceTexture");
        let block = source.insert_with(
            "NiTexturingProperty",
            [
                ("Has Base Texture", FieldValue::Bool(false)),
                ("Base Texture Source", FieldValue::Link(Some(image))),
            ],
        );

        let mut texturing = TexturingProperty::default();
        texturing.read(&source, block);
        assert_eq!(texturing.binding(), None);
    }
}
