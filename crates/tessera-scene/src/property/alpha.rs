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

//! Alpha blending and alpha testing.

use super::{compare_from_index, read_or_default};
use tessera_core::renderer::{BlendFactor, CompareFunction};
use tessera_core::{BlockHandle, SceneSource};

/// Blend selectors of the source format, indexed by a 4-bit field.
const BLEND_MAP: [BlendFactor; 16] = [
    BlendFactor::One,
    BlendFactor::Zero,
    BlendFactor::SrcColor,
    BlendFactor::OneMinusSrcColor,
    BlendFactor::DstColor,
    BlendFactor::OneMinusDstColor,
    BlendFactor::SrcAlpha,
    BlendFactor::OneMinusSrcAlpha,
    BlendFactor::DstAlpha,
    BlendFactor::OneMinusDstAlpha,
    BlendFactor::SrcAlphaSaturate,
    BlendFactor::One,
    BlendFactor::One,
    BlendFactor::One,
    BlendFactor::One,
    BlendFactor::One,
];

/// Blending on, `SrcAlpha` / `OneMinusSrcAlpha`, testing off.
const DEFAULT_FLAGS: i64 = 0x00ED;

/// Alpha blending and alpha-test state of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaProperty {
    pub(crate) blend_enabled: bool,
    pub(crate) src: BlendFactor,
    pub(crate) dst: BlendFactor,
    pub(crate) test_enabled: bool,
    pub(crate) test_function: CompareFunction,
    pub(crate) threshold: f32,
}

impl Default for AlphaProperty {
    fn default() -> Self {
        Self::from_flags(DEFAULT_FLAGS, 0)
    }
}

impl AlphaProperty {
    fn from_flags(flags: i64, threshold: i64) -> Self {
        Self {
            blend_enabled: flags & 1 != 0,
            src: BLEND_MAP[((flags >> 1) & 0x0F) as usize],
            dst: BLEND_MAP[((flags >> 5) & 0x0F) as usize],
            test_enabled: flags & (1 << 9) != 0,
            test_function: compare_from_index((flags >> 10) & 0x07),
            threshold: threshold.clamp(0, 255) as f32 / 255.0,
        }
    }

    pub(crate) fn read(&mut self, source: &dyn SceneSource, block: BlockHandle) {
        let flags = read_or_default(source.get_int(block, "Flags"), DEFAULT_FLAGS);
        let threshold = read_or_default(source.get_int(block, "Threshold"), 0);
        *self = Self::from_flags(flags, threshold);
    }

    /// Returns `true` if alpha blending is enabled.
    pub fn blend(&self) -> bool {
        self.blend_enabled
    }

    /// Returns `true` if alpha testing is enabled.
    pub fn test(&self) -> bool {
        self.test_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::scene::{FieldValue, MemorySource};

    #[test]
    fn test_flags_are_decoded() {
        let mut source = MemorySource::new();
        // blend, src = SrcAlpha, dst = One, test with Greater, threshold 128
        let flags = 1 | (6 << 1) | (1 << 9) | (4 << 10);
        let block = source.insert_with(
            "NiAlphaProperty",
            [
                ("Flags", FieldValue::Int(flags)),
                ("Threshold", FieldValue::Int(128)),
            ],
        );

        let mut alpha = AlphaProperty::default();
        alpha.read(&source, block);

        assert!(alpha.blend());
        assert!(alpha.test());
        assert_eq!(alpha.src, BlendFactor::SrcAlpha);
        assert_eq!(alpha.dst, BlendFactor::One);
        assert_eq!(alpha.test_function, CompareFunction::Greater);
        assert!((alpha.threshold - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_selectors_fall_back_to_one() {
        let mut source = MemorySource::new();
        let block = source.insert_with("NiAlphaProperty", [("Flags", FieldValue::Int(15 << 1))]);

        let mut alpha = AlphaProperty::default();
        alpha.read(&source, block);

        assert!(!alpha.blend());
        assert_eq!(alpha.src, BlendFactor::One);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let mut source = MemorySource::new();
        let block = source.insert("NiAlphaProperty");

        let mut alpha = AlphaProperty::default();
        alpha.read(&source, block);

        assert_eq!(alpha, AlphaProperty::default());
        assert!(alpha.blend());
        assert_eq!(alpha.src, BlendFactor::SrcAlpha);
        assert_eq!(alpha.dst, BlendFactor::OneMinusSrcAlpha);
        assert!(!alpha.test());
    }
}
