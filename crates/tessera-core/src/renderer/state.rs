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

//! State descriptors consumed by a [`GraphicsContext`](super::GraphicsContext).

use crate::math::{LinearRgba, Vec3};
use crate::scene::BlockHandle;

/// A factor in a blend equation, determining how much a source or destination color contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// The factor is `1.0`.
    One,
    /// The factor is `0.0`.
    Zero,
    /// The factor is the source color.
    SrcColor,
    /// The factor is `1.0 - src`.
    OneMinusSrcColor,
    /// The factor is the destination color.
    DstColor,
    /// The factor is `1.0 - dst`.
    OneMinusDstColor,
    /// The factor is the source alpha component (`src.a`).
    SrcAlpha,
    /// The factor is `1.0 - src.a`.
    OneMinusSrcAlpha,
    /// The factor is the destination alpha component (`dst.a`).
    DstAlpha,
    /// The factor is `1.0 - dst.a`.
    OneMinusDstAlpha,
    /// The factor is `min(src.a, 1.0 - dst.a)`.
    SrcAlphaSaturate,
}

/// The comparison function used for alpha and depth testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// The test always passes.
    #[default]
    Always,
    /// The test passes if the new value is less than the reference.
    Less,
    /// The test passes if the new value is equal to the reference.
    Equal,
    /// The test passes if the new value is less than or equal to the reference.
    LessEqual,
    /// The test passes if the new value is greater than the reference.
    Greater,
    /// The test passes if the new value is not equal to the reference.
    NotEqual,
    /// The test passes if the new value is greater than or equal to the reference.
    GreaterEqual,
    /// The test never passes.
    Never,
}

/// Defines how texture coordinates are handled when sampling outside the `[0, 1]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Coordinates wrap around. `1.1` becomes `0.1`.
    #[default]
    Repeat,
    /// Coordinates are clamped to the edge. `1.1` becomes `1.0`.
    ClampToEdge,
}

/// Texture minification/magnification filtering, including the mipmap choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    /// Nearest texel, no mipmapping.
    Nearest,
    /// Linear filtering, no mipmapping.
    Bilinear,
    /// Linear filtering blended between the two nearest mip levels.
    #[default]
    Trilinear,
    /// Nearest texel from the nearest mip level.
    NearestMipNearest,
    /// Nearest texel, blended between mip levels.
    NearestMipLinear,
    /// Linear filtering from the nearest mip level.
    BilinearMipNearest,
}

impl TextureFilter {
    /// Returns `true` if this filter samples mip levels.
    pub fn uses_mipmaps(&self) -> bool {
        !matches!(self, TextureFilter::Nearest | TextureFilter::Bilinear)
    }
}

/// Defines how polygons are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    /// Polygons are filled. This is the normal rendering mode.
    #[default]
    Fill,
    /// Polygons are rendered as outlines (wireframe).
    Line,
}

/// Color blending for the active target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    /// The factor applied to the incoming fragment.
    pub src_factor: BlendFactor,
    /// The factor applied to the value already in the framebuffer.
    pub dst_factor: BlendFactor,
}

impl Default for BlendState {
    /// Classic "over" compositing.
    fn default() -> Self {
        Self {
            src_factor: BlendFactor::SrcAlpha,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
        }
    }
}

/// Fragment rejection based on alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaTestState {
    /// The comparison between fragment alpha and `threshold`.
    pub compare: CompareFunction,
    /// The reference alpha, in `[0.0, 1.0]`.
    pub threshold: f32,
}

/// Depth buffer usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthState {
    /// If `true`, fragments are depth tested.
    pub test_enabled: bool,
    /// If `true`, depth values are written.
    pub write_enabled: bool,
    /// The comparison used when testing.
    pub compare: CompareFunction,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test_enabled: true,
            write_enabled: true,
            compare: CompareFunction::LessEqual,
        }
    }
}

/// Fixed-function lighting material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialState {
    /// Ambient reflectance.
    pub ambient: LinearRgba,
    /// Diffuse reflectance. Its alpha carries the material opacity.
    pub diffuse: LinearRgba,
    /// Specular reflectance. Black when specular highlights are disabled.
    pub specular: LinearRgba,
    /// Emitted color.
    pub emissive: LinearRgba,
    /// Specular exponent, in `[0.0, 128.0]`.
    pub shininess: f32,
}

impl Default for MaterialState {
    fn default() -> Self {
        Self {
            ambient: LinearRgba::new(0.4, 0.4, 0.4, 1.0),
            diffuse: LinearRgba::new(0.8, 0.8, 0.8, 1.0),
            specular: LinearRgba::BLACK,
            emissive: LinearRgba::BLACK,
            shininess: 0.0,
        }
    }
}

/// A texture bound to the first texture unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureBinding {
    /// The source-texture block providing the image.
    pub source: BlockHandle,
    /// The sampling filter.
    pub filter: TextureFilter,
    /// Addressing along S (U).
    pub wrap_s: AddressMode,
    /// Addressing along T (V).
    pub wrap_t: AddressMode,
    /// The texture-coordinate set used for lookups.
    pub coord_set: u32,
}

/// One point primitive, laid out for direct upload.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct PointVertex {
    /// Scene-space position.
    pub position: Vec3,
    /// Point size.
    pub size: f32,
    /// Vertex color.
    pub color: LinearRgba,
}
