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

//! Affine transformations between local and scene space.

use super::{Mat4, Vec3, Vec4};
use std::ops::Mul;

/// A 3D affine transformation (translation, rotation, scale).
///
/// This is a semantic wrapper around a [`Mat4`] whose last row is `(0, 0, 0, 1)`.
/// Nodes accumulate their ancestors' transforms into one of these and use it
/// to move local geometry into scene space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(transparent)]
pub struct AffineTransform(pub Mat4);

impl AffineTransform {
    /// The identity transform, which results in no change.
    pub const IDENTITY: Self = Self(Mat4::IDENTITY);

    /// Creates a transform from a translation vector.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tessera_core::math::{AffineTransform, Vec3};
    ///
    /// let transform = AffineTransform::from_translation(Vec3::new(1.0, 2.0, 3.0));
    /// assert_eq!(transform.translation(), Vec3::new(1.0, 2.0, 3.0));
    /// ```
    #[inline]
    pub fn from_translation(v: Vec3) -> Self {
        Self(Mat4::from_translation(v))
    }

    /// Creates a uniform scale transform.
    #[inline]
    pub fn from_scale(scale: f32) -> Self {
        Self(Mat4::from_scale(Vec3::splat(scale)))
    }

    /// Creates a rotation around the Z axis, `angle` in radians.
    #[inline]
    pub fn from_rotation_z(angle: f32) -> Self {
        Self(Mat4::from_rotation_z(angle))
    }

    /// Builds the transform `T * R * S` from its components, with `rotation`
    /// given as a rotation matrix and `scale` applied uniformly.
    pub fn from_parts(translation: Vec3, rotation: Mat4, scale: f32) -> Self {
        Self(Mat4::from_translation(translation) * rotation * Mat4::from_scale(Vec3::splat(scale)))
    }

    /// Returns the underlying matrix.
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        self.0
    }

    /// Returns the translation component.
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.0.cols[3].truncate()
    }

    /// Applies the transform to a point (`w = 1`).
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        (self.0 * Vec4::from_vec3(point, 1.0)).truncate()
    }
}

impl Default for AffineTransform {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for AffineTransform {
    type Output = Self;
    /// Composes two transforms; the right-hand side is applied first.
    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl From<AffineTransform> for Mat4 {
    #[inline]
    fn from(transform: AffineTransform) -> Self {
        transform.0
    }
}
