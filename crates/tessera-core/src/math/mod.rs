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

//! Linear algebra and geometry primitives used by scene evaluation.
//!
//! The types here cover exactly what the property and particle pipelines need:
//! points and directions ([`Vec3`]), homogeneous columns ([`Vec4`]), affine
//! matrices ([`Mat4`], [`AffineTransform`]), colors ([`LinearRgba`]) and
//! axis-aligned bounds ([`Aabb`]).

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

pub mod affine_transform;
pub mod color;
pub mod geometry;
pub mod matrix;
pub mod vector;

pub use self::affine_transform::AffineTransform;
pub use self::color::LinearRgba;
pub use self::geometry::Aabb;
pub use self::matrix::Mat4;
pub use self::vector::{Vec3, Vec4};

/// Performs an approximate equality comparison between two floats with a custom tolerance.
///
/// # Examples
///
/// ```
/// use tessera_core::math::approx_eq_eps;
/// assert!(approx_eq_eps(0.001, 0.002, 1e-2));
/// assert!(!approx_eq_eps(0.001, 0.002, 1e-4));
/// ```
#[inline]
pub fn approx_eq_eps(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() < epsilon
}

/// Performs an approximate equality comparison using [`EPSILON`].
#[inline]
pub fn approx_eq(a: f32, b: f32) -> bool {
    approx_eq_eps(a, b, EPSILON)
}
