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

//! # Tessera Scene
//!
//! Render-state properties and particle evaluation on top of a
//! scene-description graph.
//!
//! Each frame a scene runs three passes over its nodes. The update pass pulls
//! property and particle data from the [`SceneSource`](tessera_core::SceneSource)
//! when it changed, the transform pass moves local geometry into scene space,
//! and the draw pass issues graphics state and point primitives through a
//! [`GraphicsContext`](tessera_core::renderer::GraphicsContext), deferring
//! translucent nodes to a second back-to-front pass.

#![warn(missing_docs)]

pub mod node;
pub mod particles;
pub mod property;
pub mod render;
pub mod scene;

pub use node::{Drawable, NodeBase};
pub use particles::ParticleNode;
pub use property::{PropertyHandle, PropertyKind, PropertyList, PropertyRegistry};
pub use scene::{DrawStats, Scene};
