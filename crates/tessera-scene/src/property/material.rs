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

//! Lighting material and animated opacity.

use super::read_or_default;
use tessera_core::animation::{Animatable, ControlTarget, ControlValue, ControllerSet};
use tessera_core::math::LinearRgba;
use tessera_core::{BlockHandle, SceneSource};

/// Upper bound of the specular exponent accepted by fixed-function lighting.
pub const MAX_GLOSSINESS: f32 = 128.0;

/// Material colors, shininess and opacity of a node.
///
/// The opacity can be driven by an alpha controller. The controller pushes
/// its sampled value through [`Animatable::apply`]; that value takes
/// precedence over the stored `Alpha` field as long as a controller is
/// attached.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialProperty {
    pub(crate) ambient: LinearRgba,
    pub(crate) diffuse: LinearRgba,
    pub(crate) specular: LinearRgba,
    pub(crate) emissive: LinearRgba,
    pub(crate) shininess: f32,
    alpha: f32,
    sampled_alpha: Option<f32>,
    controllers: ControllerSet,
}

impl Default for MaterialProperty {
    fn default() -> Self {
        Self {
            ambient: LinearRgba::rgb(0.4, 0.4, 0.4),
            diffuse: LinearRgba::rgb(0.8, 0.8, 0.8),
            specular: LinearRgba::WHITE,
            emissive: LinearRgba::BLACK,
            shininess: 0.0,
            alpha: 1.0,
            sampled_alpha: None,
            controllers: ControllerSet::new(),
        }
    }
}

impl MaterialProperty {
    pub(crate) fn read(&mut self, source: &dyn SceneSource, block: BlockHandle) {
        let defaults = Self::default();
        let color = |name: &str, fallback: LinearRgba| {
            read_or_default(source.get_color(block, name), fallback).saturate()
        };
        self.ambient = color("Ambient Color", defaults.ambient);
        self.diffuse = color("Diffuse Color", defaults.diffuse);
        self.specular = color("Specular Color", defaults.specular);
        self.emissive = color("Emissive Color", defaults.emissive);
        self.shininess = clamp_finite(
            read_or_default(source.get_f32(block, "Glossiness"), defaults.shininess),
            0.0,
            MAX_GLOSSINESS,
        );
        self.alpha = clamp_finite(
            read_or_default(source.get_f32(block, "Alpha"), 1.0),
            0.0,
            1.0,
        );

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
            .attach_chain(source, head, ControlTarget::MaterialAlpha);
        if self.controllers.is_empty() {
            self.sampled_alpha = None;
        }
    }

    /// Registers one alpha controller.
    pub(crate) fn set_controller(&mut self, source: &dyn SceneSource, controller: BlockHandle) {
        self.controllers
            .attach(source, controller, ControlTarget::MaterialAlpha);
    }

    /// Returns the controllers currently driving this material.
    pub fn controllers(&self) -> &ControllerSet {
        &self.controllers
    }

    /// Returns the current opacity, in `[0.0, 1.0]`.
    pub fn alpha_value(&self) -> f32 {
        self.sampled_alpha.unwrap_or(self.alpha)
    }
}

impl Animatable for MaterialProperty {
    fn apply(&mut self, value: ControlValue) -> bool {
        match value {
            ControlValue::Alpha(alpha) if alpha.is_finite() => {
                self.sampled_alpha = Some(alpha.clamp(0.0, 1.0));
                true
            }
            _ => false,
        }
    }
}

fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        log::warn!("Non-finite material value {value}, using {min}");
        min
    }
}
