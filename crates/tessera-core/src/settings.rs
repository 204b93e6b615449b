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

//! Tunables for scene evaluation, loadable from a RON document.

use crate::math::LinearRgba;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// Errors raised while parsing scene settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The document is not valid RON or does not match the settings schema.
    #[error("Malformed settings document: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// A value parsed but is outside its allowed range.
    #[error("Invalid setting '{name}': {reason}")]
    Invalid {
        /// Name of the offending setting.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Tunables used while evaluating particle nodes and drawing a scene.
///
/// Every field has a default, so a settings document only needs to name the
/// values it overrides:
///
/// ```
/// use tessera_core::settings::SceneSettings;
///
/// let settings = SceneSettings::from_ron_str("(default_point_size: 4.0)").unwrap();
/// assert_eq!(settings.default_point_size, 4.0);
/// assert!(settings.deferred_translucency);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Point size used when a particle data block carries no per-particle
    /// sizes and no active radius.
    pub default_point_size: f32,
    /// Whether translucent drawables are queued on the deferred list instead
    /// of being drawn immediately.
    pub deferred_translucency: bool,
    /// Color used when a particle data block carries no vertex colors.
    pub default_particle_color: LinearRgba,
    /// Upper bound on the live particles of a single node.
    pub max_particles: usize,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            default_point_size: 1.0,
            deferred_translucency: true,
            default_particle_color: LinearRgba::WHITE,
            max_particles: 65_536,
        }
    }
}

impl SceneSettings {
    /// Parses settings from a RON string and validates them.
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = ron::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads and parses a settings file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings = Self::from_ron_str(&text)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        log::info!("Loaded scene settings from {}", path.display());
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if !(self.default_point_size.is_finite() && self.default_point_size > 0.0) {
            return Err(SettingsError::Invalid {
                name: "default_point_size",
                reason: format!("expected a positive size, got {}", self.default_point_size),
            });
        }
        if self.max_particles == 0 {
            return Err(SettingsError::Invalid {
                name: "max_particles",
                reason: "must allow at least one particle".to_owned(),
            });
        }
        Ok(())
    }
}
