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

//! Single-flag properties.

use super::read_or_default;
use tessera_core::{BlockHandle, SceneSource};

fn read_flag(source: &dyn SceneSource, block: BlockHandle, default: bool) -> bool {
    read_or_default(source.get_int(block, "Flags"), i64::from(default)) & 1 != 0
}

/// Whether specular highlights are lit.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecularProperty {
    pub(crate) highlights: bool,
}

impl Default for SpecularProperty {
    fn default() -> Self {
        Self { highlights: true }
    }
}

impl SpecularProperty {
    pub(crate) fn read(&mut self, source: &dyn SceneSource, block: BlockHandle) {
        self.highlights = read_flag(source, block, true);
    }

    /// Returns `true` if specular highlights are enabled.
    pub fn enabled(&self) -> bool {
        self.highlights
    }
}

/// Whether polygons are drawn as outlines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireframeProperty {
    pub(crate) wire: bool,
}

impl WireframeProperty {
    pub(crate) fn read(&mut self, source: &dyn SceneSource, block: BlockHandle) {
        self.wire = read_flag(source, block, false);
    }

    /// Returns `true` if wireframe rendering is enabled.
    pub fn enabled(&self) -> bool {
        self.wire
    }
}
