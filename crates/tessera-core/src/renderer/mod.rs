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

//! Graphics-state vocabulary and the call-wrapper contract.
//!
//! The types in [`state`] describe fixed-function render state (blending,
//! alpha testing, depth, material, texturing, rasterization) independently of
//! any graphics API. [`GraphicsContext`] is the boundary to whatever actually
//! issues the API calls; [`RecordingContext`] is an implementation that simply
//! records them.

mod context;
pub mod state;

pub use context::{GraphicsCommand, GraphicsContext, RecordingContext};
pub use state::*;
