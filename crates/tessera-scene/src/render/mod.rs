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

//! The draw-stage side of the property taxonomy.
//!
//! Property fields are crate-private. The functions in this module are the
//! only place that reads them to issue graphics state, so the graphics
//! vocabulary never leaks into the property types themselves.

mod deferred;
mod state;

pub use deferred::{DeferredEntry, DeferredList};
pub use state::{
    apply_alpha, apply_material, apply_property_list, apply_texturing, apply_wireframe,
    apply_zbuffer,
};
