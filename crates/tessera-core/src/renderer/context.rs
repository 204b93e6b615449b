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

//! The graphics call-wrapper contract.

use super::state::{
    AlphaTestState, BlendState, DepthState, MaterialState, PointVertex, PolygonMode,
    TextureBinding,
};

/// The active graphics context, as seen by the draw stage.
///
/// Each method sets one piece of state on the context, or issues one point
/// primitive. `None` arguments disable the corresponding feature.
pub trait GraphicsContext {
    /// Enables blending with the given factors, or disables it.
    fn set_blend(&mut self, blend: Option<BlendState>);

    /// Enables alpha testing, or disables it.
    fn set_alpha_test(&mut self, test: Option<AlphaTestState>);

    /// Sets depth testing and writing.
    fn set_depth(&mut self, depth: DepthState);

    /// Sets the lighting material.
    fn set_material(&mut self, material: MaterialState);

    /// Binds a texture on the first unit, or unbinds it.
    fn set_texture(&mut self, texture: Option<TextureBinding>);

    /// Sets the polygon rasterization mode.
    fn set_polygon_mode(&mut self, mode: PolygonMode);

    /// Sets the rasterized size of subsequent point primitives.
    fn set_point_size(&mut self, size: f32);

    /// Issues a single point primitive.
    fn draw_point(&mut self, vertex: PointVertex);
}

/// A state change or draw recorded by a [`RecordingContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsCommand {
    /// See [`GraphicsContext::set_blend`].
    SetBlend(Option<BlendState>),
    /// See [`GraphicsContext::set_alpha_test`].
    SetAlphaTest(Option<AlphaTestState>),
    /// See [`GraphicsContext::set_depth`].
    SetDepth(DepthState),
    /// See [`GraphicsContext::set_material`].
    SetMaterial(MaterialState),
    /// See [`GraphicsContext::set_texture`].
    SetTexture(Option<TextureBinding>),
    /// See [`GraphicsContext::set_polygon_mode`].
    SetPolygonMode(PolygonMode),
    /// See [`GraphicsContext::set_point_size`].
    SetPointSize(f32),
    /// See [`GraphicsContext::draw_point`].
    DrawPoint(PointVertex),
}

/// A [`GraphicsContext`] that records every call instead of executing it.
///
/// Point vertices are additionally packed into a byte stream the way they
/// would be staged for upload.
#[derive(Debug, Default)]
pub struct RecordingContext {
    commands: Vec<GraphicsCommand>,
    vertex_bytes: Vec<u8>,
}

impl RecordingContext {
    /// Creates an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded command, in call order.
    pub fn commands(&self) -> &[GraphicsCommand] {
        &self.commands
    }

    /// Returns the recorded point primitives, in draw order.
    pub fn points(&self) -> impl Iterator<Item = &PointVertex> + '_ {
        self.commands.iter().filter_map(|command| match command {
            GraphicsCommand::DrawPoint(vertex) => Some(vertex),
            _ => None,
        })
    }

    /// Returns the number of recorded draw calls.
    pub fn draw_count(&self) -> usize {
        self.points().count()
    }

    /// Returns the staged vertex data of all recorded points.
    pub fn vertex_bytes(&self) -> &[u8] {
        &self.vertex_bytes
    }

    /// Discards the recording, keeping allocations for the next frame.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.vertex_bytes.clear();
    }

    fn record(&mut self, command: GraphicsCommand) {
        log::trace!("{command:?}");
        self.commands.push(command);
    }
}

impl GraphicsContext for RecordingContext {
    fn set_blend(&mut self, blend: Option<BlendState>) {
        self.record(GraphicsCommand::SetBlend(blend));
    }

    fn set_alpha_test(&mut self, test: Option<AlphaTestState>) {
        self.record(GraphicsCommand::SetAlphaTest(test));
    }

    fn set_depth(&mut self, depth: DepthState) {
        self.record(GraphicsCommand::SetDepth(depth));
    }

    fn set_material(&mut self, material: MaterialState) {
        self.record(GraphicsCommand::SetMaterial(material));
    }

    fn set_texture(&mut self, texture: Option<TextureBinding>) {
        self.record(GraphicsCommand::SetTexture(texture));
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.record(GraphicsCommand::SetPolygonMode(mode));
    }

    fn set_point_size(&mut self, size: f32) {
        self.record(GraphicsCommand::SetPointSize(size));
    }

    fn draw_point(&mut self, vertex: PointVertex) {
        self.vertex_bytes
            .extend_from_slice(bytemuck::bytes_of(&vertex));
        self.record(GraphicsCommand::DrawPoint(vertex));
    }
}
