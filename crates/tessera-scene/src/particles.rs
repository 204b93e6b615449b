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

//! Particle nodes: a dynamic set of point primitives.

use crate::node::{Drawable, NodeBase};
use crate::property::read_or_default;
use crate::render::{apply_property_list, DeferredList};
use tessera_core::animation::{Animatable, ControlTarget, ControlValue, ControllerSet};
use tessera_core::math::{Aabb, LinearRgba, Vec3};
use tessera_core::renderer::{GraphicsContext, PointVertex};
use tessera_core::scene::SourceError;
use tessera_core::{BlockHandle, SceneSettings, SceneSource};

/// Block type every particle data block derives from.
const PARTICLES_DATA_TYPE: &str = "NiParticlesData";

/// A node drawing one point primitive per live particle.
///
/// Particle attributes live in parallel sequences. `positions` and
/// `transformed` always have the same length; `colors` and `sizes` either
/// match it or are empty, in which case the node-wide defaults apply. Only
/// the first `active` particles are live.
#[derive(Debug, Clone)]
pub struct ParticleNode {
    base: NodeBase,
    data: Option<BlockHandle>,
    seen_revision: Option<(u64, Option<u64>)>,
    dirty: bool,
    recenter: bool,
    local_center: Vec3,
    scene_center: Vec3,
    positions: Vec<Vec3>,
    colors: Vec<LinearRgba>,
    sizes: Vec<f32>,
    transformed: Vec<Vec3>,
    active: usize,
    size: f32,
    default_color: LinearRgba,
    default_size: f32,
    max_particles: usize,
    controllers: ControllerSet,
}

impl ParticleNode {
    /// Creates an empty, dirty particle node for `block`.
    pub fn new(block: BlockHandle, settings: &SceneSettings) -> Self {
        Self {
            base: NodeBase::new(block),
            data: None,
            seen_revision: None,
            dirty: true,
            recenter: false,
            local_center: Vec3::ZERO,
            scene_center: Vec3::ZERO,
            positions: Vec::new(),
            colors: Vec::new(),
            sizes: Vec::new(),
            transformed: Vec::new(),
            active: 0,
            size: settings.default_point_size,
            default_color: settings.default_particle_color,
            default_size: settings.default_point_size,
            max_particles: settings.max_particles,
            controllers: ControllerSet::new(),
        }
    }

    /// Drops every particle. Allocations are kept for reuse.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.sizes.clear();
        self.transformed.clear();
        self.active = 0;
        self.data = None;
        self.recenter = false;
        self.local_center = Vec3::ZERO;
        self.scene_center = Vec3::ZERO;
    }

    /// Forces the next [`Drawable::update`] to re-read the source.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns `true` if the next update will re-read the source.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Compares the revisions of the node block and its data block with the
    /// ones seen last, and marks the node dirty if either moved. Returns the
    /// resulting dirty state.
    pub fn sync_revision(&mut self, source: &dyn SceneSource) -> bool {
        let block = self.base.block();
        let current = source.revision(block).map(|node_revision| {
            let data_revision = resolve_data(source, block).and_then(|d| source.revision(d));
            (node_revision, data_revision)
        });
        if current != self.seen_revision {
            self.seen_revision = current;
            self.dirty = true;
        }
        self.dirty
    }

    /// Registers one particle controller on this node.
    pub fn set_controller(&mut self, source: &dyn SceneSource, controller: BlockHandle) {
        self.controllers
            .attach(source, controller, ControlTarget::Particles);
    }

    /// Returns the controllers currently driving this node.
    pub fn controllers(&self) -> &ControllerSet {
        &self.controllers
    }

    /// Returns the data block the particles were read from.
    pub fn data_block(&self) -> Option<BlockHandle> {
        self.data
    }

    /// Returns the number of live particles.
    pub fn active(&self) -> usize {
        self.active
    }

    /// Returns the node-wide point size.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Returns the local-space particle positions, live or not.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Returns the per-particle colors, or an empty slice.
    pub fn colors(&self) -> &[LinearRgba] {
        &self.colors
    }

    /// Returns the per-particle sizes, or an empty slice.
    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    /// Returns the scene-space positions. Entries past [`active`](Self::active)
    /// are stale.
    pub fn transformed(&self) -> &[Vec3] {
        &self.transformed
    }

    /// Returns the local-space centroid of the live particles.
    pub fn local_center(&self) -> Vec3 {
        self.local_center
    }

    fn read_particles(
        &mut self,
        source: &dyn SceneSource,
        block: BlockHandle,
    ) -> Result<(), SourceError> {
        if !source.contains(block) {
            return Err(SourceError::MissingBlock(block));
        }
        let data = resolve_data(source, block).ok_or_else(|| SourceError::MissingField {
            block,
            field: "Data".to_owned(),
        })?;
        let vertices = source.get_vectors(data, "Vertices")?;

        let count = vertices.len().min(self.max_particles);
        if count < vertices.len() {
            log::warn!(
                "Particle data {data} holds {} particles, keeping {count}",
                vertices.len()
            );
        }

        let radius = read_or_default(source.get_f32(data, "Active Radius"), self.default_size);
        self.size = if radius.is_finite() && radius >= 0.0 {
            radius
        } else {
            log::warn!("Invalid particle radius {radius} on {data}");
            self.default_size
        };

        // Vec::clear keeps capacity, so shrinking counts never free memory.
        self.positions.clear();
        self.positions.extend(vertices[..count].iter().map(|&v| {
            if v.is_finite() {
                v
            } else {
                Vec3::ZERO
            }
        }));
        let repaired = vertices[..count].iter().filter(|v| !v.is_finite()).count();
        if repaired > 0 {
            log::warn!("Moved {repaired} non-finite particle positions of {data} to the origin");
        }
        self.transformed.clear();
        self.transformed.extend_from_slice(&self.positions);

        let colors =
            read_or_default::<&[LinearRgba]>(source.get_colors(data, "Vertex Colors"), &[]);
        self.colors.clear();
        self.colors
            .extend_from_slice(parallel_prefix(colors, count, data, "Vertex Colors"));

        let sizes = read_or_default::<&[f32]>(source.get_floats(data, "Sizes"), &[]);
        let fallback = self.size;
        self.sizes.clear();
        self.sizes.extend(
            parallel_prefix(sizes, count, data, "Sizes")
                .iter()
                .map(|&s| if s.is_finite() && s >= 0.0 { s } else { fallback }),
        );
        if self.sizes.iter().zip(sizes).any(|(kept, read)| kept != read) {
            log::warn!("Replaced invalid particle sizes of {data} with {fallback}");
        }

        let valid = read_or_default(source.get_int(data, "Num Valid"), count as i64);
        self.active = usize::try_from(valid).unwrap_or(0).min(count);

        self.data = Some(data);
        self.local_center = centroid(&self.positions[..self.active]);
        self.recenter = false;
        Ok(())
    }
}

/// Finds the particle data block of a node: its `Data` link, or else the
/// first child deriving from the particle data type.
fn resolve_data(source: &dyn SceneSource, block: BlockHandle) -> Option<BlockHandle> {
    if let Ok(Some(data)) = source.get_link(block, "Data") {
        if source.contains(data) {
            return Some(data);
        }
    }
    source
        .get_links(block, "Children")
        .ok()?
        .iter()
        .copied()
        .find(|&child| source.inherits(child, PARTICLES_DATA_TYPE))
}

/// Returns the first `count` entries of a per-particle array, or an empty
/// slice if the array is too short to cover every particle.
fn parallel_prefix<'a, T>(
    values: &'a [T],
    count: usize,
    data: BlockHandle,
    field: &str,
) -> &'a [T] {
    if values.len() >= count {
        &values[..count]
    } else {
        if !values.is_empty() {
            log::warn!(
                "'{field}' of {data} has {} entries for {count} particles, ignoring it",
                values.len()
            );
        }
        &[]
    }
}

fn centroid(points: &[Vec3]) -> Vec3 {
    if points.is_empty() {
        return Vec3::ZERO;
    }
    let sum = points.iter().fold(Vec3::ZERO, |acc, &p| acc + p);
    sum / points.len() as f32
}

impl Drawable for ParticleNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    /// Re-reads particle data if the node is dirty.
    ///
    /// The sequences are resized to the new particle count; capacity beyond
    /// it is retained. A missing or malformed data block leaves the node with
    /// zero particles. The controller chain is re-resolved either way.
    fn update(&mut self, source: &dyn SceneSource, block: BlockHandle) {
        if !self.dirty {
            return;
        }
        if block != self.base.block() {
            self.base.set_block(block);
        }
        match self.read_particles(source, block) {
            Ok(()) => self.dirty = false,
            Err(err) => {
                log::debug!("Particle node {block} has no particles: {err}");
                self.clear();
            }
        }

        self.controllers.clear();
        let head = read_or_default(source.get_link(block, "Controller"), None);
        self.controllers
            .attach_chain(source, head, ControlTarget::Particles);
    }

    fn transform(&mut self) {
        if self.recenter {
            self.local_center = centroid(&self.positions[..self.active]);
            self.recenter = false;
        }
        self.scene_center = self.base.world().transform_point(self.local_center);
    }

    fn transform_shapes(&mut self) {
        let world = *self.base.world();
        for (out, &local) in self.transformed[..self.active]
            .iter_mut()
            .zip(&self.positions[..self.active])
        {
            *out = world.transform_point(local);
        }
    }

    /// Bounds of the live particles, each expanded by its own size when
    /// per-particle sizes exist and by the node-wide size otherwise.
    fn boundaries(&self) -> Aabb {
        self.transformed[..self.active]
            .iter()
            .enumerate()
            .fold(Aabb::INVALID, |bounds, (i, &p)| {
                let radius = self.sizes.get(i).copied().unwrap_or(self.size);
                bounds.merge(&Aabb::from_center_radius(p, radius))
            })
    }

    fn center(&self) -> Vec3 {
        self.scene_center
    }

    fn draw_shapes(&self, ctx: &mut dyn GraphicsContext, deferred: Option<&mut DeferredList>) {
        if self.base.is_hidden() || self.active == 0 {
            return;
        }
        if let Some(deferred) = deferred {
            if self.base.properties().is_translucent() {
                deferred.push(self.base.block(), self.scene_center);
                return;
            }
        }

        apply_property_list(ctx, self.base.properties());
        let mut current_size = None;
        for (i, &position) in self.transformed[..self.active].iter().enumerate() {
            let size = self.sizes.get(i).copied().unwrap_or(self.size);
            if current_size != Some(size) {
                ctx.set_point_size(size);
                current_size = Some(size);
            }
            let color = self.colors.get(i).copied().unwrap_or(self.default_color);
            ctx.draw_point(PointVertex {
                position,
                size,
                color,
            });
        }
    }
}

impl Animatable for ParticleNode {
    /// Values are only taken while a particle controller is attached, the
    /// same rule the material and texturing properties follow.
    fn apply(&mut self, value: ControlValue) -> bool {
        if self.controllers.is_empty() {
            log::trace!(
                "Ignoring {value:?} on uncontrolled node {}",
                self.base.block()
            );
            return false;
        }
        let len = self.positions.len();
        match value {
            ControlValue::ParticleCount(count) => {
                self.active = count.min(len);
                self.recenter = true;
                true
            }
            ControlValue::ParticlePosition { index, position }
                if index < len && position.is_finite() =>
            {
                self.positions[index] = position;
                self.recenter = true;
                true
            }
            ControlValue::ParticleColor { index, color } if index < len => {
                if self.colors.is_empty() {
                    self.colors.resize(len, self.default_color);
                }
                self.colors[index] = color;
                true
            }
            ControlValue::ParticleSize { index, size }
                if index < len && size.is_finite() && size >= 0.0 =>
            {
                if self.sizes.is_empty() {
                    self.sizes.resize(len, self.size);
                }
                self.sizes[index] = size;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::math::{AffineTransform, EPSILON};
    use tessera_core::renderer::{GraphicsCommand, RecordingContext};
    use tessera_core::scene::{FieldValue, MemorySource};

    fn assert_vec3_approx_eq(a: Vec3, b: Vec3) {
        assert!(
            (a - b).length() < EPSILON,
            "vectors not approximately equal: {a:?} vs {b:?}"
        );
    }

    fn particle_source(positions: Vec<Vec3>) -> (MemorySource, BlockHandle, BlockHandle) {
        let mut source = MemorySource::new();
        let data = source.insert_with(
            "NiParticlesData",
            [("Vertices", FieldValue::Vectors(positions))],
        );
        let node = source.insert_with("NiParticles", [("Data", FieldValue::Link(Some(data)))]);
        (source, node, data)
    }

    fn loaded(source: &MemorySource, node: BlockHandle) -> ParticleNode {
        let mut particles = ParticleNode::new(node, &SceneSettings::default());
        particles.update(source, node);
        particles
    }

    #[test]
    fn test_update_reads_particles_and_centroid() {
        let (source, node, data) = particle_source(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        let particles = loaded(&source, node);

        assert_eq!(particles.active(), 3);
        assert_eq!(particles.data_block(), Some(data));
        assert_eq!(particles.transformed().len(), particles.positions().len());
        assert!(particles.colors().is_empty());
        assert!(!particles.is_dirty());
        assert_vec3_approx_eq(
            particles.local_center(),
            Vec3::new(1.0 / 3.0, 1.0 / 3.0, 0.0),
        );
    }

    #[test]
    fn test_update_is_a_no_op_when_clean() {
        let (mut source, node, data) = particle_source(vec![Vec3::X]);
        let mut particles = loaded(&source, node);

        source
            .set_field(
                data,
                "Vertices",
                FieldValue::Vectors(vec![Vec3::Y, Vec3::Z]),
            )
            .unwrap();
        particles.update(&source, node);
        assert_eq!(particles.positions(), &[Vec3::X]);

        assert!(particles.sync_revision(&source));
        particles.update(&source, node);
        assert_eq!(particles.positions(), &[Vec3::Y, Vec3::Z]);
    }

    #[test]
    fn test_data_found_among_children() {
        let mut source = MemorySource::new();
        source.set_type_parent("NiPSysData", "NiParticlesData");
        let other = source.insert("NiNode");
        let data = source.insert_with(
            "NiPSysData",
            [("Vertices", FieldValue::Vectors(vec![Vec3::ONE]))],
        );
        let node = source.insert_with(
            "NiParticleSystem",
            [("Children", FieldValue::Links(vec![other, data]))],
        );

        let particles = loaded(&source, node);
        assert_eq!(particles.data_block(), Some(data));
        assert_eq!(particles.active(), 1);
    }

    #[test]
    fn test_missing_data_soft_fails_to_zero() {
        let mut source = MemorySource::new();
        let node = source.insert("NiParticles");

        let particles = loaded(&source, node);
        assert_eq!(particles.active(), 0);
        assert!(!particles.boundaries().is_valid());
        assert_eq!(particles.center(), Vec3::ZERO);
    }

    #[test]
    fn test_num_valid_and_attribute_arrays() {
        let (mut source, node, data) = particle_source(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        source.set_field(data, "Num Valid", FieldValue::Int(2)).unwrap();
        source
            .set_field(data, "Sizes", FieldValue::Floats(vec![0.5, 0.25, 1.0]))
            .unwrap();
        source
            .set_field(
                data,
                "Vertex Colors",
                FieldValue::Colors(vec![LinearRgba::BLACK]),
            )
            .unwrap();
        source.set_field(data, "Active Radius", FieldValue::Float(2.0)).unwrap();

        let particles = loaded(&source, node);
        assert_eq!(particles.active(), 2);
        assert_eq!(particles.sizes(), &[0.5, 0.25, 1.0]);
        assert!(particles.colors().is_empty());
        assert_eq!(particles.size(), 2.0);
        assert_vec3_approx_eq(particles.local_center(), Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_max_particles_truncates() {
        let (source, node, _) = particle_source(vec![Vec3::ZERO; 10]);
        let settings = SceneSettings {
            max_particles: 4,
            ..SceneSettings::default()
        };
        let mut particles = ParticleNode::new(node, &settings);
        particles.update(&source, node);
        assert_eq!(particles.positions().len(), 4);
        assert_eq!(particles.active(), 4);
    }

    #[test]
    fn test_shrinking_keeps_capacity() {
        let (mut source, node, data) = particle_source(vec![Vec3::ONE; 64]);
        let mut particles = loaded(&source, node);
        let capacity = particles.positions.capacity();

        source
            .set_field(data, "Vertices", FieldValue::Vectors(vec![Vec3::ONE; 2]))
            .unwrap();
        particles.sync_revision(&source);
        particles.update(&source, node);

        assert_eq!(particles.positions().len(), 2);
        assert_eq!(particles.positions.capacity(), capacity);
    }

    #[test]
    fn test_transform_and_bounds() {
        let (source, node, _) = particle_source(vec![Vec3::ZERO, Vec3::X]);
        let mut particles = loaded(&source, node);
        particles
            .base_mut()
            .set_world(AffineTransform::from_translation(Vec3::new(0.0, 0.0, 5.0)));

        particles.transform();
        particles.transform_shapes();

        assert_vec3_approx_eq(particles.center(), Vec3::new(0.5, 0.0, 5.0));
        assert_vec3_approx_eq(particles.transformed()[1], Vec3::new(1.0, 0.0, 5.0));
        let bounds = particles.boundaries();
        assert_vec3_approx_eq(bounds.min, Vec3::new(-1.0, -1.0, 4.0));
        assert_vec3_approx_eq(bounds.max, Vec3::new(2.0, 1.0, 6.0));
    }

    #[test]
    fn test_draw_issues_one_point_per_live_particle() {
        let (mut source, node, data) = particle_source(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        source.set_field(data, "Num Valid", FieldValue::Int(2)).unwrap();
        let mut particles = loaded(&source, node);
        particles.transform();
        particles.transform_shapes();

        let mut ctx = RecordingContext::new();
        particles.draw_shapes(&mut ctx, None);

        assert_eq!(ctx.draw_count(), 2);
        let sizes = ctx
            .commands()
            .iter()
            .filter(|c| matches!(c, GraphicsCommand::SetPointSize(_)))
            .count();
        assert_eq!(sizes, 1);
        assert!(ctx.points().all(|p| p.color == LinearRgba::WHITE));
    }

    #[test]
    fn test_translucent_node_is_deferred() {
        let (mut source, node, _) = particle_source(vec![Vec3::ZERO]);
        let alpha =
            source.insert_with("NiAlphaProperty", [("Flags", FieldValue::Int(0x00ED))]);
        source
            .set_field(node, "Properties", FieldValue::Links(vec![alpha]))
            .unwrap();

        let mut registry = crate::property::PropertyRegistry::new();
        let mut particles = loaded(&source, node);
        particles.base_mut().update_properties(&source, &mut registry);
        particles.transform();
        particles.transform_shapes();

        let mut ctx = RecordingContext::new();
        let mut deferred = DeferredList::default();
        particles.draw_shapes(&mut ctx, Some(&mut deferred));
        assert_eq!(ctx.draw_count(), 0);
        assert_eq!(deferred.len(), 1);

        particles.draw_shapes(&mut ctx, None);
        assert_eq!(ctx.draw_count(), 1);
    }

    #[test]
    fn test_controller_values() {
        let (mut source, node, _) = particle_source(vec![Vec3::ZERO, Vec3::X]);
        let controller = source.insert("NiParticleSystemController");
        source
            .set_field(node, "Controller", FieldValue::Link(Some(controller)))
            .unwrap();
        let mut particles = loaded(&source, node);
        assert_eq!(particles.controllers().bindings().len(), 1);

        assert!(particles.apply(ControlValue::ParticleCount(1)));
        assert!(particles.apply(ControlValue::ParticleColor {
            index: 1,
            color: LinearRgba::BLACK
        }));
        assert!(!particles.apply(ControlValue::ParticleSize { index: 5, size: 1.0 }));
        assert!(!particles.apply(ControlValue::Alpha(0.5)));

        assert_eq!(particles.active(), 1);
        assert_eq!(particles.colors(), &[LinearRgba::WHITE, LinearRgba::BLACK]);

        assert!(particles.apply(ControlValue::ParticlePosition {
            index: 0,
            position: Vec3::Z
        }));
        particles.transform();
        assert_vec3_approx_eq(particles.center(), Vec3::Z);
    }

    #[test]
    fn test_controller_values_need_an_attached_controller() {
        let (source, node, _) = particle_source(vec![Vec3::ZERO, Vec3::X]);
        let mut particles = loaded(&source, node);
        assert!(particles.controllers().is_empty());

        assert!(!particles.apply(ControlValue::ParticleCount(1)));
        assert!(!particles.apply(ControlValue::ParticleSize { index: 0, size: 3.0 }));
        assert_eq!(particles.active(), 2);
        assert!(particles.sizes().is_empty());
    }

    #[test]
    fn test_invalid_sizes_fall_back_to_node_size() {
        let (mut source, node, data) = particle_source(vec![Vec3::X, Vec3::Y, Vec3::Z]);
        source
            .set_field(data, "Sizes", FieldValue::Floats(vec![f32::NAN, -1.0, 0.5]))
            .unwrap();
        source.set_field(data, "Active Radius", FieldValue::Float(0.25)).unwrap();
        let mut particles = loaded(&source, node);
        particles.transform();
        particles.transform_shapes();

        assert_eq!(particles.sizes(), &[0.25, 0.25, 0.5]);
        let bounds = particles.boundaries();
        assert!(bounds.is_valid());
        assert_vec3_approx_eq(bounds.min, Vec3::new(-0.5, -0.5, -0.25));
        assert_vec3_approx_eq(bounds.max, Vec3::new(1.25, 1.25, 1.5));

        let mut ctx = RecordingContext::new();
        particles.draw_shapes(&mut ctx, None);
        assert!(ctx.points().all(|p| p.size.is_finite()));
        assert!(ctx.commands().iter().all(|c| match c {
            GraphicsCommand::SetPointSize(s) => s.is_finite(),
            _ => true,
        }));
    }

    #[test]
    fn test_non_finite_positions_move_to_origin() {
        let (source, node, _) =
            particle_source(vec![Vec3::new(f32::NAN, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)]);
        let mut particles = loaded(&source, node);
        particles.transform();
        particles.transform_shapes();

        assert_eq!(particles.active(), 2);
        assert_eq!(
            particles.positions(),
            &[Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)]
        );
        assert_vec3_approx_eq(particles.center(), Vec3::X);
        assert!(particles.boundaries().is_valid());
    }
}
