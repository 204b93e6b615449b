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

// Tessera Sandbox
// Builds a small particle scene in memory and runs it for a few frames.
//
// Usage: sandbox [settings.ron]

use anyhow::{Context, Result};
use tessera_core::animation::{Animatable, ControlValue};
use tessera_core::math::{AffineTransform, LinearRgba, Vec3};
use tessera_core::renderer::RecordingContext;
use tessera_core::scene::{FieldValue, MemorySource};
use tessera_core::{BlockHandle, SceneSettings};
use tessera_scene::{Drawable, Scene};

const FRAMES: usize = 4;
const FOUNTAIN_PARTICLES: usize = 32;

struct Blocks {
    fountain: BlockHandle,
    fountain_data: BlockHandle,
    smoke: BlockHandle,
    smoke_material: BlockHandle,
}

fn populate(source: &mut MemorySource) -> Blocks {
    let zbuffer = source.insert_with("NiZBufferProperty", [("Flags", FieldValue::Int(3))]);
    let blend = source.insert_with("NiAlphaProperty", [("Flags", FieldValue::Int(0x00ED))]);
    let fade = source.insert("NiAlphaController");
    let smoke_material = source.insert_with(
        "NiMaterialProperty",
        [
            ("Diffuse Color", FieldValue::Color(LinearRgba::rgb(0.6, 0.6, 0.6))),
            ("Alpha", FieldValue::Float(0.7)),
            ("Controller", FieldValue::Link(Some(fade))),
        ],
    );

    let fountain_positions: Vec<Vec3> = (0..FOUNTAIN_PARTICLES)
        .map(|i| {
            let t = i as f32 / FOUNTAIN_PARTICLES as f32;
            Vec3::new((t * 12.0).cos() * t, t * 4.0, (t * 12.0).sin() * t)
        })
        .collect();
    let fountain_colors = (0..FOUNTAIN_PARTICLES)
        .map(|i| {
            LinearRgba::rgb(0.2, 0.4, 1.0).with_alpha(1.0 - i as f32 / FOUNTAIN_PARTICLES as f32)
        })
        .collect();
    let fountain_data = source.insert_with(
        "NiParticlesData",
        [
            ("Vertices", FieldValue::Vectors(fountain_positions)),
            ("Vertex Colors", FieldValue::Colors(fountain_colors)),
            ("Num Valid", FieldValue::Int(8)),
            ("Active Radius", FieldValue::Float(0.1)),
        ],
    );
    let spray = source.insert("NiParticleSystemController");
    let fountain = source.insert_with(
        "NiParticles",
        [
            ("Data", FieldValue::Link(Some(fountain_data))),
            ("Controller", FieldValue::Link(Some(spray))),
            ("Properties", FieldValue::Links(vec![zbuffer])),
        ],
    );

    let smoke_data = source.insert_with(
        "NiPSysData",
        [
            (
                "Vertices",
                FieldValue::Vectors(vec![Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.5, 6.0, -0.5)]),
            ),
            ("Sizes", FieldValue::Floats(vec![1.5, 2.0])),
        ],
    );
    let drift = source.insert("NiPSysUpdateCtlr");
    let smoke = source.insert_with(
        "NiParticleSystem",
        [
            ("Children", FieldValue::Links(vec![smoke_data])),
            ("Controller", FieldValue::Link(Some(drift))),
            ("Properties", FieldValue::Links(vec![zbuffer, blend, smoke_material])),
        ],
    );

    Blocks {
        fountain,
        fountain_data,
        smoke,
        smoke_material,
    }
}

fn load_settings() -> Result<SceneSettings> {
    match std::env::args().nth(1) {
        Some(path) => SceneSettings::load(&path).context("Sandbox settings"),
        None => Ok(SceneSettings::default()),
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = load_settings()?;
    log::info!("Scene settings: {settings:?}");

    let mut source = MemorySource::new();
    let blocks = populate(&mut source);

    let mut scene = Scene::new(settings);
    for node in [blocks.fountain, blocks.smoke] {
        if !scene.add_particles(&source, node) {
            anyhow::bail!("Block {node} is not a particle node");
        }
    }
    scene.set_transform(
        blocks.smoke,
        AffineTransform::from_translation(Vec3::new(2.0, 0.0, -3.0)),
    );
    scene.set_view(AffineTransform::from_translation(Vec3::new(0.0, -2.0, -10.0)));

    let mut ctx = RecordingContext::new();
    for frame in 0..FRAMES {
        // Emit more fountain particles each frame.
        let born = 8 * (frame + 1);
        source
            .set_field(
                blocks.fountain_data,
                "Num Valid",
                FieldValue::Int(born as i64),
            )
            .context("Fountain data block vanished")?;

        scene.update(&source);

        // Stand in for the external controllers: fade the smoke and lift
        // its first particle.
        let fade = 0.7 - 0.15 * frame as f32;
        let material = scene
            .node(blocks.smoke)
            .and_then(|node| node.base().properties().get_block(blocks.smoke_material).cloned())
            .context("Smoke material was not resolved")?;
        material.apply(ControlValue::Alpha(fade));
        if let Some(smoke) = scene.node_mut(blocks.smoke) {
            smoke.apply(ControlValue::ParticlePosition {
                index: 0,
                position: Vec3::new(0.0, 5.0 + frame as f32 * 0.5, 0.0),
            });
        }

        scene.transform();
        ctx.clear();
        let stats = scene.draw(&mut ctx);
        let bounds = scene.bounds();

        log::info!(
            "Frame {frame}: {} points ({} opaque nodes, {} deferred), {} vertex bytes, bounds {:?}..{:?}",
            ctx.draw_count(),
            stats.opaque,
            stats.deferred,
            ctx.vertex_bytes().len(),
            bounds.min,
            bounds.max,
        );
    }

    log::info!(
        "Done: {} cached properties, smoke center {:?}",
        scene.registry().len(),
        scene.node(blocks.smoke).map(|node| node.center())
    );
    Ok(())
}
