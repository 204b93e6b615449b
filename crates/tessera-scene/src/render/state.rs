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

use crate::property::{
    AlphaProperty, MaterialProperty, PropertyList, SpecularProperty, TexturingProperty,
    WireframeProperty, ZBufferProperty,
};
use tessera_core::math::LinearRgba;
use tessera_core::renderer::{
    AlphaTestState, BlendState, DepthState, GraphicsContext, MaterialState, PolygonMode,
};

/// Sets blending and alpha testing. `None` disables both.
pub fn apply_alpha(ctx: &mut dyn GraphicsContext, alpha: Option<&AlphaProperty>) {
    let Some(alpha) = alpha else {
        ctx.set_blend(None);
        ctx.set_alpha_test(None);
        return;
    };
    ctx.set_blend(alpha.blend_enabled.then_some(BlendState {
        src_factor: alpha.src,
        dst_factor: alpha.dst,
    }));
    ctx.set_alpha_test(alpha.test_enabled.then_some(AlphaTestState {
        compare: alpha.test_function,
        threshold: alpha.threshold,
    }));
}

/// Sets depth testing and writes. `None` restores the default depth state.
pub fn apply_zbuffer(ctx: &mut dyn GraphicsContext, zbuffer: Option<&ZBufferProperty>) {
    let depth = zbuffer.map_or_else(DepthState::default, |z| DepthState {
        test_enabled: z.depth_test,
        write_enabled: z.depth_mask,
        compare: z.function,
    });
    ctx.set_depth(depth);
}

/// Sets the lighting material. The opacity goes into every color's alpha;
/// the specular color is black unless specular highlights are enabled, which
/// they are when no specular property is present.
pub fn apply_material(
    ctx: &mut dyn GraphicsContext,
    material: Option<&MaterialProperty>,
    specular: Option<&SpecularProperty>,
) {
    let Some(material) = material else {
        ctx.set_material(MaterialState::default());
        return;
    };
    let alpha = material.alpha_value();
    let lit_specular = specular.map_or(true, SpecularProperty::enabled);
    ctx.set_material(MaterialState {
        ambient: material.ambient.with_alpha(alpha),
        diffuse: material.diffuse.with_alpha(alpha),
        specular: if lit_specular {
            material.specular.with_alpha(alpha)
        } else {
            LinearRgba::BLACK.with_alpha(alpha)
        },
        emissive: material.emissive.with_alpha(alpha),
        shininess: material.shininess,
    });
}

/// Binds the base texture, or unbinds the texture unit.
pub fn apply_texturing(ctx: &mut dyn GraphicsContext, texturing: Option<&TexturingProperty>) {
    ctx.set_texture(texturing.and_then(TexturingProperty::binding));
}

/// Sets the polygon mode.
pub fn apply_wireframe(ctx: &mut dyn GraphicsContext, wireframe: Option<&WireframeProperty>) {
    let mode = match wireframe {
        Some(w) if w.wire => PolygonMode::Line,
        _ => PolygonMode::Fill,
    };
    ctx.set_polygon_mode(mode);
}

/// Issues the full graphics state of a property list. Kinds the list does
/// not hold fall back to default state.
pub fn apply_property_list(ctx: &mut dyn GraphicsContext, properties: &PropertyList) {
    apply_alpha(ctx, properties.get::<AlphaProperty>().as_deref());
    apply_zbuffer(ctx, properties.get::<ZBufferProperty>().as_deref());
    apply_material(
        ctx,
        properties.get::<MaterialProperty>().as_deref(),
        properties.get::<SpecularProperty>().as_deref(),
    );
    apply_texturing(ctx, properties.get::<TexturingProperty>().as_deref());
    apply_wireframe(ctx, properties.get::<WireframeProperty>().as_deref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{PropertyHandle, PropertyRegistry};
    use tessera_core::renderer::{
        BlendFactor, CompareFunction, GraphicsCommand, RecordingContext,
    };
    use tessera_core::scene::{FieldValue, MemorySource};

    #[test]
    fn test_empty_list_resets_to_defaults() {
        let mut ctx = RecordingContext::new();
        apply_property_list(&mut ctx, &PropertyList::new());

        assert_eq!(
            ctx.commands(),
            &[
                GraphicsCommand::SetBlend(None),
                GraphicsCommand::SetAlphaTest(None),
                GraphicsCommand::SetDepth(DepthState::default()),
                GraphicsCommand::SetMaterial(MaterialState::default()),
                GraphicsCommand::SetTexture(None),
                GraphicsCommand::SetPolygonMode(PolygonMode::Fill),
            ]
        );
    }

    #[test]
    fn test_resolved_list_issues_property_state() {
        let mut source = MemorySource::new();
        let alpha = source.insert_with(
            "NiAlphaProperty",
            [
                ("Flags", FieldValue::Int(0x00ED | (1 << 9) | (4 << 10))),
                ("Threshold", FieldValue::Int(255)),
            ],
        );
        let material = source.insert_with(
            "NiMaterialProperty",
            [
                ("Specular Color", FieldValue::Color(LinearRgba::rgb(0.5, 0.5, 0.5))),
                ("Alpha", FieldValue::Float(0.5)),
            ],
        );
        let specular = source.insert_with("NiSpecularProperty", [("Flags", FieldValue::Int(0))]);
        let wireframe = source.insert_with("NiWireframeProperty", [("Flags", FieldValue::Int(1))]);

        let mut registry = PropertyRegistry::new();
        let mut list = PropertyList::new();
        for block in [alpha, material, specular, wireframe] {
            let property: PropertyHandle = registry.create(&source, block).unwrap();
            list.add(property);
        }

        let mut ctx = RecordingContext::new();
        apply_property_list(&mut ctx, &list);
        let commands = ctx.commands();

        assert_eq!(
            commands[0],
            GraphicsCommand::SetBlend(Some(BlendState {
                src_factor: BlendFactor::SrcAlpha,
                dst_factor: BlendFactor::OneMinusSrcAlpha,
            }))
        );
        assert_eq!(
            commands[1],
            GraphicsCommand::SetAlphaTest(Some(AlphaTestState {
                compare: CompareFunction::Greater,
                threshold: 1.0,
            }))
        );
        let GraphicsCommand::SetMaterial(state) = &commands[3] else {
            panic!("expected a material command, got {:?}", commands[3]);
        };
        assert_eq!(state.diffuse.a, 0.5);
        assert_eq!(state.specular, LinearRgba::new(0.0, 0.0, 0.0, 0.5));
        assert_eq!(
            commands[5],
            GraphicsCommand::SetPolygonMode(PolygonMode::Line)
        );
    }
}
