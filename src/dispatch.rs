//! Resolution of draw lists against a shader's schema.
//!
//! A draw list is an unordered slice of resource handles. Resolution turns it
//! into a [`DrawCall`] the backend can execute blindly:
//!
//! 1. Partition the list by resource kind, merging entries of the same kind
//!    name by name with last-write-wins.
//! 2. Pair declared attribute buffers with merged vertex data. A declared
//!    attribute with no buffer is skipped with a warning.
//! 3. Fill unset uniforms from schema defaults.
//! 4. Assign texture units counting up from zero in declaration order, bound
//!    or not, so a slot's unit never depends on what the caller submitted.
//! 5. Adopt the index buffer's effective span and the schema's draw mode.
//!
//! A missing index buffer is the one hard error; without it nothing defines
//! the draw span. Everything else degrades with a logged warning, matching
//! the authoring-time versus draw-time split described in [`crate::errors`].

use smallvec::SmallVec;

use crate::assets::prelude::*;
use crate::errors::{Error, Result};
use crate::resource::Resource;
use crate::store::ResourceStore;
use crate::utils::prelude::{FastHashMap, HashValue};
use crate::{MAX_UNIFORM_VARIABLES, MAX_VERTEX_ATTRIBUTES};

/// Where a sampler slot's image comes from. Target aliases resolve to the
/// flavor-defining attachment at execution time, so they survive resizes.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TextureBinding {
    Texture(TextureHandle),
    Target(TargetHandle),
}

/// One uniform slot resolved for a single draw.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UniformBinding {
    Value(UniformValue),
    Texture {
        unit: u8,
        binding: Option<TextureBinding>,
    },
}

/// One attribute slot paired with the buffer feeding it.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AttributeBinding {
    pub name: HashValue<str>,
    pub buffer: BufferHandle,
    pub components: u8,
}

/// A fully resolved draw. `uniforms` carries value and sampler slots in
/// schema declaration order; `offset` and `count` are in indices.
#[derive(Debug, PartialEq, Clone)]
pub struct DrawCall {
    pub shader: ShaderHandle,
    pub attributes: SmallVec<[AttributeBinding; MAX_VERTEX_ATTRIBUTES]>,
    pub uniforms: SmallVec<[(HashValue<str>, UniformBinding); MAX_UNIFORM_VARIABLES]>,
    pub buffer: BufferHandle,
    pub offset: usize,
    pub count: usize,
    pub mode: DrawMode,
}

pub(crate) fn resolve(
    store: &ResourceStore,
    shader: ShaderHandle,
    resources: &[Resource],
) -> Result<DrawCall> {
    let schema = store
        .schema(shader)
        .ok_or_else(|| Error::ShaderInvalid(format!("{:?} is not alive.", shader)))?;

    let mut buffers = FastHashMap::default();
    let mut values = FastHashMap::default();
    let mut samplers = FastHashMap::default();
    let mut index = None;

    for resource in resources {
        match *resource {
            Resource::VertexBuffers(handle) => match store.vertex_entries(handle) {
                Some(entries) => {
                    for (name, buffer) in entries {
                        buffers.insert(*name, *buffer);
                    }
                }
                None => warn!("{:?} is not alive; skipped.", handle),
            },
            Resource::IndexBuffer(handle) => match store.index_buffer(handle) {
                Some(slot) => index = Some((slot.buffer, slot.span())),
                None => warn!("{:?} is not alive; skipped.", handle),
            },
            Resource::Uniforms(handle) => match store.uniform_values(handle) {
                Some(entries) => {
                    for (name, value) in entries {
                        values.insert(*name, *value);
                    }
                }
                None => warn!("{:?} is not alive; skipped.", handle),
            },
            Resource::Textures(handle) => match store.texture_entries(handle) {
                Some(entries) => {
                    for (name, slot) in entries {
                        samplers.insert(*name, slot.binding());
                    }
                }
                None => warn!("{:?} is not alive; skipped.", handle),
            },
            Resource::Target(handle) => {
                warn!(
                    "{:?} can't take part in a draw list; render into it with offscreen().",
                    handle
                );
            }
        }
    }

    let mut attributes = SmallVec::new();
    for decl in &schema.buffers {
        match buffers.get(&decl.hash) {
            Some(buffer) => attributes.push(AttributeBinding {
                name: decl.hash,
                buffer: *buffer,
                components: decl.components,
            }),
            None => warn!(
                "Attribute buffer '{}' is missing from the draw list.",
                decl.name
            ),
        }
    }

    let (buffer, (offset, count)) = index.ok_or_else(|| {
        Error::ResourceInvalid("The draw list carries no index buffer.".into())
    })?;

    let mut uniforms = SmallVec::new();
    for decl in &schema.uniforms {
        match values.get(&decl.hash) {
            Some(value) if value.schema_type() == decl.ty => {
                uniforms.push((decl.hash, UniformBinding::Value(*value)));
            }
            Some(value) => {
                warn!(
                    "Uniform '{}' got a {:?} value (declared {:?}); ignored.",
                    decl.name,
                    value.schema_type(),
                    decl.ty
                );
                if let Some(default) = decl.default {
                    uniforms.push((decl.hash, UniformBinding::Value(default)));
                }
            }
            None => match decl.default {
                Some(default) => uniforms.push((decl.hash, UniformBinding::Value(default))),
                None => warn!("Uniform '{}' is unset and has no default.", decl.name),
            },
        }
    }

    for (unit, decl) in schema.textures.iter().enumerate() {
        let binding = samplers.get(&decl.hash).cloned();
        if binding.is_none() {
            warn!("Texture slot '{}' has nothing bound.", decl.name);
        }

        uniforms.push((
            decl.hash,
            UniformBinding::Texture {
                unit: unit as u8,
                binding,
            },
        ));
    }

    Ok(DrawCall {
        shader,
        attributes,
        uniforms,
        buffer,
        offset,
        count,
        mode: schema.mode,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backends::{self, Device};
    use crate::math::prelude::Vector2;

    struct Fixture {
        store: ResourceStore,
        device: Box<dyn Device>,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                store: ResourceStore::new(),
                device: backends::new_headless(),
            }
        }

        fn shader(&mut self, params: ShaderParams) -> ShaderHandle {
            self.store
                .create_shader(
                    self.device.as_mut(),
                    params,
                    "void main() {}",
                    "void main() {}",
                )
                .unwrap()
        }

        fn triangle(&mut self) -> (Resource, Resource) {
            let vertices = self
                .store
                .create_vertex_buffers(
                    self.device.as_mut(),
                    VertexData::new().with("position", vec![0.0; 9]),
                )
                .unwrap();
            let indices = self
                .store
                .create_index_buffer(self.device.as_mut(), IndexData::new(vec![0, 1, 2]))
                .unwrap();
            (vertices.into(), indices.into())
        }

        fn resolve(&self, shader: ShaderHandle, resources: &[Resource]) -> Result<DrawCall> {
            resolve(&self.store, shader, resources)
        }
    }

    fn uniform_of(call: &DrawCall, name: &str) -> UniformBinding {
        let hash = HashValue::from(name);
        call.uniforms
            .iter()
            .find(|(n, _)| *n == hash)
            .map(|(_, binding)| *binding)
            .unwrap()
    }

    #[test]
    fn merges_same_kind_resources_with_last_write_wins() {
        let mut fx = Fixture::new();
        let shader = fx.shader(
            ShaderParams::build()
                .buffer("position", SchemaType::Vector3f)
                .uniform("tint", SchemaType::F32)
                .uniform("glow", SchemaType::F32)
                .finish(),
        );
        let (vertices, indices) = fx.triangle();

        let first = fx.store.create_uniforms();
        fx.store
            .set_uniform(first, "tint", UniformValue::F32(0.25))
            .unwrap();
        fx.store
            .set_uniform(first, "glow", UniformValue::F32(0.9))
            .unwrap();
        let second = fx.store.create_uniforms();
        fx.store
            .set_uniform(second, "tint", UniformValue::F32(0.75))
            .unwrap();

        let call = fx
            .resolve(shader, &[vertices, first.into(), indices, second.into()])
            .unwrap();
        assert_eq!(
            uniform_of(&call, "tint"),
            UniformBinding::Value(UniformValue::F32(0.75))
        );

        // Keys the later bag never mentions survive the merge.
        assert_eq!(
            uniform_of(&call, "glow"),
            UniformBinding::Value(UniformValue::F32(0.9))
        );

        // Reversed order flips the winner.
        let call = fx
            .resolve(shader, &[vertices, second.into(), indices, first.into()])
            .unwrap();
        assert_eq!(
            uniform_of(&call, "tint"),
            UniformBinding::Value(UniformValue::F32(0.25))
        );
    }

    #[test]
    fn schema_defaults_fill_unset_uniforms() {
        let mut fx = Fixture::new();
        let shader = fx.shader(
            ShaderParams::build()
                .buffer("position", SchemaType::Vector3f)
                .uniform_default("tint", SchemaType::Vector3f, [0.0f32, 1.0, 0.0])
                .finish(),
        );
        let (vertices, indices) = fx.triangle();

        let call = fx.resolve(shader, &[vertices, indices]).unwrap();
        assert_eq!(
            uniform_of(&call, "tint"),
            UniformBinding::Value(UniformValue::Vector3f([0.0, 1.0, 0.0]))
        );

        // Resolution is stateless; the default binds again on the next draw.
        let call = fx.resolve(shader, &[vertices, indices]).unwrap();
        assert_eq!(
            uniform_of(&call, "tint"),
            UniformBinding::Value(UniformValue::Vector3f([0.0, 1.0, 0.0]))
        );

        // A supplied value of the declared type beats the default.
        let uniforms = fx.store.create_uniforms();
        fx.store
            .set_uniform(uniforms, "tint", UniformValue::Vector3f([0.2, 0.4, 0.6]))
            .unwrap();
        let call = fx
            .resolve(shader, &[vertices, indices, uniforms.into()])
            .unwrap();
        assert_eq!(
            uniform_of(&call, "tint"),
            UniformBinding::Value(UniformValue::Vector3f([0.2, 0.4, 0.6]))
        );
    }

    #[test]
    fn mistyped_values_fall_back_to_the_default() {
        let mut fx = Fixture::new();
        let shader = fx.shader(
            ShaderParams::build()
                .buffer("position", SchemaType::Vector3f)
                .uniform_default("tint", SchemaType::Vector3f, [1.0f32, 1.0, 1.0])
                .finish(),
        );
        let (vertices, indices) = fx.triangle();

        let uniforms = fx.store.create_uniforms();
        fx.store
            .set_uniform(uniforms, "tint", UniformValue::F32(0.5))
            .unwrap();

        let call = fx
            .resolve(shader, &[vertices, indices, uniforms.into()])
            .unwrap();
        assert_eq!(
            uniform_of(&call, "tint"),
            UniformBinding::Value(UniformValue::Vector3f([1.0, 1.0, 1.0]))
        );
    }

    #[test]
    fn texture_units_count_up_in_declaration_order() {
        let mut fx = Fixture::new();
        let shader = fx.shader(
            ShaderParams::build()
                .buffer("position", SchemaType::Vector3f)
                .texture_2d("albedo")
                .texture_2d("normal")
                .texture_2d("rough")
                .finish(),
        );
        let (vertices, indices) = fx.triangle();

        let textures = fx.store.create_textures();
        let params = TextureParams {
            dimensions: Vector2::new(2, 2),
            ..Default::default()
        };
        fx.store
            .set_texture(
                fx.device.as_mut(),
                textures,
                "normal",
                params,
                TextureData::new(vec![0; 16]).into(),
            )
            .unwrap();

        let call = fx
            .resolve(shader, &[vertices, indices, textures.into()])
            .unwrap();

        // The second slot is the only one bound, yet keeps unit 1.
        match uniform_of(&call, "albedo") {
            UniformBinding::Texture { unit: 0, binding: None } => {}
            v => panic!("unexpected binding {:?}", v),
        }
        match uniform_of(&call, "normal") {
            UniformBinding::Texture {
                unit: 1,
                binding: Some(TextureBinding::Texture(_)),
            } => {}
            v => panic!("unexpected binding {:?}", v),
        }
        match uniform_of(&call, "rough") {
            UniformBinding::Texture { unit: 2, binding: None } => {}
            v => panic!("unexpected binding {:?}", v),
        }
    }

    #[test]
    fn index_data_is_the_one_structural_requirement() {
        let mut fx = Fixture::new();
        let shader = fx.shader(
            ShaderParams::build()
                .buffer("position", SchemaType::Vector3f)
                .finish(),
        );
        let (vertices, indices) = fx.triangle();

        // No index buffer: nothing defines the draw span.
        assert!(fx.resolve(shader, &[vertices]).is_err());

        // A missing attribute buffer degrades to a warning and an empty slot.
        let call = fx.resolve(shader, &[indices]).unwrap();
        assert!(call.attributes.is_empty());

        assert!(fx.resolve(shader, &[vertices, indices]).is_ok());
    }

    #[test]
    fn pinned_index_spans_reach_the_call() {
        let mut fx = Fixture::new();
        let shader = fx.shader(
            ShaderParams::build()
                .buffer("position", SchemaType::Vector3f)
                .finish(),
        );

        let vertices = fx
            .store
            .create_vertex_buffers(
                fx.device.as_mut(),
                VertexData::new().with("position", vec![0.0; 12]),
            )
            .unwrap();
        let indices = fx
            .store
            .create_index_buffer(
                fx.device.as_mut(),
                IndexData::with_span(vec![0, 1, 2, 2, 3, 0], 3, 3),
            )
            .unwrap();

        let call = fx
            .resolve(shader, &[vertices.into(), indices.into()])
            .unwrap();
        assert_eq!((call.offset, call.count), (3, 3));
        assert_eq!(call.mode, DrawMode::Triangles);
    }

    #[test]
    fn targets_in_draw_lists_are_skipped() {
        let mut fx = Fixture::new();
        let shader = fx.shader(
            ShaderParams::build()
                .buffer("position", SchemaType::Vector3f)
                .finish(),
        );
        let (vertices, indices) = fx.triangle();

        let target = fx
            .store
            .create_target(
                fx.device.as_mut(),
                TargetParams::new(TargetFlavor::Color, 64, 64),
            )
            .unwrap();

        let call = fx.resolve(shader, &[vertices, target.into(), indices]);
        assert!(call.is_ok());
    }

    #[test]
    fn dead_shader_handles_are_an_error() {
        let mut fx = Fixture::new();
        let shader = fx.shader(
            ShaderParams::build()
                .buffer("position", SchemaType::Vector3f)
                .finish(),
        );
        let (vertices, indices) = fx.triangle();

        fx.store
            .delete_shader(fx.device.as_mut(), shader)
            .unwrap();
        assert!(fx.resolve(shader, &[vertices, indices]).is_err());
    }
}
