extern crate env_logger;
extern crate glaze;
extern crate rand;

mod common;

use rand::{Rng, SeedableRng, XorShiftRng};

use glaze::backends::capabilities::Capabilities;
use glaze::math::prelude::{Matrix4, Vector2};
use glaze::prelude::*;

use crate::common::{Event, Journal, RecordingDevice};

/// A context over a recorder that impersonates the given version string.
fn limited_context(version: &str, extensions: Vec<&str>) -> (Context, Journal) {
    let journal = Journal::default();
    let capabilities = Capabilities::parse(
        version,
        extensions,
        "test".to_owned(),
        "recorder".to_owned(),
        8,
    )
    .unwrap();

    let device = RecordingDevice::with_capabilities(journal.clone(), capabilities);
    let ctx = Context::with_device(ContextParams::default(), Box::new(device)).unwrap();

    journal.take();
    (ctx, journal)
}

#[test]
fn shader_validation_precedes_device_creation() {
    let (mut ctx, journal) = common::recording_context(ContextParams::default());

    // The same name on both a buffer and a uniform.
    let duplicated = ShaderParams::build()
        .buffer("tint", SchemaType::Vector3f)
        .uniform("tint", SchemaType::F32)
        .finish();
    assert!(ctx
        .create_shader(duplicated, "void main() {}", "void main() {}")
        .is_err());

    // Samplers belong in texture slots, not uniforms.
    let sampler = ShaderParams::build()
        .uniform("scene", SchemaType::Texture2D)
        .finish();
    assert!(ctx
        .create_shader(sampler, "void main() {}", "void main() {}")
        .is_err());

    // A default whose type contradicts the declaration.
    let mistyped = ShaderParams::build()
        .uniform_default("tint", SchemaType::Vector3f, 0.5f32)
        .finish();
    assert!(ctx
        .create_shader(mistyped, "void main() {}", "void main() {}")
        .is_err());

    assert!(journal.take().is_empty());
}

#[test]
fn texture_replacement_reallocates() {
    let (mut ctx, journal) = common::recording_context(ContextParams::default());

    let textures = ctx.create_textures();
    let params = TextureParams {
        dimensions: Vector2::new(2, 2),
        ..Default::default()
    };

    ctx.set_texture(textures, "albedo", params, TextureData::new(vec![0; 16]))
        .unwrap();
    ctx.set_texture(textures, "albedo", params, TextureData::new(vec![255; 16]))
        .unwrap();

    let events = journal.take();
    assert_eq!(events.len(), 3);

    let first = match &events[0] {
        Event::CreateTexture { handle, .. } => *handle,
        other => panic!("expected a creation, got {:?}", other),
    };
    let second = match &events[1] {
        Event::CreateTexture { handle, .. } => *handle,
        other => panic!("expected a creation, got {:?}", other),
    };

    // The replacement is allocated before the old object goes away.
    assert_ne!(first, second);
    assert_eq!(events[2], Event::DeleteTexture(first));
}

#[test]
fn sampling_updates_stay_in_place() {
    let (mut ctx, journal) = common::recording_context(ContextParams::default());

    let textures = ctx.create_textures();
    let params = TextureParams {
        dimensions: Vector2::new(64, 64),
        ..Default::default()
    };
    ctx.set_texture(textures, "albedo", params, TextureData::new(vec![0; 16384]))
        .unwrap();
    journal.take();

    ctx.set_texture_sampling(textures, "albedo", None, Some(TextureFilter::Nearest))
        .unwrap();

    let events = journal.take();
    assert_eq!(events.len(), 1);
    match &events[0] {
        Event::UpdateTextureParams { wrap, filter, .. } => {
            // 64x64 static textures mipmap, so the default wrap is Repeat.
            assert_eq!(*wrap, TextureWrap::Repeat);
            assert_eq!(*filter, TextureFilter::Nearest);
        }
        other => panic!("expected a sampling update, got {:?}", other),
    }
}

#[test]
fn srgb_formats_fall_back_on_weak_devices() {
    let (mut ctx, journal) = limited_context("OpenGL ES 2.0", vec![]);

    let textures = ctx.create_textures();
    let params = TextureParams {
        format: TextureFormat::Srgba8,
        dimensions: Vector2::new(2, 2),
        ..Default::default()
    };
    ctx.set_texture(textures, "albedo", params, TextureData::new(vec![0; 16]))
        .unwrap();

    let events = journal.take();
    match &events[0] {
        Event::CreateTexture { params, .. } => assert_eq!(params.format, TextureFormat::Rgba8),
        other => panic!("expected a creation, got {:?}", other),
    }
}

#[test]
fn depth_targets_require_depth_textures() {
    let (mut ctx, journal) = limited_context("OpenGL ES 2.0", vec![]);

    match ctx.create_target(TargetParams::new(TargetFlavor::Depth, 256, 256)) {
        Err(Error::CapabilityMissing(_)) => (),
        other => panic!("expected a capability error, got {:?}", other),
    }
    assert!(journal.take().is_empty());

    // The extension fills the gap on the same version.
    let (mut ctx, journal) = limited_context("OpenGL ES 2.0", vec!["GL_OES_depth_texture"]);
    ctx.create_target(TargetParams::new(TargetFlavor::Depth, 256, 256))
        .unwrap();
    assert_eq!(journal.take().len(), 1);
}

#[test]
fn uniform_bags_never_touch_the_device() {
    let (mut ctx, journal) = common::recording_context(ContextParams::default());

    let uniforms = ctx.create_uniforms();
    ctx.set_uniform(uniforms, "tint", 0.5f32).unwrap();
    ctx.set_uniform(uniforms, "model", Matrix4::from_scale(2.0f32))
        .unwrap();
    ctx.delete_uniform(uniforms, "tint").unwrap();
    ctx.delete_uniforms(uniforms).unwrap();

    assert!(journal.take().is_empty());
    assert!(ctx.set_uniform(uniforms, "tint", 1.0f32).is_err());
}

#[test]
fn index_updates_rederive_the_span() {
    let (mut ctx, journal) = common::recording_context(ContextParams::default());

    let shader = ctx
        .create_shader(
            ShaderParams::build()
                .buffer("position", SchemaType::Vector3f)
                .finish(),
            "void main() {}",
            "void main() {}",
        )
        .unwrap();
    let vertices = ctx
        .create_vertex_buffers(VertexData::new().with("position", vec![0.0; 18]))
        .unwrap();
    let indices = ctx
        .create_index_buffer(IndexData::new(vec![0, 1, 2, 2, 3, 0]))
        .unwrap();

    ctx.update_index_buffer(indices, IndexData::new(vec![0, 1, 2]))
        .unwrap();
    journal.take();

    ctx.draw(shader, &[vertices.into(), indices.into()])
        .unwrap();

    let calls = journal.draws();
    assert_eq!((calls[0].offset, calls[0].count), (0, 3));
}

#[test]
fn per_key_updates_and_deletes_reach_single_buffers() {
    let (mut ctx, journal) = common::recording_context(ContextParams::default());

    let buffers = ctx
        .create_vertex_buffers(VertexData::new().with("position", vec![0.0; 9]))
        .unwrap();
    journal.take();

    // A known name re-uploads in place.
    ctx.update_vertex_buffer(buffers, "position", &[1.0; 9])
        .unwrap();
    // A new name allocates.
    ctx.update_vertex_buffer(buffers, "normal", &[0.0; 9])
        .unwrap();

    let events = journal.take();
    assert_eq!(events.len(), 2);
    match &events[0] {
        Event::UpdateVertexBuffer { data, .. } => assert_eq!(data, &vec![1.0; 9]),
        other => panic!("expected an update, got {:?}", other),
    }
    let created = match &events[1] {
        Event::CreateVertexBuffer { handle, .. } => *handle,
        other => panic!("expected a creation, got {:?}", other),
    };

    ctx.delete_vertex_buffer(buffers, "normal").unwrap();
    assert_eq!(journal.take(), vec![Event::DeleteBuffer(created)]);

    assert!(ctx.delete_vertex_buffer(buffers, "normal").is_err());
}

#[test]
fn buffer_churn_pairs_creations_with_deletions() {
    let _ = env_logger::try_init();
    let (mut ctx, journal) = common::recording_context(ContextParams::default());

    let mut generator = XorShiftRng::from_seed([7; 16]);
    let mut live = Vec::new();

    for i in 0..256 {
        if live.is_empty() || generator.gen() {
            let data = VertexData::new()
                .with(format!("attr{}", i), vec![0.0; 9])
                .with(format!("extra{}", i), vec![0.0; 6]);
            live.push(ctx.create_vertex_buffers(data).unwrap());
        } else {
            let at = generator.gen_range(0, live.len());
            let handle = live.swap_remove(at);
            ctx.delete_vertex_buffers(handle).unwrap();

            // Frozen handles stay dead even after the slot is recycled.
            assert!(ctx.delete_vertex_buffers(handle).is_err());
            assert!(ctx.update_vertex_buffer(handle, "attr0", &[0.0; 9]).is_err());
        }
    }

    for handle in live.drain(..) {
        ctx.delete_vertex_buffers(handle).unwrap();
    }

    let mut balance = 0i64;
    for event in journal.take() {
        match event {
            Event::CreateVertexBuffer { .. } => balance += 1,
            Event::DeleteBuffer(_) => balance -= 1,
            _ => (),
        }
    }
    assert_eq!(balance, 0);
}
