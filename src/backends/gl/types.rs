use gl;
use gl::types::*;

use crate::assets::prelude::*;
use crate::backends::capabilities::Version;

impl From<DrawMode> for GLenum {
    fn from(mode: DrawMode) -> Self {
        match mode {
            DrawMode::Triangles => gl::TRIANGLES,
            DrawMode::Lines => gl::LINES,
        }
    }
}

impl From<TextureWrap> for GLenum {
    fn from(wrap: TextureWrap) -> Self {
        match wrap {
            TextureWrap::Repeat => gl::REPEAT,
            TextureWrap::Mirror => gl::MIRRORED_REPEAT,
            TextureWrap::Clamp => gl::CLAMP_TO_EDGE,
        }
    }
}

/// Returns the `(min, mag)` filter pair for a resolved sampling filter. Minification
/// samples across mipmap levels only when the texture actually carries them.
pub fn filters(filter: TextureFilter, mipmap: bool) -> (GLenum, GLenum) {
    match filter {
        TextureFilter::Nearest => {
            let min = if mipmap {
                gl::NEAREST_MIPMAP_NEAREST
            } else {
                gl::NEAREST
            };
            (min, gl::NEAREST)
        }
        TextureFilter::Linear => {
            let min = if mipmap {
                gl::LINEAR_MIPMAP_LINEAR
            } else {
                gl::LINEAR
            };
            (min, gl::LINEAR)
        }
    }
}

/// Whether the context accepts sized internal formats. ES 2 only understands the
/// unsized ones; everything newer wants `RGBA8` and friends.
fn sized_formats(version: Version) -> bool {
    match version {
        Version::GL(_, _) => true,
        Version::ES(major, _) => major >= 3,
    }
}

/// Returns the `(internal, format, pixel type)` triple for a texture format.
pub fn texture_format(format: TextureFormat, version: Version) -> (GLenum, GLenum, GLenum) {
    if sized_formats(version) {
        match format {
            TextureFormat::Rgb8 => (gl::RGB8, gl::RGB, gl::UNSIGNED_BYTE),
            TextureFormat::Rgba8 => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
            TextureFormat::Srgb8 => (gl::SRGB8, gl::RGB, gl::UNSIGNED_BYTE),
            TextureFormat::Srgba8 => (gl::SRGB8_ALPHA8, gl::RGBA, gl::UNSIGNED_BYTE),
        }
    } else {
        // 0x8C42 is SRGB_ALPHA, which the core bindings leave out.
        match format {
            TextureFormat::Rgb8 => (gl::RGB, gl::RGB, gl::UNSIGNED_BYTE),
            TextureFormat::Rgba8 => (gl::RGBA, gl::RGBA, gl::UNSIGNED_BYTE),
            TextureFormat::Srgb8 => (gl::SRGB, gl::SRGB, gl::UNSIGNED_BYTE),
            TextureFormat::Srgba8 => (0x8C42, 0x8C42, gl::UNSIGNED_BYTE),
        }
    }
}

/// The storage triple used for the color attachment of offscreen targets.
pub fn target_color_format(version: Version) -> (GLenum, GLenum, GLenum) {
    texture_format(TextureFormat::Rgba8, version)
}

/// The storage triple used for sampleable depth attachments.
pub fn target_depth_format(version: Version) -> (GLenum, GLenum, GLenum) {
    if sized_formats(version) {
        (gl::DEPTH_COMPONENT24, gl::DEPTH_COMPONENT, gl::FLOAT)
    } else {
        (gl::DEPTH_COMPONENT, gl::DEPTH_COMPONENT, gl::UNSIGNED_INT)
    }
}
