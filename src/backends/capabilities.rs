//! What the underlying video implementation can do. Contrary to device state,
//! these values never change after construction.
//!
//! Parsing works on plain strings so it can run (and be tested) without a
//! live context; backends gather the raw strings themselves.

use std::cmp;

use crate::errors::{Error, Result};
use crate::utils::prelude::FastHashSet;

/// An API version. Versions of different APIs are never ordered against each
/// other: both `GL(3, 0) >= ES(3, 0)` and `ES(3, 0) >= GL(3, 0)` are false.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    /// Desktop OpenGL.
    GL(u8, u8),
    /// OpenGL for embedded systems.
    ES(u8, u8),
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Version) -> Option<cmp::Ordering> {
        let (es1, major1, minor1) = match *self {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        let (es2, major2, minor2) = match *other {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        if es1 != es2 {
            None
        } else {
            match major1.cmp(&major2) {
                cmp::Ordering::Equal => Some(minor1.cmp(&minor2)),
                v => Some(v),
            }
        }
    }
}

impl Version {
    /// Parses a `GL_VERSION` string. Vendor specific information after the
    /// version number is ignored.
    pub fn parse(desc: &str) -> Result<Version> {
        let (es, desc) = if desc.starts_with("OpenGL ES-") {
            // e.g. "OpenGL ES-CM 1.1".
            (true, &desc[13..])
        } else if desc.starts_with("OpenGL ES ") {
            (true, &desc[10..])
        } else {
            (false, &desc[..])
        };

        let malformed = || Error::Device(format!("Unrecognized version string '{}'.", desc));

        let digits = desc.split(' ').next().ok_or_else(malformed)?;
        let mut iter = digits.split('.');
        let major = iter
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(malformed)?;
        let minor = iter
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(malformed)?;

        if es {
            Ok(Version::ES(major, minor))
        } else {
            Ok(Version::GL(major, minor))
        }
    }
}

macro_rules! extensions {
    ($($string:expr => $field:ident,)+) => {
        /// Presence flags for the extensions this crate cares about.
        #[derive(Debug, Clone, Copy, Default)]
        pub struct Extensions {
            $(
                pub $field: bool,
            )+
        }

        impl Extensions {
            pub fn parse<'a, I>(names: I) -> Extensions
            where
                I: IntoIterator<Item = &'a str>,
            {
                let mut extensions = Extensions::default();

                for name in names {
                    match name {
                        $(
                            $string => extensions.$field = true,
                        )+
                        _ => (),
                    }
                }

                extensions
            }
        }
    }
}

extensions! {
    "GL_ARB_shader_objects" => gl_arb_shader_objects,
    "GL_ARB_vertex_shader" => gl_arb_vertex_shader,
    "GL_ARB_fragment_shader" => gl_arb_fragment_shader,
    "GL_ARB_vertex_buffer_object" => gl_arb_vertex_buffer_object,
    "GL_ARB_framebuffer_object" => gl_arb_framebuffer_object,
    "GL_EXT_framebuffer_object" => gl_ext_framebuffer_object,
    "GL_ARB_depth_texture" => gl_arb_depth_texture,
    "GL_OES_depth_texture" => gl_oes_depth_texture,
    "GL_EXT_texture_sRGB" => gl_ext_texture_srgb,
    "GL_EXT_sRGB" => gl_ext_srgb,
    "GL_ARB_texture_non_power_of_two" => gl_arb_texture_non_power_of_two,
    "GL_OES_texture_npot" => gl_oes_texture_npot,
}

/// The capabilities of a live device.
#[derive(Debug)]
pub struct Capabilities {
    pub version: Version,

    /// The company responsible for the implementation.
    pub vendor: String,

    /// The name of the renderer, typically tied to a hardware configuration.
    pub renderer: String,

    /// Presence flags for the extensions this crate reasons about itself.
    pub extensions: Extensions,

    /// Every advertised extension name, for caller-requested lookups.
    pub names: FastHashSet<String>,

    /// Maximum number of texture units that can be bound to a program.
    pub max_texture_units: u8,
}

impl Capabilities {
    pub fn parse<'a, I>(
        version: &str,
        names: I,
        vendor: String,
        renderer: String,
        max_texture_units: u8,
    ) -> Result<Capabilities>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let version = Version::parse(version)?;
        let names: FastHashSet<String> = names.into_iter().map(|v| v.to_owned()).collect();
        let extensions = Extensions::parse(names.iter().map(|v| v.as_str()));

        Ok(Capabilities {
            version,
            vendor,
            renderer,
            extensions,
            names,
            max_texture_units,
        })
    }

    /// Capabilities of a device that performs no work. Reports a modern
    /// desktop version and no extensions.
    pub fn headless() -> Capabilities {
        Capabilities {
            version: Version::GL(4, 5),
            vendor: "none".to_owned(),
            renderer: "headless".to_owned(),
            extensions: Extensions::default(),
            names: FastHashSet::default(),
            max_texture_units: crate::MAX_TEXTURE_SLOTS as u8,
        }
    }

    /// Whether the named extension is advertised.
    pub fn supports(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Whether depth buffers can be sampled as textures.
    pub fn has_depth_texture(&self) -> bool {
        match self.version {
            Version::GL(_, _) => {
                self.version >= Version::GL(1, 4) || self.extensions.gl_arb_depth_texture
            }
            Version::ES(_, _) => {
                self.version >= Version::ES(3, 0) || self.extensions.gl_oes_depth_texture
            }
        }
    }

    /// Whether sRGB pixel formats decode to linear in the sampler.
    pub fn has_srgb_texture(&self) -> bool {
        match self.version {
            Version::GL(_, _) => {
                self.version >= Version::GL(2, 1) || self.extensions.gl_ext_texture_srgb
            }
            Version::ES(_, _) => self.version >= Version::ES(3, 0) || self.extensions.gl_ext_srgb,
        }
    }
}
