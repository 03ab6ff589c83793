//! # glaze
//!
//! `glaze` is a tiny declarative layer over OpenGL. Instead of hand-writing
//! the bind/upload/draw choreography for every object on screen, you describe
//! GPU-side resources (vertex data, index data, uniform values, textures,
//! off-screen targets) and shader programs as plain data, then issue draw
//! calls that resolve those descriptions into the correct low-level command
//! sequence.
//!
//! The crate deliberately stops there. It is not a scene graph, performs no
//! culling or batching, and retains no state beyond what the caller creates
//! explicitly. Windowing, GL context creation and asset decoding are the
//! caller's business; `glaze` only asks for a symbol loader.
//!
//! ## Workflow
//!
//! 1. Build a [`Context`] over a live GL context (or a headless one in tests).
//! 2. Describe a shader with a schema: named attribute buffers, named
//!    uniforms with optional defaults, named texture slots and a draw mode.
//! 3. Create resources and hand a list of them to [`Context::draw`]. The
//!    dispatcher partitions the list by kind, merges duplicates with
//!    last-write-wins, fills unset uniforms from schema defaults, assigns
//!    texture units in declaration order and issues one indexed draw.
//!
//! ```
//! use glaze::prelude::*;
//!
//! fn main() -> glaze::errors::Result<()> {
//!     let mut ctx = Context::headless(ContextParams::default())?;
//!
//!     let shader = ctx.create_shader(
//!         ShaderParams::build()
//!             .buffer("position", SchemaType::Vector3f)
//!             .uniform_default("color", SchemaType::Vector3f, [1.0, 0.0, 0.0])
//!             .finish(),
//!         "void main() { gl_Position = vec4(position, 1.0); }",
//!         "void main() { gl_FragColor = vec4(color, 1.0); }",
//!     )?;
//!
//!     let vertices = ctx.create_vertex_buffers(VertexData::new().with(
//!         "position",
//!         vec![0.0, 1.0, 0.0, -1.0, -1.0, 0.0, 1.0, -1.0, 0.0],
//!     ))?;
//!     let indices = ctx.create_index_buffer(IndexData::new(vec![0, 1, 2]))?;
//!
//!     ctx.clear(Color::black())?
//!         .draw(shader, &[vertices.into(), indices.into()])?;
//!     Ok(())
//! }
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

#[macro_use]
pub mod utils;

pub mod assets;
pub mod backends;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod errors;
pub mod math;
pub mod resource;

mod store;

pub use crate::context::{Context, ContextParams};
pub use crate::errors::{Error, Result};
pub use crate::resource::Resource;

/// Maximum number of attribute buffers a single schema may declare.
pub const MAX_VERTEX_ATTRIBUTES: usize = 12;
/// Maximum number of uniform variables a single schema may declare.
pub const MAX_UNIFORM_VARIABLES: usize = 32;
/// Maximum number of texture slots a single schema may declare.
pub const MAX_TEXTURE_SLOTS: usize = 8;

pub mod prelude {
    pub use crate::assets::prelude::*;
    pub use crate::commands::Command;
    pub use crate::context::{Context, ContextParams};
    pub use crate::errors::{Error, Result};
    pub use crate::resource::{
        IndexBufferHandle, Resource, ResourceKind, TexturesHandle, UniformsHandle,
        VertexBuffersHandle,
    };
    pub use crate::utils::prelude::{Color, HashValue};
}
