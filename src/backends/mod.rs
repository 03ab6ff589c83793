//! Device backends. A backend is responsible for exactly one thing: turning
//! resolved draw calls and resource lifecycles into low-level video API calls.
//!
//! Everything above this module works in terms of handles and plain data, so
//! a backend never sees schemas being merged or defaults being filled in. It
//! receives complete [`DrawCall`]s and executes them.

pub mod capabilities;
pub mod headless;
mod utils;

use crate::assets::prelude::*;
use crate::dispatch::DrawCall;
use crate::errors::Result;
use crate::math::prelude::Vector2;
use crate::utils::prelude::Color;

use self::capabilities::Capabilities;

/// The contract between the resource store and a concrete video backend.
///
/// Methods are `unsafe` because implementations call into a foreign API that
/// must be current on this thread.
pub trait Device {
    fn capabilities(&self) -> &Capabilities;

    unsafe fn create_shader(
        &mut self,
        handle: ShaderHandle,
        schema: Schema,
        vs: &str,
        fs: &str,
    ) -> Result<()>;

    unsafe fn delete_shader(&mut self, handle: ShaderHandle) -> Result<()>;

    unsafe fn create_vertex_buffer(&mut self, handle: BufferHandle, data: &[f32]) -> Result<()>;

    unsafe fn update_vertex_buffer(&mut self, handle: BufferHandle, data: &[f32]) -> Result<()>;

    unsafe fn create_index_buffer(&mut self, handle: BufferHandle, data: &[u32]) -> Result<()>;

    unsafe fn update_index_buffer(&mut self, handle: BufferHandle, data: &[u32]) -> Result<()>;

    unsafe fn delete_buffer(&mut self, handle: BufferHandle) -> Result<()>;

    unsafe fn create_texture(
        &mut self,
        handle: TextureHandle,
        params: TextureParams,
        image: &TextureImage,
    ) -> Result<()>;

    /// Re-binds sampling state of a live texture without touching its storage.
    unsafe fn update_texture_params(
        &mut self,
        handle: TextureHandle,
        wrap: TextureWrap,
        filter: TextureFilter,
    ) -> Result<()>;

    unsafe fn delete_texture(&mut self, handle: TextureHandle) -> Result<()>;

    unsafe fn create_target(&mut self, handle: TargetHandle, params: TargetParams) -> Result<()>;

    /// Reallocates the attachments of a live target. The handle stays valid.
    unsafe fn resize_target(&mut self, handle: TargetHandle, dimensions: Vector2<u32>)
        -> Result<()>;

    unsafe fn delete_target(&mut self, handle: TargetHandle) -> Result<()>;

    /// Updates the dimensions of the default framebuffer.
    unsafe fn set_dimensions(&mut self, dimensions: Vector2<u32>) -> Result<()>;

    /// Clears the listed planes of the bound framebuffer and re-asserts its
    /// viewport. `None` leaves the color plane untouched.
    unsafe fn clear(&mut self, color: Option<Color>, depth: bool) -> Result<()>;

    /// Redirects rendering into `handle`. Nesting is allowed; the previous
    /// framebuffer and viewport are restored by the matching [`end_target`].
    ///
    /// [`end_target`]: Device::end_target
    unsafe fn begin_target(&mut self, handle: TargetHandle) -> Result<()>;

    unsafe fn end_target(&mut self) -> Result<()>;

    unsafe fn set_blend(&mut self, enabled: bool) -> Result<()>;

    /// Executes one resolved draw call and returns the number of primitives
    /// assembled.
    unsafe fn draw(&mut self, call: &DrawCall) -> Result<u32>;

    /// Blocks until every submitted call has taken effect.
    unsafe fn flush(&mut self) -> Result<()>;
}

#[cfg(not(target_arch = "wasm32"))]
pub mod gl;

#[cfg(not(target_arch = "wasm32"))]
pub fn new<F>(loader: F, dimensions: Vector2<u32>) -> Result<Box<dyn Device>>
where
    F: FnMut(&str) -> *const std::os::raw::c_void,
{
    let device = unsafe { self::gl::device::GLDevice::new(loader, dimensions)? };
    Ok(Box::new(device))
}

pub fn new_headless() -> Box<dyn Device> {
    Box::new(self::headless::HeadlessDevice::new())
}
