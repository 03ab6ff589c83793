//! The public facade. A [`Context`] owns a device, the resource store and the
//! command registry, and every operation of the crate is a method on it.
//!
//! All work is synchronous: a call returns once the device has accepted it.
//! There is no frame queue and no hidden retained state beyond the resources
//! the caller created.

use crate::assets::prelude::*;
use crate::backends::capabilities::Capabilities;
use crate::backends::{self, Device};
use crate::commands::{Command, CommandRegistry};
use crate::dispatch;
use crate::errors::{Error, Result};
use crate::math::prelude::Vector2;
use crate::resource::{IndexBufferHandle, Resource, TexturesHandle, UniformsHandle,
                      VertexBuffersHandle};
use crate::store::ResourceStore;
use crate::utils::prelude::Color;

/// Construction parameters of a [`Context`].
pub struct ContextParams {
    /// Dimensions of the drawing surface in pixels.
    pub dimensions: Vector2<u32>,

    /// Extension names the device must advertise; construction fails with
    /// [`Error::CapabilityMissing`] otherwise.
    pub extensions: Vec<String>,

    /// User commands for the registry, which is fixed for the lifetime of
    /// the context. Built-in commands are always present.
    pub commands: Vec<Command>,
}

impl Default for ContextParams {
    fn default() -> Self {
        ContextParams {
            dimensions: Vector2::new(640, 480),
            extensions: Vec::new(),
            commands: Vec::new(),
        }
    }
}

pub struct Context {
    device: Box<dyn Device>,
    store: ResourceStore,
    commands: CommandRegistry,
    dimensions: Vector2<u32>,
}

impl Context {
    /// Builds a context over a live OpenGL context. `loader` resolves API
    /// symbols. The caller owns window and GL context creation and must keep
    /// the context current on this thread.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new<F>(params: ContextParams, loader: F) -> Result<Self>
    where
        F: FnMut(&str) -> *const std::os::raw::c_void,
    {
        let device = backends::new(loader, params.dimensions)?;
        Self::from_device(params, device)
    }

    /// Builds a context over the no-op device. Resource bookkeeping, schema
    /// validation and draw resolution run in full; nothing reaches a GPU.
    pub fn headless(params: ContextParams) -> Result<Self> {
        Self::from_device(params, backends::new_headless())
    }

    /// Builds a context over a caller-supplied device implementation.
    pub fn with_device(params: ContextParams, device: Box<dyn Device>) -> Result<Self> {
        Self::from_device(params, device)
    }

    fn from_device(params: ContextParams, mut device: Box<dyn Device>) -> Result<Self> {
        for name in &params.extensions {
            if !device.capabilities().supports(name) {
                return Err(Error::CapabilityMissing(name.clone()));
            }
        }

        unsafe { device.set_dimensions(params.dimensions)? };

        Ok(Context {
            device,
            store: ResourceStore::new(),
            commands: CommandRegistry::new(params.commands),
            dimensions: params.dimensions,
        })
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.device.capabilities()
    }

    pub fn dimensions(&self) -> Vector2<u32> {
        self.dimensions
    }

    /// Resizes the drawing surface. Takes effect immediately unless an
    /// offscreen pass is active, in which case it applies when the pass
    /// stack unwinds.
    pub fn set_dimensions(&mut self, dimensions: Vector2<u32>) -> Result<()> {
        self.dimensions = dimensions;
        unsafe { self.device.set_dimensions(dimensions) }
    }

    /// Clears the color and depth planes of the current render target and
    /// re-asserts its full-surface viewport.
    pub fn clear(&mut self, color: Color) -> Result<&mut Self> {
        unsafe { self.device.clear(Some(color), true)? };
        Ok(self)
    }

    /// Compiles and links a shader program. The define list is injected into
    /// both sources; attribute and uniform locations are resolved once, here.
    pub fn create_shader(
        &mut self,
        params: ShaderParams,
        vs: &str,
        fs: &str,
    ) -> Result<ShaderHandle> {
        self.store
            .create_shader(self.device.as_mut(), params, vs, fs)
    }

    pub fn delete_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        self.store.delete_shader(self.device.as_mut(), handle)
    }

    /// The schema a shader was created with.
    pub fn schema(&self, handle: ShaderHandle) -> Option<&Schema> {
        self.store.schema(handle)
    }

    /// Creates one device buffer per named entry.
    pub fn create_vertex_buffers(&mut self, data: VertexData) -> Result<VertexBuffersHandle> {
        self.store.create_vertex_buffers(self.device.as_mut(), data)
    }

    /// Replaces the contents of one named buffer, allocating it first when
    /// the name is new to the collection.
    pub fn update_vertex_buffer(
        &mut self,
        handle: VertexBuffersHandle,
        name: &str,
        data: &[f32],
    ) -> Result<()> {
        self.store
            .update_vertex_buffer(self.device.as_mut(), handle, name, data)
    }

    /// Releases one named buffer and removes it from the collection.
    pub fn delete_vertex_buffer(&mut self, handle: VertexBuffersHandle, name: &str) -> Result<()> {
        self.store
            .delete_vertex_buffer(self.device.as_mut(), handle, name)
    }

    pub fn delete_vertex_buffers(&mut self, handle: VertexBuffersHandle) -> Result<()> {
        self.store
            .delete_vertex_buffers(self.device.as_mut(), handle)
    }

    pub fn create_index_buffer(&mut self, data: IndexData) -> Result<IndexBufferHandle> {
        self.store.create_index_buffer(self.device.as_mut(), data)
    }

    /// Replaces the index data and re-derives the draw span: a span pinned in
    /// `data` is range-checked and kept, otherwise the span follows the new
    /// length.
    pub fn update_index_buffer(&mut self, handle: IndexBufferHandle, data: IndexData) -> Result<()> {
        self.store
            .update_index_buffer(self.device.as_mut(), handle, data)
    }

    pub fn delete_index_buffer(&mut self, handle: IndexBufferHandle) -> Result<()> {
        self.store.delete_index_buffer(self.device.as_mut(), handle)
    }

    /// Creates an empty uniform value bag.
    pub fn create_uniforms(&mut self) -> UniformsHandle {
        self.store.create_uniforms()
    }

    pub fn set_uniform<T>(&mut self, handle: UniformsHandle, name: &str, value: T) -> Result<()>
    where
        T: Into<UniformValue>,
    {
        self.store.set_uniform(handle, name, value.into())
    }

    /// Removes one named value from the bag.
    pub fn delete_uniform(&mut self, handle: UniformsHandle, name: &str) -> Result<()> {
        self.store.delete_uniform(handle, name)
    }

    pub fn delete_uniforms(&mut self, handle: UniformsHandle) -> Result<()> {
        self.store.delete_uniforms(handle)
    }

    /// Creates an empty texture bag.
    pub fn create_textures(&mut self) -> TexturesHandle {
        self.store.create_textures()
    }

    /// Creates or replaces the named texture from image data.
    pub fn set_texture<T>(
        &mut self,
        handle: TexturesHandle,
        name: &str,
        params: TextureParams,
        image: T,
    ) -> Result<()>
    where
        T: Into<TextureImage>,
    {
        self.store
            .set_texture(self.device.as_mut(), handle, name, params, image.into())
    }

    /// Adjusts wrap and filter state of the named texture in place. `None`
    /// keeps the current value.
    pub fn set_texture_sampling(
        &mut self,
        handle: TexturesHandle,
        name: &str,
        wrap: Option<TextureWrap>,
        filter: Option<TextureFilter>,
    ) -> Result<()> {
        self.store
            .set_texture_sampling(self.device.as_mut(), handle, name, wrap, filter)
    }

    /// Points the named slot at `target`'s sampleable attachment instead of
    /// owned image data. The alias resolves at draw time, so it keeps working
    /// across target resizes.
    pub fn alias_target(
        &mut self,
        handle: TexturesHandle,
        name: &str,
        target: TargetHandle,
    ) -> Result<()> {
        self.store
            .alias_target(self.device.as_mut(), handle, name, target)
    }

    /// Releases one named slot and removes it from the bag. Owned textures
    /// are deleted on the device; aliases just drop the reference.
    pub fn delete_texture(&mut self, handle: TexturesHandle, name: &str) -> Result<()> {
        self.store.delete_texture(self.device.as_mut(), handle, name)
    }

    pub fn delete_textures(&mut self, handle: TexturesHandle) -> Result<()> {
        self.store.delete_textures(self.device.as_mut(), handle)
    }

    /// Creates an offscreen render target. Zero dimensions inherit the
    /// current surface dimensions.
    pub fn create_target(&mut self, mut params: TargetParams) -> Result<TargetHandle> {
        if params.dimensions.x == 0 || params.dimensions.y == 0 {
            params.dimensions = self.dimensions;
        }

        self.store.create_target(self.device.as_mut(), params)
    }

    /// Reallocates the target's attachments. Resizing to the current size is
    /// a no-op; zero dimensions inherit the current surface dimensions.
    pub fn resize_target(&mut self, handle: TargetHandle, dimensions: Vector2<u32>) -> Result<()> {
        let dimensions = if dimensions.x == 0 || dimensions.y == 0 {
            self.dimensions
        } else {
            dimensions
        };

        self.store
            .resize_target(self.device.as_mut(), handle, dimensions)
    }

    pub fn delete_target(&mut self, handle: TargetHandle) -> Result<()> {
        self.store.delete_target(self.device.as_mut(), handle)
    }

    /// Dimensions of a live target.
    pub fn target_dimensions(&self, handle: TargetHandle) -> Option<Vector2<u32>> {
        self.store.target_params(handle).map(|v| v.dimensions)
    }

    /// Redirects every draw issued inside `scope` into `target`, clearing it
    /// on entry: color and depth for `Color` flavors, only depth for `Depth`
    /// flavors. Passes nest; when `scope` returns, the previous target (or
    /// the default framebuffer) and its viewport are restored. The restore
    /// runs even when the scope fails, and the scope's error wins.
    pub fn offscreen<F>(&mut self, target: TargetHandle, scope: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Context) -> Result<()>,
    {
        let flavor = self
            .store
            .target_params(target)
            .map(|v| v.flavor)
            .ok_or_else(|| {
                Error::ResourceInvalid("The render target of this pass is gone.".to_owned())
            })?;

        unsafe { self.device.begin_target(target)? };

        let cleared = unsafe {
            match flavor {
                TargetFlavor::Color => self.device.clear(Some(Color::transparent()), true),
                TargetFlavor::Depth => self.device.clear(None, true),
            }
        };

        let outcome = cleared.and_then(|_| scope(self));
        let restored = unsafe { self.device.end_target() };

        outcome.and(restored)?;
        Ok(self)
    }

    /// Runs `scope` bracketed by the named command's hooks. The after-hook
    /// runs even when the scope fails, and the scope's error wins.
    pub fn with_command<F>(&mut self, name: &str, scope: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Context) -> Result<()>,
    {
        let (on_before, on_after) = {
            let command = self.commands.get(name)?;
            (command.on_before, command.on_after)
        };

        on_before(self.device.as_mut())?;

        let outcome = scope(self);
        let cleanup = match on_after {
            Some(hook) => hook(self.device.as_mut()),
            None => Ok(()),
        };

        outcome.and(cleanup)?;
        Ok(self)
    }

    /// Resolves `resources` against the shader's schema and issues one
    /// indexed draw.
    ///
    /// Resources of the same kind merge name-by-name with last-write-wins
    /// semantics. Draw-time gaps with a defined fallback (unset uniforms
    /// with schema defaults, unbound texture slots, schema attributes with
    /// no buffer) are logged and drawn through; a missing index buffer is
    /// the one structural error.
    pub fn draw(&mut self, shader: ShaderHandle, resources: &[Resource]) -> Result<&mut Self> {
        let call = dispatch::resolve(&self.store, shader, resources)?;
        let primitives = unsafe { self.device.draw(&call)? };
        trace!("Drew {} primitives with {:?}.", primitives, shader);
        Ok(self)
    }

    /// Blocks until the device has executed everything submitted so far.
    pub fn flush(&mut self) -> Result<()> {
        unsafe { self.device.flush() }
    }
}
