//! The OpenGL device. Works against desktop GL 2.0+ and OpenGL ES 2.0+
//! through function pointers resolved at runtime, so it never links against a
//! particular windowing stack.

use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::mem;
use std::os::raw::c_void;
use std::ptr;

use gl::types::*;

use crate::assets::prelude::*;
use crate::backends::capabilities::{Capabilities, Version};
use crate::backends::utils::DataVec;
use crate::backends::Device;
use crate::dispatch::{DrawCall, TextureBinding, UniformBinding};
use crate::errors::{Error, Result};
use crate::math::prelude::Vector2;
use crate::utils::prelude::{Color, FastHashMap, FastHashSet, HashValue};

use super::types;

#[derive(Debug)]
struct GLShaderData {
    id: GLuint,
    attributes: FastHashMap<HashValue<str>, GLint>,
    uniforms: FastHashMap<HashValue<str>, GLint>,
}

#[derive(Debug, Clone, Copy)]
struct GLBufferData {
    id: GLuint,
    target: GLenum,
}

#[derive(Debug, Clone, Copy)]
struct GLTextureData {
    id: GLuint,
    target: GLenum,
    mipmap: bool,
}

#[derive(Debug, Clone, Copy)]
struct GLTargetData {
    fbo: GLuint,
    color: GLuint,
    /// Renderbuffer id for `Color` flavored targets, texture id otherwise.
    depth: GLuint,
    flavor: TargetFlavor,
    dimensions: Vector2<u32>,
}

impl GLTargetData {
    /// The attachment a sampler reads when this target is aliased as a
    /// texture.
    fn attachment(&self) -> GLuint {
        match self.flavor {
            TargetFlavor::Color => self.color,
            TargetFlavor::Depth => self.depth,
        }
    }
}

#[derive(Debug)]
struct GLDeviceState {
    dimensions: Vector2<u32>,
    targets: Vec<TargetHandle>,
    program: Option<GLuint>,
    attributes: FastHashSet<GLuint>,
    blend: bool,
}

pub struct GLDevice {
    capabilities: Capabilities,
    shaders: DataVec<ShaderHandle, GLShaderData>,
    buffers: DataVec<BufferHandle, GLBufferData>,
    textures: DataVec<TextureHandle, GLTextureData>,
    targets: DataVec<TargetHandle, GLTargetData>,
    state: GLDeviceState,
}

impl GLDevice {
    /// Loads function pointers through `loader` and prepares the fixed parts
    /// of the pipeline state.
    ///
    /// The context behind the loader must be current on this thread, and stay
    /// current for every later call into the device.
    pub unsafe fn new<F>(mut loader: F, dimensions: Vector2<u32>) -> Result<Self>
    where
        F: FnMut(&str) -> *const c_void,
    {
        gl::load_with(|symbol| loader(symbol));

        let capabilities = parse_capabilities()?;
        info!("{:#?}", capabilities);
        check_requirements(&capabilities)?;

        // Core profiles refuse to draw without a vertex array bound, so a
        // single one is kept bound for the lifetime of the device.
        if capabilities.version >= Version::GL(3, 0) || capabilities.version >= Version::ES(3, 0) {
            let mut vao = 0;
            gl::GenVertexArrays(1, &mut vao);
            gl::BindVertexArray(vao);
        }

        gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
        gl::Enable(gl::DEPTH_TEST);
        gl::Disable(gl::BLEND);
        gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
        gl::Viewport(0, 0, dimensions.x as GLint, dimensions.y as GLint);
        check()?;

        Ok(GLDevice {
            capabilities,
            shaders: DataVec::new(),
            buffers: DataVec::new(),
            textures: DataVec::new(),
            targets: DataVec::new(),
            state: GLDeviceState {
                dimensions,
                targets: Vec::new(),
                program: None,
                attributes: FastHashSet::default(),
                blend: false,
            },
        })
    }
}

impl Device for GLDevice {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    unsafe fn create_shader(
        &mut self,
        handle: ShaderHandle,
        schema: Schema,
        vs: &str,
        fs: &str,
    ) -> Result<()> {
        let vs_id = compile(ShaderStage::Vertex, vs)?;
        let fs_id = match compile(ShaderStage::Fragment, fs) {
            Ok(id) => id,
            Err(err) => {
                gl::DeleteShader(vs_id);
                return Err(err);
            }
        };

        let id = link(vs_id, fs_id)?;

        // Locations are resolved exactly once. Names the compiler dropped
        // stay at -1 and are skipped at draw time; with conditionally
        // compiled shaders that is expected, so it only warns.
        let mut attributes = FastHashMap::default();
        for decl in &schema.buffers {
            let location = attribute_location(id, &decl.name)?;
            if location < 0 {
                warn!("Attribute '{}' is missing from the linked program.", decl.name);
            }

            attributes.insert(decl.hash, location);
        }

        let mut uniforms = FastHashMap::default();
        for decl in &schema.uniforms {
            let location = uniform_location(id, &decl.name)?;
            if location < 0 {
                warn!("Uniform '{}' is missing from the linked program.", decl.name);
            }

            uniforms.insert(decl.hash, location);
        }

        for decl in &schema.textures {
            let location = uniform_location(id, &decl.name)?;
            if location < 0 {
                warn!(
                    "Texture slot '{}' is missing from the linked program.",
                    decl.name
                );
            }

            uniforms.insert(decl.hash, location);
        }

        check()?;

        self.shaders.create(
            handle,
            GLShaderData {
                id,
                attributes,
                uniforms,
            },
        );
        Ok(())
    }

    unsafe fn delete_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        let shader = self
            .shaders
            .free(handle)
            .ok_or_else(|| Error::ShaderInvalid("The shader being deleted is gone.".to_owned()))?;

        if self.state.program == Some(shader.id) {
            gl::UseProgram(0);
            self.state.program = None;
        }

        gl::DeleteProgram(shader.id);
        check()
    }

    unsafe fn create_vertex_buffer(&mut self, handle: BufferHandle, data: &[f32]) -> Result<()> {
        let (len, ptr) = bytes_of(data);
        let id = create_buffer(gl::ARRAY_BUFFER, len, ptr)?;
        self.buffers.create(
            handle,
            GLBufferData {
                id,
                target: gl::ARRAY_BUFFER,
            },
        );
        Ok(())
    }

    unsafe fn update_vertex_buffer(&mut self, handle: BufferHandle, data: &[f32]) -> Result<()> {
        let (len, ptr) = bytes_of(data);
        self.update_buffer(handle, len, ptr)
    }

    unsafe fn create_index_buffer(&mut self, handle: BufferHandle, data: &[u32]) -> Result<()> {
        let (len, ptr) = bytes_of(data);
        let id = create_buffer(gl::ELEMENT_ARRAY_BUFFER, len, ptr)?;
        self.buffers.create(
            handle,
            GLBufferData {
                id,
                target: gl::ELEMENT_ARRAY_BUFFER,
            },
        );
        Ok(())
    }

    unsafe fn update_index_buffer(&mut self, handle: BufferHandle, data: &[u32]) -> Result<()> {
        let (len, ptr) = bytes_of(data);
        self.update_buffer(handle, len, ptr)
    }

    unsafe fn delete_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        let buffer = self
            .buffers
            .free(handle)
            .ok_or_else(|| Error::ResourceInvalid("The buffer being deleted is gone.".to_owned()))?;

        gl::DeleteBuffers(1, &buffer.id);
        check()
    }

    unsafe fn create_texture(
        &mut self,
        handle: TextureHandle,
        params: TextureParams,
        image: &TextureImage,
    ) -> Result<()> {
        let target = if image.is_cube() {
            gl::TEXTURE_CUBE_MAP
        } else {
            gl::TEXTURE_2D
        };

        let mut id = 0;
        gl::GenTextures(1, &mut id);
        if id == 0 {
            return Err(Error::Device("GenTextures returned no name.".to_owned()));
        }

        gl::BindTexture(target, id);

        let (internal, format, pixel) =
            types::texture_format(params.format, self.capabilities.version);
        let components = params.format.components() as usize;
        let levels = image.levels();

        let (mut width, mut height) = (params.dimensions.x, params.dimensions.y);
        for level in 0..levels {
            let row = width as usize * components;

            match image {
                TextureImage::TwoD(data) => {
                    let bytes = orient(&data.bytes[level], row, params.flip);
                    gl::TexImage2D(
                        gl::TEXTURE_2D,
                        level as GLint,
                        internal as GLint,
                        width as GLsizei,
                        height as GLsizei,
                        0,
                        format,
                        pixel,
                        bytes.as_ptr() as *const c_void,
                    );
                }
                TextureImage::Cube(data) => {
                    for (face, side) in data.faces[level].iter().enumerate() {
                        let bytes = orient(side, row, params.flip);
                        gl::TexImage2D(
                            gl::TEXTURE_CUBE_MAP_POSITIVE_X + face as GLenum,
                            level as GLint,
                            internal as GLint,
                            width as GLsizei,
                            height as GLsizei,
                            0,
                            format,
                            pixel,
                            bytes.as_ptr() as *const c_void,
                        );
                    }
                }
            }

            width = (width / 2).max(1);
            height = (height / 2).max(1);
        }

        // Cube chains are always caller-supplied; only 2D textures generate.
        let mipmap = params.supports_mipmap() && (levels > 1 || !image.is_cube());
        if mipmap && levels == 1 {
            gl::GenerateMipmap(target);
        }

        // ES 2 has no TEXTURE_MAX_LEVEL; partial chains there need a full
        // pyramid to be complete.
        let clamps_levels = match self.capabilities.version {
            Version::GL(_, _) => true,
            Version::ES(major, _) => major >= 3,
        };
        if levels > 1 && clamps_levels {
            gl::TexParameteri(target, gl::TEXTURE_BASE_LEVEL, 0);
            gl::TexParameteri(target, gl::TEXTURE_MAX_LEVEL, (levels - 1) as GLint);
        }

        apply_sampling(
            target,
            params.resolved_wrap(),
            params.resolved_filter(),
            mipmap,
        );
        check()?;

        self.textures
            .create(handle, GLTextureData { id, target, mipmap });
        Ok(())
    }

    unsafe fn update_texture_params(
        &mut self,
        handle: TextureHandle,
        wrap: TextureWrap,
        filter: TextureFilter,
    ) -> Result<()> {
        let texture = self.textures.get(handle).ok_or_else(|| {
            Error::ResourceInvalid("The texture being updated is gone.".to_owned())
        })?;

        gl::BindTexture(texture.target, texture.id);
        apply_sampling(texture.target, wrap, filter, texture.mipmap);
        check()
    }

    unsafe fn delete_texture(&mut self, handle: TextureHandle) -> Result<()> {
        let texture = self.textures.free(handle).ok_or_else(|| {
            Error::ResourceInvalid("The texture being deleted is gone.".to_owned())
        })?;

        gl::DeleteTextures(1, &texture.id);
        check()
    }

    unsafe fn create_target(&mut self, handle: TargetHandle, params: TargetParams) -> Result<()> {
        let mut previous = 0;
        gl::GetIntegerv(gl::FRAMEBUFFER_BINDING, &mut previous);

        let mut fbo = 0;
        gl::GenFramebuffers(1, &mut fbo);
        if fbo == 0 {
            return Err(Error::Device("GenFramebuffers returned no name.".to_owned()));
        }

        gl::BindFramebuffer(gl::FRAMEBUFFER, fbo);

        let (color, depth) =
            attach_planes(self.capabilities.version, params.flavor, params.dimensions);

        let status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);
        if status != gl::FRAMEBUFFER_COMPLETE {
            gl::DeleteFramebuffers(1, &fbo);
            delete_planes(params.flavor, color, depth);

            gl::BindFramebuffer(gl::FRAMEBUFFER, previous as GLuint);
            return Err(Error::FramebufferInvalid(describe_status(status)));
        }

        gl::BindFramebuffer(gl::FRAMEBUFFER, previous as GLuint);
        check()?;

        self.targets.create(
            handle,
            GLTargetData {
                fbo,
                color,
                depth,
                flavor: params.flavor,
                dimensions: params.dimensions,
            },
        );
        Ok(())
    }

    unsafe fn resize_target(
        &mut self,
        handle: TargetHandle,
        dimensions: Vector2<u32>,
    ) -> Result<()> {
        let version = self.capabilities.version;
        let target = self.targets.get_mut(handle).ok_or_else(|| {
            Error::ResourceInvalid("The render target being resized is gone.".to_owned())
        })?;

        let mut previous = 0;
        gl::GetIntegerv(gl::FRAMEBUFFER_BINDING, &mut previous);
        gl::BindFramebuffer(gl::FRAMEBUFFER, target.fbo);

        // The old planes are deleted and fresh ones attached under the same
        // framebuffer. Aliases resolve through the handle, so they pick up
        // the new names on the next draw.
        delete_planes(target.flavor, target.color, target.depth);
        let (color, depth) = attach_planes(version, target.flavor, dimensions);

        let status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);
        gl::BindFramebuffer(gl::FRAMEBUFFER, previous as GLuint);
        if status != gl::FRAMEBUFFER_COMPLETE {
            return Err(Error::FramebufferInvalid(describe_status(status)));
        }

        target.color = color;
        target.depth = depth;
        target.dimensions = dimensions;
        check()
    }

    unsafe fn delete_target(&mut self, handle: TargetHandle) -> Result<()> {
        let target = self.targets.free(handle).ok_or_else(|| {
            Error::ResourceInvalid("The render target being deleted is gone.".to_owned())
        })?;

        self.state.targets.retain(|v| *v != handle);

        gl::DeleteFramebuffers(1, &target.fbo);
        gl::DeleteTextures(1, &target.color);
        match target.flavor {
            TargetFlavor::Color => gl::DeleteRenderbuffers(1, &target.depth),
            TargetFlavor::Depth => gl::DeleteTextures(1, &target.depth),
        }

        check()
    }

    unsafe fn set_dimensions(&mut self, dimensions: Vector2<u32>) -> Result<()> {
        self.state.dimensions = dimensions;

        // Inside an offscreen pass the viewport belongs to the target; the
        // new dimensions take effect when the pass stack unwinds.
        if self.state.targets.is_empty() {
            gl::Viewport(0, 0, dimensions.x as GLint, dimensions.y as GLint);
        }

        check()
    }

    unsafe fn clear(&mut self, color: Option<Color>, depth: bool) -> Result<()> {
        // A clear always covers the full surface of the current binding.
        let dimensions = match self.state.targets.last().and_then(|v| self.targets.get(*v)) {
            Some(target) => target.dimensions,
            None => self.state.dimensions,
        };
        gl::Viewport(0, 0, dimensions.x as GLint, dimensions.y as GLint);

        let mut bits = 0;
        if let Some(color) = color {
            let color = color.clip();
            gl::ClearColor(color.0, color.1, color.2, color.3);
            bits |= gl::COLOR_BUFFER_BIT;
        }
        if depth {
            bits |= gl::DEPTH_BUFFER_BIT;
        }
        if bits != 0 {
            gl::Clear(bits);
        }

        check()
    }

    unsafe fn begin_target(&mut self, handle: TargetHandle) -> Result<()> {
        let target = self.targets.get(handle).ok_or_else(|| {
            Error::ResourceInvalid("The render target of this pass is gone.".to_owned())
        })?;

        gl::BindFramebuffer(gl::FRAMEBUFFER, target.fbo);
        gl::Viewport(
            0,
            0,
            target.dimensions.x as GLint,
            target.dimensions.y as GLint,
        );

        self.state.targets.push(handle);
        check()
    }

    unsafe fn end_target(&mut self) -> Result<()> {
        self.state.targets.pop();

        match self.state.targets.last().and_then(|v| self.targets.get(*v)) {
            Some(previous) => {
                gl::BindFramebuffer(gl::FRAMEBUFFER, previous.fbo);
                gl::Viewport(
                    0,
                    0,
                    previous.dimensions.x as GLint,
                    previous.dimensions.y as GLint,
                );
            }
            None => {
                gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
                gl::Viewport(
                    0,
                    0,
                    self.state.dimensions.x as GLint,
                    self.state.dimensions.y as GLint,
                );
            }
        }

        check()
    }

    unsafe fn set_blend(&mut self, enabled: bool) -> Result<()> {
        if self.state.blend != enabled {
            if enabled {
                gl::Enable(gl::BLEND);
            } else {
                gl::Disable(gl::BLEND);
            }

            self.state.blend = enabled;
        }

        check()
    }

    unsafe fn draw(&mut self, call: &DrawCall) -> Result<u32> {
        let shader = self
            .shaders
            .get(call.shader)
            .ok_or_else(|| Error::ShaderInvalid("The shader of this draw is gone.".to_owned()))?;

        if self.state.program != Some(shader.id) {
            gl::UseProgram(shader.id);
            self.state.program = Some(shader.id);
        }

        // Every attribute reads a tightly packed buffer of its own.
        let mut enabled = FastHashSet::default();
        for attribute in &call.attributes {
            let location = match shader.attributes.get(&attribute.name) {
                Some(&location) if location >= 0 => location as GLuint,
                _ => continue,
            };

            let buffer = self.buffers.get(attribute.buffer).ok_or_else(|| {
                Error::ResourceInvalid("An attribute buffer of this draw is gone.".to_owned())
            })?;

            gl::BindBuffer(gl::ARRAY_BUFFER, buffer.id);
            gl::EnableVertexAttribArray(location);
            gl::VertexAttribPointer(
                location,
                GLint::from(attribute.components),
                gl::FLOAT,
                gl::FALSE,
                0,
                ptr::null(),
            );
            enabled.insert(location);
        }

        for location in &self.state.attributes {
            if !enabled.contains(location) {
                gl::DisableVertexAttribArray(*location);
            }
        }
        self.state.attributes = enabled;

        for (name, binding) in &call.uniforms {
            let location = match shader.uniforms.get(name) {
                Some(&location) if location >= 0 => location,
                _ => continue,
            };

            match *binding {
                UniformBinding::Value(v) => bind_uniform(location, &v),
                UniformBinding::Texture { unit, binding } => {
                    gl::ActiveTexture(gl::TEXTURE0 + GLenum::from(unit));

                    let resolved = binding.and_then(|v| match v {
                        TextureBinding::Texture(handle) => {
                            self.textures.get(handle).map(|t| (t.target, t.id))
                        }
                        TextureBinding::Target(handle) => self
                            .targets
                            .get(handle)
                            .map(|t| (gl::TEXTURE_2D, t.attachment())),
                    });

                    match resolved {
                        Some((target, id)) => gl::BindTexture(target, id),
                        None => gl::BindTexture(gl::TEXTURE_2D, 0),
                    }

                    gl::Uniform1i(location, GLint::from(unit));
                }
            }
        }

        let buffer = self.buffers.get(call.buffer).ok_or_else(|| {
            Error::ResourceInvalid("The index buffer of this draw is gone.".to_owned())
        })?;

        gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, buffer.id);

        let first = (call.offset * mem::size_of::<u32>()) as *const c_void;
        gl::DrawElements(
            call.mode.into(),
            call.count as GLsizei,
            gl::UNSIGNED_INT,
            first,
        );
        check()?;

        Ok(call.mode.assemble(call.count as u32))
    }

    unsafe fn flush(&mut self) -> Result<()> {
        gl::Finish();
        check()
    }
}

impl GLDevice {
    unsafe fn update_buffer(
        &mut self,
        handle: BufferHandle,
        len: usize,
        data: *const c_void,
    ) -> Result<()> {
        let buffer = self
            .buffers
            .get(handle)
            .ok_or_else(|| Error::ResourceInvalid("The buffer being updated is gone.".to_owned()))?;

        gl::BindBuffer(buffer.target, buffer.id);
        gl::BufferData(buffer.target, len as GLsizeiptr, data, gl::STATIC_DRAW);
        check()
    }
}

unsafe fn parse_capabilities() -> Result<Capabilities> {
    let version = get_string(gl::VERSION)?;
    let parsed = Version::parse(&version)?;

    // GetString(EXTENSIONS) was removed from core profiles.
    let names: Vec<String> =
        if parsed >= Version::GL(3, 0) || parsed >= Version::ES(3, 0) {
            let mut len = 0;
            gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut len);

            (0..len)
                .map(|index| {
                    let name = gl::GetStringi(gl::EXTENSIONS, index as GLuint);
                    CStr::from_ptr(name as *const _).to_string_lossy().into_owned()
                })
                .collect()
        } else {
            get_string(gl::EXTENSIONS)?
                .split(' ')
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .collect()
        };

    let vendor = get_string(gl::VENDOR)?;
    let renderer = get_string(gl::RENDERER)?;

    let mut units = 0;
    gl::GetIntegerv(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS, &mut units);
    let units = units.max(2).min(255) as u8;

    Capabilities::parse(
        &version,
        names.iter().map(String::as_str),
        vendor,
        renderer,
        units,
    )
}

fn check_requirements(capabilities: &Capabilities) -> Result<()> {
    let version = capabilities.version;
    let extensions = &capabilities.extensions;

    let shaders = version >= Version::GL(2, 0)
        || version >= Version::ES(2, 0)
        || (extensions.gl_arb_shader_objects
            && extensions.gl_arb_vertex_shader
            && extensions.gl_arb_fragment_shader);
    if !shaders {
        return Err(Error::CapabilityMissing("shader objects".to_owned()));
    }

    let buffers = version >= Version::GL(1, 5)
        || version >= Version::ES(2, 0)
        || extensions.gl_arb_vertex_buffer_object;
    if !buffers {
        return Err(Error::CapabilityMissing("vertex buffer objects".to_owned()));
    }

    let framebuffers = version >= Version::GL(3, 0)
        || version >= Version::ES(2, 0)
        || extensions.gl_arb_framebuffer_object
        || extensions.gl_ext_framebuffer_object;
    if !framebuffers {
        return Err(Error::CapabilityMissing("framebuffer objects".to_owned()));
    }

    // Draws are always issued with 32-bit indices.
    let indices = match version {
        Version::GL(_, _) => true,
        Version::ES(_, _) => {
            version >= Version::ES(3, 0) || capabilities.supports("GL_OES_element_index_uint")
        }
    };
    if !indices {
        return Err(Error::CapabilityMissing("32-bit vertex indices".to_owned()));
    }

    Ok(())
}

unsafe fn get_string(id: GLenum) -> Result<String> {
    let name = gl::GetString(id);
    if name.is_null() {
        return Err(Error::Device(format!(
            "GetString(0x{:x}) returned nothing.",
            id
        )));
    }

    Ok(CStr::from_ptr(name as *const _).to_string_lossy().into_owned())
}

unsafe fn compile(stage: ShaderStage, source: &str) -> Result<GLuint> {
    let kind = match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
    };

    let source = CString::new(source)
        .map_err(|_| Error::CompileFailure(stage, "Source contains a NUL byte.".to_owned()))?;

    let id = gl::CreateShader(kind);
    gl::ShaderSource(id, 1, &source.as_ptr(), ptr::null());
    gl::CompileShader(id);

    let mut status = GLint::from(gl::FALSE);
    gl::GetShaderiv(id, gl::COMPILE_STATUS, &mut status);
    if status != GLint::from(gl::TRUE) {
        let log = shader_log(id);
        gl::DeleteShader(id);
        return Err(Error::CompileFailure(stage, log));
    }

    Ok(id)
}

unsafe fn link(vs: GLuint, fs: GLuint) -> Result<GLuint> {
    let id = gl::CreateProgram();
    gl::AttachShader(id, vs);
    gl::AttachShader(id, fs);
    gl::LinkProgram(id);

    gl::DetachShader(id, vs);
    gl::DeleteShader(vs);
    gl::DetachShader(id, fs);
    gl::DeleteShader(fs);

    let mut status = GLint::from(gl::FALSE);
    gl::GetProgramiv(id, gl::LINK_STATUS, &mut status);
    if status != GLint::from(gl::TRUE) {
        let log = program_log(id);
        gl::DeleteProgram(id);
        return Err(Error::LinkFailure(log));
    }

    Ok(id)
}

unsafe fn shader_log(id: GLuint) -> String {
    let mut len = 0;
    gl::GetShaderiv(id, gl::INFO_LOG_LENGTH, &mut len);
    if len <= 0 {
        return String::new();
    }

    let mut buf = vec![0; len as usize];
    gl::GetShaderInfoLog(id, len, ptr::null_mut(), buf.as_mut_ptr() as *mut GLchar);
    truncate_log(buf)
}

unsafe fn program_log(id: GLuint) -> String {
    let mut len = 0;
    gl::GetProgramiv(id, gl::INFO_LOG_LENGTH, &mut len);
    if len <= 0 {
        return String::new();
    }

    let mut buf = vec![0; len as usize];
    gl::GetProgramInfoLog(id, len, ptr::null_mut(), buf.as_mut_ptr() as *mut GLchar);
    truncate_log(buf)
}

fn truncate_log(mut buf: Vec<u8>) -> String {
    let end = buf.iter().position(|v| *v == 0).unwrap_or(buf.len());
    buf.truncate(end);
    String::from_utf8_lossy(&buf).into_owned()
}

unsafe fn attribute_location(id: GLuint, name: &str) -> Result<GLint> {
    let name = CString::new(name).map_err(|_| {
        Error::ShaderInvalid(format!("Attribute name '{:?}' contains a NUL byte.", name))
    })?;

    Ok(gl::GetAttribLocation(id, name.as_ptr()))
}

unsafe fn uniform_location(id: GLuint, name: &str) -> Result<GLint> {
    let name = CString::new(name).map_err(|_| {
        Error::ShaderInvalid(format!("Uniform name '{:?}' contains a NUL byte.", name))
    })?;

    Ok(gl::GetUniformLocation(id, name.as_ptr()))
}

unsafe fn create_buffer(target: GLenum, len: usize, data: *const c_void) -> Result<GLuint> {
    let mut id = 0;
    gl::GenBuffers(1, &mut id);
    if id == 0 {
        return Err(Error::Device("GenBuffers returned no name.".to_owned()));
    }

    gl::BindBuffer(target, id);
    gl::BufferData(target, len as GLsizeiptr, data, gl::STATIC_DRAW);
    check()?;
    Ok(id)
}

fn bytes_of<T>(data: &[T]) -> (usize, *const c_void) {
    let ptr = if data.is_empty() {
        ptr::null()
    } else {
        data.as_ptr() as *const c_void
    };

    (data.len() * mem::size_of::<T>(), ptr)
}

/// Reverses the row order when `flip` asks for a bottom-up upload.
fn orient(bytes: &[u8], row: usize, flip: bool) -> Cow<'_, [u8]> {
    if !flip || row == 0 {
        return Cow::Borrowed(bytes);
    }

    let mut out = Vec::with_capacity(bytes.len());
    for chunk in bytes.chunks(row).rev() {
        out.extend_from_slice(chunk);
    }

    Cow::Owned(out)
}

unsafe fn apply_sampling(target: GLenum, wrap: TextureWrap, filter: TextureFilter, mipmap: bool) {
    let (min, mag) = types::filters(filter, mipmap);
    gl::TexParameteri(target, gl::TEXTURE_WRAP_S, GLenum::from(wrap) as GLint);
    gl::TexParameteri(target, gl::TEXTURE_WRAP_T, GLenum::from(wrap) as GLint);
    gl::TexParameteri(target, gl::TEXTURE_MIN_FILTER, min as GLint);
    gl::TexParameteri(target, gl::TEXTURE_MAG_FILTER, mag as GLint);
}

/// Builds the planes of a render target and attaches them to the framebuffer
/// currently bound to `FRAMEBUFFER`. Color flavors pair a sampleable color
/// texture with a depth renderbuffer; depth flavors render straight into a
/// sampleable depth texture.
unsafe fn attach_planes(
    version: Version,
    flavor: TargetFlavor,
    dimensions: Vector2<u32>,
) -> (GLuint, GLuint) {
    let (width, height) = (dimensions.x as GLsizei, dimensions.y as GLsizei);

    // The color plane is always a sampleable texture.
    let mut color = 0;
    gl::GenTextures(1, &mut color);
    gl::BindTexture(gl::TEXTURE_2D, color);
    let (internal, format, pixel) = types::target_color_format(version);
    gl::TexImage2D(
        gl::TEXTURE_2D,
        0,
        internal as GLint,
        width,
        height,
        0,
        format,
        pixel,
        ptr::null(),
    );
    apply_sampling(
        gl::TEXTURE_2D,
        TextureWrap::Clamp,
        TextureFilter::Nearest,
        false,
    );
    gl::FramebufferTexture2D(
        gl::FRAMEBUFFER,
        gl::COLOR_ATTACHMENT0,
        gl::TEXTURE_2D,
        color,
        0,
    );

    let depth = match flavor {
        TargetFlavor::Color => {
            let mut depth = 0;
            gl::GenRenderbuffers(1, &mut depth);
            gl::BindRenderbuffer(gl::RENDERBUFFER, depth);
            gl::RenderbufferStorage(gl::RENDERBUFFER, gl::DEPTH_COMPONENT16, width, height);
            gl::FramebufferRenderbuffer(
                gl::FRAMEBUFFER,
                gl::DEPTH_ATTACHMENT,
                gl::RENDERBUFFER,
                depth,
            );
            depth
        }
        TargetFlavor::Depth => {
            let mut depth = 0;
            gl::GenTextures(1, &mut depth);
            gl::BindTexture(gl::TEXTURE_2D, depth);
            let (internal, format, pixel) = types::target_depth_format(version);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                internal as GLint,
                width,
                height,
                0,
                format,
                pixel,
                ptr::null(),
            );
            apply_sampling(
                gl::TEXTURE_2D,
                TextureWrap::Clamp,
                TextureFilter::Nearest,
                false,
            );
            gl::FramebufferTexture2D(
                gl::FRAMEBUFFER,
                gl::DEPTH_ATTACHMENT,
                gl::TEXTURE_2D,
                depth,
                0,
            );
            depth
        }
    };

    (color, depth)
}

unsafe fn delete_planes(flavor: TargetFlavor, color: GLuint, depth: GLuint) {
    gl::DeleteTextures(1, &color);
    match flavor {
        TargetFlavor::Color => gl::DeleteRenderbuffers(1, &depth),
        TargetFlavor::Depth => gl::DeleteTextures(1, &depth),
    }
}

unsafe fn bind_uniform(location: GLint, value: &UniformValue) {
    match *value {
        UniformValue::I32(v) => gl::Uniform1i(location, v),
        UniformValue::F32(v) => gl::Uniform1f(location, v),
        UniformValue::Vector2f(v) => gl::Uniform2fv(location, 1, v.as_ptr()),
        UniformValue::Vector3f(v) => gl::Uniform3fv(location, 1, v.as_ptr()),
        UniformValue::Vector4f(v) => gl::Uniform4fv(location, 1, v.as_ptr()),
        UniformValue::Matrix2f(v) => gl::UniformMatrix2fv(location, 1, gl::FALSE, v[0].as_ptr()),
        UniformValue::Matrix3f(v) => gl::UniformMatrix3fv(location, 1, gl::FALSE, v[0].as_ptr()),
        UniformValue::Matrix4f(v) => gl::UniformMatrix4fv(location, 1, gl::FALSE, v[0].as_ptr()),
    }
}

fn describe_status(status: GLenum) -> String {
    match status {
        gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => "incomplete attachment".to_owned(),
        gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => "missing attachment".to_owned(),
        gl::FRAMEBUFFER_UNSUPPORTED => "unsupported attachment combination".to_owned(),
        other => format!("status 0x{:x}", other),
    }
}

unsafe fn check() -> Result<()> {
    match gl::GetError() {
        gl::NO_ERROR => Ok(()),
        gl::INVALID_ENUM => Err(Error::Device("An invalid enum was passed.".to_owned())),
        gl::INVALID_VALUE => Err(Error::Device("An invalid value was passed.".to_owned())),
        gl::INVALID_OPERATION => Err(Error::Device(
            "The operation is not legal in the current state.".to_owned(),
        )),
        gl::INVALID_FRAMEBUFFER_OPERATION => Err(Error::Device(
            "The bound framebuffer is not complete.".to_owned(),
        )),
        gl::OUT_OF_MEMORY => Err(Error::Device("Out of memory.".to_owned())),
        other => Err(Error::Device(format!("Unknown error 0x{:x}.", other))),
    }
}
