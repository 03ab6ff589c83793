//! A device that performs no work. Creation, updates and draws all succeed,
//! which keeps resource and dispatch logic testable without a video context.

use crate::assets::prelude::*;
use crate::dispatch::DrawCall;
use crate::errors::Result;
use crate::math::prelude::Vector2;
use crate::utils::prelude::Color;

use super::capabilities::Capabilities;
use super::Device;

pub struct HeadlessDevice {
    capabilities: Capabilities,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        HeadlessDevice {
            capabilities: Capabilities::headless(),
        }
    }
}

impl Device for HeadlessDevice {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    unsafe fn create_shader(
        &mut self,
        _: ShaderHandle,
        _: Schema,
        _: &str,
        _: &str,
    ) -> Result<()> {
        Ok(())
    }

    unsafe fn delete_shader(&mut self, _: ShaderHandle) -> Result<()> {
        Ok(())
    }

    unsafe fn create_vertex_buffer(&mut self, _: BufferHandle, _: &[f32]) -> Result<()> {
        Ok(())
    }

    unsafe fn update_vertex_buffer(&mut self, _: BufferHandle, _: &[f32]) -> Result<()> {
        Ok(())
    }

    unsafe fn create_index_buffer(&mut self, _: BufferHandle, _: &[u32]) -> Result<()> {
        Ok(())
    }

    unsafe fn update_index_buffer(&mut self, _: BufferHandle, _: &[u32]) -> Result<()> {
        Ok(())
    }

    unsafe fn delete_buffer(&mut self, _: BufferHandle) -> Result<()> {
        Ok(())
    }

    unsafe fn create_texture(
        &mut self,
        _: TextureHandle,
        _: TextureParams,
        _: &TextureImage,
    ) -> Result<()> {
        Ok(())
    }

    unsafe fn update_texture_params(
        &mut self,
        _: TextureHandle,
        _: TextureWrap,
        _: TextureFilter,
    ) -> Result<()> {
        Ok(())
    }

    unsafe fn delete_texture(&mut self, _: TextureHandle) -> Result<()> {
        Ok(())
    }

    unsafe fn create_target(&mut self, _: TargetHandle, _: TargetParams) -> Result<()> {
        Ok(())
    }

    unsafe fn resize_target(&mut self, _: TargetHandle, _: Vector2<u32>) -> Result<()> {
        Ok(())
    }

    unsafe fn delete_target(&mut self, _: TargetHandle) -> Result<()> {
        Ok(())
    }

    unsafe fn set_dimensions(&mut self, _: Vector2<u32>) -> Result<()> {
        Ok(())
    }

    unsafe fn clear(&mut self, _: Option<Color>, _: bool) -> Result<()> {
        Ok(())
    }

    unsafe fn begin_target(&mut self, _: TargetHandle) -> Result<()> {
        Ok(())
    }

    unsafe fn end_target(&mut self) -> Result<()> {
        Ok(())
    }

    unsafe fn set_blend(&mut self, _: bool) -> Result<()> {
        Ok(())
    }

    unsafe fn draw(&mut self, call: &DrawCall) -> Result<u32> {
        Ok(call.mode.assemble(call.count as u32))
    }

    unsafe fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
