//! A device implementation that records every call it receives, so tests can
//! assert on the exact call sequence a context operation produces.

use std::cell::RefCell;
use std::rc::Rc;

use glaze::assets::prelude::*;
use glaze::backends::capabilities::Capabilities;
use glaze::backends::Device;
use glaze::dispatch::DrawCall;
use glaze::math::prelude::Vector2;
use glaze::utils::prelude::Color;
use glaze::{Context, ContextParams, Result};

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateShader {
        handle: ShaderHandle,
        vs: String,
        fs: String,
    },
    DeleteShader(ShaderHandle),
    CreateVertexBuffer {
        handle: BufferHandle,
        data: Vec<f32>,
    },
    UpdateVertexBuffer {
        handle: BufferHandle,
        data: Vec<f32>,
    },
    CreateIndexBuffer {
        handle: BufferHandle,
        data: Vec<u32>,
    },
    UpdateIndexBuffer {
        handle: BufferHandle,
        data: Vec<u32>,
    },
    DeleteBuffer(BufferHandle),
    CreateTexture {
        handle: TextureHandle,
        params: TextureParams,
    },
    UpdateTextureParams {
        handle: TextureHandle,
        wrap: TextureWrap,
        filter: TextureFilter,
    },
    DeleteTexture(TextureHandle),
    CreateTarget {
        handle: TargetHandle,
        params: TargetParams,
    },
    ResizeTarget {
        handle: TargetHandle,
        dimensions: Vector2<u32>,
    },
    DeleteTarget(TargetHandle),
    SetDimensions(Vector2<u32>),
    Clear {
        color: Option<Color>,
        depth: bool,
    },
    BeginTarget(TargetHandle),
    EndTarget,
    SetBlend(bool),
    Draw(DrawCall),
    Flush,
}

/// Shared view of the calls a [`RecordingDevice`] received, in order.
#[derive(Clone, Default)]
pub struct Journal {
    events: Rc<RefCell<Vec<Event>>>,
}

impl Journal {
    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    /// Drains and returns everything recorded so far.
    pub fn take(&self) -> Vec<Event> {
        self.events.borrow_mut().drain(..).collect()
    }

    /// The draw calls recorded so far, oldest first. Leaves the journal
    /// intact.
    pub fn draws(&self) -> Vec<DrawCall> {
        self.events
            .borrow()
            .iter()
            .filter_map(|v| match v {
                Event::Draw(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }
}

pub struct RecordingDevice {
    capabilities: Capabilities,
    journal: Journal,
}

impl RecordingDevice {
    pub fn new(journal: Journal) -> Self {
        RecordingDevice {
            capabilities: Capabilities::headless(),
            journal,
        }
    }

    /// A recorder that impersonates a device with the given capabilities.
    pub fn with_capabilities(journal: Journal, capabilities: Capabilities) -> Self {
        RecordingDevice {
            capabilities,
            journal,
        }
    }
}

impl Device for RecordingDevice {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    unsafe fn create_shader(
        &mut self,
        handle: ShaderHandle,
        _: Schema,
        vs: &str,
        fs: &str,
    ) -> Result<()> {
        self.journal.push(Event::CreateShader {
            handle,
            vs: vs.to_owned(),
            fs: fs.to_owned(),
        });
        Ok(())
    }

    unsafe fn delete_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        self.journal.push(Event::DeleteShader(handle));
        Ok(())
    }

    unsafe fn create_vertex_buffer(&mut self, handle: BufferHandle, data: &[f32]) -> Result<()> {
        self.journal.push(Event::CreateVertexBuffer {
            handle,
            data: data.to_vec(),
        });
        Ok(())
    }

    unsafe fn update_vertex_buffer(&mut self, handle: BufferHandle, data: &[f32]) -> Result<()> {
        self.journal.push(Event::UpdateVertexBuffer {
            handle,
            data: data.to_vec(),
        });
        Ok(())
    }

    unsafe fn create_index_buffer(&mut self, handle: BufferHandle, data: &[u32]) -> Result<()> {
        self.journal.push(Event::CreateIndexBuffer {
            handle,
            data: data.to_vec(),
        });
        Ok(())
    }

    unsafe fn update_index_buffer(&mut self, handle: BufferHandle, data: &[u32]) -> Result<()> {
        self.journal.push(Event::UpdateIndexBuffer {
            handle,
            data: data.to_vec(),
        });
        Ok(())
    }

    unsafe fn delete_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        self.journal.push(Event::DeleteBuffer(handle));
        Ok(())
    }

    unsafe fn create_texture(
        &mut self,
        handle: TextureHandle,
        params: TextureParams,
        _: &TextureImage,
    ) -> Result<()> {
        self.journal.push(Event::CreateTexture { handle, params });
        Ok(())
    }

    unsafe fn update_texture_params(
        &mut self,
        handle: TextureHandle,
        wrap: TextureWrap,
        filter: TextureFilter,
    ) -> Result<()> {
        self.journal.push(Event::UpdateTextureParams {
            handle,
            wrap,
            filter,
        });
        Ok(())
    }

    unsafe fn delete_texture(&mut self, handle: TextureHandle) -> Result<()> {
        self.journal.push(Event::DeleteTexture(handle));
        Ok(())
    }

    unsafe fn create_target(&mut self, handle: TargetHandle, params: TargetParams) -> Result<()> {
        self.journal.push(Event::CreateTarget { handle, params });
        Ok(())
    }

    unsafe fn resize_target(
        &mut self,
        handle: TargetHandle,
        dimensions: Vector2<u32>,
    ) -> Result<()> {
        self.journal.push(Event::ResizeTarget { handle, dimensions });
        Ok(())
    }

    unsafe fn delete_target(&mut self, handle: TargetHandle) -> Result<()> {
        self.journal.push(Event::DeleteTarget(handle));
        Ok(())
    }

    unsafe fn set_dimensions(&mut self, dimensions: Vector2<u32>) -> Result<()> {
        self.journal.push(Event::SetDimensions(dimensions));
        Ok(())
    }

    unsafe fn clear(&mut self, color: Option<Color>, depth: bool) -> Result<()> {
        self.journal.push(Event::Clear { color, depth });
        Ok(())
    }

    unsafe fn begin_target(&mut self, handle: TargetHandle) -> Result<()> {
        self.journal.push(Event::BeginTarget(handle));
        Ok(())
    }

    unsafe fn end_target(&mut self) -> Result<()> {
        self.journal.push(Event::EndTarget);
        Ok(())
    }

    unsafe fn set_blend(&mut self, enabled: bool) -> Result<()> {
        self.journal.push(Event::SetBlend(enabled));
        Ok(())
    }

    unsafe fn draw(&mut self, call: &DrawCall) -> Result<u32> {
        let primitives = call.mode.assemble(call.count as u32);
        self.journal.push(Event::Draw(call.clone()));
        Ok(primitives)
    }

    unsafe fn flush(&mut self) -> Result<()> {
        self.journal.push(Event::Flush);
        Ok(())
    }
}

/// A context over a recording device plus the journal observing it. Calls
/// made during construction are already drained.
pub fn recording_context(params: ContextParams) -> (Context, Journal) {
    let journal = Journal::default();
    let device = RecordingDevice::new(journal.clone());
    let ctx = Context::with_device(params, Box::new(device)).unwrap();

    journal.take();
    (ctx, journal)
}
