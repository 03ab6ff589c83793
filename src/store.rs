//! Central bookkeeping for every live resource.
//!
//! The store pairs generational handles with the CPU-side description of each
//! resource and drives the device through creations, updates and deletions.
//! Validation happens here, before any device object exists, so device errors
//! are reserved for genuine driver failures.

use crate::assets::prelude::*;
use crate::backends::Device;
use crate::dispatch::TextureBinding;
use crate::errors::{Error, Result};
use crate::resource::{IndexBufferHandle, TexturesHandle, UniformsHandle, VertexBuffersHandle};
use crate::utils::prelude::{FastHashMap, HandlePool, HashValue, ObjectPool};

pub(crate) struct VertexBuffersSlot {
    pub entries: FastHashMap<HashValue<str>, BufferHandle>,
}

pub(crate) struct IndexBufferSlot {
    pub buffer: BufferHandle,
    offset: Option<usize>,
    count: Option<usize>,
    len: usize,
}

impl IndexBufferSlot {
    /// The effective draw span. Unpinned bounds follow the current length.
    pub fn span(&self) -> (usize, usize) {
        let offset = self.offset.unwrap_or(0);
        let count = self
            .count
            .unwrap_or_else(|| self.len.saturating_sub(offset));
        (offset, count)
    }

    fn check_span(offset: Option<usize>, count: Option<usize>, len: usize) -> Result<()> {
        let from = offset.unwrap_or(0);
        let n = count.unwrap_or_else(|| len.saturating_sub(from));

        if from + n > len {
            return Err(Error::ResourceInvalid(format!(
                "Index span {}..{} is out of bounds of {} indices.",
                from,
                from + n,
                len
            )));
        }

        Ok(())
    }
}

pub(crate) struct UniformsSlot {
    pub values: FastHashMap<HashValue<str>, UniformValue>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TextureSlot {
    Owned {
        handle: TextureHandle,
        params: TextureParams,
    },
    Alias(TargetHandle),
}

impl TextureSlot {
    pub fn binding(&self) -> TextureBinding {
        match *self {
            TextureSlot::Owned { handle, .. } => TextureBinding::Texture(handle),
            TextureSlot::Alias(target) => TextureBinding::Target(target),
        }
    }
}

pub(crate) struct TexturesSlot {
    pub entries: FastHashMap<HashValue<str>, TextureSlot>,
}

pub(crate) struct TargetSlot {
    pub params: TargetParams,
}

pub(crate) struct ShaderSlot {
    pub schema: Schema,
}

/// Owns every live resource and its device-side counterpart.
pub(crate) struct ResourceStore {
    shaders: ObjectPool<ShaderHandle, ShaderSlot>,
    vertex_buffers: ObjectPool<VertexBuffersHandle, VertexBuffersSlot>,
    index_buffers: ObjectPool<IndexBufferHandle, IndexBufferSlot>,
    uniforms: ObjectPool<UniformsHandle, UniformsSlot>,
    textures: ObjectPool<TexturesHandle, TexturesSlot>,
    targets: ObjectPool<TargetHandle, TargetSlot>,
    buffer_handles: HandlePool<BufferHandle>,
    texture_handles: HandlePool<TextureHandle>,
}

impl ResourceStore {
    pub fn new() -> Self {
        ResourceStore {
            shaders: ObjectPool::new(),
            vertex_buffers: ObjectPool::new(),
            index_buffers: ObjectPool::new(),
            uniforms: ObjectPool::new(),
            textures: ObjectPool::new(),
            targets: ObjectPool::new(),
            buffer_handles: HandlePool::new(),
            texture_handles: HandlePool::new(),
        }
    }

    pub fn create_shader(
        &mut self,
        device: &mut dyn Device,
        params: ShaderParams,
        vs: &str,
        fs: &str,
    ) -> Result<ShaderHandle> {
        params.validate(vs, fs)?;

        let vs = params.inject(vs);
        let fs = params.inject(fs);
        let schema = params.schema;

        let handle = self.shaders.create(ShaderSlot {
            schema: schema.clone(),
        });

        if let Err(err) = unsafe { device.create_shader(handle, schema, &vs, &fs) } {
            self.shaders.free(handle);
            return Err(err);
        }

        Ok(handle)
    }

    pub fn delete_shader(&mut self, device: &mut dyn Device, handle: ShaderHandle) -> Result<()> {
        self.shaders
            .free(handle)
            .ok_or_else(|| Error::ShaderInvalid(format!("{:?} is not alive.", handle)))?;

        unsafe { device.delete_shader(handle) }
    }

    pub fn schema(&self, handle: ShaderHandle) -> Option<&Schema> {
        self.shaders.get(handle).map(|v| &v.schema)
    }

    pub fn create_vertex_buffers(
        &mut self,
        device: &mut dyn Device,
        data: VertexData,
    ) -> Result<VertexBuffersHandle> {
        let mut entries = FastHashMap::default();
        let mut created = Vec::with_capacity(data.entries.len());

        for (name, floats) in &data.entries {
            let hash = HashValue::from(name);
            if entries.contains_key(&hash) {
                self.rollback_buffers(device, &created);
                return Err(Error::ResourceInvalid(format!(
                    "Duplicate vertex buffer name '{}'.",
                    name
                )));
            }

            let buffer = self.buffer_handles.create();
            if let Err(err) = unsafe { device.create_vertex_buffer(buffer, floats) } {
                self.buffer_handles.free(buffer);
                self.rollback_buffers(device, &created);
                return Err(err);
            }

            created.push(buffer);
            entries.insert(hash, buffer);
        }

        Ok(self.vertex_buffers.create(VertexBuffersSlot { entries }))
    }

    /// Replaces the contents of one named buffer, allocating a fresh device
    /// buffer when the name is new to the collection.
    pub fn update_vertex_buffer(
        &mut self,
        device: &mut dyn Device,
        handle: VertexBuffersHandle,
        name: &str,
        data: &[f32],
    ) -> Result<()> {
        let hash = HashValue::from(name);
        let existing = self
            .vertex_buffers
            .get(handle)
            .ok_or_else(|| Error::ResourceInvalid(format!("{:?} is not alive.", handle)))?
            .entries
            .get(&hash)
            .cloned();

        match existing {
            Some(buffer) => unsafe { device.update_vertex_buffer(buffer, data) },
            None => {
                let buffer = self.buffer_handles.create();
                if let Err(err) = unsafe { device.create_vertex_buffer(buffer, data) } {
                    self.buffer_handles.free(buffer);
                    return Err(err);
                }

                if let Some(slot) = self.vertex_buffers.get_mut(handle) {
                    slot.entries.insert(hash, buffer);
                }
                Ok(())
            }
        }
    }

    /// Releases one named buffer and removes it from the collection.
    pub fn delete_vertex_buffer(
        &mut self,
        device: &mut dyn Device,
        handle: VertexBuffersHandle,
        name: &str,
    ) -> Result<()> {
        let slot = self
            .vertex_buffers
            .get_mut(handle)
            .ok_or_else(|| Error::ResourceInvalid(format!("{:?} is not alive.", handle)))?;

        let buffer = slot.entries.remove(&HashValue::from(name)).ok_or_else(|| {
            Error::ResourceInvalid(format!("No vertex buffer named '{}' in {:?}.", name, handle))
        })?;

        self.buffer_handles.free(buffer);
        unsafe { device.delete_buffer(buffer) }
    }

    pub fn delete_vertex_buffers(
        &mut self,
        device: &mut dyn Device,
        handle: VertexBuffersHandle,
    ) -> Result<()> {
        let slot = self
            .vertex_buffers
            .free(handle)
            .ok_or_else(|| Error::ResourceInvalid(format!("{:?} is not alive.", handle)))?;

        for buffer in slot.entries.values() {
            self.buffer_handles.free(*buffer);
            unsafe { device.delete_buffer(*buffer)? };
        }

        Ok(())
    }

    pub fn vertex_entries(
        &self,
        handle: VertexBuffersHandle,
    ) -> Option<&FastHashMap<HashValue<str>, BufferHandle>> {
        self.vertex_buffers.get(handle).map(|v| &v.entries)
    }

    pub fn create_index_buffer(
        &mut self,
        device: &mut dyn Device,
        data: IndexData,
    ) -> Result<IndexBufferHandle> {
        IndexBufferSlot::check_span(data.offset, data.count, data.indices.len())?;

        let buffer = self.buffer_handles.create();
        if let Err(err) = unsafe { device.create_index_buffer(buffer, &data.indices) } {
            self.buffer_handles.free(buffer);
            return Err(err);
        }

        Ok(self.index_buffers.create(IndexBufferSlot {
            buffer,
            offset: data.offset,
            count: data.count,
            len: data.indices.len(),
        }))
    }

    /// Replaces the index data and the draw span together. The span in `data`
    /// is checked against the new length exactly as at creation.
    pub fn update_index_buffer(
        &mut self,
        device: &mut dyn Device,
        handle: IndexBufferHandle,
        data: IndexData,
    ) -> Result<()> {
        IndexBufferSlot::check_span(data.offset, data.count, data.indices.len())?;

        let buffer = self
            .index_buffers
            .get(handle)
            .ok_or_else(|| Error::ResourceInvalid(format!("{:?} is not alive.", handle)))?
            .buffer;

        unsafe { device.update_index_buffer(buffer, &data.indices)? };

        if let Some(slot) = self.index_buffers.get_mut(handle) {
            slot.offset = data.offset;
            slot.count = data.count;
            slot.len = data.indices.len();
        }

        Ok(())
    }

    pub fn delete_index_buffer(
        &mut self,
        device: &mut dyn Device,
        handle: IndexBufferHandle,
    ) -> Result<()> {
        let slot = self
            .index_buffers
            .free(handle)
            .ok_or_else(|| Error::ResourceInvalid(format!("{:?} is not alive.", handle)))?;

        self.buffer_handles.free(slot.buffer);
        unsafe { device.delete_buffer(slot.buffer) }
    }

    pub fn index_buffer(&self, handle: IndexBufferHandle) -> Option<&IndexBufferSlot> {
        self.index_buffers.get(handle)
    }

    pub fn create_uniforms(&mut self) -> UniformsHandle {
        self.uniforms.create(UniformsSlot {
            values: FastHashMap::default(),
        })
    }

    pub fn set_uniform(
        &mut self,
        handle: UniformsHandle,
        name: &str,
        value: UniformValue,
    ) -> Result<()> {
        let slot = self
            .uniforms
            .get_mut(handle)
            .ok_or_else(|| Error::ResourceInvalid(format!("{:?} is not alive.", handle)))?;

        slot.values.insert(name.into(), value);
        Ok(())
    }

    /// Removes one named value from the bag.
    pub fn delete_uniform(&mut self, handle: UniformsHandle, name: &str) -> Result<()> {
        let slot = self
            .uniforms
            .get_mut(handle)
            .ok_or_else(|| Error::ResourceInvalid(format!("{:?} is not alive.", handle)))?;

        slot.values
            .remove(&HashValue::from(name))
            .map(|_| ())
            .ok_or_else(|| {
                Error::ResourceInvalid(format!("No uniform named '{}' in {:?}.", name, handle))
            })
    }

    pub fn delete_uniforms(&mut self, handle: UniformsHandle) -> Result<()> {
        self.uniforms
            .free(handle)
            .map(|_| ())
            .ok_or_else(|| Error::ResourceInvalid(format!("{:?} is not alive.", handle)))
    }

    pub fn uniform_values(
        &self,
        handle: UniformsHandle,
    ) -> Option<&FastHashMap<HashValue<str>, UniformValue>> {
        self.uniforms.get(handle).map(|v| &v.values)
    }

    pub fn create_textures(&mut self) -> TexturesHandle {
        self.textures.create(TexturesSlot {
            entries: FastHashMap::default(),
        })
    }

    /// Creates or replaces the named texture. Replacing always reallocates;
    /// use [`set_texture_sampling`] to adjust sampling state in place.
    ///
    /// [`set_texture_sampling`]: ResourceStore::set_texture_sampling
    pub fn set_texture(
        &mut self,
        device: &mut dyn Device,
        handle: TexturesHandle,
        name: &str,
        mut params: TextureParams,
        image: TextureImage,
    ) -> Result<()> {
        if !self.textures.contains(handle) {
            return Err(Error::ResourceInvalid(format!("{:?} is not alive.", handle)));
        }

        params.validate(&image)?;

        if params.format.is_srgb() && !device.capabilities().has_srgb_texture() {
            warn!(
                "sRGB textures are unsupported here; falling back to {:?}.",
                params.format.linear()
            );
            params.format = params.format.linear();
        }

        let texture = self.texture_handles.create();
        if let Err(err) = unsafe { device.create_texture(texture, params, &image) } {
            self.texture_handles.free(texture);
            return Err(err);
        }

        let slot = TextureSlot::Owned {
            handle: texture,
            params,
        };

        let previous = self
            .textures
            .get_mut(handle)
            .and_then(|v| v.entries.insert(name.into(), slot));

        if let Some(TextureSlot::Owned { handle: old, .. }) = previous {
            self.texture_handles.free(old);
            unsafe { device.delete_texture(old)? };
        }

        Ok(())
    }

    /// Adjusts wrap and filter state of an owned texture without reallocating
    /// its storage.
    pub fn set_texture_sampling(
        &mut self,
        device: &mut dyn Device,
        handle: TexturesHandle,
        name: &str,
        wrap: Option<TextureWrap>,
        filter: Option<TextureFilter>,
    ) -> Result<()> {
        let slot = self
            .textures
            .get_mut(handle)
            .ok_or_else(|| Error::ResourceInvalid(format!("{:?} is not alive.", handle)))?;

        let entry = slot.entries.get_mut(&HashValue::from(name)).ok_or_else(|| {
            Error::ResourceInvalid(format!("No texture named '{}' in {:?}.", name, handle))
        })?;

        match *entry {
            TextureSlot::Owned {
                handle: texture,
                ref mut params,
            } => {
                if wrap.is_some() {
                    params.wrap = wrap;
                }
                if filter.is_some() {
                    params.filter = filter;
                }

                let (wrap, filter) = (params.resolved_wrap(), params.resolved_filter());
                unsafe { device.update_texture_params(texture, wrap, filter) }
            }
            TextureSlot::Alias(_) => Err(Error::ResourceInvalid(format!(
                "'{}' in {:?} aliases a target; its sampling state is fixed.",
                name, handle
            ))),
        }
    }

    /// Points the named slot at a target's sampleable attachment. The alias
    /// resolves at draw time, so it survives target resizes.
    pub fn alias_target(
        &mut self,
        device: &mut dyn Device,
        handle: TexturesHandle,
        name: &str,
        target: TargetHandle,
    ) -> Result<()> {
        if !self.targets.contains(target) {
            return Err(Error::ResourceInvalid(format!("{:?} is not alive.", target)));
        }

        let slot = self
            .textures
            .get_mut(handle)
            .ok_or_else(|| Error::ResourceInvalid(format!("{:?} is not alive.", handle)))?;

        let previous = slot.entries.insert(name.into(), TextureSlot::Alias(target));

        if let Some(TextureSlot::Owned { handle: old, .. }) = previous {
            self.texture_handles.free(old);
            unsafe { device.delete_texture(old)? };
        }

        Ok(())
    }

    /// Releases one named slot. Owned textures are deleted on the device;
    /// aliases just drop the reference.
    pub fn delete_texture(
        &mut self,
        device: &mut dyn Device,
        handle: TexturesHandle,
        name: &str,
    ) -> Result<()> {
        let slot = self
            .textures
            .get_mut(handle)
            .ok_or_else(|| Error::ResourceInvalid(format!("{:?} is not alive.", handle)))?;

        let entry = slot.entries.remove(&HashValue::from(name)).ok_or_else(|| {
            Error::ResourceInvalid(format!("No texture named '{}' in {:?}.", name, handle))
        })?;

        if let TextureSlot::Owned { handle: texture, .. } = entry {
            self.texture_handles.free(texture);
            unsafe { device.delete_texture(texture)? };
        }

        Ok(())
    }

    pub fn delete_textures(
        &mut self,
        device: &mut dyn Device,
        handle: TexturesHandle,
    ) -> Result<()> {
        let slot = self
            .textures
            .free(handle)
            .ok_or_else(|| Error::ResourceInvalid(format!("{:?} is not alive.", handle)))?;

        for entry in slot.entries.values() {
            if let TextureSlot::Owned { handle: texture, .. } = *entry {
                self.texture_handles.free(texture);
                unsafe { device.delete_texture(texture)? };
            }
        }

        Ok(())
    }

    pub fn texture_entries(
        &self,
        handle: TexturesHandle,
    ) -> Option<&FastHashMap<HashValue<str>, TextureSlot>> {
        self.textures.get(handle).map(|v| &v.entries)
    }

    pub fn create_target(
        &mut self,
        device: &mut dyn Device,
        params: TargetParams,
    ) -> Result<TargetHandle> {
        params.validate()?;

        if params.flavor == TargetFlavor::Depth && !device.capabilities().has_depth_texture() {
            return Err(Error::CapabilityMissing("depth textures".into()));
        }

        let handle = self.targets.create(TargetSlot { params });
        if let Err(err) = unsafe { device.create_target(handle, params) } {
            self.targets.free(handle);
            return Err(err);
        }

        Ok(handle)
    }

    pub fn resize_target(
        &mut self,
        device: &mut dyn Device,
        handle: TargetHandle,
        dimensions: crate::math::prelude::Vector2<u32>,
    ) -> Result<()> {
        if dimensions.x == 0 || dimensions.y == 0 {
            return Err(Error::ResourceInvalid(
                "Target dimensions must be non-zero.".into(),
            ));
        }

        let slot = self
            .targets
            .get_mut(handle)
            .ok_or_else(|| Error::ResourceInvalid(format!("{:?} is not alive.", handle)))?;

        if slot.params.dimensions == dimensions {
            return Ok(());
        }

        slot.params.dimensions = dimensions;
        unsafe { device.resize_target(handle, dimensions) }
    }

    pub fn delete_target(&mut self, device: &mut dyn Device, handle: TargetHandle) -> Result<()> {
        self.targets
            .free(handle)
            .ok_or_else(|| Error::ResourceInvalid(format!("{:?} is not alive.", handle)))?;

        unsafe { device.delete_target(handle) }
    }

    pub fn target_params(&self, handle: TargetHandle) -> Option<&TargetParams> {
        self.targets.get(handle).map(|v| &v.params)
    }

    fn rollback_buffers(&mut self, device: &mut dyn Device, buffers: &[BufferHandle]) {
        for buffer in buffers {
            self.buffer_handles.free(*buffer);
            if let Err(err) = unsafe { device.delete_buffer(*buffer) } {
                warn!("Leaked a buffer while rolling back a failed creation: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backends;

    fn store_and_device() -> (ResourceStore, Box<dyn Device>) {
        (ResourceStore::new(), backends::new_headless())
    }

    #[test]
    fn index_spans_are_rederived_on_update() {
        let (mut store, mut device) = store_and_device();
        let device = device.as_mut();

        let handle = store
            .create_index_buffer(device, IndexData::new(vec![0, 1, 2, 2, 3, 0]))
            .unwrap();
        assert_eq!(store.index_buffer(handle).unwrap().span(), (0, 6));

        // Unpinned spans follow the new length.
        store
            .update_index_buffer(device, handle, IndexData::new(vec![0, 1, 2]))
            .unwrap();
        assert_eq!(store.index_buffer(handle).unwrap().span(), (0, 3));

        // A span pinned by the update sticks.
        store
            .update_index_buffer(
                device,
                handle,
                IndexData::with_span(vec![0, 1, 2, 2, 3, 0], 3, 3),
            )
            .unwrap();
        assert_eq!(store.index_buffer(handle).unwrap().span(), (3, 3));

        // Out-of-range spans are rejected before anything is uploaded.
        assert!(store
            .update_index_buffer(device, handle, IndexData::with_span(vec![0, 1], 1, 3))
            .is_err());
        assert_eq!(store.index_buffer(handle).unwrap().span(), (3, 3));
    }

    #[test]
    fn create_index_buffer_rejects_bad_spans() {
        let (mut store, mut device) = store_and_device();
        let device = device.as_mut();

        assert!(store
            .create_index_buffer(device, IndexData::with_span(vec![0, 1, 2], 2, 3))
            .is_err());
    }

    #[test]
    fn vertex_buffer_names_are_unique() {
        let (mut store, mut device) = store_and_device();
        let device = device.as_mut();

        let data = VertexData::new()
            .with("position", vec![0.0; 6])
            .with("position", vec![0.0; 6]);

        assert!(store.create_vertex_buffers(device, data).is_err());
    }

    #[test]
    fn vertex_buffer_updates_allocate_new_names() {
        let (mut store, mut device) = store_and_device();
        let device = device.as_mut();

        let data = VertexData::new().with("position", vec![0.0; 6]);
        let handle = store.create_vertex_buffers(device, data).unwrap();
        assert_eq!(store.vertex_entries(handle).unwrap().len(), 1);

        store
            .update_vertex_buffer(device, handle, "normal", &[0.0; 9])
            .unwrap();
        assert_eq!(store.vertex_entries(handle).unwrap().len(), 2);

        store
            .delete_vertex_buffer(device, handle, "position")
            .unwrap();
        let entries = store.vertex_entries(handle).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key(&HashValue::from("normal")));
    }

    #[test]
    fn deleted_handles_do_not_reach_recycled_slots() {
        let mut store = ResourceStore::new();

        let first = store.create_uniforms();
        store
            .set_uniform(first, "tint", UniformValue::F32(1.0))
            .unwrap();
        store.delete_uniforms(first).unwrap();

        let second = store.create_uniforms();
        assert!(store
            .set_uniform(first, "tint", UniformValue::F32(2.0))
            .is_err());
        assert!(store.uniform_values(first).is_none());
        assert!(store.uniform_values(second).unwrap().is_empty());
    }

    #[test]
    fn aliases_replace_owned_textures() {
        let (mut store, mut device) = store_and_device();
        let device = device.as_mut();

        let textures = store.create_textures();
        let params = TextureParams {
            dimensions: crate::math::prelude::Vector2::new(2, 2),
            ..Default::default()
        };
        store
            .set_texture(
                device,
                textures,
                "scene",
                params,
                TextureData::new(vec![0; 16]).into(),
            )
            .unwrap();

        let target = store
            .create_target(device, TargetParams::new(TargetFlavor::Color, 64, 64))
            .unwrap();
        store.alias_target(device, textures, "scene", target).unwrap();

        let entries = store.texture_entries(textures).unwrap();
        assert_eq!(
            entries[&HashValue::from("scene")].binding(),
            TextureBinding::Target(target)
        );

        // Sampling state of an alias belongs to the target.
        assert!(store
            .set_texture_sampling(device, textures, "scene", Some(TextureWrap::Repeat), None)
            .is_err());
    }
}
