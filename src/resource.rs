//! Resource kinds and the draw-list wrapper around their handles.
//!
//! Every handle kind converts into [`Resource`] with `.into()`, so draw
//! lists read as flat slices. The dispatcher partitions a list by kind and
//! merges entries of the same kind with last-write-wins.

use crate::assets::prelude::TargetHandle;

impl_handle!(VertexBuffersHandle);
impl_handle!(IndexBufferHandle);
impl_handle!(UniformsHandle);
impl_handle!(TexturesHandle);

/// The kinds of resources the store manages.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    VertexBuffers,
    IndexBuffer,
    Uniforms,
    Textures,
    Target,
}

/// One entry of a draw list.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Resource {
    VertexBuffers(VertexBuffersHandle),
    IndexBuffer(IndexBufferHandle),
    Uniforms(UniformsHandle),
    Textures(TexturesHandle),
    Target(TargetHandle),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match *self {
            Resource::VertexBuffers(_) => ResourceKind::VertexBuffers,
            Resource::IndexBuffer(_) => ResourceKind::IndexBuffer,
            Resource::Uniforms(_) => ResourceKind::Uniforms,
            Resource::Textures(_) => ResourceKind::Textures,
            Resource::Target(_) => ResourceKind::Target,
        }
    }
}

impl From<VertexBuffersHandle> for Resource {
    fn from(handle: VertexBuffersHandle) -> Self {
        Resource::VertexBuffers(handle)
    }
}

impl From<IndexBufferHandle> for Resource {
    fn from(handle: IndexBufferHandle) -> Self {
        Resource::IndexBuffer(handle)
    }
}

impl From<UniformsHandle> for Resource {
    fn from(handle: UniformsHandle) -> Self {
        Resource::Uniforms(handle)
    }
}

impl From<TexturesHandle> for Resource {
    fn from(handle: TexturesHandle) -> Self {
        Resource::Textures(handle)
    }
}

impl From<TargetHandle> for Resource {
    fn from(handle: TargetHandle) -> Self {
        Resource::Target(handle)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::prelude::HandleLike;

    #[test]
    fn kinds_survive_conversion() {
        let uniforms = UniformsHandle::new(3, 1);
        let resource: Resource = uniforms.into();

        assert_eq!(resource.kind(), ResourceKind::Uniforms);
        assert_eq!(resource, Resource::Uniforms(uniforms));
    }
}
