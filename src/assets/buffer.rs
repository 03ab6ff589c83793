//! Geometry data. Vertex buffers carry named float arrays that feed a
//! schema's attribute slots, index buffers carry `u32` indices with an
//! optional explicit draw span.

impl_handle!(BufferHandle);

/// Named per-attribute float arrays. Every entry becomes its own device
/// buffer, looked up by name when a shader schema asks for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexData {
    pub entries: Vec<(String, Vec<f32>)>,
}

impl VertexData {
    pub fn new() -> Self {
        VertexData::default()
    }

    pub fn with<T: Into<String>>(mut self, name: T, data: Vec<f32>) -> Self {
        self.entries.push((name.into(), data));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Index data. The draw span defaults to the whole buffer; either bound can
/// be pinned explicitly and survives later index uploads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexData {
    pub indices: Vec<u32>,
    pub offset: Option<usize>,
    pub count: Option<usize>,
}

impl IndexData {
    pub fn new(indices: Vec<u32>) -> Self {
        IndexData {
            indices,
            offset: None,
            count: None,
        }
    }

    pub fn with_span(indices: Vec<u32>, offset: usize, count: usize) -> Self {
        IndexData {
            indices,
            offset: Some(offset),
            count: Some(count),
        }
    }
}
