pub mod buffer;
pub mod shader;
pub mod target;
pub mod texture;

pub mod prelude {
    pub use super::buffer::{BufferHandle, IndexData, VertexData};

    pub use super::shader::{
        BufferDecl, Define, DrawMode, Schema, SchemaType, ShaderHandle, ShaderParams,
        ShaderParamsBuilder, ShaderStage, TextureDecl, UniformDecl, UniformValue,
    };

    pub use super::texture::{
        CubeData, TextureData, TextureFilter, TextureFormat, TextureHandle, TextureHint,
        TextureImage, TextureParams, TextureWrap,
    };

    pub use super::target::{TargetFlavor, TargetHandle, TargetParams};
}
