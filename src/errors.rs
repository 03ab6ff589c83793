use crate::assets::shader::ShaderStage;

/// Things that can go wrong while authoring resources and shaders.
///
/// Everything here is a deterministic authoring error, not a transient
/// failure; there is no retry story. Draw-time binding gaps (a texture slot
/// with nothing bound, a uniform with neither value nor default) are
/// deliberately *not* errors: they are logged and the draw proceeds, since a
/// rendering glitch beats crashing an interactive surface.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Failed to compile {} shader:\n{}", _0, _1)]
    CompileFailure(ShaderStage, String),
    #[fail(display = "Failed to link shader program:\n{}", _0)]
    LinkFailure(String),
    #[fail(display = "Framebuffer is incomplete: {}.", _0)]
    FramebufferInvalid(String),
    #[fail(display = "OpenGL implementation doesn't support {}.", _0)]
    CapabilityMissing(String),
    #[fail(display = "Shader is invalid: {}", _0)]
    ShaderInvalid(String),
    #[fail(display = "{}", _0)]
    ResourceInvalid(String),
    #[fail(display = "Command '{}' is not registered.", _0)]
    CommandUnknown(String),
    #[fail(display = "{}", _0)]
    Device(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<failure::Error> for Error {
    fn from(err: failure::Error) -> Error {
        Error::Device(format!("{}", err))
    }
}
