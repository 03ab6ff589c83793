//! Texture parameters and image payloads.
//!
//! Sampling state is resolved lazily: unless the caller pins a wrap or filter
//! mode, defaults are picked from the mipmap policy. A texture gets mipmaps
//! when both dimensions are powers of two and it is not a streaming texture.

use crate::errors::{Error, Result};
use crate::math::prelude::Vector2;

impl_handle!(TextureHandle);

/// Expected update pattern. Streaming textures are re-uploaded frequently
/// (video frames) and never carry mipmaps.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TextureHint {
    Static,
    Stream,
}

impl Default for TextureHint {
    fn default() -> Self {
        TextureHint::Static
    }
}

/// Magnification and minification filtering.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Wrap behaviour outside the [0, 1] coordinate range.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TextureWrap {
    Repeat,
    Mirror,
    Clamp,
}

/// Pixel layout with a color-space tag. sRGB formats decode to linear in the
/// sampler when the implementation supports it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    Rgb8,
    Rgba8,
    Srgb8,
    Srgba8,
}

impl TextureFormat {
    /// Bytes per pixel.
    pub fn components(self) -> u32 {
        match self {
            TextureFormat::Rgb8 | TextureFormat::Srgb8 => 3,
            TextureFormat::Rgba8 | TextureFormat::Srgba8 => 4,
        }
    }

    pub fn is_srgb(self) -> bool {
        match self {
            TextureFormat::Srgb8 | TextureFormat::Srgba8 => true,
            _ => false,
        }
    }

    /// The linear format with the same layout, used as a fallback when sRGB
    /// sampling is unsupported.
    pub fn linear(self) -> TextureFormat {
        match self {
            TextureFormat::Srgb8 => TextureFormat::Rgb8,
            TextureFormat::Srgba8 => TextureFormat::Rgba8,
            v => v,
        }
    }
}

/// Creation parameters of a 2D or cube texture.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct TextureParams {
    pub hint: TextureHint,
    /// Explicit wrap mode. `None` picks the policy default.
    pub wrap: Option<TextureWrap>,
    /// Explicit filter mode. `None` picks the policy default.
    pub filter: Option<TextureFilter>,
    pub format: TextureFormat,
    /// Swap rows on upload so the image's top-left maps to (0, 1).
    pub flip: bool,
    pub dimensions: Vector2<u32>,
}

impl Default for TextureParams {
    fn default() -> Self {
        TextureParams {
            hint: TextureHint::Static,
            wrap: None,
            filter: None,
            format: TextureFormat::Rgba8,
            flip: false,
            dimensions: Vector2::new(0, 0),
        }
    }
}

impl TextureParams {
    /// Mipmaps require power-of-two dimensions and a non-streaming hint.
    pub fn supports_mipmap(&self) -> bool {
        self.dimensions.x.is_power_of_two()
            && self.dimensions.y.is_power_of_two()
            && self.hint != TextureHint::Stream
    }

    pub fn resolved_wrap(&self) -> TextureWrap {
        self.wrap.unwrap_or(if self.supports_mipmap() {
            TextureWrap::Repeat
        } else {
            TextureWrap::Clamp
        })
    }

    pub fn resolved_filter(&self) -> TextureFilter {
        self.filter.unwrap_or(TextureFilter::Linear)
    }

    /// Checks dimensions against the payload before any device object is
    /// created.
    pub fn validate(&self, image: &TextureImage) -> Result<()> {
        if self.dimensions.x == 0 || self.dimensions.y == 0 {
            return Err(Error::ResourceInvalid(
                "Texture dimensions must be non-zero.".into(),
            ));
        }

        if image.levels() == 0 {
            return Err(Error::ResourceInvalid(
                "Texture data must contain at least one level.".into(),
            ));
        }

        if image.levels() > 1 && !self.supports_mipmap() {
            return Err(Error::ResourceInvalid(
                "Explicit mip levels require power-of-two dimensions.".into(),
            ));
        }

        if image.is_cube() && self.dimensions.x != self.dimensions.y {
            return Err(Error::ResourceInvalid(
                "Cube texture faces must be square.".into(),
            ));
        }

        let components = self.format.components();
        for level in 0..image.levels() {
            let w = (self.dimensions.x >> level).max(1);
            let h = (self.dimensions.y >> level).max(1);
            let expected = (w * h * components) as usize;

            let ok = match *image {
                TextureImage::TwoD(ref data) => data.bytes[level].len() == expected,
                TextureImage::Cube(ref data) => {
                    data.faces[level].iter().all(|v| v.len() == expected)
                }
            };

            if !ok {
                return Err(Error::ResourceInvalid(format!(
                    "Texture level {} has the wrong byte length (expected {}).",
                    level, expected
                )));
            }
        }

        Ok(())
    }
}

/// Mip chain of a 2D texture. Entry 0 is the base level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureData {
    pub bytes: Vec<Box<[u8]>>,
}

impl TextureData {
    pub fn new(bytes: Vec<u8>) -> Self {
        TextureData {
            bytes: vec![bytes.into_boxed_slice()],
        }
    }
}

/// Face sets per mip level, in +X -X +Y -Y +Z -Z order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CubeData {
    pub faces: Vec<[Box<[u8]>; 6]>,
}

/// Image payload of a texture.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureImage {
    TwoD(TextureData),
    Cube(CubeData),
}

impl TextureImage {
    pub fn levels(&self) -> usize {
        match *self {
            TextureImage::TwoD(ref data) => data.bytes.len(),
            TextureImage::Cube(ref data) => data.faces.len(),
        }
    }

    pub fn is_cube(&self) -> bool {
        match *self {
            TextureImage::Cube(_) => true,
            _ => false,
        }
    }
}

impl From<TextureData> for TextureImage {
    fn from(data: TextureData) -> Self {
        TextureImage::TwoD(data)
    }
}

impl From<CubeData> for TextureImage {
    fn from(data: CubeData) -> Self {
        TextureImage::Cube(data)
    }
}
