//! Off-screen render targets.
//!
//! A target owns its attachments. The color flavor renders into a sampleable
//! color texture with a depth renderbuffer behind it; the depth flavor keeps
//! the depth buffer itself sampleable for shadow-map style passes.

use crate::errors::{Error, Result};
use crate::math::prelude::Vector2;

impl_handle!(TargetHandle);

/// Which attachment of a target is meant to be sampled afterwards.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TargetFlavor {
    /// Color texture plus a depth renderbuffer.
    Color,
    /// Color texture plus a sampleable depth texture.
    Depth,
}

impl Default for TargetFlavor {
    fn default() -> Self {
        TargetFlavor::Color
    }
}

/// Creation parameters of an off-screen target.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct TargetParams {
    pub flavor: TargetFlavor,
    pub dimensions: Vector2<u32>,
}

impl Default for TargetParams {
    fn default() -> Self {
        TargetParams {
            flavor: TargetFlavor::Color,
            dimensions: Vector2::new(0, 0),
        }
    }
}

impl TargetParams {
    pub fn new(flavor: TargetFlavor, width: u32, height: u32) -> Self {
        TargetParams {
            flavor,
            dimensions: Vector2::new(width, height),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimensions.x == 0 || self.dimensions.y == 0 {
            return Err(Error::ResourceInvalid(
                "Target dimensions must be non-zero.".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validate_rejects_empty_dimensions() {
        assert!(TargetParams::new(TargetFlavor::Color, 256, 256)
            .validate()
            .is_ok());
        assert!(TargetParams::new(TargetFlavor::Depth, 0, 256)
            .validate()
            .is_err());
    }
}
