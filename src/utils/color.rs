/// An RGBA `Color` with floating point components in `[0, 1]`.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Color(pub f32, pub f32, pub f32, pub f32);

impl Color {
    pub fn white() -> Self {
        Color(1.0, 1.0, 1.0, 1.0)
    }

    pub fn black() -> Self {
        Color(0.0, 0.0, 0.0, 1.0)
    }

    pub fn red() -> Self {
        Color(1.0, 0.0, 0.0, 1.0)
    }

    pub fn green() -> Self {
        Color(0.0, 1.0, 0.0, 1.0)
    }

    pub fn blue() -> Self {
        Color(0.0, 0.0, 1.0, 1.0)
    }

    pub fn transparent() -> Self {
        Color(0.0, 0.0, 0.0, 0.0)
    }

    /// Clamps every component into `[0, 1]`.
    pub fn clip(&self) -> Color {
        Color(
            clamp(self.0, 0.0, 1.0),
            clamp(self.1, 0.0, 1.0),
            clamp(self.2, 0.0, 1.0),
            clamp(self.3, 0.0, 1.0),
        )
    }

    /// Truncates the alpha channel.
    pub fn rgb(&self) -> [f32; 3] {
        [self.0, self.1, self.2]
    }
}

impl From<[f32; 4]> for Color {
    fn from(v: [f32; 4]) -> Self {
        Color(v[0], v[1], v[2], v[3])
    }
}

impl Into<[f32; 4]> for Color {
    fn into(self) -> [f32; 4] {
        [self.0, self.1, self.2, self.3]
    }
}

fn clamp(v: f32, min: f32, max: f32) -> f32 {
    if v < min {
        min
    } else if v > max {
        max
    } else {
        v
    }
}
