//! Math types, re-exported from `cgmath`.

pub use cgmath::*;

pub mod prelude {
    pub use cgmath::prelude::*;
    pub use cgmath::{Matrix2, Matrix3, Matrix4, Point2, Point3, Vector2, Vector3, Vector4};
}
