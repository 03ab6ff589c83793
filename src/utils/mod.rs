//! Commonly used utilities: generational handles, pools and hashed names.

#[macro_use]
pub mod handle;
pub mod color;
pub mod handle_pool;
pub mod hash;
pub mod hash_value;
pub mod object_pool;

pub mod prelude {
    pub use super::color::Color;
    pub use super::handle::{Handle, HandleIndex, HandleLike};
    pub use super::handle_pool::HandlePool;
    pub use super::hash::{hash64, FastHashMap, FastHashSet};
    pub use super::hash_value::HashValue;
    pub use super::object_pool::ObjectPool;
}
