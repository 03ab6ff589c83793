//! Fast non-cryptographic hashing for small keys. `FxHasher` is not
//! collision resistant against adversarial input; keys in this crate are
//! short author-controlled names, which is exactly the workload it is
//! good at.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

pub type FastHashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type FastHashSet<K> = rustc_hash::FxHashSet<K>;

/// Hashes `v` to a stable 64-bit value.
pub fn hash64<T: Hash + ?Sized>(v: &T) -> u64 {
    let mut state = FxHasher::default();
    v.hash(&mut state);
    state.finish()
}
