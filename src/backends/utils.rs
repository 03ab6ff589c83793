use std::marker::PhantomData;

use crate::utils::prelude::HandleLike;

/// Handle-indexed storage for device objects. Versions are tracked so a stale
/// handle misses instead of touching a recycled slot.
#[derive(Debug)]
pub struct DataVec<H, T>
where
    H: HandleLike,
{
    buf: Vec<Option<T>>,
    versions: Vec<u32>,
    _marker: PhantomData<H>,
}

impl<H, T> DataVec<H, T>
where
    H: HandleLike,
{
    pub fn new() -> Self {
        DataVec {
            buf: Vec::new(),
            versions: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn get(&self, handle: H) -> Option<&T> {
        let index = handle.index() as usize;
        if let Some(&v) = self.versions.get(index) {
            if v == handle.version() {
                return self.buf[index].as_ref();
            }
        }

        None
    }

    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        let index = handle.index() as usize;
        if let Some(&v) = self.versions.get(index) {
            if v == handle.version() {
                return self.buf[index].as_mut();
            }
        }

        None
    }

    pub fn create(&mut self, handle: H, value: T) {
        let index = handle.index() as usize;

        if self.buf.len() <= index {
            self.buf.resize_with(index + 1, || None);
            self.versions.resize(index + 1, 0);
        }

        self.buf[index] = Some(value);
        self.versions[index] = handle.version();
    }

    pub fn free(&mut self, handle: H) -> Option<T> {
        let index = handle.index() as usize;
        if let Some(&v) = self.versions.get(index) {
            if v == handle.version() {
                return self.buf[index].take();
            }
        }

        None
    }
}

impl<H, T> Default for DataVec<H, T>
where
    H: HandleLike,
{
    fn default() -> Self {
        DataVec::new()
    }
}
