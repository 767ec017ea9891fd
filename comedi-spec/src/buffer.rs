//! Exclusively owned sample buffers for instructions and commands.
//!
//! Assignment releases the old storage before allocating the new one. If the
//! allocation fails the buffer is left empty and the error is returned; the
//! previous contents are not restored.

use crate::error::ResourceError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleBuffer<T> {
    items: Vec<T>,
}

impl<T: Copy> SampleBuffer<T> {
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Replace the contents with `items`.
    pub fn assign<I>(&mut self, items: I) -> Result<(), ResourceError>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let items = items.into_iter();
        let requested = items.len();

        self.items = Vec::new();
        let mut fresh = Vec::new();
        if fresh.try_reserve_exact(requested).is_err() {
            tracing::warn!(requested, "sample buffer allocation failed");
            return Err(ResourceError::OutOfMemory { requested });
        }
        fresh.extend(items.take(requested));
        self.items = fresh;
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.get(index).copied()
    }

    /// Fresh copy of the stored samples
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.items.iter().copied()
    }

    /// Overwrite one stored sample in place
    pub fn set(&mut self, index: usize, value: T) -> bool {
        match self.items.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl<T: Copy + fmt::Display> fmt::Display for SampleBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", item)?;
        }
        write!(f, "]")
    }
}
