//! Growable sequence stored in region memory.
//!
//! A [`Slice`] does not own its region; every growing call takes the region
//! explicitly. Growth prefers extending the block in place, which is
//! possible whenever the block is still the region's most recent
//! allocation. Otherwise the elements are copied to a larger block and the
//! old one is abandoned to the region.
//!
//! ```
//! use regio::{Region, Slice};
//!
//! let mut buf = vec![0u8; 4096];
//! let region = Region::new(&mut buf);
//! let mut squares = Slice::new();
//! for i in 0..100u64 {
//!     squares.push(&region, i * i).unwrap();
//! }
//! assert_eq!(squares[99], 9801);
//! assert_eq!(squares.relocations(), 0);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

use log::trace;

use crate::config::SliceConfig;
use crate::error::ArenaError;
use crate::flags::AllocFlags;
use crate::region::Region;

/// A growable sequence of `T` living in region memory.
///
/// Elements are never dropped: the region does not run destructors.
/// A slice should be grown against one region (or views of the same
/// region); the tip check makes growth correct regardless, only slower.
pub struct Slice<'r, T> {
    data: NonNull<T>,
    len: usize,
    cap: usize,
    config: SliceConfig,
    relocations: usize,
    _region: PhantomData<&'r mut [T]>,
}

impl<'r, T> Slice<'r, T> {
    /// An empty slice with the default growth configuration.
    ///
    /// No memory is claimed until the first push.
    pub fn new() -> Self {
        Self::with_valid_config(SliceConfig::DEFAULT)
    }

    /// An empty slice with a custom growth configuration.
    pub fn with_config(config: SliceConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: SliceConfig) -> Self {
        Self {
            data: NonNull::dangling(),
            len: 0,
            cap: 0,
            config,
            relocations: 0,
            _region: PhantomData,
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the slice has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the current block holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Number of times growth had to copy the elements to a new block.
    pub fn relocations(&self) -> usize {
        self.relocations
    }

    /// The growth configuration.
    pub fn config(&self) -> &SliceConfig {
        &self.config
    }

    /// Append `value`, growing through `region` if the block is full.
    ///
    /// Returns the new last element. On exhaustion the slice is unchanged
    /// and `value` is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    pub fn push(&mut self, region: &'r Region<'_>, value: T) -> Result<&mut T, ArenaError> {
        if self.len == self.cap {
            self.grow(region)?;
        }
        // SAFETY: `len < cap`, so the slot is inside the block and unused.
        unsafe {
            let slot = self.data.add(self.len);
            slot.write(value);
            self.len += 1;
            Ok(&mut *slot.as_ptr())
        }
    }

    fn grow(&mut self, region: &'r Region<'_>) -> Result<(), ArenaError> {
        let size = mem::size_of::<T>();
        let align = mem::align_of::<T>();

        if self.cap == 0 {
            let initial = self.config.initial;
            self.data = region.alloc_raw(size, align, initial, AllocFlags::NO_INIT)?.cast();
            self.cap = initial;
            return Ok(());
        }

        if region.is_tip(self.data.cast(), self.cap * size) {
            let increment = self.config.increment;
            region.extend_tip(size, increment, AllocFlags::NO_INIT)?;
            self.cap += increment;
            return Ok(());
        }

        let cap = self.config.next_capacity(self.cap);
        let data = region
            .alloc_raw(size, align, cap, AllocFlags::NO_INIT)?
            .cast::<T>();
        // SAFETY: the new block is freshly claimed, holds `cap > len`
        // elements, and cannot overlap the old one. The old copies are
        // never read again.
        unsafe { ptr::copy_nonoverlapping(self.data.as_ptr(), data.as_ptr(), self.len) };
        trace!(
            "slice relocated: {} -> {cap} elements ({} copied)",
            self.cap,
            self.len
        );
        self.data = data;
        self.cap = cap;
        self.relocations += 1;
        Ok(())
    }

    /// Remove and return the last element.
    ///
    /// The slot stays claimed and is reused by the next push.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot was initialised and is now outside `len`.
        Some(unsafe { self.data.add(self.len).read() })
    }

    /// Forget every element, keeping the block.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// The elements as a shared slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots are initialised; a dangling pointer
        // is valid for an empty slice.
        unsafe { slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    /// The elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as for `as_slice`, and `&mut self` is exclusive.
        unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), self.len) }
    }

    /// The element at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }
}

impl<'r, T: Copy> Slice<'r, T> {
    /// Append every element of `items`.
    ///
    /// Stops at the first exhaustion; elements pushed before it stay.
    pub fn extend_from_slice(
        &mut self,
        region: &'r Region<'_>,
        items: &[T],
    ) -> Result<(), ArenaError> {
        for &item in items {
            self.push(region, item)?;
        }
        Ok(())
    }
}

impl<T> Default for Slice<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for Slice<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for Slice<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<'s, T> IntoIterator for &'s Slice<'_, T> {
    type Item = &'s T;
    type IntoIter = slice::Iter<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for Slice<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
