//! Accounted sub-regions carved from a region's tail.
//!
//! Unlike a scratch view, a pushed sub-region is a real allocation: the
//! owner's limit (or a scratch owner's cursor) moves past the chunk, so the
//! owner cannot hand the same bytes out again until the chunk is popped.
//! Release is tied to the [`SubRegion`] handle and checked for LIFO order.

use std::cell::Cell;
use std::ops::Deref;
use std::thread;

use log::trace;

use crate::config::SUBREGION_DIVISOR;
use crate::error::ArenaError;
use crate::flags::AllocFlags;
use crate::raw;
use crate::region::Region;

/// A forward region over a chunk claimed from another region.
///
/// Dereferences to the chunk's [`Region`]. Dropping the handle (or calling
/// [`SubRegion::pop`]) gives the whole chunk back to its owner.
pub struct SubRegion<'p> {
    region: Region<'p>,
    owner: &'p Region<'p>,
    /// The owner cell the push moved.
    gate: &'p Cell<usize>,
    start: usize,
    end: usize,
}

impl<'a> Region<'a> {
    /// Push a sub-region over the trailing half of the available space.
    ///
    /// Equivalent to [`push_subregion_sized`](Region::push_subregion_sized)
    /// with `available() / 2` bytes.
    pub fn push_subregion(&self) -> Result<SubRegion<'_>, ArenaError> {
        self.push_subregion_sized(self.available() / SUBREGION_DIVISOR)
    }

    /// Push a sub-region of exactly `bytes` bytes.
    ///
    /// A forward region gives up the chunk at its limit side; a scratch view
    /// gives it up at its cursor. Either way the owner's remaining space
    /// shrinks by `bytes` until the sub-region is popped. Exhaustion in the
    /// sub-region unwinds to whatever boundary is installed on the owner at
    /// the time.
    ///
    /// # Panics
    ///
    /// Panics if a scratch view is active on this region.
    pub fn push_subregion_sized(&self, bytes: usize) -> Result<SubRegion<'_>, ArenaError> {
        assert!(
            !self.scratch_active.get(),
            "cannot push a sub-region while a scratch view is active"
        );
        let (flags, gate) = if self.is_scratch() {
            (AllocFlags::NO_INIT, self.cursor.cell())
        } else {
            (AllocFlags::NO_INIT | AllocFlags::FROM_END, &self.limit)
        };
        let ptr = self.alloc_raw(1, 1, bytes, flags)?;
        let start = raw::addr(ptr) - raw::addr(self.base);
        let end = start + bytes;
        trace!("sub-region pushed over {start}..{end}");

        Ok(SubRegion {
            region: Region::span(self.base, start, end, Some(self)),
            owner: self,
            gate,
            start,
            end,
        })
    }
}

impl SubRegion<'_> {
    /// Give the chunk back to the owner.
    ///
    /// # Panics
    ///
    /// Panics if the owner has pushed another sub-region that is still live,
    /// or has a scratch view active.
    pub fn pop(self) {
        drop(self);
    }

    fn release(&self) {
        let nested = self.gate.get() == self.start && !self.owner.scratch_active.get();
        if nested {
            self.gate.set(self.end);
            trace!("sub-region popped, {}..{} reclaimed", self.start, self.end);
        } else if !thread::panicking() {
            panic!(
                "sub-region {}..{} released out of order (owner at {})",
                self.start,
                self.end,
                self.gate.get()
            );
        }
    }
}

impl<'p> Deref for SubRegion<'p> {
    type Target = Region<'p>;

    fn deref(&self) -> &Region<'p> {
        &self.region
    }
}

impl Drop for SubRegion<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
