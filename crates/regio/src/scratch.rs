//! Scratch views over a region's unused tail.
//!
//! A scratch view allocates downward from the parent's limit while the
//! parent keeps allocating upward from its cursor. The view's cursor *is*
//! the parent's limit cell, so neither side can claim the other's memory,
//! and every scratch allocation re-checks the parent's cursor first.
//! Dropping the view puts the parent's limit back: everything the view
//! allocated is reclaimed in one step and the parent sees exactly the
//! space it had before.
//!
//! # Example
//!
//! ```
//! use regio::Region;
//!
//! let mut buf = [0u8; 256];
//! let region = Region::new(&mut buf);
//! let before = region.available();
//! {
//!     let scratch = region.scratch();
//!     let tmp = scratch.alloc_zeroed::<u32>(16).unwrap();
//!     tmp[0] = 1;
//!     assert!(region.available() < before);
//! }
//! assert_eq!(region.available(), before);
//! ```

use std::cell::Cell;
use std::marker::PhantomData;

use log::trace;

use crate::region::{Cursor, Region};

impl<'a> Region<'a> {
    /// Borrow this region's unused space as a scratch view.
    ///
    /// Called on a scratch view, returns an equivalent view of the same
    /// scratch space: scratch depth never exceeds one. Such a collapsed view
    /// reclaims nothing when dropped; the memory goes back when the
    /// original view is dropped.
    ///
    /// Exhaustion inside the view lands at the boundary installed on this
    /// region when the allocation happens, if any.
    ///
    /// # Panics
    ///
    /// Panics if this region already has an active scratch view.
    pub fn scratch(&self) -> Region<'_> {
        if let Some(parent) = self.parent {
            return Region {
                base: self.base,
                cursor: Cursor::Borrowed(self.cursor.cell()),
                limit: Cell::new(self.limit.get()),
                last: Cell::new(self.last.get()),
                origin: self.origin,
                escape: Cell::new(None),
                upstream: Some(self),
                parent: Some(parent),
                restore: None,
                scratch_active: Cell::new(false),
                _buffer: PhantomData,
            };
        }

        assert!(
            !self.scratch_active.get(),
            "region already has an active scratch view"
        );
        self.scratch_active.set(true);

        let limit = self.limit.get();
        trace!("scratch view over {}..{limit}", self.cursor_offset());
        Region {
            base: self.base,
            cursor: Cursor::Borrowed(&self.limit),
            limit: Cell::new(self.cursor_offset()),
            last: Cell::new(limit),
            origin: limit,
            escape: Cell::new(None),
            upstream: Some(self),
            parent: Some(self),
            restore: Some(limit),
            scratch_active: Cell::new(false),
            _buffer: PhantomData,
        }
    }
}

impl Drop for Region<'_> {
    fn drop(&mut self) {
        if let (Some(parent), Some(limit)) = (self.parent, self.restore) {
            trace!(
                "scratch view released {} bytes",
                limit - self.cursor_offset()
            );
            parent.limit.set(limit);
            parent.scratch_active.set(false);
        }
    }
}
