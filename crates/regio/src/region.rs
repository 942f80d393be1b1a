//! Bump-pointer region over one contiguous buffer.
//!
//! A [`Region`] hands out memory by moving a cursor toward a limit. The
//! direction follows from their order: `cursor < limit` bumps upward
//! (forward), `cursor > limit` bumps downward (backward). A scratch view
//! swaps the two relative to its parent, so one allocation routine serves
//! both directions:
//!
//! ```text
//! base                                                     base + len
//! | parent, used | cursor ->     free     <- limit | scratch, used |
//! ```
//!
//! Positions are byte offsets from the buffer base. Regions derived from
//! the same buffer (scratch views, pushed sub-regions) share the base, so
//! positions compare by value across them.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::ptr::NonNull;
use std::slice;

use log::debug;

use crate::error::ArenaError;
use crate::escape::{self, EscapeFrame};
use crate::flags::AllocFlags;
use crate::raw;
use crate::zeroable::Zeroable;

/// Storage for a region's cursor.
///
/// A scratch view does not own its cursor: it bumps its parent's limit
/// cell directly, which keeps the parent from allocating into scratch
/// memory while the view is alive.
pub(crate) enum Cursor<'a> {
    Owned(Cell<usize>),
    Borrowed(&'a Cell<usize>),
}

impl Cursor<'_> {
    #[inline]
    pub(crate) fn cell(&self) -> &Cell<usize> {
        match self {
            Self::Owned(cell) => cell,
            Self::Borrowed(cell) => cell,
        }
    }
}

/// A bump allocator over a single contiguous buffer.
///
/// All allocation goes through [`Region::alloc_raw`]; the typed helpers are
/// thin wrappers around it. Allocation takes `&self`, so references handed
/// out earlier stay usable while more memory is claimed. Nothing is ever
/// freed individually and destructors of allocated values never run.
///
/// Exhaustion is reported as [`ArenaError::Exhausted`] unless an escape is
/// installed (see [`Region::with_escape`]), in which case it aborts the
/// enclosing unit of work instead.
///
/// A `Region` is single-threaded: it is neither `Send` nor `Sync`.
pub struct Region<'a> {
    /// Start of the backing buffer. Dangling for a zero-capacity region.
    pub(crate) base: NonNull<u8>,
    /// Next allocation boundary.
    pub(crate) cursor: Cursor<'a>,
    /// End of usable space in the current direction.
    pub(crate) limit: Cell<usize>,
    /// Start of the most recent forward allocation (the tip block).
    pub(crate) last: Cell<usize>,
    /// Cursor position when the region was created.
    pub(crate) origin: usize,
    /// Innermost escape frame installed on this region itself.
    pub(crate) escape: Cell<Option<NonNull<EscapeFrame>>>,
    /// Region whose boundaries apply when none is installed here.
    pub(crate) upstream: Option<&'a Region<'a>>,
    /// Present only on scratch views.
    pub(crate) parent: Option<&'a Region<'a>>,
    /// Parent limit a scratch view puts back when dropped.
    pub(crate) restore: Option<usize>,
    /// Whether a scratch view currently borrows this region's limit.
    pub(crate) scratch_active: Cell<bool>,
    pub(crate) _buffer: PhantomData<&'a mut [u8]>,
}

impl<'a> Region<'a> {
    /// Create a region over a caller-owned buffer.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        let len = buffer.len();
        Self::over(NonNull::from(buffer).cast(), len)
    }

    /// Create a region over uninitialised memory.
    pub fn from_uninit(buffer: &'a mut [MaybeUninit<u8>]) -> Self {
        let len = buffer.len();
        Self::over(NonNull::from(buffer).cast(), len)
    }

    /// Create a region over `len` bytes starting at `ptr`.
    ///
    /// A null `ptr` yields a zero-capacity region, whatever `len` says.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be valid for reads and writes of `len` bytes
    /// for `'a`, and nothing else may access that memory while the region
    /// or anything allocated from it is alive.
    pub unsafe fn from_raw_parts(ptr: *mut u8, len: usize) -> Self {
        match NonNull::new(ptr) {
            Some(base) => Self::over(base, len),
            None => Self::empty(),
        }
    }

    /// A region with zero capacity. Every non-empty allocation fails.
    pub fn empty() -> Self {
        Self::over(NonNull::dangling(), 0)
    }

    fn over(base: NonNull<u8>, len: usize) -> Self {
        Self::span(base, 0, len, None)
    }

    /// A forward region over `start..end` of the buffer at `base`.
    pub(crate) fn span(
        base: NonNull<u8>,
        start: usize,
        end: usize,
        upstream: Option<&'a Region<'a>>,
    ) -> Self {
        Self {
            base,
            cursor: Cursor::Owned(Cell::new(start)),
            limit: Cell::new(end),
            last: Cell::new(start),
            origin: start,
            escape: Cell::new(None),
            upstream,
            parent: None,
            restore: None,
            scratch_active: Cell::new(false),
            _buffer: PhantomData,
        }
    }

    /// Current cursor, as a byte offset from the buffer base.
    #[inline]
    pub fn cursor_offset(&self) -> usize {
        self.cursor.cell().get()
    }

    /// Current limit, as a byte offset from the buffer base.
    ///
    /// For a scratch view this is the parent's cursor.
    #[inline]
    pub fn limit_offset(&self) -> usize {
        match self.parent {
            Some(parent) => parent.cursor_offset(),
            None => self.limit.get(),
        }
    }

    /// Bytes between the cursor and the limit, before alignment padding.
    pub fn available(&self) -> usize {
        self.cursor_offset().abs_diff(self.limit_offset())
    }

    /// Bytes this region has moved its cursor since it was created.
    ///
    /// Allocations made with [`AllocFlags::FROM_END`] are not counted.
    pub fn used(&self) -> usize {
        self.cursor_offset().abs_diff(self.origin)
    }

    /// Bytes this region spans from its origin to its current limit.
    pub fn capacity(&self) -> usize {
        self.origin.abs_diff(self.limit_offset())
    }

    /// Whether this region is a scratch view over another region.
    #[inline]
    pub fn is_scratch(&self) -> bool {
        self.parent.is_some()
    }

    /// Whether allocations move the cursor toward higher addresses.
    #[inline]
    pub fn is_forward(&self) -> bool {
        !self.is_scratch()
    }

    /// Whether an escape boundary is installed for this region, either on
    /// it directly or on a region it was derived from.
    pub fn has_escape(&self) -> bool {
        self.active_escape().is_some()
    }

    /// Innermost frame an exhaustion here would unwind to.
    ///
    /// Resolved on every call so a view that outlives a boundary never
    /// unwinds to a frame that has been removed.
    pub(crate) fn active_escape(&self) -> Option<NonNull<EscapeFrame>> {
        let mut region = self;
        loop {
            if let Some(frame) = region.escape.get() {
                return Some(frame);
            }
            region = region.upstream?;
        }
    }

    /// Claim `count` elements of `size` bytes aligned to `align`.
    ///
    /// The memory is zero-filled unless [`AllocFlags::NO_INIT`] is set. On
    /// exhaustion the region is left unchanged and the call either returns
    /// [`ArenaError::Exhausted`] ([`AllocFlags::SOFT_FAIL`], or no escape
    /// installed) or unwinds to the installed escape boundary.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero, if `align` is not a power of two, or if
    /// [`AllocFlags::FROM_END`] is requested on a scratch view or while a
    /// scratch view is active.
    pub fn alloc_raw(
        &self,
        size: usize,
        align: usize,
        count: usize,
        flags: AllocFlags,
    ) -> Result<NonNull<u8>, ArenaError> {
        assert!(size > 0, "element size must be non-zero");
        assert!(
            align.is_power_of_two(),
            "alignment must be a power of two (got {align})"
        );

        let Some(offset) = self.bump(size, align, count, flags) else {
            return self.exhausted(size.saturating_mul(count), flags);
        };
        // SAFETY: `bump` only returns offsets of spans inside the buffer.
        let ptr = unsafe { raw::at(self.base, offset) };
        if !flags.contains(AllocFlags::NO_INIT) {
            // SAFETY: the span was claimed just now and nothing refers to it.
            unsafe { raw::zero(ptr, size * count) };
        }
        Ok(ptr)
    }

    /// Move the cursor (or, for `FROM_END`, the limit) and return the start
    /// offset of the claimed span.
    fn bump(&self, size: usize, align: usize, count: usize, flags: AllocFlags) -> Option<usize> {
        if let Some(parent) = self.parent {
            // The parent may have allocated since our last call.
            self.limit.set(parent.cursor_offset());
        }

        if flags.contains(AllocFlags::FROM_END) {
            assert!(
                !self.is_scratch(),
                "FROM_END is not available on a scratch view"
            );
            assert!(
                !self.scratch_active.get(),
                "FROM_END while a scratch view borrows the limit"
            );
            return self.bump_cell(&self.limit, self.cursor_offset(), size, align, count);
        }

        let before = self.cursor_offset();
        let start = self.bump_cell(self.cursor.cell(), self.limit.get(), size, align, count)?;
        // A claim that did not move the cursor leaves the tip block alone.
        if self.is_forward() && self.cursor_offset() != before {
            self.last.set(start);
        }
        Some(start)
    }

    /// Bump `cell` toward `far`. The direction is the sign of `far - cell`.
    fn bump_cell(
        &self,
        cell: &Cell<usize>,
        far: usize,
        size: usize,
        align: usize,
        count: usize,
    ) -> Option<usize> {
        let at = cell.get();
        let base = raw::addr(self.base);
        let mask = align - 1;

        if at < far {
            let avail = far - at;
            let padding = (base + at).wrapping_neg() & mask;
            if count > avail.checked_sub(padding)? / size {
                return None;
            }
            let start = at + padding;
            cell.set(start + size * count);
            Some(start)
        } else {
            let avail = at - far;
            if count > avail / size {
                return None;
            }
            let bytes = size * count;
            let end = at - bytes;
            let padding = (base + end) & mask;
            if padding > avail - bytes {
                return None;
            }
            let start = end - padding;
            cell.set(start);
            Some(start)
        }
    }

    #[cold]
    fn exhausted(&self, requested: usize, flags: AllocFlags) -> Result<NonNull<u8>, ArenaError> {
        let error = ArenaError::Exhausted {
            requested,
            available: self.available(),
        };
        let target = match self.active_escape() {
            Some(frame) if !flags.contains(AllocFlags::SOFT_FAIL) => Some(frame),
            _ => None,
        };
        debug!(
            "region exhausted: requested {requested} bytes, available {} bytes (scratch={}, escape={})",
            self.available(),
            self.is_scratch(),
            target.is_some(),
        );
        match target {
            Some(frame) => escape::unwind(frame, error),
            None => Err(error),
        }
    }

    /// Move `value` into the region.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_from<T>(&self, value: T) -> Result<&mut T, ArenaError> {
        let ptr = self
            .alloc_raw(mem::size_of::<T>(), mem::align_of::<T>(), 1, AllocFlags::NO_INIT)?
            .cast::<T>();
        // SAFETY: `ptr` is aligned for `T`, sized for one `T` and claimed
        // exclusively by this call.
        unsafe {
            ptr.write(value);
            Ok(&mut *ptr.as_ptr())
        }
    }

    /// Allocate `count` zero-valued elements.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_zeroed<T: Zeroable>(&self, count: usize) -> Result<&mut [T], ArenaError> {
        let ptr = self
            .alloc_raw(
                mem::size_of::<T>(),
                mem::align_of::<T>(),
                count,
                AllocFlags::empty(),
            )?
            .cast::<T>();
        // SAFETY: zero-filled, aligned, exclusively claimed, and `T:
        // Zeroable` makes the zero pattern a valid `T`.
        Ok(unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), count) })
    }

    /// Copy `src` into the region.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> Result<&mut [T], ArenaError> {
        let ptr = self
            .alloc_raw(
                mem::size_of::<T>(),
                mem::align_of::<T>(),
                src.len(),
                AllocFlags::NO_INIT,
            )?
            .cast::<T>();
        // SAFETY: the destination is aligned, sized for `src.len()`
        // elements, freshly claimed, and cannot overlap `src`.
        unsafe {
            ptr.copy_from_nonoverlapping(NonNull::from(src).cast::<T>(), src.len());
            Ok(slice::from_raw_parts_mut(ptr.as_ptr(), src.len()))
        }
    }

    /// Allocate `count` uninitialised elements.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_uninit<T>(&self, count: usize) -> Result<&mut [MaybeUninit<T>], ArenaError> {
        let ptr = self
            .alloc_raw(
                mem::size_of::<T>(),
                mem::align_of::<T>(),
                count,
                AllocFlags::NO_INIT,
            )?
            .cast::<MaybeUninit<T>>();
        // SAFETY: aligned and exclusively claimed; `MaybeUninit` needs no
        // initialisation.
        Ok(unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), count) })
    }

    /// Whether `ptr..ptr + len` ends exactly at the cursor of a forward
    /// region and lies within its most recent allocation.
    ///
    /// A block at the tip can be extended in place.
    pub fn is_tip(&self, ptr: NonNull<u8>, len: usize) -> bool {
        if !self.is_forward() {
            return false;
        }
        match raw::offset_from(self.base, ptr) {
            Some(start) => {
                start >= self.last.get() && start.checked_add(len) == Some(self.cursor_offset())
            }
            None => false,
        }
    }

    /// Claim `count * size` bytes directly after the tip block, keeping the
    /// block recorded as the tip.
    pub(crate) fn extend_tip(
        &self,
        size: usize,
        count: usize,
        flags: AllocFlags,
    ) -> Result<NonNull<u8>, ArenaError> {
        debug_assert!(self.is_forward());
        let last = self.last.get();
        let ptr = self.alloc_raw(size, 1, count, flags)?;
        self.last.set(last);
        Ok(ptr)
    }

    /// Hand the last `bytes` of the tip block back to the region.
    pub(crate) fn retract(&self, bytes: usize) {
        let cursor = self.cursor_offset();
        assert!(
            self.is_forward() && cursor - bytes >= self.last.get(),
            "retract past the start of the tip block"
        );
        self.cursor.cell().set(cursor - bytes);
    }
}

impl fmt::Debug for Region<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("cursor", &self.cursor_offset())
            .field("limit", &self.limit_offset())
            .field("scratch", &self.is_scratch())
            .field("escape", &self.has_escape())
            .finish()
    }
}
