//! Immutable byte strings stored in region memory.
//!
//! An [`ArenaStr`] is a `(pointer, length)` view. Copying it copies the
//! view, never the bytes. Construction avoids copying whenever the bytes
//! already sit at the region tip, and [`ArenaStr::concat`] appends onto a
//! head at the tip instead of moving it, so a chain of concatenations
//! against one region costs only the bytes being appended.
//!
//! ```
//! use regio::{arena_format, ArenaStr, Region};
//!
//! let mut buf = [0u8; 256];
//! let region = Region::new(&mut buf);
//! let greeting = ArenaStr::copy(&region, "hello")?;
//! let greeting = ArenaStr::concat(&region, greeting, ", world")?;
//! assert_eq!(greeting, "hello, world");
//!
//! let line = arena_format!(&region, "{greeting} #{}", 7)?;
//! assert_eq!(line, "hello, world #7");
//! # Ok::<(), regio::ArenaError>(())
//! ```

use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;
use std::slice;
use std::str::{self, Utf8Error};

use crate::error::ArenaError;
use crate::flags::AllocFlags;
use crate::hash::fnv1a;
use crate::raw;
use crate::region::Region;

/// An immutable view of bytes, usually living in a region.
///
/// Not NUL-terminated. Equality and hashing look only at the bytes, so two
/// strings with the same contents are equal wherever they are stored.
#[derive(Clone, Copy)]
pub struct ArenaStr<'r> {
    ptr: NonNull<u8>,
    len: usize,
    _bytes: PhantomData<&'r [u8]>,
}

impl<'r> ArenaStr<'r> {
    /// The empty string. Claims no memory.
    pub const fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            _bytes: PhantomData,
        }
    }

    fn from_raw(ptr: NonNull<u8>, len: usize) -> Self {
        Self {
            ptr,
            len,
            _bytes: PhantomData,
        }
    }

    /// Make `bytes` a region string.
    ///
    /// Empty input gives the empty string, and input that already occupies
    /// the region tip is taken as is. Anything else is copied into the
    /// region.
    pub fn copy<B>(region: &'r Region<'_>, bytes: &'r B) -> Result<Self, ArenaError>
    where
        B: AsRef<[u8]> + ?Sized,
    {
        let bytes = bytes.as_ref();
        if bytes.is_empty() {
            return Ok(Self::empty());
        }
        let src = NonNull::from(bytes).cast::<u8>();
        if region.is_tip(src, bytes.len()) {
            return Ok(Self::from_raw(src, bytes.len()));
        }
        let dst = region.alloc_raw(1, 1, bytes.len(), AllocFlags::NO_INIT)?;
        // SAFETY: `dst` was just claimed for `bytes.len()` bytes and is
        // disjoint from `bytes`.
        unsafe { raw::copy_bytes(bytes, dst) };
        Ok(Self::from_raw(dst, bytes.len()))
    }

    /// The contents of `head` followed by `tail`.
    ///
    /// In a forward region the head is moved to the tip first if it is not
    /// already there, and `tail` is then written directly after it. Repeated
    /// concatenation onto the result therefore never copies the head again,
    /// as long as nothing else allocates from the region in between. In a
    /// scratch view both parts are copied into one fresh block.
    pub fn concat<B>(region: &'r Region<'_>, head: Self, tail: &'r B) -> Result<Self, ArenaError>
    where
        B: AsRef<[u8]> + ?Sized,
    {
        let tail = tail.as_ref();
        if head.is_empty() {
            return Self::copy(region, tail);
        }
        if tail.is_empty() {
            // The head still moves to the tip, so the next append splices.
            return if region.is_forward() {
                Self::copy(region, head.as_bytes())
            } else {
                Ok(head)
            };
        }
        let Some(len) = head.len.checked_add(tail.len()) else {
            return Err(ArenaError::Exhausted {
                requested: usize::MAX,
                available: region.available(),
            });
        };

        if !region.is_forward() {
            let dst = region.alloc_raw(1, 1, len, AllocFlags::NO_INIT)?;
            // SAFETY: `dst` holds `len` freshly claimed bytes; neither part
            // can overlap memory that was unclaimed until now.
            unsafe {
                raw::copy_bytes(head.as_bytes(), dst);
                raw::copy_bytes(tail, raw::at(dst, head.len));
            }
            return Ok(Self::from_raw(dst, len));
        }

        let head = Self::copy(region, head.as_bytes())?;
        let dst = region.extend_tip(1, tail.len(), AllocFlags::NO_INIT)?;
        debug_assert_eq!(raw::addr(dst), raw::addr(head.ptr) + head.len);
        // SAFETY: `dst` starts the bytes just claimed after the head.
        unsafe { raw::copy_bytes(tail, dst) };
        Ok(Self::from_raw(head.ptr, len))
    }

    /// Render `args` into the region.
    ///
    /// The arguments are formatted twice: once to measure, once to write
    /// into a block of exactly that size plus a NUL byte. In a forward
    /// region the NUL is handed back to the region but left in place, so it
    /// stays readable after the string until the next allocation reuses it.
    /// Usually called through [`arena_format!`](crate::arena_format).
    ///
    /// Returns [`ArenaError::Format`] if a `Display` impl fails or renders
    /// differently the second time.
    pub fn format(region: &'r Region<'_>, args: fmt::Arguments<'_>) -> Result<Self, ArenaError> {
        let mut measure = Measure(0);
        measure.write_fmt(args).map_err(|_| ArenaError::Format)?;
        let len = measure.0;

        let tip = region.last.get();
        let ptr = region.alloc_raw(1, 1, len + 1, AllocFlags::NO_INIT)?;
        let mut render = Render {
            dst: ptr,
            cap: len,
            written: 0,
        };
        if render.write_fmt(args).is_err() || render.written != len {
            if region.is_forward() {
                region.retract(len + 1);
                region.last.set(tip);
            }
            return Err(ArenaError::Format);
        }
        // SAFETY: byte `len` is the last of the `len + 1` claimed.
        unsafe { raw::at(ptr, len).write(0) };
        if region.is_forward() {
            region.retract(1);
            if len == 0 {
                // Nothing was kept, so the earlier block is still the tip.
                region.last.set(tip);
            }
        }
        Ok(Self::from_raw(ptr, len))
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the string has no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The bytes, for as long as the region keeps them.
    #[inline]
    pub fn as_bytes(&self) -> &'r [u8] {
        // SAFETY: `ptr..ptr + len` was initialised at construction and the
        // lifetime keeps the backing memory claimed.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The bytes as UTF-8.
    pub fn to_str(&self) -> Result<&'r str, Utf8Error> {
        str::from_utf8(self.as_bytes())
    }

    /// 64-bit FNV-1a hash of the bytes.
    pub fn fnv1a(&self) -> u64 {
        fnv1a(self.as_bytes())
    }
}

/// Counts bytes without storing them.
struct Measure(usize);

impl fmt::Write for Measure {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 = self.0.saturating_add(s.len());
        Ok(())
    }
}

/// Writes into a claimed block, refusing to run past `cap`.
struct Render {
    dst: NonNull<u8>,
    cap: usize,
    written: usize,
}

impl fmt::Write for Render {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if s.len() > self.cap - self.written {
            return Err(fmt::Error);
        }
        // SAFETY: `written + s.len() <= cap`, inside the claimed block.
        unsafe { raw::copy_bytes(s.as_bytes(), raw::at(self.dst, self.written)) };
        self.written += s.len();
        Ok(())
    }
}

/// Format into a region, producing a [`ArenaStr`].
///
/// `arena_format!(region, "...", args..)` is shorthand for
/// [`ArenaStr::format`] with [`format_args!`].
#[macro_export]
macro_rules! arena_format {
    ($region:expr, $($arg:tt)*) => {
        $crate::ArenaStr::format($region, ::std::format_args!($($arg)*))
    };
}

impl Default for ArenaStr<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for ArenaStr<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for ArenaStr<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq for ArenaStr<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for ArenaStr<'_> {}

impl PartialEq<[u8]> for ArenaStr<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<str> for ArenaStr<'_> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for ArenaStr<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Hash for ArenaStr<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(self.as_bytes());
    }
}

impl fmt::Debug for ArenaStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

impl fmt::Display for ArenaStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&String::from_utf8_lossy(self.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::FnvBuildHasher;
    use regio_test_utils::AlignedBuf;
    use std::hash::BuildHasher;

    #[test]
    fn copy_of_empty_claims_nothing() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let s = ArenaStr::copy(&region, "").unwrap();
        assert!(s.is_empty());
        assert_eq!(region.used(), 0);
    }

    #[test]
    fn copy_at_tip_is_a_no_op() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let first = ArenaStr::copy(&region, "tip").unwrap();
        let again = ArenaStr::copy(&region, first.as_bytes()).unwrap();
        assert_eq!(again.as_ptr(), first.as_ptr());
        assert_eq!(region.used(), 3);
    }

    #[test]
    fn copy_away_from_tip_duplicates() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let first = ArenaStr::copy(&region, "abc").unwrap();
        region.alloc_raw(1, 1, 1, AllocFlags::empty()).unwrap();
        let second = ArenaStr::copy(&region, first.as_bytes()).unwrap();
        assert_ne!(second.as_ptr(), first.as_ptr());
        assert_eq!(second, first);
    }

    #[test]
    fn concat_splices_at_the_tip() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let a = ArenaStr::copy(&region, "a").unwrap();
        let ab = ArenaStr::concat(&region, a, "b").unwrap();
        let abc = ArenaStr::concat(&region, ab, "c").unwrap();
        assert_eq!(abc, "abc");
        assert_eq!(abc.as_ptr(), a.as_ptr());
        assert_eq!(region.used(), 3);
    }

    #[test]
    fn concat_moves_head_to_the_tip_once() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let head = ArenaStr::copy(&region, "head").unwrap();
        region.alloc_raw(1, 1, 2, AllocFlags::empty()).unwrap();
        let joined = ArenaStr::concat(&region, head, "+tail").unwrap();
        assert_eq!(joined, "head+tail");
        assert_eq!(head, "head");
        assert_eq!(region.used(), 4 + 2 + 9);
    }

    #[test]
    fn concat_with_empty_parts() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let x = ArenaStr::concat(&region, ArenaStr::empty(), "x").unwrap();
        assert_eq!(x, "x");
        let same = ArenaStr::concat(&region, x, "").unwrap();
        assert_eq!(same.as_ptr(), x.as_ptr());
        assert_eq!(region.used(), 1);
    }

    #[test]
    fn concat_with_empty_tail_moves_the_head_to_the_tip() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let head = ArenaStr::copy(&region, "head").unwrap();
        region.alloc_raw(1, 1, 2, AllocFlags::empty()).unwrap();

        let moved = ArenaStr::concat(&region, head, "").unwrap();
        assert_eq!(moved, "head");
        assert_ne!(moved.as_ptr(), head.as_ptr());
        assert_eq!(region.used(), 4 + 2 + 4);

        let spliced = ArenaStr::concat(&region, moved, "!").unwrap();
        assert_eq!(spliced.as_ptr(), moved.as_ptr());
        assert_eq!(region.used(), 4 + 2 + 5);
    }

    #[test]
    fn zero_byte_claim_does_not_cost_the_head_its_tip() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let a = ArenaStr::copy(&region, "ab").unwrap();
        region.alloc_raw(1, 1, 0, AllocFlags::empty()).unwrap();
        let abc = ArenaStr::concat(&region, a, "c").unwrap();
        assert_eq!(abc, "abc");
        assert_eq!(abc.as_ptr(), a.as_ptr());
        assert_eq!(region.used(), 3);
    }

    #[test]
    fn empty_format_leaves_the_tip_block_in_place() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let name = ArenaStr::copy(&region, "name").unwrap();
        let nothing = crate::arena_format!(&region, "{}", "").unwrap();
        assert!(nothing.is_empty());
        assert_eq!(region.used(), 4);

        let joined = ArenaStr::concat(&region, name, "=1").unwrap();
        assert_eq!(joined, "name=1");
        assert_eq!(joined.as_ptr(), name.as_ptr());
    }

    #[test]
    fn concat_in_scratch_copies_both_parts() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let scratch = region.scratch();
        let a = ArenaStr::copy(&scratch, "left").unwrap();
        let b = ArenaStr::concat(&scratch, a, "right").unwrap();
        assert_eq!(b, "leftright");
        assert_eq!(a, "left");
        assert_eq!(region.used(), 0);
    }

    #[test]
    fn format_measures_and_retracts_the_sentinel() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let s = crate::arena_format!(&region, "{}-{:03}", "id", 7).unwrap();
        assert_eq!(s, "id-007");
        assert_eq!(region.used(), 6);
        // The result sits at the tip, so it can be extended in place.
        let longer = ArenaStr::concat(&region, s, "!").unwrap();
        assert_eq!(longer.as_ptr(), s.as_ptr());
    }

    #[test]
    fn format_sentinel_survives_until_reuse() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let s = crate::arena_format!(&region, "{}", 42).unwrap();
        let next = region.alloc_raw(1, 1, 1, AllocFlags::NO_INIT).unwrap();
        assert_eq!(raw::addr(next), raw::addr(s.ptr) + s.len());
        // SAFETY: one byte was just claimed without initialisation; it still
        // holds the sentinel.
        assert_eq!(unsafe { next.read() }, 0);
    }

    #[test]
    fn format_in_scratch_keeps_the_sentinel_claimed() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let scratch = region.scratch();
        let s = crate::arena_format!(&scratch, "{}", 12345).unwrap();
        assert_eq!(s, "12345");
        assert_eq!(scratch.used(), 6);
    }

    #[test]
    fn format_exhaustion_is_reported() {
        let mut buf = AlignedBuf::<8>::new();
        let region = Region::new(buf.as_mut_slice());
        let err = crate::arena_format!(&region, "{}", "far too long").unwrap_err();
        assert!(err.is_exhausted());
    }

    #[test]
    fn unstable_display_is_a_format_error() {
        use std::cell::Cell;

        struct Grows(Cell<usize>);
        impl fmt::Display for Grows {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.set(self.0.get() + 1);
                write!(f, "{}", "x".repeat(self.0.get()))
            }
        }

        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let err = crate::arena_format!(&region, "{}", Grows(Cell::new(0))).unwrap_err();
        assert_eq!(err, ArenaError::Format);
        assert_eq!(region.used(), 0);
    }

    #[test]
    fn failed_format_keeps_the_earlier_tip() {
        use std::cell::Cell;

        struct Shrinks(Cell<usize>);
        impl fmt::Display for Shrinks {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let n = self.0.get();
                self.0.set(n.saturating_sub(1));
                write!(f, "{}", "y".repeat(n))
            }
        }

        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let head = ArenaStr::copy(&region, "k").unwrap();
        let err = crate::arena_format!(&region, "{}", Shrinks(Cell::new(3))).unwrap_err();
        assert_eq!(err, ArenaError::Format);
        assert!(region.is_tip(head.ptr, head.len()));
    }

    #[test]
    fn equality_checks_length_then_bytes() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let a = ArenaStr::copy(&region, "same").unwrap();
        let b = ArenaStr::copy(&region, b"same").unwrap();
        let c = ArenaStr::copy(&region, "sam").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(ArenaStr::empty(), ArenaStr::default());
        assert!(a == *"same");
        assert!(a == b"same"[..]);
    }

    #[test]
    fn hash_feeds_only_the_bytes() {
        let mut buf = AlignedBuf::<64>::new();
        let region = Region::new(buf.as_mut_slice());
        let s = ArenaStr::copy(&region, "foobar").unwrap();
        assert_eq!(s.fnv1a(), 0x85944171f73967e8);
        assert_eq!(FnvBuildHasher::default().hash_one(s), s.fnv1a());
    }

    #[test]
    fn display_and_debug_are_lossy() {
        let bytes = [b'o', b'k', 0xff];
        let s = ArenaStr::from_raw(NonNull::from(&bytes).cast(), bytes.len());
        assert_eq!(s.to_string(), "ok\u{fffd}");
        assert_eq!(format!("{s:?}"), "\"ok\u{fffd}\"");
        assert!(s.to_str().is_err());
    }
}
