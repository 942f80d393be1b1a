//! Low-level primitives for region memory operations.
//!
//! The pointer arithmetic the rest of the crate relies on lives here. Each
//! `unsafe` function states the contract its callers uphold, and every call
//! site restates why it holds in a `// SAFETY:` comment.

use std::ptr::NonNull;

/// Absolute address of `ptr`.
#[inline]
pub(crate) fn addr<T>(ptr: NonNull<T>) -> usize {
    ptr.as_ptr().addr()
}

/// Byte offset of `ptr` from `base`, or `None` if `ptr` lies below `base`.
#[inline]
pub(crate) fn offset_from(base: NonNull<u8>, ptr: NonNull<u8>) -> Option<usize> {
    addr(ptr).checked_sub(addr(base))
}

/// Pointer to byte `offset` of the buffer starting at `base`.
///
/// # Safety
///
/// `offset` must not exceed the length of the buffer `base` points into.
#[inline]
pub(crate) unsafe fn at(base: NonNull<u8>, offset: usize) -> NonNull<u8> {
    // SAFETY: in bounds per the caller's contract.
    unsafe { base.add(offset) }
}

/// Fill `len` bytes starting at `ptr` with zero.
///
/// # Safety
///
/// `ptr..ptr + len` must be valid for writes and not referenced by any live
/// borrow.
#[inline]
pub(crate) unsafe fn zero(ptr: NonNull<u8>, len: usize) {
    // SAFETY: forwarded to the caller.
    unsafe { ptr.write_bytes(0, len) }
}

/// Copy `src` into the memory starting at `dst`.
///
/// # Safety
///
/// `dst..dst + src.len()` must be valid for writes, must not overlap `src`,
/// and must not be referenced by any live borrow.
#[inline]
pub(crate) unsafe fn copy_bytes(src: &[u8], dst: NonNull<u8>) {
    // SAFETY: forwarded to the caller.
    unsafe { dst.copy_from_nonoverlapping(NonNull::from(src).cast::<u8>(), src.len()) }
}
