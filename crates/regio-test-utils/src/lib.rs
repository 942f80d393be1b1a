//! Test utilities for regio development.
//!
//! Provides over-aligned backing buffers ([`AlignedBuf`], [`heap_buffer`])
//! filled with a recognisable [`POISON`] byte, and shared workload
//! fixtures in [`fixtures`].
//!
//! Independent of `regio`, so the allocator's unit tests can use it too.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

/// Byte every fresh test buffer is filled with.
///
/// Memory claimed with `NO_INIT` still holds this value, which makes
/// skipped zero-filling observable.
pub const POISON: u8 = 0xA5;

/// A stack buffer aligned to 64 bytes.
///
/// Offsets into it are also absolute alignments up to 64, so tests can
/// assert exact cursor positions after padded allocations.
#[repr(C, align(64))]
pub struct AlignedBuf<const N: usize>(pub [u8; N]);

impl<const N: usize> AlignedBuf<N> {
    pub fn new() -> Self {
        Self([POISON; N])
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl<const N: usize> Default for AlignedBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// A heap buffer of `len` poisoned bytes for workloads too large for the
/// stack.
///
/// Only the global allocator's alignment is guaranteed.
pub fn heap_buffer(len: usize) -> Vec<u8> {
    vec![POISON; len]
}
