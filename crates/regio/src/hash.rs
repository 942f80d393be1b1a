//! 64-bit FNV-1a hashing for arena strings.
//!
//! [`ArenaStr`](crate::ArenaStr) feeds only its bytes into a hasher, so an
//! [`FnvHasher`] over a string produces exactly [`fnv1a`] of its contents.
//! That lets arena strings key a `HashMap` or `IndexMap` directly, with no
//! interning step. Not collision-resistant against adversarial input.

use std::hash::{BuildHasherDefault, Hasher};

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

/// Hash `bytes` with 64-bit FNV-1a.
///
/// Returns the offset basis for an empty input.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| fnv1a_byte(hash, b))
}

/// Streaming FNV-1a [`Hasher`].
#[derive(Clone, Copy, Debug)]
pub struct FnvHasher(u64);

impl Default for FnvHasher {
    fn default() -> Self {
        Self(FNV_OFFSET)
    }
}

impl Hasher for FnvHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.0 = bytes.iter().fold(self.0, |hash, &b| fnv1a_byte(hash, b));
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

/// [`BuildHasher`](std::hash::BuildHasher) producing [`FnvHasher`]s.
pub type FnvBuildHasher = BuildHasherDefault<FnvHasher>;
