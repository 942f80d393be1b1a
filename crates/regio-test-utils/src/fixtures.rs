//! Reusable workloads for tests and benchmarks.
//!
//! - [`WORDS`]: short ASCII words for string building.
//! - [`MIXED_REQUESTS`]: `(size, align, count)` triples shaped like a
//!   parser's node and buffer allocations.

/// Short words of varied length, some repeated.
pub const WORDS: &[&str] = &[
    "region", "cursor", "limit", "scratch", "tip", "slice", "a", "bump", "region", "escape",
    "arena", "push", "pop", "string", "", "concat", "hash", "fnv", "tip", "format",
];

/// Allocation requests as `(size, align, count)`.
pub const MIXED_REQUESTS: &[(usize, usize, usize)] = &[
    (8, 8, 1),
    (24, 8, 1),
    (1, 1, 13),
    (4, 4, 16),
    (16, 16, 2),
    (2, 2, 7),
    (32, 8, 1),
    (1, 1, 1),
    (8, 8, 4),
    (64, 64, 1),
];

/// Total bytes one pass over [`MIXED_REQUESTS`] claims, excluding padding.
pub fn mixed_request_bytes() -> usize {
    MIXED_REQUESTS
        .iter()
        .map(|&(size, _, count)| size * count)
        .sum()
}
