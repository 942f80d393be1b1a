//! Benchmark workloads for the regio allocator.
//!
//! Each workload runs against a caller-supplied [`Region`] so the
//! benchmark controls buffer size and reset cadence:
//!
//! - [`bump_requests`]: replay `(size, align, count)` requests
//! - [`fill_slice`]: push `n` values into a [`Slice`]
//! - [`join_words`]: build one string with repeated [`ArenaStr::concat`]

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use regio::{AllocFlags, ArenaError, ArenaStr, Region, Slice};

/// Backing buffer size used by the benches: 1 MiB.
pub const BENCH_BUFFER_BYTES: usize = 1 << 20;

/// Replay `requests` against `region` until one fails or all succeed.
///
/// Returns the number of requests that succeeded.
pub fn bump_requests(region: &Region<'_>, requests: &[(usize, usize, usize)]) -> usize {
    requests
        .iter()
        .take_while(|&&(size, align, count)| {
            region
                .alloc_raw(size, align, count, AllocFlags::NO_INIT)
                .is_ok()
        })
        .count()
}

/// Push `0..n` into a fresh slice.
///
/// With `interleave` set, a one-byte allocation follows every push so the
/// slice never sits at the tip and has to relocate to grow.
pub fn fill_slice<'r>(
    region: &'r Region<'_>,
    n: u64,
    interleave: bool,
) -> Result<Slice<'r, u64>, ArenaError> {
    let mut slice = Slice::new();
    for i in 0..n {
        slice.push(region, i)?;
        if interleave {
            region.alloc_raw(1, 1, 1, AllocFlags::NO_INIT)?;
        }
    }
    Ok(slice)
}

/// Join `words` with `sep` into one region string.
pub fn join_words<'r>(
    region: &'r Region<'_>,
    words: &'r [&'r str],
    sep: &'r str,
) -> Result<ArenaStr<'r>, ArenaError> {
    let mut line = ArenaStr::empty();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            line = ArenaStr::concat(region, line, sep)?;
        }
        line = ArenaStr::concat(region, line, *word)?;
    }
    Ok(line)
}
