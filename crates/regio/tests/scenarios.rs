//! Integration scenarios combining regions, scratch views, sub-regions,
//! escapes, slices and strings the way a caller would.

use std::mem::MaybeUninit;

use indexmap::IndexMap;
use regio::{arena_format, AllocFlags, ArenaError, ArenaStr, FnvBuildHasher, Region, Slice};
use regio_test_utils::fixtures::{mixed_request_bytes, MIXED_REQUESTS, WORDS};
use regio_test_utils::{heap_buffer, AlignedBuf};

// ── Helpers ─────────────────────────────────────────────────────

/// Split `input` on spaces into region strings.
fn tokenize<'r>(
    region: &'r Region<'_>,
    input: &'r str,
) -> Result<Slice<'r, ArenaStr<'r>>, ArenaError> {
    let mut words = Slice::new();
    for word in input.split(' ').filter(|w| !w.is_empty()) {
        words.push(region, ArenaStr::copy(region, word)?)?;
    }
    Ok(words)
}

// ── Concrete scenarios ──────────────────────────────────────────

#[test]
fn sixty_four_byte_region() {
    let mut buf = AlignedBuf::<64>::new();
    let region = Region::new(buf.as_mut_slice());

    assert!(region.alloc_raw(16, 8, 3, AllocFlags::empty()).is_ok());
    assert_eq!(region.used(), 48);
    assert_eq!(region.available(), 16);

    assert!(region.alloc_raw(16, 8, 1, AllocFlags::empty()).is_ok());
    assert_eq!(region.available(), 0);

    let err = region.alloc_raw(1, 1, 1, AllocFlags::SOFT_FAIL).unwrap_err();
    assert!(err.is_exhausted());
    assert_eq!(region.used(), 64);
    assert_eq!(region.available(), 0);
}

#[test]
fn abc_splices_without_relocation() {
    let mut buf = heap_buffer(256);
    let region = Region::new(&mut buf);

    let a = ArenaStr::copy(&region, "a").unwrap();
    let ab = ArenaStr::concat(&region, a, "b").unwrap();
    assert!(region.is_tip(std::ptr::NonNull::from(ab.as_bytes()).cast(), ab.len()));
    let abc = ArenaStr::concat(&region, ab, "c").unwrap();

    assert_eq!(abc.len(), 3);
    assert_eq!(abc, "abc");
    assert_eq!(ab.as_ptr(), a.as_ptr());
    assert_eq!(abc.as_ptr(), a.as_ptr());
}

// ── Hash-keyed strings ──────────────────────────────────────────

#[test]
fn arena_strings_key_an_index_map() {
    let mut buf = heap_buffer(4096);
    let region = Region::new(&mut buf);
    let mut other = heap_buffer(64);
    let other = Region::new(&mut other);
    let mut counts: IndexMap<ArenaStr<'_>, usize, FnvBuildHasher> = IndexMap::default();

    for word in WORDS {
        let key = ArenaStr::copy(&region, word).unwrap();
        *counts.entry(key).or_insert(0) += 1;
    }

    let lookup = ArenaStr::copy(&other, "region").unwrap();
    assert_eq!(counts.get(&lookup), Some(&2));
    assert_eq!(counts.get(&ArenaStr::empty()), Some(&1));
    assert_eq!(counts.get_index(0).map(|(k, _)| *k), Some(lookup));
    assert_eq!(counts.len(), WORDS.len() - 2);
}

// ── Escapes ─────────────────────────────────────────────────────

#[test]
fn escape_abandons_an_oversized_unit_of_work() {
    let mut buf = heap_buffer(512);
    let region = Region::new(&mut buf);
    let before = region.available();

    let outcome = region.with_escape(|r| {
        let scratch = r.scratch();
        let mut doubled = Slice::new();
        for i in 0..10_000u64 {
            doubled.push(&scratch, i * 2)?;
        }
        Ok(doubled.len())
    });

    match outcome {
        Err(ArenaError::Exhausted { available, .. }) => assert!(available < 512),
        other => panic!("expected exhaustion, got {other:?}"),
    }
    // The scratch memory is back, and no boundary is left installed.
    assert!(!region.has_escape());
    assert!(region.available() + 16 >= before);
    assert!(region.alloc_raw(1, 1, region.available(), AllocFlags::empty()).is_ok());
}

#[test]
fn escape_lets_the_unit_of_work_succeed() {
    let mut buf = heap_buffer(2048);
    let region = Region::new(&mut buf);
    let input = "the quick  brown fox";

    let joined = region
        .with_escape(|r| {
            let words = tokenize(r, input)?;
            let mut line = ArenaStr::empty();
            for (i, word) in words.iter().enumerate() {
                if i > 0 {
                    line = ArenaStr::concat(r, line, "-")?;
                }
                line = ArenaStr::concat(r, line, word.as_bytes())?;
            }
            Ok(line.to_str().map(str::len).unwrap_or(0))
        })
        .unwrap();

    assert_eq!(joined, "the-quick-brown-fox".len());
}

#[test]
fn soft_fail_search_inside_an_escape() {
    let mut buf = heap_buffer(256);
    let region = Region::new(&mut buf);
    let result = region.with_escape(|r| {
        let mut chunk = 1024;
        loop {
            match r.alloc_raw(1, 1, chunk, AllocFlags::SOFT_FAIL | AllocFlags::NO_INIT) {
                Ok(_) => return Ok(chunk),
                Err(_) => chunk /= 2,
            }
        }
    });
    assert_eq!(result, Ok(128));
}

// ── Sub-regions and scratch together ────────────────────────────

#[test]
fn per_request_sub_regions_do_not_leak() {
    let mut buf = heap_buffer(4096);
    let region = Region::new(&mut buf);
    let before = region.available();

    for request in 0..100u32 {
        let sub = region.push_subregion().unwrap();
        let line = arena_format!(&*sub, "request {request}").unwrap();
        assert!(line.starts_with(b"request "));
        let scratch = sub.scratch();
        let tmp = scratch.alloc_zeroed::<u32>(64).unwrap();
        tmp[63] = request;
        drop(scratch);
        sub.pop();
    }

    assert_eq!(region.available(), before);
}

#[test]
fn mixed_requests_keep_alignment_in_both_directions() {
    let mut buf = heap_buffer(4 * mixed_request_bytes() + 1024);
    let region = Region::new(&mut buf);
    let scratch = region.scratch();

    for &(size, align, count) in MIXED_REQUESTS {
        let up = region.alloc_raw(size, align, count, AllocFlags::empty()).unwrap();
        let down = scratch.alloc_raw(size, align, count, AllocFlags::empty()).unwrap();
        assert_eq!(up.as_ptr() as usize % align, 0);
        assert_eq!(down.as_ptr() as usize % align, 0);
        assert!(up < down);
    }
    assert!(region.used() >= mixed_request_bytes());
    assert!(scratch.used() >= mixed_request_bytes());
}

#[test]
fn uninitialised_backing_memory() {
    let mut storage = [MaybeUninit::<u8>::uninit(); 128];
    let region = Region::from_uninit(&mut storage);
    let values = region.alloc_slice_copy(&[3u32, 1, 4, 1, 5]).unwrap();
    let zeros = region.alloc_zeroed::<u16>(4).unwrap();
    assert_eq!(values, &[3, 1, 4, 1, 5]);
    assert_eq!(zeros, &[0; 4]);
}

#[test]
fn format_from_scratch_is_reclaimed() {
    let mut buf = heap_buffer(128);
    let region = Region::new(&mut buf);
    let kept = arena_format!(&region, "{:>6}", "kept").unwrap();
    {
        let scratch = region.scratch();
        let temp = arena_format!(&scratch, "{kept}/{}", 99).unwrap();
        assert_eq!(temp, "  kept/99");
    }
    assert_eq!(kept, "  kept");
    assert_eq!(region.available(), 128 - 6);
}
