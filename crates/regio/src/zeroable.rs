//! Types whose all-zero bit pattern is a valid value.

/// Marker for types that may be materialised from zero-filled memory.
///
/// Required by [`Region::alloc_zeroed`](crate::Region::alloc_zeroed), which
/// returns freshly zeroed storage as initialised values.
///
/// # Safety
///
/// Implementors guarantee that a value whose every byte is zero is a valid
/// instance of the type.
pub unsafe trait Zeroable: Sized {}

macro_rules! impl_zeroable {
    ($($ty:ty),* $(,)?) => {
        $(
            // SAFETY: zero is a valid value of every primitive listed here.
            unsafe impl Zeroable for $ty {}
        )*
    };
}

impl_zeroable!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool);

// SAFETY: an array of zeroable elements is zeroable element-wise.
unsafe impl<T: Zeroable, const N: usize> Zeroable for [T; N] {}

// SAFETY: the null pointer is the all-zero pattern.
unsafe impl<T> Zeroable for *const T {}

// SAFETY: the null pointer is the all-zero pattern.
unsafe impl<T> Zeroable for *mut T {}
