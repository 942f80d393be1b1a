//! Per-call allocation flags.

use bitflags::bitflags;

bitflags! {
    /// Combinable options for [`Region::alloc_raw`](crate::Region::alloc_raw).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AllocFlags: u8 {
        /// Skip zero-filling the returned memory.
        const NO_INIT = 0b0000_0001;
        /// Return `Err` on exhaustion even when an escape is installed.
        const SOFT_FAIL = 0b0000_0010;
        /// Allocate from the limit side for this call, moving the limit
        /// toward the cursor. Not available on scratch views.
        const FROM_END = 0b0000_0100;
    }
}
