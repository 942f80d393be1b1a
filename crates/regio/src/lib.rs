//! Region-based bump allocation over caller-supplied buffers.
//!
//! A [`Region`] claims memory from one contiguous buffer by moving a cursor.
//! Nothing is freed individually; memory comes back in bulk when a scratch
//! view or sub-region ends, or when the buffer itself is dropped.
//!
//! # Architecture
//!
//! ```text
//! Region (bump cursor → limit over &mut [u8])
//! ├── scratch()          backward view over the unused tail, reclaimed on drop
//! ├── push_subregion()   accounted tail chunk, LIFO release via SubRegion
//! ├── with_escape()      exhaustion unwinds to a boundary instead of returning
//! ├── Slice<T>           growable sequence, extends in place at the tip
//! └── ArenaStr           immutable bytes; copy, concat and format at the tip
//! ```
//!
//! # Failure policy
//!
//! Exhaustion is the only recoverable error. With no escape installed, or
//! with [`AllocFlags::SOFT_FAIL`], it is returned as
//! [`ArenaError::Exhausted`]. Inside [`Region::with_escape`] it abandons the
//! unit of work and the boundary returns the error instead. Misuse (zero
//! element size, out-of-order sub-region release) panics.
//!
//! # Threading
//!
//! Regions, slices and strings are single-threaded and neither `Send` nor
//! `Sync`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod error;
mod escape;
pub mod flags;
pub mod hash;
mod raw;
pub mod region;
pub mod scratch;
pub mod slice;
pub mod string;
pub mod subregion;
mod zeroable;

// Public re-exports for the primary API surface.
pub use config::{Relocation, SliceConfig};
pub use error::ArenaError;
pub use flags::AllocFlags;
pub use hash::{FnvBuildHasher, FnvHasher};
pub use region::Region;
pub use slice::Slice;
pub use string::ArenaStr;
pub use subregion::SubRegion;
pub use zeroable::Zeroable;
