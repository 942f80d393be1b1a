//! Abort-on-exhaustion boundaries.
//!
//! [`Region::with_escape`] runs a unit of work under a boundary. While it
//! runs, an exhausting allocation that did not ask for
//! [`AllocFlags::SOFT_FAIL`] does not return: it unwinds straight back to
//! the boundary, which reports [`ArenaError::Exhausted`]. Scratch views and
//! sub-regions look the boundary up through the region they came from at
//! allocation time, so they reach it while it is installed and get the
//! error back as a value once it is gone.
//!
//! The unwind uses [`std::panic::resume_unwind`], so the panic hook does
//! not fire and nothing is printed. Builds with `panic = "abort"` turn an
//! escape into process abort.

use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::NonNull;

use log::trace;

use crate::error::ArenaError;
use crate::flags::AllocFlags;
use crate::raw;
use crate::region::Region;

/// Boundary record stored in region memory while the boundary is active.
pub(crate) struct EscapeFrame {
    /// The boundary that was innermost before this one.
    previous: Option<NonNull<EscapeFrame>>,
}

/// Unwind payload addressed to one boundary.
struct Escaped {
    frame: usize,
    error: ArenaError,
}

/// Reinstates the previous boundary on every exit path.
struct Installed<'r, 'a> {
    region: &'r Region<'a>,
    frame: NonNull<EscapeFrame>,
}

impl Drop for Installed<'_, '_> {
    fn drop(&mut self) {
        // SAFETY: the frame was written by `with_escape` into memory the
        // region keeps claimed for at least as long as this guard.
        let previous = unsafe { self.frame.as_ref() }.previous;
        self.region.escape.set(previous);
        trace!("escape frame {:#x} removed", raw::addr(self.frame));
    }
}

impl Region<'_> {
    /// Run `work` with exhaustion escaping to this call.
    ///
    /// Installing the boundary claims a small frame from the region with
    /// soft-fail semantics; if even that fails, `work` is not run and the
    /// exhaustion is returned. Otherwise the result of `work` is returned,
    /// or `Err(ArenaError::Exhausted { .. })` if an allocation inside it
    /// escaped. Boundaries nest: an escape always lands at the innermost
    /// boundary installed on the region that exhausted.
    ///
    /// Panics raised by `work` for other reasons propagate unchanged.
    pub fn with_escape<T, F>(&self, work: F) -> Result<T, ArenaError>
    where
        F: FnOnce(&Self) -> Result<T, ArenaError>,
    {
        let frame = self
            .alloc_raw(
                mem::size_of::<EscapeFrame>(),
                mem::align_of::<EscapeFrame>(),
                1,
                AllocFlags::SOFT_FAIL | AllocFlags::NO_INIT,
            )?
            .cast::<EscapeFrame>();
        // SAFETY: aligned, sized and exclusively claimed for one frame.
        unsafe {
            frame.write(EscapeFrame {
                previous: self.escape.get(),
            })
        };
        self.escape.set(Some(frame));
        trace!("escape frame {:#x} installed", raw::addr(frame));

        let _installed = Installed {
            region: self,
            frame,
        };
        match panic::catch_unwind(AssertUnwindSafe(|| work(self))) {
            Ok(result) => result,
            Err(payload) => match payload.downcast::<Escaped>() {
                Ok(escaped) if escaped.frame == raw::addr(frame) => Err(escaped.error),
                Ok(escaped) => panic::resume_unwind(escaped),
                Err(payload) => panic::resume_unwind(payload),
            },
        }
    }
}

/// Abandon the current unit of work and unwind to `frame`'s boundary.
pub(crate) fn unwind(frame: NonNull<EscapeFrame>, error: ArenaError) -> ! {
    trace!("escaping to frame {:#x}: {error}", raw::addr(frame));
    panic::resume_unwind(Box::new(Escaped {
        frame: raw::addr(frame),
        error,
    }))
}
