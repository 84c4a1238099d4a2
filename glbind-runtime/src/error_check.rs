// Error-query instrumentation around checked wrapper calls.
//
// Generated wrappers open an `ErrorCheck` before the native call (debug builds
// only). Codes already pending on entry belong to an earlier unchecked call and
// are logged and discarded. When the guard drops, the error-query entry point is drained and any
// reported codes become a `GlError::Native` panic. The error-query function
// itself is never instrumented.

use std::cell::Cell;

use glbind_ffi::NativeErrorCode;
use tracing::{error, warn};

use crate::error::GlError;

/// Upper bound on error-query calls per check, in case the native side keeps
/// reporting the same code (no current context, for example).
const MAX_DRAINED_CODES: usize = 16;

thread_local! {
    static SUSPENDED: Cell<bool> = const { Cell::new(false) };
}

/// Scope guard that checks for native errors when it drops.
#[must_use = "the check runs when the guard is dropped"]
pub struct ErrorCheck {
    function: &'static str,
    query: fn() -> NativeErrorCode,
}

impl ErrorCheck {
    pub fn enter(function: &'static str, query: fn() -> NativeErrorCode) -> Self {
        let check = ErrorCheck { function, query };
        if !Self::is_suspended() {
            let stale = check.drain();
            if !stale.is_empty() {
                warn!(function, ?stale, "discarding native errors raised before this call");
            }
        }
        check
    }

    /// Stop querying errors on this thread until [`ErrorCheck::resume`].
    /// Generated for functions that open a region where the native API forbids
    /// error queries.
    pub fn suspend() {
        SUSPENDED.with(|s| s.set(true));
    }

    pub fn resume() {
        SUSPENDED.with(|s| s.set(false));
    }

    pub fn is_suspended() -> bool {
        SUSPENDED.with(|s| s.get())
    }

    /// Drain pending error codes without raising.
    pub fn drain(&self) -> Vec<NativeErrorCode> {
        let mut codes = Vec::new();
        for _ in 0..MAX_DRAINED_CODES {
            let code = (self.query)();
            if !code.is_error() {
                break;
            }
            codes.push(code);
        }
        codes
    }
}

impl Drop for ErrorCheck {
    fn drop(&mut self) {
        if Self::is_suspended() {
            return;
        }
        let codes = self.drain();
        if codes.is_empty() {
            return;
        }
        let err = GlError::Native {
            function: self.function,
            codes,
        };
        if std::thread::panicking() {
            error!("{err}");
        } else {
            panic!("{err}");
        }
    }
}

impl std::fmt::Debug for ErrorCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorCheck")
            .field("function", &self.function)
            .finish()
    }
}
