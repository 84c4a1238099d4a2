// Error types for the glbind runtime.

use glbind_ffi::{NativeErrorCode, SlotId};
use thiserror::Error;

/// Failures surfaced by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlError {
    /// A wrapper ran before `EntryPoints::load_with` completed.
    #[error("entry points have not been loaded; call load_with before invoking any wrapper")]
    NotLoaded,

    /// The platform loader returned no address for this symbol.
    #[error("entry point `{name}` ({slot}) was not resolved by the platform loader")]
    Unresolved { slot: SlotId, name: String },

    #[error("{slot} is out of range for a table of {len} entry points")]
    SlotOutOfRange { slot: SlotId, len: usize },

    /// The error-query entry point reported errors after a checked call.
    #[error("`{function}` raised native error(s): {}", format_codes(.codes))]
    Native {
        function: &'static str,
        codes: Vec<NativeErrorCode>,
    },

    #[error("failed to open library `{path}`: {reason}")]
    LibraryOpen { path: String, reason: String },
}

/// Convenience alias used throughout the runtime and generated code.
pub type GlResult<T> = Result<T, GlError>;

fn format_codes(codes: &[NativeErrorCode]) -> String {
    codes
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
