// glbind-runtime: support types for generated wrappers.
// Generated code reaches native entry points only through `EntryPoints`, and
// only pins memory through the call-local guards exported here.

pub mod entry_points;
pub mod error;
pub mod traits;
pub mod pin;
pub mod text;
pub mod convert;
pub mod error_check;
pub mod loader;

// Re-export the primary public API surface.
pub use entry_points::{EntryPoints, LoadReport, LoadState};
pub use error::{GlError, GlResult};
pub use traits::{RawEnum, RawInt};
pub use pin::{HandlePin, live_handle_pins};
pub use text::{TextBuffer, DEFAULT_TEXT_CAPACITY};
pub use convert::{bool_from_raw, string_from_ptr};
pub use error_check::ErrorCheck;
pub use loader::LibraryResolver;

// Re-export FFI types needed by generated code.
pub use glbind_ffi::{EntryPointLayout, NativeErrorCode, SlotId};
