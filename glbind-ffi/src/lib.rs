// glbind-ffi: slot ids, the persisted entry-point layout, native error codes.
// Zero external dependencies. This crate defines the contract between generated
// bindings and glbind-runtime.

pub mod slots;
pub mod layout;
pub mod error;

pub use slots::*;
pub use layout::*;
pub use error::*;
