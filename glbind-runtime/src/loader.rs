// Symbol resolution through a dynamically opened native library.

use std::ffi::{CStr, c_void};

use libloading::Library;
use tracing::{debug, info};

use crate::error::{GlError, GlResult};

/// Resolves entry points by name from one shared library.
///
/// ```ignore
/// let lib = unsafe { LibraryResolver::open("libGLESv2.so")? };
/// bindings::load_with(|name| lib.lookup(name));
/// ```
pub struct LibraryResolver {
    library: Library,
    path: String,
}

impl LibraryResolver {
    /// Open the library at `path`.
    ///
    /// # Safety
    /// Loading a library runs its initialisation routines; the caller must
    /// trust the library at `path`.
    pub unsafe fn open(path: &str) -> GlResult<Self> {
        // SAFETY: forwarded from the caller.
        let library = unsafe { Library::new(path) }.map_err(|e| GlError::LibraryOpen {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        info!(path, "opened native library");
        Ok(LibraryResolver {
            library,
            path: path.to_string(),
        })
    }

    /// Address of `name`, or null when the library does not export it.
    pub fn lookup(&self, name: &CStr) -> *const c_void {
        // SAFETY: the symbol is read as an opaque address and never called here.
        match unsafe { self.library.get::<*const c_void>(name.to_bytes_with_nul()) } {
            Ok(symbol) => *symbol,
            Err(_) => {
                debug!(name = ?name, "symbol not exported");
                std::ptr::null()
            }
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for LibraryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryResolver")
            .field("path", &self.path)
            .finish()
    }
}
