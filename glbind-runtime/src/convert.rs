// Return-value converters used by generated wrappers.

use std::ffi::{CStr, c_char};

use crate::traits::RawInt;

/// Native booleans come back as integers: any nonzero value is `true`.
#[inline]
pub fn bool_from_raw<T: RawInt>(raw: T) -> bool {
    raw.is_nonzero()
}

/// Copy a nul-terminated native string. A null pointer yields an empty string.
///
/// # Safety
/// `ptr` must be null or point at a nul-terminated string that stays valid for
/// the duration of this call.
pub unsafe fn string_from_ptr(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: forwarded from the caller.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}
