// Fixed-capacity character buffer for out-flow string parameters.

use std::ffi::c_char;

use smallvec::{SmallVec, smallvec};

/// Capacity used when no sibling parameter carries the buffer size.
pub const DEFAULT_TEXT_CAPACITY: usize = 256;

/// Zero-filled buffer the native side writes a nul-terminated string into.
///
/// Buffers up to [`DEFAULT_TEXT_CAPACITY`] bytes live on the stack.
pub struct TextBuffer {
    buf: SmallVec<[u8; DEFAULT_TEXT_CAPACITY]>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TEXT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        TextBuffer {
            buf: smallvec![0; capacity],
        }
    }

    /// Size the buffer from a runtime length argument. Negative or
    /// unrepresentable lengths give an empty buffer.
    pub fn with_len<L: TryInto<usize>>(len: L) -> Self {
        Self::with_capacity(len.try_into().unwrap_or(0))
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut c_char {
        self.buf.as_mut_ptr().cast()
    }

    /// Contents up to the first nul (or the whole buffer if none).
    pub fn to_string_lossy(&self) -> String {
        let end = self.buf.iter().position(|&b| b == 0).unwrap_or(self.buf.len());
        String::from_utf8_lossy(&self.buf[..end]).into_owned()
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBuffer")
            .field("capacity", &self.capacity())
            .finish()
    }
}
