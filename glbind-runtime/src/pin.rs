// HandlePin: call-local pin that hands the native side a stable address.
//
// Single values are boxed (the native side writes into the copy, and the
// generated wrapper copies the result back through `target`). Slices are
// borrowed in place for the lifetime of the pin. Either way the pin is released
// when dropped, so an unwinding call still frees it.

use std::cell::Cell;
use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::trace;

thread_local! {
    static LIVE_PINS: Cell<usize> = const { Cell::new(0) };
}

/// Number of handle pins currently open on this thread.
pub fn live_handle_pins() -> usize {
    LIVE_PINS.with(|c| c.get())
}

/// A pinned argument for one native call.
///
/// - `!Send`, `!Sync`: a pin belongs to the call that opened it.
/// - `Drop` releases the handle; `release` does the same explicitly.
pub struct HandlePin<'a, T: ?Sized> {
    ptr: NonNull<T>,
    /// True when `ptr` came from `Box::into_raw` and must be freed.
    owned: bool,
    _borrow: PhantomData<&'a mut T>,
}

impl<T: Copy> HandlePin<'_, T> {
    /// Pin a heap copy of `value`.
    pub fn boxed(value: &T) -> Self {
        // SAFETY: Box::into_raw never returns null.
        let ptr = unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(*value))) };
        Self::open(ptr, true)
    }

    /// Current value of the pinned copy.
    #[inline]
    pub fn target(&self) -> T {
        // SAFETY: `ptr` is a live Box allocation owned by this pin.
        unsafe { *self.ptr.as_ptr() }
    }
}

impl<'a, T> HandlePin<'a, [T]> {
    /// Pin a slice that the native side only reads.
    pub fn slice(values: &'a [T]) -> Self {
        Self::open(NonNull::from(values), false)
    }

    /// Pin a slice the native side may write into. Writes land in `values`.
    pub fn slice_mut(values: &'a mut [T]) -> Self {
        Self::open(NonNull::from(values), false)
    }
}

impl<T: ?Sized> HandlePin<'_, T> {
    fn open(ptr: NonNull<T>, owned: bool) -> Self {
        LIVE_PINS.with(|c| c.set(c.get() + 1));
        HandlePin {
            ptr,
            owned,
            _borrow: PhantomData,
        }
    }

    /// Address of the pinned object, for the native call.
    #[inline]
    pub fn addr(&self) -> *mut c_void {
        self.ptr.as_ptr().cast()
    }

    /// Release the pin now instead of at scope exit.
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl<T: ?Sized> Drop for HandlePin<'_, T> {
    fn drop(&mut self) {
        if self.owned {
            // SAFETY: `owned` pins were created from `Box::into_raw` in `boxed`.
            unsafe { drop(Box::from_raw(self.ptr.as_ptr())) };
        }
        LIVE_PINS.with(|c| c.set(c.get() - 1));
        trace!(owned = self.owned, "handle pin released");
    }
}

impl<T: ?Sized> std::fmt::Debug for HandlePin<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlePin")
            .field("addr", &self.addr())
            .field("owned", &self.owned)
            .finish()
    }
}
