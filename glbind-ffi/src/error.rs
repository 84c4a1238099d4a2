use std::fmt;

/// Raw code returned by the native error-query entry point.
///
/// Kept as a transparent `u32` rather than a Rust enum: the native side may
/// report codes this crate does not know about, and every value must survive
/// the round trip.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct NativeErrorCode(pub u32);

impl NativeErrorCode {
    pub const NO_ERROR: NativeErrorCode = NativeErrorCode(0);
    pub const INVALID_ENUM: NativeErrorCode = NativeErrorCode(0x0500);
    pub const INVALID_VALUE: NativeErrorCode = NativeErrorCode(0x0501);
    pub const INVALID_OPERATION: NativeErrorCode = NativeErrorCode(0x0502);
    pub const STACK_OVERFLOW: NativeErrorCode = NativeErrorCode(0x0503);
    pub const STACK_UNDERFLOW: NativeErrorCode = NativeErrorCode(0x0504);
    pub const OUT_OF_MEMORY: NativeErrorCode = NativeErrorCode(0x0505);
    pub const INVALID_FRAMEBUFFER_OPERATION: NativeErrorCode = NativeErrorCode(0x0506);

    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 != 0
    }

    /// Symbolic name for well-known codes.
    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::NO_ERROR => "NO_ERROR",
            Self::INVALID_ENUM => "INVALID_ENUM",
            Self::INVALID_VALUE => "INVALID_VALUE",
            Self::INVALID_OPERATION => "INVALID_OPERATION",
            Self::STACK_OVERFLOW => "STACK_OVERFLOW",
            Self::STACK_UNDERFLOW => "STACK_UNDERFLOW",
            Self::OUT_OF_MEMORY => "OUT_OF_MEMORY",
            Self::INVALID_FRAMEBUFFER_OPERATION => "INVALID_FRAMEBUFFER_OPERATION",
            _ => return None,
        })
    }
}

impl fmt::Display for NativeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} (0x{:04X})", self.0),
            None => write!(f, "0x{:04X}", self.0),
        }
    }
}

impl From<u32> for NativeErrorCode {
    fn from(raw: u32) -> Self {
        NativeErrorCode(raw)
    }
}
