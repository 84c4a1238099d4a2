// Traits implemented for raw native integers and by generated enum types.

/// Integer types the native side returns for booleans and enums.
pub trait RawInt: Copy {
    fn is_nonzero(self) -> bool;
}

macro_rules! impl_raw_int {
    ($($t:ty),*) => {
        $(impl RawInt for $t {
            #[inline]
            fn is_nonzero(self) -> bool {
                self != 0
            }
        })*
    };
}

impl_raw_int!(i8, u8, i16, u16, i32, u32, i64, u64, isize, usize);

/// Implemented by codegen for every exported enum.
///
/// Generated enums are transparent newtypes over their backing integer, so
/// `from_raw` accepts any value, including ones outside the declared constant
/// set. No range check is performed.
pub trait RawEnum: Copy + 'static {
    /// The backing integer representation.
    type Repr: Copy;

    fn from_raw(raw: Self::Repr) -> Self;

    fn into_raw(self) -> Self::Repr;
}
