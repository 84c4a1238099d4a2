use std::ffi::CStr;
use std::fmt;

use crate::slots::SlotId;

// ---------------------------------------------------------------------------
// Persisted entry-point layout
// ---------------------------------------------------------------------------

/// Compile-time layout of the entry-point table.
///
/// Symbol names live back to back in one byte blob, each followed by a nul
/// terminator. `offsets[slot]` is the byte offset of that slot's name. Strings
/// are never constructed for the whole table; a name is only materialized as a
/// `CStr` view when the resolver asks for it.
#[derive(Clone, Copy, Debug)]
pub struct EntryPointLayout {
    names: &'static [u8],
    offsets: &'static [u32],
}

impl EntryPointLayout {
    pub const EMPTY: EntryPointLayout = EntryPointLayout { names: &[], offsets: &[] };

    pub const fn new(names: &'static [u8], offsets: &'static [u32]) -> Self {
        EntryPointLayout { names, offsets }
    }

    /// Number of slots.
    #[inline]
    pub const fn len(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn names(&self) -> &'static [u8] {
        self.names
    }

    pub fn offsets(&self) -> &'static [u32] {
        self.offsets
    }

    /// Symbol name of a slot, or `None` if the slot is out of range or the
    /// blob is malformed at that offset.
    pub fn name(&self, slot: SlotId) -> Option<&'static CStr> {
        name_at(self.names, self.offsets, slot)
    }

    /// Iterate `(slot, name)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &'static CStr)> + '_ {
        (0..self.offsets.len() as u32).filter_map(move |i| {
            let slot = SlotId(i);
            self.name(slot).map(|name| (slot, name))
        })
    }

    /// See [`validate_layout`].
    pub fn validate(&self) -> Result<(), LayoutError> {
        validate_layout(self.names, self.offsets)
    }
}

fn name_at<'a>(names: &'a [u8], offsets: &[u32], slot: SlotId) -> Option<&'a CStr> {
    let start = *offsets.get(slot.index())? as usize;
    CStr::from_bytes_until_nul(names.get(start..)?).ok()
}

/// Check that every offset starts a non-empty, nul-terminated name directly
/// after the previous one, and that the blob has no trailing bytes.
///
/// Codegen runs this over the tables it is about to emit; generated code can
/// run it over the compiled-in layout.
pub fn validate_layout(names: &[u8], offsets: &[u32]) -> Result<(), LayoutError> {
    let mut expected = 0usize;
    for (i, &offset) in offsets.iter().enumerate() {
        let slot = SlotId(i as u32);
        if offset as usize != expected {
            return Err(LayoutError::OffsetMismatch {
                slot,
                expected: expected as u32,
                found: offset,
            });
        }
        let name = name_at(names, offsets, slot).ok_or(LayoutError::Unterminated { slot })?;
        if name.is_empty() {
            return Err(LayoutError::EmptyName { slot });
        }
        expected += name.to_bytes_with_nul().len();
    }
    if expected != names.len() {
        return Err(LayoutError::TrailingBytes {
            used: expected,
            total: names.len(),
        });
    }
    Ok(())
}

/// A structural defect in an [`EntryPointLayout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutError {
    OffsetMismatch { slot: SlotId, expected: u32, found: u32 },
    Unterminated { slot: SlotId },
    EmptyName { slot: SlotId },
    TrailingBytes { used: usize, total: usize },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::OffsetMismatch { slot, expected, found } => {
                write!(f, "{slot}: offset {found}, expected {expected}")
            }
            LayoutError::Unterminated { slot } => write!(f, "{slot}: name is not nul-terminated"),
            LayoutError::EmptyName { slot } => write!(f, "{slot}: empty symbol name"),
            LayoutError::TrailingBytes { used, total } => {
                write!(f, "name blob has {} unused trailing bytes", total - used)
            }
        }
    }
}

impl std::error::Error for LayoutError {}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: &[u8] = b"glClear\0glGetError\0";
    const OFFSETS: &[u32] = &[0, 8];

    #[test]
    fn names_are_read_at_offsets() {
        let layout = EntryPointLayout::new(NAMES, OFFSETS);
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.name(SlotId(0)).unwrap().to_bytes(), b"glClear");
        assert_eq!(layout.name(SlotId(1)).unwrap().to_bytes(), b"glGetError");
        assert!(layout.name(SlotId(2)).is_none());
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn iter_yields_slots_in_order() {
        let layout = EntryPointLayout::new(NAMES, OFFSETS);
        let slots: Vec<u32> = layout.iter().map(|(s, _)| s.0).collect();
        assert_eq!(slots, vec![0, 1]);
    }

    #[test]
    fn validate_rejects_skewed_offsets() {
        const BAD: &[u32] = &[0, 7];
        let layout = EntryPointLayout::new(NAMES, BAD);
        assert_eq!(
            layout.validate(),
            Err(LayoutError::OffsetMismatch { slot: SlotId(1), expected: 8, found: 7 })
        );
    }

    #[test]
    fn validate_rejects_trailing_bytes() {
        const PADDED: &[u8] = b"glClear\0\0";
        const ONE: &[u32] = &[0];
        let layout = EntryPointLayout::new(PADDED, ONE);
        assert!(matches!(layout.validate(), Err(LayoutError::TrailingBytes { .. })));
    }

    #[test]
    fn unterminated_name_is_rejected() {
        assert_eq!(
            validate_layout(b"glClear", &[0]),
            Err(LayoutError::Unterminated { slot: SlotId(0) })
        );
    }

    #[test]
    fn empty_layout_is_valid() {
        assert!(EntryPointLayout::EMPTY.validate().is_ok());
        assert!(EntryPointLayout::EMPTY.is_empty());
    }
}
