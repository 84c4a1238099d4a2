// Entry-point table: one slot per distinct native symbol.
//
// Slots are assigned over the delegates that require one, deduplicated by
// symbol and sorted by symbol, so identical input always yields an identical
// name blob and offset table.

use std::collections::BTreeMap;

use glbind_ffi::SlotId;
use tracing::debug;

use crate::error::SynthError;
use crate::schema::DelegateInfo;

/// Upper bound on alias chains, so a cycle cannot loop forever.
const MAX_ALIAS_DEPTH: usize = 8;

/// One slot of the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotEntry {
    pub slot: SlotId,
    /// Full native symbol (function prefix included).
    pub symbol: String,
    /// Byte offset of `symbol` in the name blob.
    pub offset: u32,
}

/// Generation-time view of the entry-point table.
#[derive(Clone, Debug, Default)]
pub struct EntryPointTable {
    entries: Vec<SlotEntry>,
    /// Delegate name -> slot, aliases included.
    by_delegate: BTreeMap<String, SlotId>,
    /// Aliased delegates whose target holds no slot.
    unresolved: BTreeMap<String, String>,
}

impl EntryPointTable {
    /// Collect the slot-eligible delegates and lay out the table.
    pub fn build<'a, I>(delegates: I, function_prefix: &str) -> Self
    where
        I: IntoIterator<Item = &'a DelegateInfo>,
    {
        let delegates: Vec<&DelegateInfo> = delegates.into_iter().collect();

        // Distinct symbols, sorted.
        let mut symbols: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for d in delegates.iter().filter(|d| d.requires_slot()) {
            symbols
                .entry(format!("{function_prefix}{}", d.entry_point))
                .or_default()
                .push(d.name.as_str());
        }

        let mut entries = Vec::with_capacity(symbols.len());
        let mut by_delegate = BTreeMap::new();
        let mut offset = 0u32;
        for (i, (symbol, owners)) in symbols.into_iter().enumerate() {
            let slot = SlotId(i as u32);
            for owner in owners {
                by_delegate.insert(owner.to_string(), slot);
            }
            let len = symbol.len() as u32 + 1;
            entries.push(SlotEntry { slot, symbol, offset });
            offset += len;
        }

        // Aliases share their target's slot.
        let by_name: BTreeMap<&str, &DelegateInfo> =
            delegates.iter().map(|d| (d.name.as_str(), *d)).collect();
        let mut unresolved = BTreeMap::new();
        for d in delegates.iter().filter(|d| !d.requires_slot()) {
            match resolve_alias(d, &by_name, &by_delegate) {
                Some(slot) => {
                    by_delegate.insert(d.name.clone(), slot);
                }
                None => {
                    let target = d.alias_of.clone().unwrap_or_default();
                    unresolved.insert(d.name.clone(), target);
                }
            }
        }

        debug!(
            slots = entries.len(),
            delegates = by_delegate.len(),
            unresolved = unresolved.len(),
            "entry-point table built"
        );

        EntryPointTable {
            entries,
            by_delegate,
            unresolved,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SlotEntry] {
        &self.entries
    }

    pub fn entry(&self, slot: SlotId) -> Option<&SlotEntry> {
        self.entries.get(slot.index())
    }

    /// Slot a delegate's calls go through.
    pub fn slot_for(&self, delegate: &str) -> Result<SlotId, SynthError> {
        if let Some(slot) = self.by_delegate.get(delegate) {
            return Ok(*slot);
        }
        Err(match self.unresolved.get(delegate) {
            Some(target) => SynthError::UnresolvedAlias {
                delegate: delegate.to_string(),
                target: target.clone(),
            },
            None => SynthError::MissingDelegate {
                function: String::new(),
                delegate: delegate.to_string(),
            },
        })
    }

    /// Symbol names back to back, each nul-terminated.
    pub fn name_blob(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(self.entries.last().map_or(0, |e| {
            e.offset as usize + e.symbol.len() + 1
        }));
        for e in &self.entries {
            blob.extend_from_slice(e.symbol.as_bytes());
            blob.push(0);
        }
        blob
    }

    pub fn offsets(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.offset).collect()
    }
}

fn resolve_alias(
    d: &DelegateInfo,
    by_name: &BTreeMap<&str, &DelegateInfo>,
    by_delegate: &BTreeMap<String, SlotId>,
) -> Option<SlotId> {
    let mut current = d;
    for _ in 0..MAX_ALIAS_DEPTH {
        let target = current.alias_of.as_deref()?;
        if let Some(slot) = by_delegate.get(target) {
            return Some(*slot);
        }
        current = by_name.get(target)?;
    }
    None
}
