// Entry-point table: one resolved address per slot, filled exactly once.
//
// Generated bindings declare a `static ENTRY_POINTS: EntryPoints` over their
// compile-time layout. Resolution is explicit (`load_with`) and must finish
// before any wrapper runs; after that the table is read-only, so concurrent
// wrapper calls need no locking.

use std::ffi::{CStr, c_void};
use std::ptr::NonNull;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use glbind_ffi::{EntryPointLayout, SlotId};
use tracing::{debug, trace};

use crate::error::{GlError, GlResult};

/// Wrapper so a resolved address can live inside OnceLock (which requires Send+Sync).
/// SAFETY: addresses point at immutable native code and are never written
/// through; they are shared read-only after resolution.
#[derive(Clone, Copy)]
struct Address(Option<NonNull<c_void>>);
unsafe impl Send for Address {}
unsafe impl Sync for Address {}

/// Lifecycle of an [`EntryPoints`] table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Uninitialized,
    Resolving,
    Resolved,
}

/// Outcome of a resolution pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadReport {
    pub resolved: usize,
    /// Slots the resolver returned null for, in slot order.
    pub missing: Vec<SlotId>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Process-wide table of lazily resolved native entry points.
pub struct EntryPoints {
    layout: EntryPointLayout,
    resolving: AtomicBool,
    addresses: OnceLock<Box<[Address]>>,
}

impl EntryPoints {
    pub const fn new(layout: EntryPointLayout) -> Self {
        EntryPoints {
            layout,
            resolving: AtomicBool::new(false),
            addresses: OnceLock::new(),
        }
    }

    pub fn layout(&self) -> &EntryPointLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    pub fn state(&self) -> LoadState {
        if self.addresses.get().is_some() {
            LoadState::Resolved
        } else if self.resolving.load(Ordering::Acquire) {
            LoadState::Resolving
        } else {
            LoadState::Uninitialized
        }
    }

    /// Resolve every slot through `resolve`. A null return leaves the slot
    /// empty instead of failing the whole pass.
    ///
    /// Only the first call resolves anything. Later calls (from any thread)
    /// wait for that pass to finish, do not invoke `resolve`, and return the
    /// same report.
    pub fn load_with<F>(&self, mut resolve: F) -> LoadReport
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        let addresses = self.addresses.get_or_init(|| {
            self.resolving.store(true, Ordering::Release);
            let table: Box<[Address]> = (0..self.layout.len() as u32)
                .map(|i| {
                    let slot = SlotId(i);
                    let address = self
                        .layout
                        .name(slot)
                        .and_then(|name| NonNull::new(resolve(name) as *mut c_void));
                    if address.is_none() {
                        trace!(%slot, name = ?self.layout.name(slot), "entry point not found");
                    }
                    Address(address)
                })
                .collect();
            let resolved = table.iter().filter(|a| a.0.is_some()).count();
            debug!(resolved, total = table.len(), "entry points resolved");
            table
        });
        Self::report_for(addresses)
    }

    /// Report for a completed pass, or `None` before `load_with`.
    pub fn report(&self) -> Option<LoadReport> {
        self.addresses.get().map(|a| Self::report_for(a))
    }

    fn report_for(addresses: &[Address]) -> LoadReport {
        let missing: Vec<SlotId> = addresses
            .iter()
            .enumerate()
            .filter(|(_, a)| a.0.is_none())
            .map(|(i, _)| SlotId(i as u32))
            .collect();
        LoadReport {
            resolved: addresses.len() - missing.len(),
            missing,
        }
    }

    /// Resolved address of `slot`.
    pub fn get(&self, slot: SlotId) -> GlResult<NonNull<c_void>> {
        let addresses = self.addresses.get().ok_or(GlError::NotLoaded)?;
        let address = addresses.get(slot.index()).ok_or(GlError::SlotOutOfRange {
            slot,
            len: addresses.len(),
        })?;
        address.0.ok_or_else(|| GlError::Unresolved {
            slot,
            name: self.symbol(slot),
        })
    }

    /// Address for a generated wrapper's call. Calling through an empty slot
    /// is never allowed to proceed: this panics with the [`GlError`] naming
    /// the entry point.
    #[track_caller]
    #[inline]
    pub fn require(&self, slot: SlotId) -> *const c_void {
        match self.get(slot) {
            Ok(address) => address.as_ptr(),
            Err(err) => panic!("{err}"),
        }
    }

    pub fn is_resolved(&self, slot: SlotId) -> bool {
        self.get(slot).is_ok()
    }

    /// Symbol name of `slot`.
    pub fn name(&self, slot: SlotId) -> Option<&'static CStr> {
        self.layout.name(slot)
    }

    fn symbol(&self, slot: SlotId) -> String {
        self.name(slot)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("<{slot}>"))
    }
}

impl std::fmt::Debug for EntryPoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryPoints")
            .field("len", &self.len())
            .field("state", &self.state())
            .finish()
    }
}
