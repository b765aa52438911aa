//! Port records and the published association cell
//!
//! A [`PortRecord`] is created by a successful attach and destroyed after a
//! detach (or teardown) once every concurrent reader has drained. The record
//! is published into the interface's association cell through
//! `crossbeam::epoch`, so data-plane readers see either null or a
//! fully-initialized record.

use crate::error::Result;
use crate::iface::NetIface;
use crossbeam::epoch::{self, Atomic, Guard, Owned, Shared};
use std::sync::atomic::Ordering;

/// Rounds of pin-and-flush used by the reclamation drain
const QUIESCE_ROUNDS: usize = 8;

/// State held per enslaved interface, linking it to its owning bridge
///
/// The back-reference is the bridge id, resolved through the registry;
/// the record never owns the bridge or the interface.
pub struct PortRecord {
    /// Id of the owning bridge
    bridge: usize,

    /// Device index of the enslaved interface
    iface_index: u32,

    /// Interface name, kept for diagnostics
    iface_name: String,
}

impl PortRecord {
    pub(crate) fn new(bridge: usize, iface_index: u32, iface_name: &str) -> Self {
        Self {
            bridge,
            iface_index,
            iface_name: iface_name.to_string(),
        }
    }

    /// Id of the owning bridge
    pub fn bridge(&self) -> usize {
        self.bridge
    }

    /// Device index of the enslaved interface
    pub fn iface_index(&self) -> u32 {
        self.iface_index
    }

    /// Name of the enslaved interface
    pub fn iface_name(&self) -> &str {
        &self.iface_name
    }
}

#[cfg(test)]
thread_local! {
    /// Makes the next allocation on this thread fail, for unwind tests
    pub(crate) static FAIL_PORT_ALLOC: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

/// Allocate a port record for an interface about to be enslaved
pub(crate) fn allocate(bridge: usize, iface: &NetIface) -> Result<PortRecord> {
    #[cfg(test)]
    if FAIL_PORT_ALLOC.with(|f| f.replace(false)) {
        return Err(crate::error::Error::OutOfMemory(iface.name().to_string()));
    }

    Ok(PortRecord::new(bridge, iface.index(), iface.name()))
}

/// Publish a fully-initialized record into an association cell
///
/// The caller must hold the owning bridge's lock and must have verified the
/// cell is empty; publication uses a release store so readers that observe
/// the pointer observe every field.
pub(crate) fn publish(cell: &Atomic<PortRecord>, record: PortRecord) {
    cell.store(Owned::new(record), Ordering::Release);
}

/// Lock-free read of the published association
///
/// Returns a reference valid for the lifetime of the guard. Never blocks.
pub(crate) fn lookup<'g>(cell: &Atomic<PortRecord>, guard: &'g Guard) -> Option<&'g PortRecord> {
    let shared = cell.load(Ordering::Acquire, guard);
    if shared.is_null() {
        None
    } else {
        // Non-null pointers in the cell always reference a live record:
        // unpublish defers destruction until all pinned readers drain.
        Some(unsafe { shared.deref() })
    }
}

/// Unpublish the association and schedule the record for reclamation
///
/// Returns false if nothing was published. The record is destroyed only
/// after every reader pinned before the swap has unpinned.
pub(crate) fn unpublish(cell: &Atomic<PortRecord>, guard: &Guard) -> bool {
    let old = cell.swap(Shared::null(), Ordering::AcqRel, guard);
    if old.is_null() {
        return false;
    }
    unsafe { guard.defer_destroy(old) };
    true
}

/// Reclamation drain barrier
///
/// Pushes deferred destructions to the global queue and advances the epoch
/// so records unpublished before this call become unreachable to any reader
/// pinned afterwards. Called by detach and teardown after unpublishing.
pub fn quiesce() {
    for _ in 0..QUIESCE_ROUNDS {
        epoch::pin().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_empty_cell() {
        let cell: Atomic<PortRecord> = Atomic::null();
        let guard = epoch::pin();
        assert!(lookup(&cell, &guard).is_none());
        assert!(!unpublish(&cell, &guard));
    }

    #[test]
    fn test_publish_lookup_unpublish() {
        let cell: Atomic<PortRecord> = Atomic::null();
        publish(&cell, PortRecord::new(2, 9, "eth9"));

        let guard = epoch::pin();
        let rec = lookup(&cell, &guard).unwrap();
        assert_eq!(rec.bridge(), 2);
        assert_eq!(rec.iface_index(), 9);
        assert_eq!(rec.iface_name(), "eth9");

        assert!(unpublish(&cell, &guard));
        assert!(lookup(&cell, &guard).is_none());
        drop(guard);
        quiesce();
    }

    #[test]
    fn test_allocate_failure_injection() {
        let iface = NetIface::new(
            1,
            "eth1",
            crate::iface::IfaceKind::Ethernet,
            crate::hwaddr::HwAddr::local_assigned(1),
        );
        FAIL_PORT_ALLOC.with(|f| f.set(true));
        assert!(allocate(0, &iface).is_err());
        // The flag is one-shot; the next allocation succeeds.
        assert!(allocate(0, &iface).is_ok());
    }
}
