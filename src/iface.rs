//! Network interface objects
//!
//! Interfaces are owned by the device stack (see [`crate::stack`]); the
//! bridge core only holds cloned handles. Each interface carries the
//! atomically-published port association cell that the data plane reads
//! without locking.

use crate::hwaddr::HwAddr;
use crate::port::PortRecord;
use crossbeam::epoch::{self, Atomic};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Kind of a registered interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfaceKind {
    /// A bridge device created by this manager
    Bridge,
    /// An ordinary ethernet device eligible for enslavement
    Ethernet,
}

/// A network interface as seen by the bridge core
///
/// The stack that registered the interface controls its lifetime; bridge
/// code records associations on it but never unregisters it on its own
/// (teardown asks the stack to do that).
pub struct NetIface {
    /// Stable device index assigned at registration
    index: u32,

    /// Interface name (e.g., "brig0", "eth0")
    name: String,

    /// Device kind, fixed at registration
    kind: IfaceKind,

    /// Current hardware address
    addr: Mutex<HwAddr>,

    /// Whether the interface is currently registered with the stack
    registered: AtomicBool,

    /// Administrative up/down state
    admin_up: AtomicBool,

    /// Advisory flag: this interface is enslaved to a bridge
    bridge_port: AtomicBool,

    /// Whether the bridge receive intercept is installed
    intercept: AtomicBool,

    /// Published interface-to-port association, read lock-free by the
    /// data plane. Null when the interface is not enslaved.
    port_cell: Atomic<PortRecord>,
}

/// Shared handle to a registered interface
pub type IfaceHandle = Arc<NetIface>;

impl NetIface {
    pub(crate) fn new(index: u32, name: &str, kind: IfaceKind, addr: HwAddr) -> Self {
        Self {
            index,
            name: name.to_string(),
            kind,
            addr: Mutex::new(addr),
            registered: AtomicBool::new(true),
            admin_up: AtomicBool::new(false),
            bridge_port: AtomicBool::new(false),
            intercept: AtomicBool::new(false),
            port_cell: Atomic::null(),
        }
    }

    /// Stable device index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Interface name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device kind
    pub fn kind(&self) -> IfaceKind {
        self.kind
    }

    /// Current hardware address
    pub fn addr(&self) -> HwAddr {
        *self.addr.lock().unwrap()
    }

    pub(crate) fn set_addr(&self, addr: HwAddr) {
        *self.addr.lock().unwrap() = addr;
    }

    /// Whether the interface is still registered with the stack
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    pub(crate) fn set_registered(&self, registered: bool) {
        self.registered.store(registered, Ordering::SeqCst);
    }

    /// Administrative up/down state
    pub fn is_admin_up(&self) -> bool {
        self.admin_up.load(Ordering::SeqCst)
    }

    pub(crate) fn set_admin_up(&self, up: bool) {
        self.admin_up.store(up, Ordering::SeqCst);
    }

    /// Advisory flag: enslaved to a bridge
    pub fn is_bridge_port(&self) -> bool {
        self.bridge_port.load(Ordering::SeqCst)
    }

    pub(crate) fn set_bridge_port(&self, enslaved: bool) {
        self.bridge_port.store(enslaved, Ordering::SeqCst);
    }

    /// Whether the bridge receive intercept is installed
    pub fn intercept_installed(&self) -> bool {
        self.intercept.load(Ordering::SeqCst)
    }

    pub(crate) fn set_intercept(&self, installed: bool) {
        self.intercept.store(installed, Ordering::SeqCst);
    }

    pub(crate) fn port_cell(&self) -> &Atomic<PortRecord> {
        &self.port_cell
    }
}

impl Drop for NetIface {
    fn drop(&mut self) {
        // A record still published here can have no remaining readers:
        // this is the last handle. Reclaim it directly.
        let cell = std::mem::replace(&mut self.port_cell, Atomic::null());
        let shared = cell.load(Ordering::Relaxed, unsafe { epoch::unprotected() });
        if !shared.is_null() {
            drop(unsafe { shared.into_owned() });
        }
    }
}

impl std::fmt::Debug for NetIface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetIface")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("registered", &self.is_registered())
            .field("admin_up", &self.is_admin_up())
            .field("bridge_port", &self.is_bridge_port())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_iface_state() {
        let iface = NetIface::new(3, "eth0", IfaceKind::Ethernet, HwAddr::local_assigned(3));
        assert_eq!(iface.index(), 3);
        assert_eq!(iface.name(), "eth0");
        assert_eq!(iface.kind(), IfaceKind::Ethernet);
        assert!(iface.is_registered());
        assert!(!iface.is_admin_up());
        assert!(!iface.is_bridge_port());
        assert!(!iface.intercept_installed());
    }

    #[test]
    fn test_drop_reclaims_published_record() {
        // No readers exist; dropping the last handle must free the record
        // without going through a detach.
        let iface = NetIface::new(7, "eth7", IfaceKind::Ethernet, HwAddr::local_assigned(7));
        crate::port::publish(iface.port_cell(), PortRecord::new(0, 7, "eth7"));
        drop(iface);
    }
}
