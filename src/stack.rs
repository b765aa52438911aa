//! Device stack boundary
//!
//! The host networking stack owns interface registration, upper/master
//! linkage, and receive-intercept installation. The bridge core talks to it
//! through the [`DeviceStack`] trait; [`MemStack`] is the in-memory
//! implementation used by the interactive console and the tests.

use crate::error::{Error, Result};
use crate::hwaddr::HwAddr;
use crate::iface::{IfaceHandle, IfaceKind, NetIface};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Contract consumed from the host networking stack
///
/// All calls complete or fail synchronously; none of them block on I/O.
pub trait DeviceStack: Send + Sync {
    /// Allocate and register a new interface under the given name
    fn register_interface(&self, kind: IfaceKind, name: &str) -> Result<IfaceHandle>;

    /// Unregister and release an interface
    fn unregister_interface(&self, iface: &IfaceHandle);

    /// Record `master` as the upper device of `slave`
    fn set_upper_master(&self, slave: &IfaceHandle, master: &IfaceHandle) -> Result<()>;

    /// Remove the upper linkage between `slave` and `master`, if present
    fn clear_upper_master(&self, slave: &IfaceHandle, master: &IfaceHandle);

    /// Install the bridge receive intercept on an interface
    fn install_receive_intercept(&self, iface: &IfaceHandle);

    /// Remove the bridge receive intercept from an interface
    fn remove_receive_intercept(&self, iface: &IfaceHandle);

    /// Change the administrative up/down state of an interface
    fn set_admin_up(&self, iface: &IfaceHandle, up: bool);

    /// Resolve a registered interface by name
    fn lookup(&self, name: &str) -> Option<IfaceHandle>;

    /// Device index of the current upper device of `slave`, if any
    fn upper_master(&self, slave: &IfaceHandle) -> Option<u32>;
}

/// In-memory device stack
///
/// Simulates interface registration and linkage with plain maps. Supports
/// failure injection so tests can exercise bring-up shortfall and the
/// attach unwind path.
pub struct MemStack {
    inner: Mutex<StackInner>,
}

struct StackInner {
    /// Next device index to assign
    next_index: u32,

    /// Registered interfaces by name
    ifaces: HashMap<String, IfaceHandle>,

    /// Upper/master linkage: slave index -> master index
    uppers: HashMap<u32, u32>,

    /// Names whose next registration fails
    fail_register: HashSet<String>,

    /// Slave indices whose linkage calls fail
    fail_linkage: HashSet<u32>,
}

impl MemStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StackInner {
                next_index: 1,
                ifaces: HashMap::new(),
                uppers: HashMap::new(),
                fail_register: HashSet::new(),
                fail_linkage: HashSet::new(),
            }),
        }
    }

    /// Number of currently registered interfaces
    pub fn iface_count(&self) -> usize {
        self.inner.lock().unwrap().ifaces.len()
    }
}

impl Default for MemStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl MemStack {
    /// Make the next registration of `name` fail
    pub fn fail_register(&self, name: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_register
            .insert(name.to_string());
    }

    /// Make linkage calls for the given slave fail
    pub fn fail_linkage(&self, slave: &IfaceHandle) {
        self.inner
            .lock()
            .unwrap()
            .fail_linkage
            .insert(slave.index());
    }
}

impl DeviceStack for MemStack {
    fn register_interface(&self, kind: IfaceKind, name: &str) -> Result<IfaceHandle> {
        let mut inner = self.inner.lock().unwrap();

        if inner.fail_register.remove(name) {
            return Err(Error::RegistrationFailed {
                name: name.to_string(),
                reason: "interface allocation failed".to_string(),
            });
        }
        if inner.ifaces.contains_key(name) {
            return Err(Error::RegistrationFailed {
                name: name.to_string(),
                reason: "name already in use".to_string(),
            });
        }

        let index = inner.next_index;
        inner.next_index += 1;

        let iface: IfaceHandle = Arc::new(NetIface::new(
            index,
            name,
            kind,
            HwAddr::local_assigned(index),
        ));
        inner.ifaces.insert(name.to_string(), iface.clone());
        Ok(iface)
    }

    fn unregister_interface(&self, iface: &IfaceHandle) {
        let mut inner = self.inner.lock().unwrap();

        if let Some(current) = inner.ifaces.get(iface.name()) {
            if Arc::ptr_eq(current, iface) {
                inner.ifaces.remove(iface.name());
            }
        }
        let index = iface.index();
        inner.uppers.retain(|slave, master| *slave != index && *master != index);

        iface.set_admin_up(false);
        iface.set_registered(false);
    }

    fn set_upper_master(&self, slave: &IfaceHandle, master: &IfaceHandle) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();

        if inner.fail_linkage.remove(&slave.index()) {
            return Err(Error::LinkageFailed {
                slave: slave.name().to_string(),
                master: master.name().to_string(),
                reason: "linkage rejected by stack".to_string(),
            });
        }
        if inner.uppers.contains_key(&slave.index()) {
            return Err(Error::LinkageFailed {
                slave: slave.name().to_string(),
                master: master.name().to_string(),
                reason: "slave already has an upper device".to_string(),
            });
        }

        inner.uppers.insert(slave.index(), master.index());
        Ok(())
    }

    fn clear_upper_master(&self, slave: &IfaceHandle, master: &IfaceHandle) {
        let mut inner = self.inner.lock().unwrap();
        if inner.uppers.get(&slave.index()) == Some(&master.index()) {
            inner.uppers.remove(&slave.index());
        }
    }

    fn install_receive_intercept(&self, iface: &IfaceHandle) {
        iface.set_intercept(true);
    }

    fn remove_receive_intercept(&self, iface: &IfaceHandle) {
        iface.set_intercept(false);
    }

    fn set_admin_up(&self, iface: &IfaceHandle, up: bool) {
        iface.set_admin_up(up);
    }

    fn lookup(&self, name: &str) -> Option<IfaceHandle> {
        self.inner.lock().unwrap().ifaces.get(name).cloned()
    }

    fn upper_master(&self, slave: &IfaceHandle) -> Option<u32> {
        self.inner.lock().unwrap().uppers.get(&slave.index()).copied()
    }
}
