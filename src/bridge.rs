//! Bridge records and the attach/detach protocols
//!
//! A [`Bridge`] owns an ordered collection of enslaved interfaces and the
//! exclusive lock guarding it. Attach publishes a port record for lock-free
//! data-plane lookup; detach unpublishes it and waits for readers to drain
//! before the record is reclaimed.

use crate::datapath::TxVerdict;
use crate::error::{Error, Result};
use crate::hwaddr::HwAddr;
use crate::iface::{IfaceHandle, IfaceKind};
use crate::port;
use crate::stack::DeviceStack;
use crossbeam::epoch;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// A bridge interface and its enslaved ports
pub struct Bridge {
    /// Unique id, assigned sequentially at creation
    id: usize,

    /// The bridge's own registered interface
    dev: IfaceHandle,

    /// Exclusive lock guarding the address and the port collection
    inner: Mutex<BridgeInner>,
}

struct BridgeInner {
    /// Current bridge hardware address
    addr: HwAddr,

    /// Enslaved interfaces, in attach order
    ports: Vec<IfaceHandle>,
}

impl Bridge {
    pub(crate) fn new(id: usize, dev: IfaceHandle) -> Self {
        let addr = dev.addr();
        Self {
            id,
            dev,
            inner: Mutex::new(BridgeInner {
                addr,
                ports: Vec::new(),
            }),
        }
    }

    /// Unique bridge id
    pub fn id(&self) -> usize {
        self.id
    }

    /// The bridge's own interface handle
    pub fn dev(&self) -> &IfaceHandle {
        &self.dev
    }

    /// Name of the bridge interface
    pub fn name(&self) -> &str {
        self.dev.name()
    }

    /// Current bridge hardware address
    pub fn addr(&self) -> HwAddr {
        self.inner.lock().unwrap().addr
    }

    /// Number of enslaved ports
    pub fn port_count(&self) -> usize {
        self.inner.lock().unwrap().ports.len()
    }

    /// Names of the enslaved ports, in attach order
    pub fn port_names(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .ports
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Enslave an interface to this bridge
    ///
    /// Validation happens before any mutation; a linkage failure after the
    /// port was published unwinds to the exact pre-call state.
    pub fn attach(&self, stack: &dyn DeviceStack, iface: &IfaceHandle) -> Result<()> {
        if !iface.is_registered() {
            return Err(Error::InvalidInterface(iface.name().to_string()));
        }
        if iface.kind() == IfaceKind::Bridge {
            return Err(Error::WouldLoop(iface.name().to_string()));
        }
        {
            let guard = epoch::pin();
            if let Some(rec) = port::lookup(iface.port_cell(), &guard) {
                return Err(Error::AlreadyBridged {
                    iface: iface.name().to_string(),
                    bridge: rec.bridge(),
                });
            }
        }

        let record = port::allocate(self.id, iface)?;

        let mut inner = self.inner.lock().unwrap();

        iface.set_bridge_port(true);
        stack.install_receive_intercept(iface);
        port::publish(iface.port_cell(), record);
        inner.ports.push(iface.clone());

        if let Err(err) = stack.set_upper_master(iface, &self.dev) {
            inner.ports.retain(|p| !Arc::ptr_eq(p, iface));
            {
                let guard = epoch::pin();
                port::unpublish(iface.port_cell(), &guard);
            }
            stack.remove_receive_intercept(iface);
            iface.set_bridge_port(false);
            drop(inner);
            port::quiesce();
            debug!(bridge = self.id, iface = iface.name(), "attach unwound");
            return Err(err);
        }

        debug!(bridge = self.id, iface = iface.name(), "port attached");
        Ok(())
    }

    /// Release an interface from this bridge
    pub fn detach(&self, stack: &dyn DeviceStack, iface: &IfaceHandle) -> Result<()> {
        if !iface.is_registered() {
            return Err(Error::InvalidInterface(iface.name().to_string()));
        }

        // Best-effort: there may be nothing to undo.
        stack.clear_upper_master(iface, &self.dev);

        {
            let guard = epoch::pin();
            match port::lookup(iface.port_cell(), &guard) {
                Some(rec) if rec.bridge() == self.id => {}
                _ => return Err(Error::NotAPort(iface.name().to_string())),
            }
        }

        stack.remove_receive_intercept(iface);

        let mut inner = self.inner.lock().unwrap();
        inner.ports.retain(|p| !Arc::ptr_eq(p, iface));
        {
            let guard = epoch::pin();
            port::unpublish(iface.port_cell(), &guard);
        }
        iface.set_bridge_port(false);
        drop(inner);

        port::quiesce();

        debug!(bridge = self.id, iface = iface.name(), "port detached");
        Ok(())
    }

    /// Unpublish and reclaim every remaining port
    ///
    /// Teardown-only path: the registry owns the only mutation context, so
    /// the full detach validation is skipped.
    pub(crate) fn release_ports(&self, stack: &dyn DeviceStack) {
        let drained: Vec<IfaceHandle> = {
            let mut inner = self.inner.lock().unwrap();
            std::mem::take(&mut inner.ports)
        };

        for iface in &drained {
            stack.clear_upper_master(iface, &self.dev);
            stack.remove_receive_intercept(iface);
            {
                let guard = epoch::pin();
                port::unpublish(iface.port_cell(), &guard);
            }
            iface.set_bridge_port(false);
            debug!(bridge = self.id, iface = iface.name(), "port released");
        }

        if !drained.is_empty() {
            port::quiesce();
        }
    }

    /// Bring the bridge interface administratively up
    pub fn open(&self, stack: &dyn DeviceStack) {
        stack.set_admin_up(&self.dev, true);
    }

    /// Bring the bridge interface administratively down
    pub fn stop(&self, stack: &dyn DeviceStack) {
        stack.set_admin_up(&self.dev, false);
    }

    /// Change the bridge hardware address
    pub fn set_address(&self, addr: HwAddr) -> Result<()> {
        if !addr.is_valid_unicast() {
            return Err(Error::AddressUnavailable(addr));
        }
        if !self.dev.is_registered() {
            return Err(Error::NotReady(self.name().to_string()));
        }

        let mut inner = self.inner.lock().unwrap();
        if inner.addr != addr {
            inner.addr = addr;
            self.dev.set_addr(addr);
            debug!(bridge = self.id, %addr, "address changed");
        }
        Ok(())
    }

    /// Transmit callback: every frame is consumed, nothing is forwarded
    pub fn transmit(&self, frame: &[u8]) -> TxVerdict {
        trace!(bridge = self.id, len = frame.len(), "frame dropped on transmit");
        TxVerdict::Consumed
    }
}
