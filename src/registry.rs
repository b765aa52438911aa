//! Bridge registry
//!
//! Owns every bridge record and orchestrates bulk bring-up and teardown.
//! All structural mutation goes through `&mut Registry`, which serializes
//! administrative operations the way the host framework's global lock
//! would: at most one mutator process-wide.

use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::hwaddr::HwAddr;
use crate::iface::{IfaceHandle, IfaceKind};
use crate::stack::DeviceStack;
use std::sync::Arc;
use tracing::{info, warn};

/// Deterministic bridge interface name for an id
pub fn bridge_name(id: usize) -> String {
    format!("brig{id}")
}

/// Process-wide collection of all bridges
pub struct Registry {
    /// The external device stack
    stack: Arc<dyn DeviceStack>,

    /// All bridges, in creation order
    bridges: Vec<Arc<Bridge>>,

    /// Next bridge id to assign; ids are never reused
    next_id: usize,
}

impl Registry {
    /// Create an empty registry backed by the given stack
    pub fn new(stack: Arc<dyn DeviceStack>) -> Self {
        Self {
            stack,
            bridges: Vec::new(),
            next_id: 0,
        }
    }

    /// The device stack this registry operates against
    pub fn stack(&self) -> &Arc<dyn DeviceStack> {
        &self.stack
    }

    /// All bridges, in creation order
    pub fn bridges(&self) -> &[Arc<Bridge>] {
        &self.bridges
    }

    /// Look up a bridge by id
    pub fn bridge(&self, id: usize) -> Option<&Arc<Bridge>> {
        self.bridges.iter().find(|b| b.id() == id)
    }

    /// Look up a bridge by interface name
    pub fn bridge_named(&self, name: &str) -> Option<&Arc<Bridge>> {
        self.bridges.iter().find(|b| b.name() == name)
    }

    /// Create `count` bridges with sequential ids
    ///
    /// A registration failure for one index is logged and does not abort
    /// the remaining indices. Returns the number of bridges created.
    pub fn create_bridges(&mut self, count: usize) -> usize {
        let base = self.next_id;
        let mut created = 0;

        for i in 0..count {
            let id = base + i;
            let name = bridge_name(id);
            match self.stack.register_interface(IfaceKind::Bridge, &name) {
                Ok(dev) => {
                    info!(bridge = id, name = %name, "bridge created");
                    self.bridges.push(Arc::new(Bridge::new(id, dev)));
                    created += 1;
                }
                Err(err) => {
                    warn!(bridge = id, name = %name, %err, "bridge creation failed");
                }
            }
        }

        self.next_id = base + count;
        created
    }

    /// Tear down every bridge and release every remaining port
    ///
    /// Fail-soft: every step runs for every bridge regardless of earlier
    /// failures. Safe to call on an empty registry.
    pub fn teardown_all(&mut self) {
        for bridge in self.bridges.drain(..) {
            bridge.release_ports(self.stack.as_ref());
            self.stack.unregister_interface(bridge.dev());
            info!(bridge = bridge.id(), name = bridge.name(), "bridge destroyed");
        }
    }

    /// Enslave an interface to the bridge with the given id
    pub fn attach(&mut self, bridge_id: usize, iface: &IfaceHandle) -> Result<()> {
        let bridge = self.require(bridge_id)?.clone();
        bridge.attach(self.stack.as_ref(), iface)
    }

    /// Release an interface from the bridge with the given id
    pub fn detach(&mut self, bridge_id: usize, iface: &IfaceHandle) -> Result<()> {
        let bridge = self.require(bridge_id)?.clone();
        bridge.detach(self.stack.as_ref(), iface)
    }

    /// Change the address of the bridge with the given id
    pub fn set_address(&mut self, bridge_id: usize, addr: HwAddr) -> Result<()> {
        self.require(bridge_id)?.set_address(addr)
    }

    fn require(&self, bridge_id: usize) -> Result<&Arc<Bridge>> {
        self.bridge(bridge_id)
            .ok_or_else(|| Error::UnknownBridge(bridge_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datapath;
    use crate::stack::MemStack;

    fn setup() -> (Arc<MemStack>, Registry) {
        let stack = Arc::new(MemStack::new());
        let registry = Registry::new(stack.clone());
        (stack, registry)
    }

    #[test]
    fn test_create_bridges_counts() {
        for n in [0usize, 1, 5] {
            let (_stack, mut registry) = setup();
            assert_eq!(registry.create_bridges(n), n);
            assert_eq!(registry.bridges().len(), n);

            let ids: Vec<usize> = registry.bridges().iter().map(|b| b.id()).collect();
            let expected: Vec<usize> = (0..n).collect();
            assert_eq!(ids, expected);
        }
    }

    #[test]
    fn test_create_bridges_names_follow_pattern() {
        let (_stack, mut registry) = setup();
        registry.create_bridges(3);
        let names: Vec<String> = registry
            .bridges()
            .iter()
            .map(|b| b.name().to_string())
            .collect();
        assert_eq!(names, vec!["brig0", "brig1", "brig2"]);
    }

    #[test]
    fn test_create_bridges_continues_after_failure() {
        let (stack, mut registry) = setup();
        stack.fail_register("brig1");

        assert_eq!(registry.create_bridges(3), 2);
        let ids: Vec<usize> = registry.bridges().iter().map(|b| b.id()).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let (_stack, mut registry) = setup();
        registry.create_bridges(2);
        registry.teardown_all();
        registry.create_bridges(2);

        let ids: Vec<usize> = registry.bridges().iter().map(|b| b.id()).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_dispatch_to_unknown_bridge() {
        let (stack, mut registry) = setup();
        registry.create_bridges(1);
        let eth = stack
            .register_interface(IfaceKind::Ethernet, "eth0")
            .unwrap();

        assert!(matches!(
            registry.attach(9, &eth),
            Err(Error::UnknownBridge(_))
        ));
        assert!(matches!(
            registry.detach(9, &eth),
            Err(Error::UnknownBridge(_))
        ));
    }

    #[test]
    fn test_lookup_by_name_and_id() {
        let (_stack, mut registry) = setup();
        registry.create_bridges(2);

        assert_eq!(registry.bridge_named("brig1").unwrap().id(), 1);
        assert_eq!(registry.bridge(0).unwrap().name(), "brig0");
        assert!(registry.bridge_named("brig7").is_none());
        assert!(registry.bridge(7).is_none());
    }

    #[test]
    fn test_teardown_drains_ports_across_bridges() {
        let (stack, mut registry) = setup();
        assert_eq!(registry.create_bridges(2), 2);

        let mut ifaces = Vec::new();
        for (i, name) in ["eth0", "eth1", "eth2"].iter().enumerate() {
            let eth = stack
                .register_interface(IfaceKind::Ethernet, name)
                .unwrap();
            registry.attach(i % 2, &eth).unwrap();
            ifaces.push(eth);
        }

        registry.teardown_all();

        assert!(registry.bridges().is_empty());
        for eth in &ifaces {
            assert_eq!(datapath::bridged_by(eth), None);
            assert!(!eth.is_bridge_port());
            assert!(!eth.intercept_installed());
            assert_eq!(stack.upper_master(eth), None);
        }
        // The enslaved interfaces themselves stay registered; only the
        // bridge devices are released.
        assert_eq!(stack.iface_count(), 3);
    }

    #[test]
    fn test_teardown_on_empty_registry() {
        let (_stack, mut registry) = setup();
        registry.teardown_all();
        registry.teardown_all();
        assert!(registry.bridges().is_empty());
    }

    #[test]
    fn test_teardown_unregisters_bridge_devices() {
        let (stack, mut registry) = setup();
        registry.create_bridges(2);
        let dev0 = registry.bridge(0).unwrap().dev().clone();

        registry.teardown_all();
        assert!(!dev0.is_registered());
        assert!(stack.lookup("brig0").is_none());
        assert_eq!(stack.iface_count(), 0);
    }
}
