//! Data-plane receive path
//!
//! Receive-side lookups run concurrently with control-plane mutation and
//! must never block on the bridge lock: they pin an epoch guard, read the
//! published association, and drop the guard. A record observed here stays
//! valid until the guard is dropped, even if a detach unpublishes it
//! concurrently.

use crate::iface::NetIface;
use crate::port;
use crossbeam::epoch;
use tracing::trace;

/// Outcome of the receive intercept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxVerdict {
    /// Frame belongs to a bridge port and was consumed
    Consumed,
    /// Not a bridge port; the frame continues up the normal stack path
    Pass,
}

/// Outcome of the bridge transmit callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxVerdict {
    /// Frame accepted and dropped; forwarding is out of scope
    Consumed,
}

/// Lock-free lookup: which bridge, if any, has enslaved this interface
pub fn bridged_by(iface: &NetIface) -> Option<usize> {
    let guard = epoch::pin();
    port::lookup(iface.port_cell(), &guard).map(|rec| rec.bridge())
}

/// Receive hook installed on enslaved interfaces
///
/// Frames arriving on a bridge port are consumed without forwarding;
/// everything else passes through untouched.
pub fn receive(iface: &NetIface, frame: &[u8]) -> RxVerdict {
    if !iface.intercept_installed() {
        return RxVerdict::Pass;
    }

    let guard = epoch::pin();
    match port::lookup(iface.port_cell(), &guard) {
        Some(rec) => {
            trace!(
                bridge = rec.bridge(),
                iface = iface.name(),
                len = frame.len(),
                "frame consumed on bridge port"
            );
            RxVerdict::Consumed
        }
        None => RxVerdict::Pass,
    }
}
