//! Brigade - minimal virtual network bridge manager
//!
//! Creates bridge interfaces, enslaves existing interfaces to them as
//! ports, and tears everything down cleanly. The core is the concurrent
//! port/bridge registry: mutation happens under a coarse per-bridge lock
//! while the data-plane receive path reads the interface-to-port
//! association lock-free, with reclamation deferred until every reader
//! has drained. Forwarding is deliberately out of scope; transmit consumes
//! every frame.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod console;
pub mod datapath;
pub mod error;
pub mod hwaddr;
pub mod iface;
pub mod port;
pub mod registry;
pub mod stack;
