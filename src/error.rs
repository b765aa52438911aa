//! Unified error types for Brigade

use crate::hwaddr::HwAddr;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Brigade operations
#[derive(Error, Debug)]
pub enum Error {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Config errors
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation failed: {0}")]
    ConfigValidation(String),

    // Address errors
    #[error("Invalid hardware address '{0}'")]
    AddressParse(String),

    #[error("Address {0} is not a valid unicast hardware address")]
    AddressUnavailable(HwAddr),

    // Attach/detach errors
    #[error("Interface '{0}' is not registered")]
    InvalidInterface(String),

    #[error("Refusing to enslave bridge interface '{0}' to a bridge")]
    WouldLoop(String),

    #[error("Failed to allocate port record for interface '{0}'")]
    OutOfMemory(String),

    #[error("Interface '{0}' is not a port of this bridge")]
    NotAPort(String),

    #[error("Interface '{iface}' is already a port of bridge {bridge}")]
    AlreadyBridged { iface: String, bridge: usize },

    // Device lifecycle errors
    #[error("Bridge interface '{0}' is not fully registered")]
    NotReady(String),

    #[error("Failed to register interface '{name}': {reason}")]
    RegistrationFailed { name: String, reason: String },

    #[error("Failed to link '{slave}' under '{master}': {reason}")]
    LinkageFailed {
        slave: String,
        master: String,
        reason: String,
    },

    // Registry errors
    #[error("No bridge named '{0}'")]
    UnknownBridge(String),
}

/// Result type alias for Brigade operations
pub type Result<T> = std::result::Result<T, Error>;
