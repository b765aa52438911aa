//! Hardware (MAC) address type
//!
//! Provides:
//! - A fixed six-byte address value
//! - Unicast validation (bridge addresses must be unicast and non-zero)
//! - Parsing from and formatting to colon-separated hex

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A six-byte hardware address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HwAddr([u8; 6]);

impl HwAddr {
    /// The all-zero address
    pub const ZERO: HwAddr = HwAddr([0; 6]);

    /// Create an address from raw bytes
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Raw bytes of the address
    pub fn bytes(&self) -> [u8; 6] {
        self.0
    }

    /// True if every byte is zero
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 6]
    }

    /// True if the group bit (LSB of the first octet) is set
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// True if the address may be assigned to a device: unicast and non-zero
    pub fn is_valid_unicast(&self) -> bool {
        !self.is_multicast() && !self.is_zero()
    }

    /// Deterministic locally-administered address for a device index
    ///
    /// Sets the locally-administered bit and embeds the index in the
    /// trailing four octets, so simulated devices get stable, distinct,
    /// valid unicast addresses.
    pub fn local_assigned(index: u32) -> Self {
        let ix = index.to_be_bytes();
        Self([0x02, 0x42, ix[0], ix[1], ix[2], ix[3]])
    }
}

impl fmt::Display for HwAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for HwAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');

        for byte in bytes.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| Error::AddressParse(s.to_string()))?;
            *byte =
                u8::from_str_radix(part, 16).map_err(|_| Error::AddressParse(s.to_string()))?;
        }

        if parts.next().is_some() {
            return Err(Error::AddressParse(s.to_string()));
        }

        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_not_valid_unicast() {
        assert!(HwAddr::ZERO.is_zero());
        assert!(!HwAddr::ZERO.is_valid_unicast());
    }

    #[test]
    fn test_multicast_is_not_valid_unicast() {
        let addr = HwAddr::new([0x01, 0x00, 0x5e, 0x00, 0x00, 0x01]);
        assert!(addr.is_multicast());
        assert!(!addr.is_valid_unicast());
    }

    #[test]
    fn test_unicast_is_valid() {
        let addr = HwAddr::new([0x02, 0x42, 0x00, 0x00, 0x00, 0x01]);
        assert!(addr.is_valid_unicast());
    }

    #[test]
    fn test_local_assigned_is_valid_and_distinct() {
        let a = HwAddr::local_assigned(0);
        let b = HwAddr::local_assigned(1);
        assert!(a.is_valid_unicast());
        assert!(b.is_valid_unicast());
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_roundtrip() {
        let addr: HwAddr = "02:42:ab:cd:ef:01".parse().unwrap();
        assert_eq!(addr.bytes(), [0x02, 0x42, 0xab, 0xcd, 0xef, 0x01]);
        assert_eq!(addr.to_string(), "02:42:ab:cd:ef:01");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("02:42:ab".parse::<HwAddr>().is_err());
        assert!("02:42:ab:cd:ef:01:99".parse::<HwAddr>().is_err());
        assert!("zz:42:ab:cd:ef:01".parse::<HwAddr>().is_err());
    }
}
