use std::fmt;

use alloy::primitives::Address as AlloyAddress;

/// A 20-byte EVM account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvmAddress([u8; 20]);

impl EvmAddress {
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<AlloyAddress> for EvmAddress {
    fn from(addr: AlloyAddress) -> Self {
        Self(addr.into_array())
    }
}

impl From<EvmAddress> for AlloyAddress {
    fn from(addr: EvmAddress) -> Self {
        AlloyAddress::from(addr.0)
    }
}
