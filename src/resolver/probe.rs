//! Contract probing.
//!
//! A probe is a read-only call to a method that only one registry variant
//! implements. Success identifies the variant; a revert only means "not this
//! variant" and is never surfaced as an error.

use async_trait::async_trait;

use crate::address::RegistryAddress;
use crate::error::ProbeError;

/// A variant-discriminating contract method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeMethod {
    /// Solidity signature, for logging.
    pub signature: &'static str,
    /// First four bytes of `keccak256(signature)`.
    pub selector: [u8; 4],
}

impl ProbeMethod {
    /// ABI-encoded calldata for a call without arguments.
    pub fn calldata(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }
}

/// Only Light registries expose their relayer contract.
pub const LIGHT_PROBE: ProbeMethod = ProbeMethod {
    signature: "relayerContract()",
    selector: [0xc6, 0x69, 0x43, 0x9e],
};

/// Only Classic registries keep an on-chain item count.
pub const CLASSIC_PROBE: ProbeMethod = ProbeMethod {
    signature: "itemCount()",
    selector: [0x6b, 0xfb, 0x0d, 0x01],
};

/// Read-only contract call transport.
///
/// Implementations return [`ProbeError::Reverted`] when the call reverts or
/// returns no data, and [`ProbeError::Unavailable`] when no read provider is
/// configured for the chain.
#[async_trait]
pub trait ContractProbe: Send + Sync {
    /// Calls `method` on `address` and returns the raw return data.
    async fn call(
        &self,
        chain_id: u64,
        address: &RegistryAddress,
        method: &ProbeMethod,
    ) -> Result<Vec<u8>, ProbeError>;
}
