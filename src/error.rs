//! Error types shared across the status engine and the variant resolver.

use crate::resolver::RegistryVariant;

/// Derivation failure.
///
/// Raised when an item snapshot reaches a combination of fields that no
/// status rule covers. Callers must surface this as "could not determine
/// status" and never substitute a default code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("unhandled {variant} item state: {detail}")]
    UnhandledState {
        variant: RegistryVariant,
        detail: String,
    },
    #[error("{variant} item is missing `{field}`")]
    MissingField {
        variant: RegistryVariant,
        field: &'static str,
    },
    #[error("item snapshot is {snapshot} but registry parameters are {parameters}")]
    VariantMismatch {
        snapshot: RegistryVariant,
        parameters: RegistryVariant,
    },
}

impl StatusError {
    pub(crate) fn unhandled(variant: RegistryVariant, detail: impl Into<String>) -> Self {
        Self::UnhandledState {
            variant,
            detail: detail.into(),
        }
    }
}

/// Contract probe failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// The call reverted or returned no data. Expected when the contract is
    /// not of the probed variant.
    #[error("call reverted")]
    Reverted,
    /// No read provider is configured for the chain.
    #[error("no read provider for chain {0}")]
    Unavailable(u64),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Indexer query failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexerError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("indexer responded with HTTP {0}")]
    Status(u16),
    #[error("indexer returned errors: {0}")]
    Graphql(String),
    #[error("indexer query timed out")]
    Timeout,
    #[error("failed to decode indexer response: {0}")]
    Decode(String),
}

/// Registry address parse failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("address must be 20 bytes, got {0}")]
    InvalidLength(usize),
    #[error("address is not valid hex: {0}")]
    InvalidHex(String),
}
