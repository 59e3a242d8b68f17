//! Curate - item status engine for curated registries.
//!
//! Turns raw registry item records (contract status, dispute, appeal window,
//! crowdfunding flags) into a single displayable status code, and decides
//! which of the three registry variants (Classic, Light, Permanent) an
//! address implements so the right status rules apply.
//!
//! ```text
//! indexer / contract ─→ VariantResolver ─→ RegistryVariant
//!                                               │
//! item snapshot + parameters + now ─→ status::derive_status ─→ StatusView
//! ```
//!
//! The status functions are pure. Only the resolver performs I/O, through
//! the [`ContractProbe`] and [`IndexerClient`] seams; concrete HTTP
//! transports live in the `curate-common` crate.

pub mod address;
pub mod error;
pub mod resolver;
pub mod status;

pub use async_trait::async_trait;

pub use address::RegistryAddress;
pub use error::{AddressError, IndexerError, ProbeError, StatusError};
pub use resolver::{
    ChainEndpoints, ContractProbe, IndexerClient, IndexerEndpoint, IndexerQuery, RegistryVariant,
    RegistryView, Resolution, ResolverConfig, VariantResolver,
};
pub use status::{
    derive_status, ItemSnapshot, ItemStatus, RegistryParameters, StatusView,
};
