//! Indexer existence checks.

use async_trait::async_trait;

use super::config::IndexerQuery;
use crate::address::RegistryAddress;
use crate::error::IndexerError;

/// Transport for registry existence lookups against an indexer.
#[async_trait]
pub trait IndexerClient: Send + Sync {
    /// Returns `true` if the indexer holds a registry record keyed by the
    /// (lower-cased) `address`, `false` if it answered with null.
    async fn registry_exists(
        &self,
        query: &IndexerQuery,
        address: &RegistryAddress,
    ) -> Result<bool, IndexerError>;
}
