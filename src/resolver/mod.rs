//! Registry variant resolution.
//!
//! Decides whether a registry address is a Classic, Light or Permanent
//! registry so the matching status rules and views can be used.
//!
//! # Resolution order
//!
//! 1. **Contract probes** (only when a read provider is available): call
//!    the Light-only method, then the Classic-only method. A successful call
//!    identifies the variant; a revert is a negative signal, not an error.
//! 2. **Indexer existence checks**: query the classic, light and permanent
//!    indexers concurrently for the lower-cased address. The first indexer
//!    returning a record wins; failures of the others are logged and ignored.
//! 3. Otherwise the registry is `Unknown`. There is no retry; polling is the
//!    caller's concern.
//!
//! Results are memoised per `(chain_id, address)`. `Unknown` is only
//! memoised when no probe failed and every configured indexer (at least
//! one) answered without a record.
//!
//! # Example
//!
//! ```rust,ignore
//! let resolver = VariantResolver::new(config, Arc::new(SubgraphClient::new()?))
//!     .with_probe(Arc::new(JsonRpcProbe::new(&config)?));
//!
//! let resolution = resolver.resolve(&address, 100).await;
//! if resolution.variant == RegistryVariant::Unknown {
//!     // render "registry not found"
//! }
//! ```

mod cache;
pub mod config;
pub mod indexer;
pub mod probe;
pub mod view;

use std::fmt;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::address::RegistryAddress;
use crate::error::{IndexerError, ProbeError};
use cache::VariantCache;

pub use config::{ChainEndpoints, IndexerEndpoint, IndexerQuery, ResolverConfig};
pub use indexer::IndexerClient;
pub use probe::{ContractProbe, ProbeMethod, CLASSIC_PROBE, LIGHT_PROBE};
pub use view::{RegistryView, ViewSnapshot};

/// Registry contract/indexer shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryVariant {
    Classic,
    Light,
    Permanent,
    Unknown,
}

impl RegistryVariant {
    /// Every variant a registry can actually be.
    pub const KNOWN: [RegistryVariant; 3] = [
        RegistryVariant::Classic,
        RegistryVariant::Light,
        RegistryVariant::Permanent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryVariant::Classic => "classic",
            RegistryVariant::Light => "light",
            RegistryVariant::Permanent => "permanent",
            RegistryVariant::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RegistryVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a resolution.
///
/// `checking` is set while a resolution for the key is still running; the
/// variant is `Unknown` in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub variant: RegistryVariant,
    pub checking: bool,
}

impl Resolution {
    pub fn resolved(variant: RegistryVariant) -> Self {
        Self {
            variant,
            checking: false,
        }
    }

    pub fn checking() -> Self {
        Self {
            variant: RegistryVariant::Unknown,
            checking: true,
        }
    }
}

/// Result of the contract-probe phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeOutcome {
    Found(RegistryVariant),
    /// Every probe reverted, or no read provider is configured.
    NotFound,
    /// No match, and at least one probe could not be completed.
    Failed,
}

/// Result of the indexer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexerOutcome {
    Found(RegistryVariant),
    /// Every configured indexer answered without a record.
    NotFound,
    /// No record, and either an indexer could not be reached or none is
    /// configured.
    Inconclusive,
}

/// Resolves registry addresses to their variant.
pub struct VariantResolver {
    config: Arc<ResolverConfig>,
    probe: Option<Arc<dyn ContractProbe>>,
    indexer: Arc<dyn IndexerClient>,
    cache: VariantCache,
}

impl VariantResolver {
    /// Creates a resolver that only uses indexer checks.
    pub fn new(config: Arc<ResolverConfig>, indexer: Arc<dyn IndexerClient>) -> Self {
        Self {
            config,
            probe: None,
            indexer,
            cache: VariantCache::default(),
        }
    }

    /// Enables the contract-probe phase.
    pub fn with_probe(mut self, probe: Arc<dyn ContractProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Current knowledge about `address` without doing any I/O.
    pub async fn peek(&self, address: &RegistryAddress, chain_id: u64) -> Resolution {
        let key = (chain_id, address.clone());
        if let Some(variant) = self.cache.get(&key).await {
            return Resolution::resolved(variant);
        }
        if self.cache.is_in_flight(&key) {
            return Resolution::checking();
        }
        Resolution::resolved(RegistryVariant::Unknown)
    }

    /// Resolves the variant of `address` on `chain_id`.
    ///
    /// Never fails: transport problems degrade to the next source, and
    /// `Unknown` is returned when no source identifies the registry.
    pub async fn resolve(&self, address: &RegistryAddress, chain_id: u64) -> Resolution {
        let key = (chain_id, address.clone());
        if let Some(variant) = self.cache.get(&key).await {
            tracing::debug!(
                target: "curate::resolver",
                chain_id,
                address = %address,
                variant = %variant,
                "Resolution cache hit"
            );
            return Resolution::resolved(variant);
        }

        let _guard = self.cache.begin(key.clone());

        let Some(endpoints) = self.config.chain(chain_id) else {
            tracing::warn!(
                target: "curate::resolver",
                chain_id,
                address = %address,
                "No endpoints configured for chain"
            );
            return Resolution::resolved(RegistryVariant::Unknown);
        };

        let probed = self.probe_contract(address, chain_id).await;
        if let ProbeOutcome::Found(variant) = probed {
            self.remember(key, variant).await;
            return Resolution::resolved(variant);
        }

        match self.check_indexers(endpoints, address).await {
            IndexerOutcome::Found(variant) => {
                self.remember(key, variant).await;
                Resolution::resolved(variant)
            }
            IndexerOutcome::NotFound if probed == ProbeOutcome::NotFound => {
                tracing::info!(
                    target: "curate::resolver",
                    chain_id,
                    address = %address,
                    "Registry not found on any indexer"
                );
                self.cache.insert(key, RegistryVariant::Unknown).await;
                Resolution::resolved(RegistryVariant::Unknown)
            }
            IndexerOutcome::NotFound | IndexerOutcome::Inconclusive => {
                tracing::warn!(
                    target: "curate::resolver",
                    chain_id,
                    address = %address,
                    "Could not resolve registry variant, not caching"
                );
                Resolution::resolved(RegistryVariant::Unknown)
            }
        }
    }

    /// Forgets the memoised result for `address` on `chain_id`.
    pub async fn invalidate(&self, address: &RegistryAddress, chain_id: u64) {
        self.cache.remove(&(chain_id, address.clone())).await;
    }

    /// Forgets every memoised result.
    pub async fn clear(&self) {
        self.cache.clear().await;
    }

    async fn remember(&self, key: (u64, RegistryAddress), variant: RegistryVariant) {
        tracing::info!(
            target: "curate::resolver",
            chain_id = key.0,
            address = %key.1,
            variant = %variant,
            "Registry variant resolved"
        );
        self.cache.insert(key, variant).await;
    }

    /// Light probe first, then Classic. Permanent registries have no
    /// distinguishing probe and are only found through their indexer.
    async fn probe_contract(&self, address: &RegistryAddress, chain_id: u64) -> ProbeOutcome {
        let Some(probe) = self.probe.as_ref() else {
            return ProbeOutcome::NotFound;
        };
        let request_timeout = self.config.request_timeout();
        let mut failed = false;

        for (variant, method) in [
            (RegistryVariant::Light, &LIGHT_PROBE),
            (RegistryVariant::Classic, &CLASSIC_PROBE),
        ] {
            let result = timeout(request_timeout, probe.call(chain_id, address, method))
                .await
                .unwrap_or_else(|_| Err(ProbeError::Transport("probe timed out".to_string())));

            match result {
                Ok(_) => {
                    tracing::debug!(
                        target: "curate::resolver",
                        address = %address,
                        method = method.signature,
                        "Probe succeeded"
                    );
                    return ProbeOutcome::Found(variant);
                }
                Err(ProbeError::Reverted) => {
                    tracing::debug!(
                        target: "curate::resolver",
                        address = %address,
                        method = method.signature,
                        "Probe reverted, not {}",
                        variant
                    );
                }
                Err(ProbeError::Unavailable(chain_id)) => {
                    tracing::debug!(
                        target: "curate::resolver",
                        chain_id,
                        "No read provider, skipping contract probes"
                    );
                    return ProbeOutcome::NotFound;
                }
                Err(e) => {
                    failed = true;
                    tracing::warn!(
                        target: "curate::resolver",
                        address = %address,
                        method = method.signature,
                        error = %e,
                        "Probe failed"
                    );
                }
            }
        }

        if failed {
            ProbeOutcome::Failed
        } else {
            ProbeOutcome::NotFound
        }
    }

    async fn check_indexers(
        &self,
        endpoints: &ChainEndpoints,
        address: &RegistryAddress,
    ) -> IndexerOutcome {
        let request_timeout = self.config.request_timeout();
        let queries = endpoints.indexer_queries();
        if queries.is_empty() {
            return IndexerOutcome::Inconclusive;
        }

        let mut pending: FuturesUnordered<_> = queries
            .iter()
            .map(|query| async move {
                let result = timeout(request_timeout, self.indexer.registry_exists(query, address))
                    .await
                    .unwrap_or(Err(IndexerError::Timeout));
                (query, result)
            })
            .collect();

        let mut failures = 0usize;
        while let Some((query, result)) = pending.next().await {
            match result {
                Ok(true) => {
                    tracing::debug!(
                        target: "curate::resolver",
                        address = %address,
                        indexer = %query.url,
                        "Indexer holds registry"
                    );
                    return IndexerOutcome::Found(query.variant);
                }
                Ok(false) => {}
                Err(e) => {
                    failures += 1;
                    tracing::warn!(
                        target: "curate::resolver",
                        address = %address,
                        variant = %query.variant,
                        indexer = %query.url,
                        error = %e,
                        "Indexer check failed"
                    );
                }
            }
        }

        if failures == 0 {
            IndexerOutcome::NotFound
        } else {
            IndexerOutcome::Inconclusive
        }
    }
}
