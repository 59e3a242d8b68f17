//! Resolver configuration.
//!
//! Endpoints are keyed by chain ID and handed to the resolver at
//! construction, so tests can inject fake endpoints and a chain that is not
//! configured resolves to `Unknown` without any I/O.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use super::RegistryVariant;

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Per-chain endpoints and request bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    #[serde(default)]
    pub chains: HashMap<u64, ChainEndpoints>,

    /// Upper bound for each probe or indexer request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            chains: HashMap::new(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl ResolverConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse resolver config")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read resolver config: {}", path.display()))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("invalid resolver config: {}", path.display()))
    }

    pub fn with_chain(mut self, chain_id: u64, endpoints: ChainEndpoints) -> Self {
        self.chains.insert(chain_id, endpoints);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn chain(&self, chain_id: u64) -> Option<&ChainEndpoints> {
        self.chains.get(&chain_id)
    }
}

/// Endpoints of one chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEndpoints {
    /// JSON-RPC endpoint for read-only contract calls. Without it the
    /// contract-probe phase is skipped.
    #[serde(default)]
    pub rpc_url: Option<Url>,
    #[serde(default)]
    pub classic: Option<IndexerEndpoint>,
    #[serde(default)]
    pub light: Option<IndexerEndpoint>,
    #[serde(default)]
    pub permanent: Option<IndexerEndpoint>,
}

impl ChainEndpoints {
    pub fn with_rpc_url(mut self, url: Url) -> Self {
        self.rpc_url = Some(url);
        self
    }

    pub fn with_indexer(mut self, variant: RegistryVariant, endpoint: IndexerEndpoint) -> Self {
        match variant {
            RegistryVariant::Classic => self.classic = Some(endpoint),
            RegistryVariant::Light => self.light = Some(endpoint),
            RegistryVariant::Permanent => self.permanent = Some(endpoint),
            RegistryVariant::Unknown => {}
        }
        self
    }

    pub fn indexer(&self, variant: RegistryVariant) -> Option<&IndexerEndpoint> {
        match variant {
            RegistryVariant::Classic => self.classic.as_ref(),
            RegistryVariant::Light => self.light.as_ref(),
            RegistryVariant::Permanent => self.permanent.as_ref(),
            RegistryVariant::Unknown => None,
        }
    }

    /// Existence queries for every configured indexer.
    pub fn indexer_queries(&self) -> Vec<IndexerQuery> {
        RegistryVariant::KNOWN
            .iter()
            .filter_map(|&variant| {
                self.indexer(variant).map(|endpoint| IndexerQuery {
                    variant,
                    url: endpoint.url.clone(),
                    entity: endpoint
                        .entity
                        .clone()
                        .unwrap_or_else(|| default_entity(variant).to_string()),
                })
            })
            .collect()
    }
}

/// A subgraph endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerEndpoint {
    pub url: Url,
    /// Root query field holding registries. Defaults per variant.
    #[serde(default)]
    pub entity: Option<String>,
}

impl IndexerEndpoint {
    pub fn new(url: Url) -> Self {
        Self { url, entity: None }
    }
}

/// A registry existence lookup against one indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerQuery {
    pub variant: RegistryVariant,
    pub url: Url,
    pub entity: String,
}

fn default_entity(variant: RegistryVariant) -> &'static str {
    match variant {
        RegistryVariant::Light => "lregistry",
        _ => "registry",
    }
}
