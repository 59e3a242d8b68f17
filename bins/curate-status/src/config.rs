//! Configuration for the status CLI

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use curate::{RegistryAddress, ResolverConfig};

/// Curated registry status tool
///
/// Resolves which registry variant an address implements and derives the
/// display status of item snapshots against it.
#[derive(Parser, Debug)]
#[command(name = "curate-status")]
#[command(about = "Derive curated registry item statuses", long_about = None)]
pub struct Config {
    /// Resolver configuration (JSON with per-chain RPC and indexer endpoints)
    #[arg(long, env = "CURATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Chain the registry is deployed on
    #[arg(long, env = "CURATE_CHAIN_ID", default_value = "100")]
    pub chain_id: u64,

    /// Registry address to resolve
    #[arg(long, env = "CURATE_REGISTRY")]
    pub registry: Option<String>,

    /// Item snapshots (a JSON object or array)
    ///
    /// Records without a `variant` field take the resolved registry variant.
    #[arg(long)]
    pub items: Option<PathBuf>,

    /// Registry period parameters (JSON object)
    ///
    /// Without a `variant` field the resolved registry variant is used.
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Unix timestamp (seconds) to derive statuses at (default: system time)
    #[arg(long)]
    pub now: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

impl Config {
    /// Loads the resolver config, or an empty one that resolves every
    /// registry to `unknown`.
    pub fn resolver_config(&self) -> Result<ResolverConfig> {
        match &self.config {
            Some(path) => ResolverConfig::from_json_file(path),
            None => Ok(ResolverConfig::default()),
        }
    }

    pub fn registry_address(&self) -> Result<Option<RegistryAddress>> {
        self.registry
            .as_deref()
            .map(|raw| {
                RegistryAddress::parse(raw)
                    .with_context(|| format!("invalid registry address '{raw}'"))
            })
            .transpose()
    }

    pub fn now(&self) -> u64 {
        self.now
            .unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64)
    }
}
