//! HTTP transports for curate.
//!
//! Implements the resolver seams against real endpoints: [`JsonRpcProbe`]
//! performs `eth_call` probes and [`SubgraphClient`] runs registry existence
//! queries against GraphQL indexers.

pub mod rpc;
pub mod subgraph;

use std::time::Duration;

use anyhow::{Context, Result};

pub use rpc::JsonRpcProbe;
pub use subgraph::SubgraphClient;

/// Builds the shared HTTP client with a per-request timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")
}
