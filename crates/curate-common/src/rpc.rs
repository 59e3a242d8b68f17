//! `eth_call` contract probes over JSON-RPC.
//!
//! One read provider per chain, taken from the resolver configuration. A
//! JSON-RPC error object or an empty `0x` result is reported as a revert,
//! which the resolver treats as "not this variant".

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use curate::resolver::ProbeMethod;
use curate::{ContractProbe, ProbeError, RegistryAddress, ResolverConfig};
use serde::Deserialize;
use serde_json::json;
use url::Url;

/// Contract probe backed by per-chain JSON-RPC endpoints.
pub struct JsonRpcProbe {
    client: reqwest::Client,
    endpoints: HashMap<u64, Url>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl JsonRpcProbe {
    /// Uses the `rpcUrl` of every configured chain.
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let client = crate::http_client(config.request_timeout())?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: &ResolverConfig) -> Self {
        let endpoints = config
            .chains
            .iter()
            .filter_map(|(chain_id, chain)| chain.rpc_url.clone().map(|url| (*chain_id, url)))
            .collect();
        Self { client, endpoints }
    }

    /// Whether a read provider is configured for `chain_id`.
    pub fn has_provider(&self, chain_id: u64) -> bool {
        self.endpoints.contains_key(&chain_id)
    }
}

#[async_trait]
impl ContractProbe for JsonRpcProbe {
    async fn call(
        &self,
        chain_id: u64,
        address: &RegistryAddress,
        method: &ProbeMethod,
    ) -> Result<Vec<u8>, ProbeError> {
        let url = self
            .endpoints
            .get(&chain_id)
            .ok_or(ProbeError::Unavailable(chain_id))?;

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                { "to": address.as_str(), "data": method.calldata() },
                "latest"
            ],
        });

        let response = self
            .client
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProbeError::Transport(format!(
                "HTTP {} from read provider",
                response.status()
            )));
        }

        let response: RpcResponse = response
            .json()
            .await
            .map_err(|e| ProbeError::Transport(format!("invalid JSON-RPC response: {e}")))?;

        if let Some(error) = response.error {
            tracing::trace!(
                target: "curate_common::rpc",
                address = %address,
                method = method.signature,
                code = error.code,
                message = %error.message,
                "eth_call returned an error"
            );
            return Err(ProbeError::Reverted);
        }

        let result = response
            .result
            .ok_or_else(|| ProbeError::Transport("JSON-RPC response has no result".to_string()))?;
        decode_result(&result)
    }
}

/// Decodes a `0x`-prefixed return value. No return data means the call hit
/// a contract without the method.
fn decode_result(result: &str) -> Result<Vec<u8>, ProbeError> {
    let hex_str = result
        .strip_prefix("0x")
        .or_else(|| result.strip_prefix("0X"))
        .unwrap_or(result);
    if hex_str.is_empty() {
        return Err(ProbeError::Reverted);
    }
    hex::decode(hex_str).map_err(|e| ProbeError::Transport(format!("invalid return data: {e}")))
}
