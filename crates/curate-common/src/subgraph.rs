//! Registry existence checks against GraphQL indexers.

use anyhow::Result;
use async_trait::async_trait;
use curate::{IndexerClient, IndexerError, IndexerQuery, RegistryAddress};
use serde::Deserialize;
use serde_json::{json, Value};

/// Indexer client speaking the subgraph GraphQL dialect.
pub struct SubgraphClient {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorMessage {
    message: String,
}

impl SubgraphClient {
    /// The resolver bounds each request itself; `timeout` is a transport
    /// backstop.
    pub fn new(timeout: std::time::Duration) -> Result<Self> {
        Ok(Self::with_client(crate::http_client(timeout)?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// `query($id: ID!) { <entity>(id: $id) { id } }`
///
/// The entity name comes from configuration and is spliced into the
/// document, so it is restricted to GraphQL name characters.
pub fn existence_query(entity: &str) -> Result<String, IndexerError> {
    let valid = entity
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && entity.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(IndexerError::Graphql(format!(
            "invalid entity name `{entity}`"
        )));
    }
    Ok(format!("query($id: ID!) {{ {entity}(id: $id) {{ id }} }}"))
}

#[async_trait]
impl IndexerClient for SubgraphClient {
    async fn registry_exists(
        &self,
        query: &IndexerQuery,
        address: &RegistryAddress,
    ) -> Result<bool, IndexerError> {
        let body = json!({
            "query": existence_query(&query.entity)?,
            "variables": { "id": address.as_str() },
        });

        let response = self
            .client
            .post(query.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IndexerError::Timeout
                } else {
                    IndexerError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexerError::Status(status.as_u16()));
        }

        let response: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| IndexerError::Decode(e.to_string()))?;

        if !response.errors.is_empty() {
            let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
            return Err(IndexerError::Graphql(messages.join("; ")));
        }

        let data = response
            .data
            .ok_or_else(|| IndexerError::Decode("response has no data".to_string()))?;

        match data.get(&query.entity) {
            Some(Value::Null) => Ok(false),
            Some(_) => {
                tracing::trace!(
                    target: "curate_common::subgraph",
                    indexer = %query.url,
                    address = %address,
                    "Registry record found"
                );
                Ok(true)
            }
            None => Err(IndexerError::Decode(format!(
                "response has no `{}` field",
                query.entity
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existence_query() {
        assert_eq!(
            existence_query("lregistry").unwrap(),
            "query($id: ID!) { lregistry(id: $id) { id } }"
        );
        assert!(existence_query("registry { id } x: registry").is_err());
        assert!(existence_query("").is_err());
        assert!(existence_query("1registry").is_err());
    }
}
