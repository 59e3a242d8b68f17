//! Curate Status - curated registry item status tool
//!
//! Resolves which variant (Classic, Light, Permanent) a registry address
//! implements, then derives the display status and countdown of item
//! snapshots against that registry's period parameters.
//!
//! # Usage
//!
//! ```bash
//! # Resolve a registry's variant
//! curate-status --config chains.json --chain-id 100 --registry 0x2442...
//!
//! # Derive statuses for items of that registry, as JSON
//! curate-status --config chains.json --registry 0x2442... \
//!     --items items.json --params params.json --format json
//!
//! # Derive at a fixed instant, without resolving (records carry `variant`)
//! curate-status --items items.json --params params.json --now 1700000000
//! ```

mod config;
mod report;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{Config, Format};
use curate::{ItemSnapshot, RegistryParameters, VariantResolver};
use curate_common::{JsonRpcProbe, SubgraphClient};
use report::{decode_tagged, load_records, Report};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let config = Config::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let now = config.now();
    let resolver_config = Arc::new(config.resolver_config()?);
    tracing::debug!(
        target: "curate_status",
        chains = resolver_config.chains.len(),
        timeout_ms = resolver_config.request_timeout_ms,
        "Resolver configured"
    );

    let mut report = Report::new(now);

    if let Some(address) = config.registry_address()? {
        let indexer = Arc::new(SubgraphClient::new(resolver_config.request_timeout())?);
        let probe = Arc::new(JsonRpcProbe::new(&resolver_config)?);
        let resolver = VariantResolver::new(resolver_config.clone(), indexer).with_probe(probe);

        let resolution = resolver.resolve(&address, config.chain_id).await;
        tracing::info!(
            target: "curate_status",
            address = %address,
            chain_id = config.chain_id,
            variant = %resolution.variant,
            "Registry resolved"
        );
        report = report.with_registry(address, config.chain_id, resolution);
    }

    match (&config.items, &config.params) {
        (Some(items_path), Some(params_path)) => {
            let fallback = report.variant();

            let params: RegistryParameters = load_records(params_path)?
                .into_iter()
                .next()
                .context("parameters file is empty")
                .and_then(|record| decode_tagged(record, fallback))
                .with_context(|| format!("invalid parameters in {}", params_path.display()))?;

            let items = load_records(items_path)?
                .into_iter()
                .enumerate()
                .map(|(index, record)| {
                    decode_tagged::<ItemSnapshot>(record, fallback).with_context(|| {
                        format!("invalid item #{index} in {}", items_path.display())
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            report.derive_items(&items, &params);
        }
        (None, None) => {}
        _ => bail!("--items and --params must be given together"),
    }

    let rendered = match config.format {
        Format::Text => report.render_text(),
        Format::Json => report.render_json()?,
    };
    print!("{rendered}");
    if config.format == Format::Json {
        println!();
    }

    if report.failed_items() > 0 {
        bail!(
            "could not determine the status of {} item(s)",
            report.failed_items()
        );
    }

    Ok(())
}
