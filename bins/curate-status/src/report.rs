//! Item loading and status report rendering.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use curate::{
    derive_status, ItemSnapshot, RegistryAddress, RegistryParameters, RegistryVariant,
    Resolution,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Reads a JSON file holding one record or an array of records.
pub fn load_records(path: &Path) -> Result<Vec<Value>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    Ok(match value {
        Value::Array(records) => records,
        record => vec![record],
    })
}

/// Decodes a variant-tagged record, tagging it with `fallback` when the
/// record carries no `variant` of its own.
pub fn decode_tagged<T: DeserializeOwned>(
    mut record: Value,
    fallback: RegistryVariant,
) -> Result<T> {
    let Some(fields) = record.as_object_mut() else {
        bail!("expected a JSON object");
    };
    if !fields.contains_key("variant") {
        if fallback == RegistryVariant::Unknown {
            bail!("record has no `variant` and the registry variant is unknown");
        }
        fields.insert("variant".to_string(), Value::from(fallback.as_str()));
    }
    serde_json::from_value(record).context("record does not match its variant")
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub now: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistryReport>,
    pub items: Vec<ItemReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryReport {
    pub address: RegistryAddress,
    pub chain_id: u64,
    pub variant: RegistryVariant,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReport {
    pub item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    pub fn new(now: u64) -> Self {
        Self {
            now,
            registry: None,
            items: Vec::new(),
        }
    }

    pub fn with_registry(
        mut self,
        address: RegistryAddress,
        chain_id: u64,
        resolution: Resolution,
    ) -> Self {
        self.registry = Some(RegistryReport {
            address,
            chain_id,
            variant: resolution.variant,
        });
        self
    }

    pub fn variant(&self) -> RegistryVariant {
        self.registry
            .as_ref()
            .map_or(RegistryVariant::Unknown, |registry| registry.variant)
    }

    /// Derives every item's status. A failing item is reported with its
    /// error; it never gets a substitute status.
    pub fn derive_items(&mut self, items: &[ItemSnapshot], params: &RegistryParameters) {
        for item in items {
            let report = match derive_status(item, params, self.now) {
                Ok(view) => {
                    let countdown = view.countdown(self.now);
                    ItemReport {
                        item_id: item.item_id().to_string(),
                        status: Some(view.status.to_string()),
                        deadline: view.deadline,
                        countdown_ms: countdown.map(|c| c.as_millis()),
                        countdown: countdown.map(|c| c.to_string()),
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        target: "curate_status",
                        item_id = item.item_id(),
                        error = %e,
                        "Could not determine item status"
                    );
                    ItemReport {
                        item_id: item.item_id().to_string(),
                        status: None,
                        deadline: None,
                        countdown_ms: None,
                        countdown: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            self.items.push(report);
        }
    }

    pub fn failed_items(&self) -> usize {
        self.items.iter().filter(|item| item.error.is_some()).count()
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        if let Some(registry) = &self.registry {
            let _ = writeln!(
                out,
                "registry {} on chain {}: {}",
                registry.address, registry.chain_id, registry.variant
            );
        }
        for item in &self.items {
            match (&item.status, &item.error) {
                (Some(status), _) => {
                    let _ = write!(out, "{}: {status}", item.item_id);
                    if let Some(countdown) = &item.countdown {
                        let _ = write!(out, " ({countdown})");
                    }
                    out.push('\n');
                }
                (None, Some(error)) => {
                    let _ = writeln!(out, "{}: could not determine status: {error}", item.item_id);
                }
                (None, None) => {}
            }
        }
        out
    }

    pub fn render_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: u64 = 1_700_000_000;

    fn light_item(id: &str, disputed: bool) -> Value {
        json!({
            "itemID": id,
            "contractStatus": "RegistrationRequested",
            "submissionTime": NOW - 100,
            "disputed": disputed,
        })
    }

    #[test]
    fn test_untagged_record_takes_fallback() {
        let item: ItemSnapshot =
            decode_tagged(light_item("0x01", false), RegistryVariant::Light).unwrap();
        assert_eq!(item.variant(), RegistryVariant::Light);
    }

    #[test]
    fn test_tagged_record_keeps_variant() {
        let mut record = light_item("0x01", false);
        record["variant"] = json!("classic");
        let item: ItemSnapshot = decode_tagged(record, RegistryVariant::Light).unwrap();
        assert_eq!(item.variant(), RegistryVariant::Classic);
    }

    #[test]
    fn test_untagged_record_needs_known_variant() {
        let result: Result<ItemSnapshot> =
            decode_tagged(light_item("0x01", false), RegistryVariant::Unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_report_keeps_failures_separate() {
        let params: RegistryParameters = decode_tagged(
            json!({ "challengePeriodDuration": 3600 }),
            RegistryVariant::Light,
        )
        .unwrap();
        let items: Vec<ItemSnapshot> = [light_item("0x01", false), light_item("0x02", true)]
            .into_iter()
            .map(|record| decode_tagged(record, RegistryVariant::Light).unwrap())
            .collect();

        let mut report = Report::new(NOW);
        report.derive_items(&items, &params);

        assert_eq!(report.items[0].status.as_deref(), Some("Submitted"));
        assert_eq!(report.items[0].deadline, Some(NOW - 100 + 3600));
        // Disputed without a dispute status is a malformed record.
        assert!(report.items[1].status.is_none());
        assert!(report.items[1].error.is_some());
        assert_eq!(report.failed_items(), 1);

        let text = report.render_text();
        assert!(text.contains("0x01: Submitted (in 58m 20s)"));
        assert!(text.contains("0x02: could not determine status"));
    }
}
