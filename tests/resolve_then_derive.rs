//! End-to-end: resolve a registry's variant with in-memory transports, then
//! derive item statuses with the matching rule set.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use curate::resolver::{ProbeMethod, CLASSIC_PROBE, LIGHT_PROBE};
use curate::status::{ItemStatus, LightStatus, PermanentStatus, ClassicStatus};
use curate::{
    async_trait, derive_status, ChainEndpoints, ContractProbe, IndexerClient, IndexerEndpoint,
    IndexerError, IndexerQuery, ItemSnapshot, ProbeError, RegistryAddress, RegistryParameters,
    RegistryVariant, RegistryView, ResolverConfig, StatusError, VariantResolver,
};
use serde_json::json;
use url::Url;

const CHAIN: u64 = 100;
const CLASSIC_REGISTRY: &str = "0x1111111111111111111111111111111111111111";
const LIGHT_REGISTRY: &str = "0x2222222222222222222222222222222222222222";
const PERMANENT_REGISTRY: &str = "0x3333333333333333333333333333333333333333";

fn address(raw: &str) -> RegistryAddress {
    RegistryAddress::parse(raw).unwrap()
}

/// Routes resolver logs to the test harness; `RUST_LOG=curate=debug` shows
/// the probe and indexer decisions of a failing test.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(true)
        .with_test_writer()
        .try_init();
}

/// Chain state: which contract answers which probe.
#[derive(Default)]
struct InMemoryChain {
    contracts: HashMap<RegistryAddress, HashSet<[u8; 4]>>,
    calls: AtomicU32,
}

impl InMemoryChain {
    fn deploy(mut self, raw: &str, methods: &[ProbeMethod]) -> Self {
        self.contracts.insert(
            address(raw),
            methods.iter().map(|method| method.selector).collect(),
        );
        self
    }
}

#[async_trait]
impl ContractProbe for InMemoryChain {
    async fn call(
        &self,
        _chain_id: u64,
        address: &RegistryAddress,
        method: &ProbeMethod,
    ) -> Result<Vec<u8>, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.contracts.get(address) {
            Some(methods) if methods.contains(&method.selector) => Ok(vec![0; 32]),
            _ => Err(ProbeError::Reverted),
        }
    }
}

/// Indexer state: which registries each variant's indexer holds. Variants
/// listed in `down` fail every request.
#[derive(Default)]
struct InMemoryIndexers {
    registries: HashMap<RegistryVariant, HashSet<RegistryAddress>>,
    down: HashSet<RegistryVariant>,
    calls: AtomicU32,
}

impl InMemoryIndexers {
    fn index(mut self, variant: RegistryVariant, raw: &str) -> Self {
        self.registries
            .entry(variant)
            .or_default()
            .insert(address(raw));
        self
    }

    fn down(mut self, variant: RegistryVariant) -> Self {
        self.down.insert(variant);
        self
    }
}

#[async_trait]
impl IndexerClient for InMemoryIndexers {
    async fn registry_exists(
        &self,
        query: &IndexerQuery,
        address: &RegistryAddress,
    ) -> Result<bool, IndexerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.contains(&query.variant) {
            return Err(IndexerError::Transport("connection refused".to_string()));
        }
        Ok(self
            .registries
            .get(&query.variant)
            .is_some_and(|held| held.contains(address)))
    }
}

fn config() -> Arc<ResolverConfig> {
    let mut chain = ChainEndpoints::default();
    for variant in RegistryVariant::KNOWN {
        let url = Url::parse(&format!("http://indexer.test/{variant}")).unwrap();
        chain = chain.with_indexer(variant, IndexerEndpoint::new(url));
    }
    Arc::new(ResolverConfig::default().with_chain(CHAIN, chain))
}

fn resolver(chain: InMemoryChain, indexers: InMemoryIndexers) -> VariantResolver {
    VariantResolver::new(config(), Arc::new(indexers)).with_probe(Arc::new(chain))
}

fn snapshot(variant: RegistryVariant, record: serde_json::Value) -> ItemSnapshot {
    let mut record = record;
    record["variant"] = json!(variant.as_str());
    serde_json::from_value(record).unwrap()
}

fn parameters(variant: RegistryVariant, record: serde_json::Value) -> RegistryParameters {
    let mut record = record;
    record["variant"] = json!(variant.as_str());
    serde_json::from_value(record).unwrap()
}

#[tokio::test]
async fn classic_submission_crosses_challenge_period() {
    init_tracing();
    let resolver = resolver(
        InMemoryChain::default().deploy(CLASSIC_REGISTRY, &[CLASSIC_PROBE]),
        InMemoryIndexers::default(),
    );
    let variant = resolver
        .resolve(&address(CLASSIC_REGISTRY), CHAIN)
        .await
        .variant;
    assert_eq!(variant, RegistryVariant::Classic);

    let item = snapshot(
        variant,
        json!({
            "itemID": "0x01",
            "contractStatus": "RegistrationRequested",
            "submissionTime": 1000,
            "disputed": false,
        }),
    );
    let params = parameters(variant, json!({ "challengePeriodDuration": 500 }));

    let view = derive_status(&item, &params, 1400).unwrap();
    assert_eq!(view.status, ItemStatus::Classic(ClassicStatus::Submitted));
    assert_eq!(view.countdown(1400).unwrap().as_millis(), 100_000);

    let view = derive_status(&item, &params, 1600).unwrap();
    assert_eq!(
        view.status,
        ItemStatus::Classic(ClassicStatus::PendingSubmissionExecution)
    );
    assert_eq!(view.deadline, None);
}

#[tokio::test]
async fn light_appeal_after_midpoint_needs_winner_funding() {
    init_tracing();
    let resolver = resolver(
        InMemoryChain::default().deploy(LIGHT_REGISTRY, &[LIGHT_PROBE, CLASSIC_PROBE]),
        InMemoryIndexers::default(),
    );
    let variant = resolver.resolve(&address(LIGHT_REGISTRY), CHAIN).await.variant;
    assert_eq!(variant, RegistryVariant::Light);

    let record = json!({
        "itemID": "0x02",
        "contractStatus": "RegistrationRequested",
        "submissionTime": 100,
        "disputed": true,
        "disputeStatus": "Appealable",
        "currentRuling": "Accept",
        "appealPeriodStart": 1000,
        "appealPeriodEnd": 2000,
        "hasPaidRequester": true,
        "hasPaidChallenger": false,
    });
    let item = snapshot(variant, record);
    let params = parameters(variant, json!({ "challengePeriodDuration": 500 }));

    let after_midpoint = derive_status(&item, &params, 1600).unwrap();
    assert_eq!(
        after_midpoint.status,
        ItemStatus::Light(LightStatus::CrowdfundingWinner)
    );
    assert_eq!(after_midpoint.deadline, Some(2000));

    let before_midpoint = derive_status(&item, &params, 1400).unwrap();
    assert_eq!(
        before_midpoint.status,
        ItemStatus::Light(LightStatus::Crowdfunding)
    );
    assert_eq!(before_midpoint.deadline, Some(1500));
}

#[tokio::test]
async fn permanent_found_only_by_indexer() {
    init_tracing();
    let chain = Arc::new(InMemoryChain::default());
    let indexers = InMemoryIndexers::default()
        .index(RegistryVariant::Permanent, PERMANENT_REGISTRY)
        .down(RegistryVariant::Classic);
    let resolver =
        VariantResolver::new(config(), Arc::new(indexers)).with_probe(chain.clone());

    let resolution = resolver.resolve(&address(PERMANENT_REGISTRY), CHAIN).await;
    assert_eq!(resolution.variant, RegistryVariant::Permanent);
    // Both probes reverted before the indexers were asked.
    assert_eq!(chain.calls.load(Ordering::SeqCst), 2);

    let item = snapshot(
        resolution.variant,
        json!({
            "itemID": "0x03",
            "contractStatus": "Disputed",
            "includedAt": 100,
            "challenges": [{ "rounds": [{ "rulingTime": 0 }] }],
        }),
    );
    let params = parameters(
        resolution.variant,
        json!({ "submissionPeriod": 10, "reinclusionPeriod": 10, "withdrawingPeriod": 10 }),
    );

    for now in [0, 100, 1_000_000] {
        assert_eq!(
            derive_status(&item, &params, now).unwrap().status,
            ItemStatus::Permanent(PermanentStatus::Disputed)
        );
    }
}

#[tokio::test]
async fn indexer_failures_do_not_hide_a_match() {
    init_tracing();
    let indexers = InMemoryIndexers::default()
        .index(RegistryVariant::Light, LIGHT_REGISTRY)
        .down(RegistryVariant::Classic)
        .down(RegistryVariant::Permanent);
    let resolver = VariantResolver::new(config(), Arc::new(indexers));

    let resolution = resolver.resolve(&address(LIGHT_REGISTRY), CHAIN).await;
    assert_eq!(resolution.variant, RegistryVariant::Light);
    assert!(!resolution.checking);
}

#[tokio::test]
async fn unknown_registry_derives_nothing() {
    init_tracing();
    let resolver = resolver(InMemoryChain::default(), InMemoryIndexers::default());
    let unknown = address("0x4444444444444444444444444444444444444444");

    let resolution = resolver.resolve(&unknown, CHAIN).await;
    assert_eq!(resolution.variant, RegistryVariant::Unknown);

    // A Light item evaluated against Classic parameters is rejected rather
    // than guessed.
    let item = snapshot(
        RegistryVariant::Light,
        json!({ "itemID": "0x04", "contractStatus": "Registered", "submissionTime": 0 }),
    );
    let params = parameters(RegistryVariant::Classic, json!({ "challengePeriodDuration": 1 }));
    assert_eq!(
        derive_status(&item, &params, 0),
        Err(StatusError::VariantMismatch {
            snapshot: RegistryVariant::Light,
            parameters: RegistryVariant::Classic,
        })
    );
}

#[tokio::test]
async fn solved_dispute_is_reported_not_guessed() {
    let item = snapshot(
        RegistryVariant::Classic,
        json!({
            "itemID": "0x05",
            "contractStatus": "ClearingRequested",
            "submissionTime": 0,
            "disputed": true,
            "disputeStatus": "Solved",
        }),
    );
    let params = parameters(RegistryVariant::Classic, json!({ "challengePeriodDuration": 1 }));

    assert!(matches!(
        derive_status(&item, &params, 10),
        Err(StatusError::UnhandledState { variant: RegistryVariant::Classic, .. })
    ));
}

#[tokio::test]
async fn view_follows_latest_target() {
    init_tracing();
    let indexers = InMemoryIndexers::default()
        .index(RegistryVariant::Classic, CLASSIC_REGISTRY)
        .index(RegistryVariant::Permanent, PERMANENT_REGISTRY);
    let resolver = Arc::new(VariantResolver::new(config(), Arc::new(indexers)));
    let view = RegistryView::new(resolver.clone());

    view.set_target(address(CLASSIC_REGISTRY), CHAIN).await.unwrap();
    assert_eq!(view.snapshot().resolution.variant, RegistryVariant::Classic);

    view.set_target(address(PERMANENT_REGISTRY), CHAIN)
        .await
        .unwrap();
    let snapshot = view.snapshot();
    assert_eq!(snapshot.target, Some((address(PERMANENT_REGISTRY), CHAIN)));
    assert_eq!(snapshot.resolution.variant, RegistryVariant::Permanent);

    // Both results are memoised for the lifetime of the resolver.
    assert_eq!(
        resolver.peek(&address(CLASSIC_REGISTRY), CHAIN).await.variant,
        RegistryVariant::Classic
    );
}
