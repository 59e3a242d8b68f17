//! Registry view with stale-result protection.
//!
//! A view tracks one target `(address, chain_id)` at a time. Changing the
//! target cancels the resolution in flight for the previous one, and a
//! resolution that completes for a superseded target is discarded instead
//! of being applied.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{Resolution, VariantResolver};
use crate::address::RegistryAddress;

/// What a view currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub target: Option<(RegistryAddress, u64)>,
    pub resolution: Resolution,
}

impl ViewSnapshot {
    fn empty() -> Self {
        Self {
            target: None,
            resolution: Resolution::resolved(super::RegistryVariant::Unknown),
        }
    }
}

/// Resolves the variant of whatever registry the consumer currently shows.
pub struct RegistryView {
    resolver: Arc<VariantResolver>,
    generation: Arc<AtomicU64>,
    cancel: Mutex<CancellationToken>,
    state: Arc<watch::Sender<ViewSnapshot>>,
}

impl RegistryView {
    pub fn new(resolver: Arc<VariantResolver>) -> Self {
        let (state, _) = watch::channel(ViewSnapshot::empty());
        Self {
            resolver,
            generation: Arc::new(AtomicU64::new(0)),
            cancel: Mutex::new(CancellationToken::new()),
            state: Arc::new(state),
        }
    }

    /// Switches the view to a new registry and starts resolving it.
    ///
    /// The view shows `checking` until the returned task applies the
    /// result. Any resolution still running for the previous target is
    /// cancelled.
    pub fn set_target(&self, address: RegistryAddress, chain_id: u64) -> JoinHandle<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = self.replace_token();

        self.state.send_replace(ViewSnapshot {
            target: Some((address.clone(), chain_id)),
            resolution: Resolution::checking(),
        });

        let resolver = self.resolver.clone();
        let current = self.generation.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    tracing::debug!(
                        target: "curate::resolver::view",
                        address = %address,
                        chain_id,
                        "Resolution cancelled"
                    );
                }
                resolution = resolver.resolve(&address, chain_id) => {
                    let applied = state.send_if_modified(|snapshot| {
                        if current.load(Ordering::SeqCst) != generation {
                            return false;
                        }
                        snapshot.resolution = resolution;
                        true
                    });
                    if !applied {
                        tracing::debug!(
                            target: "curate::resolver::view",
                            address = %address,
                            chain_id,
                            "Discarded stale resolution"
                        );
                    }
                }
            }
        })
    }

    /// Drops the current target and cancels its resolution.
    pub fn teardown(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.replace_token();
        self.state.send_replace(ViewSnapshot::empty());
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified whenever the snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.state.subscribe()
    }

    /// Installs a fresh token and cancels the previous one.
    fn replace_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = std::mem::replace(
            &mut *self.cancel.lock().unwrap_or_else(PoisonError::into_inner),
            token.clone(),
        );
        previous.cancel();
        token
    }
}

impl Drop for RegistryView {
    fn drop(&mut self) {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}
