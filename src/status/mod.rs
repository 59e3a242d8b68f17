//! Item lifecycle status engine.
//!
//! Converts a raw item snapshot (contract status, dispute record, appeal
//! window, crowdfunding flags) plus the registry's period parameters and a
//! caller-supplied clock into a single status code.
//!
//! Each registry variant has its own closed status enumeration and its own
//! derivation function:
//!
//! - [`classic::derive`] for Classic registries
//! - [`light::derive`] for Light registries
//! - [`permanent::derive`] for Permanent registries
//!
//! All three are pure: no I/O, no wall clock, no state between calls. A
//! snapshot that no rule covers yields [`StatusError`] rather than a guessed
//! code.
//!
//! # Example
//!
//! ```rust,ignore
//! use curate::status::{derive_status, ItemSnapshot, RegistryParameters};
//!
//! let view = derive_status(&snapshot, &params, now)?;
//! println!("{} ({:?})", view.status, view.countdown(now));
//! ```

/// Declares a closed status enumeration with stable string codes.
macro_rules! status_codes {
    ($(#[$meta:meta])* $name:ident { $($code:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($code),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$code),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$code => stringify!($code)),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod classic;
pub mod light;
pub mod permanent;
mod request;
pub mod time;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StatusError;
use crate::resolver::RegistryVariant;

pub use classic::ClassicStatus;
pub use light::LightStatus;
pub use permanent::{
    Challenge, PermanentItem, PermanentItemStatus, PermanentParameters, PermanentStatus, Round,
};
pub use time::{remaining, Countdown};

/// Contract-level status of a Classic or Light item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Absent,
    Registered,
    RegistrationRequested,
    ClearingRequested,
}

/// Arbitrator-side state of an open dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeStatus {
    Waiting,
    Appealable,
    Solved,
}

/// Arbitrator's latest ruling.
///
/// `Accept` sides with the requester, `Reject` with the challenger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ruling {
    #[default]
    None,
    #[serde(alias = "Requester")]
    Accept,
    #[serde(alias = "Challenger")]
    Reject,
}

impl Ruling {
    pub fn is_decisive(self) -> bool {
        !matches!(self, Ruling::None)
    }

    /// The party that lost under this ruling, if the ruling is decisive.
    pub fn loser(self) -> Option<Party> {
        match self {
            Ruling::None => None,
            Ruling::Accept => Some(Party::Challenger),
            Ruling::Reject => Some(Party::Requester),
        }
    }
}

/// Side of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    Requester,
    Challenger,
}

/// Raw Classic/Light item record as served by the indexer or contract.
///
/// `dispute_status` and the appeal fields are only consulted when
/// `disputed` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestItem {
    #[serde(rename = "itemID")]
    pub item_id: String,
    pub contract_status: RequestStatus,
    pub submission_time: u64,
    #[serde(default)]
    pub disputed: bool,
    #[serde(default)]
    pub dispute_status: Option<DisputeStatus>,
    #[serde(default)]
    pub current_ruling: Ruling,
    #[serde(default)]
    pub appeal_period_start: u64,
    #[serde(default)]
    pub appeal_period_end: u64,
    #[serde(default)]
    pub has_paid_requester: bool,
    #[serde(default)]
    pub has_paid_challenger: bool,
}

impl RequestItem {
    pub fn has_paid(&self, party: Party) -> bool {
        match party {
            Party::Requester => self.has_paid_requester,
            Party::Challenger => self.has_paid_challenger,
        }
    }
}

/// Period parameters of a Classic or Light registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeParameters {
    /// Seconds an unchallenged request waits before it can be executed.
    pub challenge_period_duration: u64,
}

/// A derived status and the deadline the UI counts down to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusView<S> {
    pub status: S,
    /// Unix timestamp (seconds) of the next boundary relevant to `status`.
    pub deadline: Option<u64>,
}

impl<S> StatusView<S> {
    pub(crate) fn new(status: S, deadline: Option<u64>) -> Self {
        Self { status, deadline }
    }

    pub(crate) fn settled(status: S) -> Self {
        Self::new(status, None)
    }

    /// Time left until the deadline, negative once it has passed.
    pub fn countdown(&self, now: u64) -> Option<Countdown> {
        self.deadline
            .map(|deadline| Countdown::from_millis(remaining(deadline, now)))
    }

    pub fn map<T>(self, f: impl FnOnce(S) -> T) -> StatusView<T> {
        StatusView {
            status: f(self.status),
            deadline: self.deadline,
        }
    }
}

/// Raw item record of any variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum ItemSnapshot {
    Classic(RequestItem),
    Light(RequestItem),
    Permanent(PermanentItem),
}

impl ItemSnapshot {
    pub fn variant(&self) -> RegistryVariant {
        match self {
            ItemSnapshot::Classic(_) => RegistryVariant::Classic,
            ItemSnapshot::Light(_) => RegistryVariant::Light,
            ItemSnapshot::Permanent(_) => RegistryVariant::Permanent,
        }
    }

    pub fn item_id(&self) -> &str {
        match self {
            ItemSnapshot::Classic(item) | ItemSnapshot::Light(item) => &item.item_id,
            ItemSnapshot::Permanent(item) => &item.item_id,
        }
    }
}

/// Period parameters of any variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum RegistryParameters {
    Classic(ChallengeParameters),
    Light(ChallengeParameters),
    Permanent(PermanentParameters),
}

impl RegistryParameters {
    pub fn variant(&self) -> RegistryVariant {
        match self {
            RegistryParameters::Classic(_) => RegistryVariant::Classic,
            RegistryParameters::Light(_) => RegistryVariant::Light,
            RegistryParameters::Permanent(_) => RegistryVariant::Permanent,
        }
    }
}

/// Status code of any variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ItemStatus {
    Classic(ClassicStatus),
    Light(LightStatus),
    Permanent(PermanentStatus),
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Classic(status) => status.as_str(),
            ItemStatus::Light(status) => status.as_str(),
            ItemStatus::Permanent(status) => status.as_str(),
        }
    }

    pub fn variant(&self) -> RegistryVariant {
        match self {
            ItemStatus::Classic(_) => RegistryVariant::Classic,
            ItemStatus::Light(_) => RegistryVariant::Light,
            ItemStatus::Permanent(_) => RegistryVariant::Permanent,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives the status of any snapshot with the matching parameter set.
pub fn derive_status(
    snapshot: &ItemSnapshot,
    parameters: &RegistryParameters,
    now: u64,
) -> Result<StatusView<ItemStatus>, StatusError> {
    match (snapshot, parameters) {
        (ItemSnapshot::Classic(item), RegistryParameters::Classic(params)) => {
            Ok(classic::derive(item, params, now)?.map(ItemStatus::Classic))
        }
        (ItemSnapshot::Light(item), RegistryParameters::Light(params)) => {
            Ok(light::derive(item, params, now)?.map(ItemStatus::Light))
        }
        (ItemSnapshot::Permanent(item), RegistryParameters::Permanent(params)) => {
            Ok(permanent::derive(item, params, now)?.map(ItemStatus::Permanent))
        }
        _ => Err(StatusError::VariantMismatch {
            snapshot: snapshot.variant(),
            parameters: parameters.variant(),
        }),
    }
}
