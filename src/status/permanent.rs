//! Permanent registry state machine.
//!
//! Permanent items have no request/challenge-period pair. An item is
//! `Pending` until its inclusion period elapses and `Accepted` after; a
//! challenge moves it to `Disputed`, whose latest round drives the appeal
//! codes. An expired withdrawal window wins over the inclusion logic.

use serde::{Deserialize, Serialize};

use super::time::{appeal_half_time, withdrawal_deadline};
use super::{Party, Ruling, StatusView};
use crate::error::StatusError;
use crate::resolver::RegistryVariant;

status_codes! {
    /// Status codes of a Permanent registry item.
    PermanentStatus {
        Absent,
        Pending,
        Accepted,
        Disputed,
        Crowdfunding,
        CrowdfundingWinner,
        WaitingArbitrator,
        PendingWithdrawal,
    }
}

/// Contract-level status of a Permanent item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermanentItemStatus {
    Absent,
    Submitted,
    Reincluded,
    Disputed,
}

/// One appeal round of a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// Zero until the arbitrator has ruled.
    #[serde(default)]
    pub ruling_time: u64,
    #[serde(default)]
    pub ruling: Ruling,
    #[serde(default)]
    pub appeal_period_start: u64,
    #[serde(default)]
    pub appeal_period_end: u64,
    #[serde(default)]
    pub has_paid_requester: bool,
    #[serde(default)]
    pub has_paid_challenger: bool,
}

impl Round {
    pub fn has_paid(&self, party: Party) -> bool {
        match party {
            Party::Requester => self.has_paid_requester,
            Party::Challenger => self.has_paid_challenger,
        }
    }
}

/// A challenge against a Permanent item. Rounds are ordered oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    #[serde(default)]
    pub rounds: Vec<Round>,
}

/// Raw Permanent item record. Challenges are ordered oldest first; the last
/// one is the active challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermanentItem {
    #[serde(rename = "itemID")]
    pub item_id: String,
    pub contract_status: PermanentItemStatus,
    pub included_at: u64,
    /// Zero when no withdrawal was initiated.
    #[serde(default)]
    pub withdrawing_timestamp: u64,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
}

impl PermanentItem {
    /// Latest round of the active challenge.
    pub fn latest_round(&self) -> Option<&Round> {
        self.challenges.last().and_then(|c| c.rounds.last())
    }
}

/// Period parameters of a Permanent registry, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermanentParameters {
    pub submission_period: u64,
    pub reinclusion_period: u64,
    pub withdrawing_period: u64,
}

/// Derives the status of a Permanent item and its countdown deadline.
pub fn derive(
    item: &PermanentItem,
    params: &PermanentParameters,
    now: u64,
) -> Result<StatusView<PermanentStatus>, StatusError> {
    let inclusion_period = match item.contract_status {
        PermanentItemStatus::Absent => return Ok(StatusView::settled(PermanentStatus::Absent)),
        PermanentItemStatus::Disputed => return disputed(item, now),
        PermanentItemStatus::Submitted => params.submission_period,
        PermanentItemStatus::Reincluded => params.reinclusion_period,
    };

    let withdrawal_expired = item.withdrawing_timestamp > 0
        && withdrawal_deadline(item.withdrawing_timestamp, params.withdrawing_period) < now;
    if withdrawal_expired {
        return Ok(StatusView::settled(PermanentStatus::PendingWithdrawal));
    }

    let included_from = item.included_at.saturating_add(inclusion_period);
    if included_from < now {
        Ok(StatusView::settled(PermanentStatus::Accepted))
    } else {
        Ok(StatusView::new(PermanentStatus::Pending, Some(included_from)))
    }
}

fn disputed(item: &PermanentItem, now: u64) -> Result<StatusView<PermanentStatus>, StatusError> {
    let round = item.latest_round().ok_or(StatusError::MissingField {
        variant: RegistryVariant::Permanent,
        field: "challenges.rounds",
    })?;

    if round.ruling_time == 0 {
        return Ok(StatusView::settled(PermanentStatus::Disputed));
    }
    if now >= round.appeal_period_end {
        return Ok(StatusView::settled(PermanentStatus::WaitingArbitrator));
    }
    if round.appeal_period_start > round.appeal_period_end {
        return Err(StatusError::unhandled(
            RegistryVariant::Permanent,
            format!(
                "appeal period starts at {} after it ends at {}",
                round.appeal_period_start, round.appeal_period_end
            ),
        ));
    }

    let half_time = appeal_half_time(round.appeal_period_start, round.appeal_period_end);
    if now < half_time {
        return Ok(StatusView::new(PermanentStatus::Crowdfunding, Some(half_time)));
    }

    // A refused ruling leaves the requester as the side that must fund.
    let loser = round.ruling.loser().unwrap_or(Party::Requester);
    if round.has_paid(loser) {
        Ok(StatusView::settled(PermanentStatus::WaitingArbitrator))
    } else {
        Ok(StatusView::new(
            PermanentStatus::CrowdfundingWinner,
            Some(round.appeal_period_end),
        ))
    }
}

/// Derives the status code of a Permanent item.
pub fn item_status(
    item: &PermanentItem,
    params: &PermanentParameters,
    now: u64,
) -> Result<PermanentStatus, StatusError> {
    derive(item, params, now).map(|view| view.status)
}
