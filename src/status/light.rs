//! Light registry state machine.
//!
//! Same rules as the Classic machine, with one refinement once a decisive
//! ruling exists and the appeal window is still open: after the window's
//! midpoint only the winner may be crowdfunded, so the item is
//! `CrowdfundingWinner` while the loser has not paid and `WaitingArbitrator`
//! once it has.

use super::request::{request_phase, RequestKind, RequestPhase};
use super::{ChallengeParameters, RequestItem, StatusView};
use crate::error::StatusError;
use crate::resolver::RegistryVariant;

status_codes! {
    /// Status codes of a Light registry item.
    LightStatus {
        Rejected,
        Registered,
        Submitted,
        RemovalRequested,
        Challenged,
        Crowdfunding,
        CrowdfundingWinner,
        WaitingArbitrator,
        PendingSubmissionExecution,
        PendingRemovalExecution,
    }
}

/// Derives the status of a Light item and its countdown deadline.
pub fn derive(
    item: &RequestItem,
    params: &ChallengeParameters,
    now: u64,
) -> Result<StatusView<LightStatus>, StatusError> {
    let phase = request_phase(item, params, now, RegistryVariant::Light)?;

    let view = match phase {
        RequestPhase::Absent => StatusView::settled(LightStatus::Rejected),
        RequestPhase::Registered => StatusView::settled(LightStatus::Registered),
        RequestPhase::Challengeable { kind, ends_at } => {
            let status = match kind {
                RequestKind::Registration => LightStatus::Submitted,
                RequestKind::Removal => LightStatus::RemovalRequested,
            };
            StatusView::new(status, Some(ends_at))
        }
        RequestPhase::Executable { kind } => StatusView::settled(match kind {
            RequestKind::Registration => LightStatus::PendingSubmissionExecution,
            RequestKind::Removal => LightStatus::PendingRemovalExecution,
        }),
        RequestPhase::Challenged => StatusView::settled(LightStatus::Challenged),
        RequestPhase::Appealable(window) => {
            if !window.is_exposed() {
                return Ok(StatusView::settled(LightStatus::Crowdfunding));
            }
            if now > window.end {
                return Ok(StatusView::settled(LightStatus::WaitingArbitrator));
            }

            match window.ruling.loser() {
                None => StatusView::new(LightStatus::Crowdfunding, Some(window.end)),
                Some(_) if now < window.half_time() => {
                    StatusView::new(LightStatus::Crowdfunding, Some(window.half_time()))
                }
                Some(loser) if !item.has_paid(loser) => {
                    StatusView::new(LightStatus::CrowdfundingWinner, Some(window.end))
                }
                Some(_) => StatusView::settled(LightStatus::WaitingArbitrator),
            }
        }
    };

    Ok(view)
}

/// Derives the status code of a Light item.
pub fn item_status(
    item: &RequestItem,
    params: &ChallengeParameters,
    now: u64,
) -> Result<LightStatus, StatusError> {
    derive(item, params, now).map(|view| view.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::request::fixtures::*;
    use crate::status::{DisputeStatus, RequestStatus, Ruling};

    #[test]
    fn test_winner_phase_after_half_time() {
        // Requester won, challenger lost and has not paid.
        let item = appealable(Ruling::Accept, 1000, 2000);

        let view = derive(&item, &CHALLENGE_PERIOD, 1600).unwrap();
        assert_eq!(view.status, LightStatus::CrowdfundingWinner);
        assert_eq!(view.deadline, Some(2000));
    }

    #[test]
    fn test_both_sides_fund_before_half_time() {
        let item = appealable(Ruling::Accept, 1000, 2000);

        let view = derive(&item, &CHALLENGE_PERIOD, 1400).unwrap();
        assert_eq!(view.status, LightStatus::Crowdfunding);
        assert_eq!(view.deadline, Some(1500));
    }

    #[test]
    fn test_half_time_boundary_is_winner_phase() {
        let item = appealable(Ruling::Reject, 1000, 2000);
        assert_eq!(
            item_status(&item, &CHALLENGE_PERIOD, 1499).unwrap(),
            LightStatus::Crowdfunding
        );
        assert_eq!(
            item_status(&item, &CHALLENGE_PERIOD, 1500).unwrap(),
            LightStatus::CrowdfundingWinner
        );
    }

    #[test]
    fn test_loser_paid_waits_for_arbitrator() {
        let mut item = appealable(Ruling::Accept, 1000, 2000);
        item.has_paid_challenger = true;

        assert_eq!(
            item_status(&item, &CHALLENGE_PERIOD, 1600).unwrap(),
            LightStatus::WaitingArbitrator
        );
    }

    #[test]
    fn test_only_loser_flag_matters() {
        // Reject ruling: requester lost. Challenger having paid is irrelevant.
        let mut item = appealable(Ruling::Reject, 1000, 2000);
        item.has_paid_challenger = true;
        assert_eq!(
            item_status(&item, &CHALLENGE_PERIOD, 1700).unwrap(),
            LightStatus::CrowdfundingWinner
        );

        item.has_paid_requester = true;
        item.has_paid_challenger = false;
        assert_eq!(
            item_status(&item, &CHALLENGE_PERIOD, 1700).unwrap(),
            LightStatus::WaitingArbitrator
        );
    }

    #[test]
    fn test_window_closed() {
        let item = appealable(Ruling::Accept, 1000, 2000);
        assert_eq!(
            item_status(&item, &CHALLENGE_PERIOD, 2000).unwrap(),
            LightStatus::CrowdfundingWinner
        );
        assert_eq!(
            item_status(&item, &CHALLENGE_PERIOD, 2001).unwrap(),
            LightStatus::WaitingArbitrator
        );
    }

    #[test]
    fn test_no_ruling_funds_until_end() {
        let item = appealable(Ruling::None, 1000, 2000);
        let view = derive(&item, &CHALLENGE_PERIOD, 1900).unwrap();
        assert_eq!(view.status, LightStatus::Crowdfunding);
        assert_eq!(view.deadline, Some(2000));
    }

    #[test]
    fn test_sentinel_window() {
        let item = appealable(Ruling::Accept, 0, 0);
        assert_eq!(
            item_status(&item, &CHALLENGE_PERIOD, 5000).unwrap(),
            LightStatus::Crowdfunding
        );
    }

    #[test]
    fn test_undisputed_request() {
        let item = request(RequestStatus::ClearingRequested);
        assert_eq!(
            item_status(&item, &CHALLENGE_PERIOD, 1500).unwrap(),
            LightStatus::RemovalRequested
        );
        assert_eq!(
            item_status(&item, &CHALLENGE_PERIOD, 1501).unwrap(),
            LightStatus::PendingRemovalExecution
        );
    }

    #[test]
    fn test_solved_dispute_is_unhandled() {
        let mut item = request(RequestStatus::ClearingRequested);
        item.disputed = true;
        item.dispute_status = Some(DisputeStatus::Solved);

        assert!(item_status(&item, &CHALLENGE_PERIOD, 0).is_err());
    }
}
