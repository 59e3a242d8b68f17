//! Request phase shared by the Classic and Light state machines.
//!
//! Both variants agree on everything up to the appeal window; they only
//! differ in how an appealable ruling maps to a crowdfunding code.

use super::time::{appeal_half_time, challenge_period_end};
use super::{ChallengeParameters, DisputeStatus, RequestItem, RequestStatus, Ruling};
use crate::error::StatusError;
use crate::resolver::RegistryVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RequestKind {
    Registration,
    Removal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RequestPhase {
    Absent,
    Registered,
    /// Unchallenged and still inside the challenge period.
    Challengeable { kind: RequestKind, ends_at: u64 },
    /// Unchallenged and past the challenge period, awaiting execution.
    Executable { kind: RequestKind },
    /// Disputed, no appealable ruling yet.
    Challenged,
    /// Disputed, ruling open to appeal.
    Appealable(AppealWindow),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct AppealWindow {
    pub start: u64,
    pub end: u64,
    pub ruling: Ruling,
}

impl AppealWindow {
    /// `(0, 0)` means the arbitrator does not expose an appeal window.
    pub fn is_exposed(&self) -> bool {
        !(self.start == 0 && self.end == 0)
    }

    pub fn half_time(&self) -> u64 {
        appeal_half_time(self.start, self.end)
    }
}

pub(super) fn request_phase(
    item: &RequestItem,
    params: &ChallengeParameters,
    now: u64,
    variant: RegistryVariant,
) -> Result<RequestPhase, StatusError> {
    let kind = match item.contract_status {
        RequestStatus::Absent => return Ok(RequestPhase::Absent),
        RequestStatus::Registered => return Ok(RequestPhase::Registered),
        RequestStatus::RegistrationRequested => RequestKind::Registration,
        RequestStatus::ClearingRequested => RequestKind::Removal,
    };

    if !item.disputed {
        let ends_at = challenge_period_end(item.submission_time, params.challenge_period_duration);
        // Equality is still inside the window.
        return Ok(if now > ends_at {
            RequestPhase::Executable { kind }
        } else {
            RequestPhase::Challengeable { kind, ends_at }
        });
    }

    let dispute_status = item.dispute_status.ok_or(StatusError::MissingField {
        variant,
        field: "disputeStatus",
    })?;

    match dispute_status {
        DisputeStatus::Waiting => Ok(RequestPhase::Challenged),
        DisputeStatus::Appealable => {
            let window = AppealWindow {
                start: item.appeal_period_start,
                end: item.appeal_period_end,
                ruling: item.current_ruling,
            };
            if window.is_exposed() && window.start > window.end {
                return Err(StatusError::unhandled(
                    variant,
                    format!(
                        "appeal period starts at {} after it ends at {}",
                        window.start, window.end
                    ),
                ));
            }
            Ok(RequestPhase::Appealable(window))
        }
        DisputeStatus::Solved => Err(StatusError::unhandled(
            variant,
            format!(
                "dispute is Solved while the item is still {:?}",
                item.contract_status
            ),
        )),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_terminal_statuses_ignore_dispute_fields() {
        let mut item = request(RequestStatus::Registered);
        item.disputed = true;
        item.dispute_status = Some(DisputeStatus::Solved);

        let phase = request_phase(&item, &CHALLENGE_PERIOD, 0, RegistryVariant::Classic).unwrap();
        assert_eq!(phase, RequestPhase::Registered);
    }

    #[test]
    fn test_missing_dispute_status() {
        let mut item = request(RequestStatus::ClearingRequested);
        item.disputed = true;

        let err = request_phase(&item, &CHALLENGE_PERIOD, 0, RegistryVariant::Light).unwrap_err();
        assert_eq!(
            err,
            StatusError::MissingField {
                variant: RegistryVariant::Light,
                field: "disputeStatus",
            }
        );
    }

    #[test]
    fn test_inverted_appeal_window() {
        let item = appealable(Ruling::Accept, 2000, 1000);
        let err = request_phase(&item, &CHALLENGE_PERIOD, 0, RegistryVariant::Classic).unwrap_err();
        assert!(matches!(err, StatusError::UnhandledState { .. }));
    }

    #[test]
    fn test_dispute_status_ignored_when_not_disputed() {
        let mut item = request(RequestStatus::RegistrationRequested);
        item.dispute_status = Some(DisputeStatus::Solved);

        let phase = request_phase(&item, &CHALLENGE_PERIOD, 1400, RegistryVariant::Classic).unwrap();
        assert_eq!(
            phase,
            RequestPhase::Challengeable {
                kind: RequestKind::Registration,
                ends_at: 1500,
            }
        );
    }
}
