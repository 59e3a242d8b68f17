//! Classic registry state machine.
//!
//! Rules, first match wins:
//!
//! 1. `Absent` items are `Rejected`, `Registered` items are `Registered`.
//! 2. Undisputed requests are `Submitted`/`RemovalRequested` until the
//!    challenge period ends (inclusive), then pending execution.
//! 3. Disputed requests awaiting a ruling are `Challenged`.
//! 4. Appealable rulings are `Crowdfunding` while the appeal window is open
//!    (or not exposed at all), `WaitingArbitrator` after it closes.
//! 5. Anything else, e.g. a `Solved` dispute on a pending request, is an error.

use super::request::{request_phase, RequestKind, RequestPhase};
use super::{ChallengeParameters, RequestItem, StatusView};
use crate::error::StatusError;
use crate::resolver::RegistryVariant;

status_codes! {
    /// Status codes of a Classic registry item.
    ClassicStatus {
        Rejected,
        Registered,
        Submitted,
        RemovalRequested,
        Challenged,
        Crowdfunding,
        WaitingArbitrator,
        PendingSubmissionExecution,
        PendingRemovalExecution,
    }
}

/// Derives the status of a Classic item and its countdown deadline.
pub fn derive(
    item: &RequestItem,
    params: &ChallengeParameters,
    now: u64,
) -> Result<StatusView<ClassicStatus>, StatusError> {
    let phase = request_phase(item, params, now, RegistryVariant::Classic)?;

    let view = match phase {
        RequestPhase::Absent => StatusView::settled(ClassicStatus::Rejected),
        RequestPhase::Registered => StatusView::settled(ClassicStatus::Registered),
        RequestPhase::Challengeable { kind, ends_at } => {
            let status = match kind {
                RequestKind::Registration => ClassicStatus::Submitted,
                RequestKind::Removal => ClassicStatus::RemovalRequested,
            };
            StatusView::new(status, Some(ends_at))
        }
        RequestPhase::Executable { kind } => StatusView::settled(match kind {
            RequestKind::Registration => ClassicStatus::PendingSubmissionExecution,
            RequestKind::Removal => ClassicStatus::PendingRemovalExecution,
        }),
        RequestPhase::Challenged => StatusView::settled(ClassicStatus::Challenged),
        RequestPhase::Appealable(window) => {
            if !window.is_exposed() {
                StatusView::settled(ClassicStatus::Crowdfunding)
            } else if now > window.end {
                StatusView::settled(ClassicStatus::WaitingArbitrator)
            } else {
                StatusView::new(ClassicStatus::Crowdfunding, Some(window.end))
            }
        }
    };

    Ok(view)
}

/// Derives the status code of a Classic item.
pub fn item_status(
    item: &RequestItem,
    params: &ChallengeParameters,
    now: u64,
) -> Result<ClassicStatus, StatusError> {
    derive(item, params, now).map(|view| view.status)
}
