use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::model::*;

use super::deletion::{split_for_deletion, DeletionOutcome};
use super::EngineError;

/// "Move this reservation to `target_resource`, anchored at `target_day`."
/// `dragged_day` is the day of the reservation the user grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub reservation_id: Ulid,
    pub target_resource: Ulid,
    pub target_day: Day,
    pub dragged_day: Day,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveDecision {
    /// Single-day reservation: `moved` is the candidate to check and commit.
    DirectMove { moved: Reservation },
    /// Multi-day reservation: move only the dragged day, or the whole span?
    NeedsSingleVsAllChoice { dragged: Reservation },
    /// Resource change with later same-project reservations on the old resource:
    /// move only this one, or the whole series?
    NeedsSeriesChoice {
        dragged: Reservation,
        future_siblings: Vec<Reservation>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesChoice {
    OnlyThis,
    ThisAndFuture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanChoice {
    DraggedDayOnly,
    EntireSpan,
}

/// A relocation ready for validation and commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovePlan {
    /// New placements; each must pass the collision check.
    pub placed: Vec<Reservation>,
    /// Reservations that only shrink. Committed without a check.
    pub shrunk: Vec<Reservation>,
    /// Reservations deleted outright, e.g. a single-day original whose only day moved.
    pub removed: Vec<Reservation>,
}

impl MovePlan {
    /// `existing` as it would look with the shrinking already applied; the
    /// placements are checked against this.
    pub fn is_empty(&self) -> bool {
        self.placed.is_empty() && self.shrunk.is_empty() && self.removed.is_empty()
    }

    pub fn baseline(&self, existing: &[Reservation]) -> Vec<Reservation> {
        let replaced: HashSet<Ulid> = self
            .shrunk
            .iter()
            .chain(&self.removed)
            .filter_map(|r| r.id)
            .collect();
        existing
            .iter()
            .filter(|r| r.id.is_none_or(|id| !replaced.contains(&id)))
            .cloned()
            .chain(self.shrunk.iter().cloned())
            .collect()
    }
}

/// Same project, same (original) resource, starting strictly after `dragged`.
pub fn future_siblings(dragged: &Reservation, existing: &[Reservation]) -> Vec<Reservation> {
    let mut siblings: Vec<Reservation> = existing
        .iter()
        .filter(|r| {
            r.id != dragged.id
                && r.project_id == dragged.project_id
                && r.resource_id == dragged.resource_id
                && r.dates.start > dragged.dates.start
        })
        .cloned()
        .collect();
    siblings.sort_by_key(|r| (r.dates.start, r.id));
    siblings
}

fn find<'a>(existing: &'a [Reservation], id: Ulid) -> Result<&'a Reservation, EngineError> {
    existing
        .iter()
        .find(|r| r.id == Some(id))
        .ok_or(EngineError::NotFound(id))
}

/// Decide how a drag should be handled. Pure: nothing is checked or committed.
pub fn decide_move(request: &MoveRequest, existing: &[Reservation]) -> Result<MoveDecision, EngineError> {
    let dragged = find(existing, request.reservation_id)?;

    if dragged.resource_id != request.target_resource {
        let future = future_siblings(dragged, existing);
        if !future.is_empty() {
            return Ok(MoveDecision::NeedsSeriesChoice {
                dragged: dragged.clone(),
                future_siblings: future,
            });
        }
    }

    if dragged.dates.is_single_day() {
        return Ok(MoveDecision::DirectMove {
            moved: Reservation {
                resource_id: request.target_resource,
                dates: DateRange::single(request.target_day),
                ..dragged.clone()
            },
        });
    }
    Ok(MoveDecision::NeedsSingleVsAllChoice {
        dragged: dragged.clone(),
    })
}

/// The dragged reservation on the target resource, duration kept, starting at the target day.
fn relocated(dragged: &Reservation, request: &MoveRequest) -> Result<Reservation, EngineError> {
    let dates = dragged
        .dates
        .anchored_at(request.target_day)
        .ok_or(EngineError::LimitExceeded("date out of range"))?;
    Ok(Reservation {
        resource_id: request.target_resource,
        dates,
        ..dragged.clone()
    })
}

/// Answer to [`MoveDecision::NeedsSeriesChoice`]. Siblings keep their dates and
/// only change resource.
pub fn plan_series_move(
    request: &MoveRequest,
    existing: &[Reservation],
    choice: SeriesChoice,
) -> Result<MovePlan, EngineError> {
    let dragged = find(existing, request.reservation_id)?;
    let mut placed = vec![relocated(dragged, request)?];
    if choice == SeriesChoice::ThisAndFuture {
        placed.extend(future_siblings(dragged, existing).into_iter().map(|s| Reservation {
            resource_id: request.target_resource,
            ..s
        }));
    }
    Ok(MovePlan {
        placed,
        ..MovePlan::default()
    })
}

/// Answer to [`MoveDecision::NeedsSingleVsAllChoice`].
pub fn plan_span_move(
    request: &MoveRequest,
    existing: &[Reservation],
    choice: SpanChoice,
) -> Result<MovePlan, EngineError> {
    let dragged = find(existing, request.reservation_id)?;
    match choice {
        SpanChoice::EntireSpan => Ok(MovePlan {
            placed: vec![relocated(dragged, request)?],
            ..MovePlan::default()
        }),
        SpanChoice::DraggedDayOnly => {
            if !dragged.dates.contains(request.dragged_day) {
                return Err(EngineError::DayOutsideReservation {
                    id: request.reservation_id,
                    day: request.dragged_day,
                });
            }
            // Dropped back where it was picked up.
            if request.target_resource == dragged.resource_id && request.target_day == request.dragged_day {
                return Ok(MovePlan::default());
            }
            let outcome = split_for_deletion(dragged, DateRange::single(request.dragged_day));
            let moved_day = Reservation {
                id: None,
                resource_id: request.target_resource,
                dates: DateRange::single(request.target_day),
                ..dragged.clone()
            };
            let removed = match outcome {
                DeletionOutcome::FullDelete => vec![dragged.clone()],
                _ => Vec::new(),
            };
            Ok(MovePlan {
                placed: vec![moved_day],
                shrunk: outcome.survivors(dragged),
                removed,
            })
        }
    }
}
