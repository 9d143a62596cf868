use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::model::*;

/// One candidate and every existing reservation it collides with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub candidate: Reservation,
    pub colliding: Vec<Reservation>,
}

/// All existing reservations that `candidate` would collide with.
///
/// Technical rooms never collide. The candidate's own id is skipped so an edit
/// doesn't collide with its previous version. Dates are compared inclusively;
/// a reservation without a time slot, or spanning several days, occupies
/// whole days.
pub fn find_collisions<'a>(
    candidate: &Reservation,
    existing: &'a [Reservation],
    catalog: &(impl ResourceCatalog + ?Sized),
) -> Vec<&'a Reservation> {
    if catalog.is_technical(&candidate.resource_id) {
        return Vec::new();
    }
    existing
        .iter()
        .filter(|other| collides(candidate, other))
        .collect()
}

/// Same as [`find_collisions`] for a draft whose required fields may be missing.
/// A draft without resource, start or end never collides.
pub fn find_draft_collisions<'a>(
    draft: &ReservationDraft,
    existing: &'a [Reservation],
    catalog: &(impl ResourceCatalog + ?Sized),
) -> Vec<&'a Reservation> {
    let (Some(resource_id), Some(start), Some(end)) = (draft.resource_id, draft.start, draft.end) else {
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }
    let time = match (&draft.start_time, &draft.end_time) {
        (Some(s), Some(e)) => Some(TimeSlot::new(s.clone(), e.clone())),
        _ => None,
    };
    let mut candidate = Reservation::new(resource_id, Ulid::nil(), Ulid::nil(), DateRange::new(start, end));
    candidate.id = draft.id;
    candidate.time = time;
    find_collisions(&candidate, existing, catalog)
}

fn collides(candidate: &Reservation, other: &Reservation) -> bool {
    if candidate.id.is_some() && other.id == candidate.id {
        return false;
    }
    if other.resource_id != candidate.resource_id {
        return false;
    }
    if !candidate.dates.overlaps(&other.dates) {
        return false;
    }
    // Times only count when both sides are single-day bookings.
    match (&candidate.time, &other.time) {
        (Some(a), Some(b)) if candidate.dates.is_single_day() && other.dates.is_single_day() => {
            a.overlaps(b)
        }
        _ => true,
    }
}

/// Check every member of a batch against `existing`, ignoring reservations that
/// the batch itself replaces. Members are not compared with each other.
pub fn check_batch(
    batch: &[Reservation],
    existing: &[Reservation],
    catalog: &(impl ResourceCatalog + ?Sized),
) -> Vec<Conflict> {
    let batch_ids: HashSet<Ulid> = batch.iter().filter_map(|r| r.id).collect();
    let others: Vec<Reservation> = existing
        .iter()
        .filter(|r| r.id.is_none_or(|id| !batch_ids.contains(&id)))
        .cloned()
        .collect();

    batch
        .iter()
        .filter_map(|candidate| {
            let colliding = find_collisions(candidate, &others, catalog);
            if colliding.is_empty() {
                None
            } else {
                Some(Conflict {
                    candidate: candidate.clone(),
                    colliding: colliding.into_iter().cloned().collect(),
                })
            }
        })
        .collect()
}
