use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::calendar::DurationOptions;
use crate::model::*;

use super::EngineError;

// ── Partition by skip predicate ──────────────────────────────────

/// Split `range` into maximal runs of consecutive days for which `skip` is false.
///
/// Boundaries are inclusive; a lone non-skipped day is a valid one-day run.
pub fn partition_days(range: DateRange, mut skip: impl FnMut(Day) -> bool) -> Vec<DateRange> {
    let mut chunks = Vec::new();
    let mut open: Option<Day> = None;
    let mut last_kept = range.start;

    for day in range.days() {
        if skip(day) {
            if let Some(start) = open.take() {
                chunks.push(DateRange::new(start, last_kept));
            }
        } else {
            open.get_or_insert(day);
            last_kept = day;
        }
    }
    if let Some(start) = open {
        chunks.push(DateRange::new(start, range.end));
    }
    chunks
}

// ── Creation chunking ────────────────────────────────────────────

/// Which weekend days a new booking may occupy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekendPolicy {
    pub include_friday: bool,
    pub include_saturday: bool,
}

impl WeekendPolicy {
    pub const ALL_DAYS: WeekendPolicy = WeekendPolicy {
        include_friday: true,
        include_saturday: true,
    };

    pub fn skips(&self, day: Day) -> bool {
        match WeekendDay::of(day) {
            Some(WeekendDay::Friday) => !self.include_friday,
            Some(WeekendDay::Saturday) => !self.include_saturday,
            None => false,
        }
    }
}

impl From<DurationOptions> for WeekendPolicy {
    /// A full-month booking keeps every day of the month.
    fn from(options: DurationOptions) -> Self {
        if options.full_month {
            return WeekendPolicy::ALL_DAYS;
        }
        WeekendPolicy {
            include_friday: options.include_friday,
            include_saturday: options.include_saturday,
        }
    }
}

/// Fan `template` out over `resource_ids`, one reservation per weekend-free chunk
/// per resource. Output is ordered chunk by chunk, resources in the given order.
pub fn chunk_for_creation(
    template: &Reservation,
    resource_ids: &[Ulid],
    policy: WeekendPolicy,
) -> Result<Vec<Reservation>, EngineError> {
    let chunks = partition_days(template.dates, |day| policy.skips(day));
    let reservations: Vec<Reservation> = chunks
        .iter()
        .flat_map(|chunk| {
            resource_ids.iter().map(move |rid| Reservation {
                id: None,
                resource_id: *rid,
                dates: *chunk,
                ..template.clone()
            })
        })
        .collect();
    if reservations.is_empty() {
        return Err(EngineError::NoBookableDays);
    }
    Ok(reservations)
}

// ── Available-day chunking ───────────────────────────────────────

/// Union of every day covered by the colliding reservations.
pub fn blocked_days<'a>(collisions: impl IntoIterator<Item = &'a Reservation>) -> BTreeSet<Day> {
    collisions
        .into_iter()
        .flat_map(|r| r.dates.days())
        .collect()
}

/// Split `candidate` around every day a collision occupies. Day granularity
/// only: time slots are ignored here.
pub fn chunk_available_days<'a>(
    candidate: &Reservation,
    collisions: impl IntoIterator<Item = &'a Reservation>,
) -> Result<Vec<Reservation>, EngineError> {
    let blocked = blocked_days(collisions);
    let chunks = partition_days(candidate.dates, |day| blocked.contains(&day));
    if chunks.is_empty() {
        return Err(EngineError::NoAvailableDays);
    }
    Ok(chunks.into_iter().map(|c| candidate.sibling(c)).collect())
}
