use ulid::Ulid;

use crate::calendar;
use crate::model::*;

use super::conflict::{find_collisions, find_draft_collisions};
use super::Engine;

impl Engine {
    pub fn reservations_for_resource(&self, resource_id: Ulid) -> Vec<Reservation> {
        self.store
            .reservations()
            .into_iter()
            .filter(|r| r.resource_id == resource_id)
            .collect()
    }

    /// Every reservation occupying `day`, on any resource.
    pub fn reservations_on(&self, day: Day) -> Vec<Reservation> {
        self.store
            .reservations()
            .into_iter()
            .filter(|r| r.dates.contains(day))
            .collect()
    }

    pub fn reservations_in(&self, range: DateRange) -> Vec<Reservation> {
        self.store
            .reservations()
            .into_iter()
            .filter(|r| r.dates.overlaps(&range))
            .collect()
    }

    /// A project's reservations on one resource, ordered by start date.
    pub fn series(&self, project_id: Ulid, resource_id: Ulid) -> Vec<Reservation> {
        self.store
            .reservations()
            .into_iter()
            .filter(|r| r.project_id == project_id && r.resource_id == resource_id)
            .collect()
    }

    /// What `candidate` would collide with right now. Commits nothing.
    pub fn collisions_for(&self, candidate: &Reservation) -> Vec<Reservation> {
        let existing = self.store.reservations();
        find_collisions(candidate, &existing, self.store.as_ref())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Same as [`Engine::collisions_for`] for a form that may still be incomplete.
    pub fn draft_collisions(&self, draft: &ReservationDraft) -> Vec<Reservation> {
        let existing = self.store.reservations();
        find_draft_collisions(draft, &existing, self.store.as_ref())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Sunday..Saturday of the week containing `day`.
    pub fn week_days(&self, day: Day) -> Vec<Day> {
        calendar::week_of(day).days().collect()
    }

    /// Every cell of a Sunday-started month view, padding included.
    pub fn month_grid(&self, day: Day) -> Vec<Day> {
        calendar::month_grid(day).days().collect()
    }

    /// Default time slot for a new booking on `resource_id`.
    ///
    /// Standard rooms get the configured working day. A technical room starts
    /// where the latest booking that day ends, or at the configured day start
    /// when the day is free, and lasts the configured slot length.
    pub fn suggest_time_slot(&self, resource_id: Ulid, day: Day) -> TimeSlot {
        if !self.store.is_technical(&resource_id) {
            return TimeSlot::new(self.config.day_start.clone(), self.config.day_end.clone());
        }
        let start = self
            .store
            .reservations()
            .into_iter()
            .filter(|r| r.resource_id == resource_id && r.dates.contains(day))
            .filter_map(|r| r.time.map(|t| t.end))
            .max()
            .unwrap_or_else(|| self.config.day_start.clone());
        let end = ClockTime::from_minutes(start.minutes() + self.config.technical_slot_minutes);
        TimeSlot::new(start, end)
    }
}
