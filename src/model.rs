use std::collections::HashMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::EngineError;
use crate::limits::*;

/// A calendar day. Every range comparison in the engine happens at this granularity.
pub type Day = NaiveDate;

/// Closed interval `[start, end]` of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Day,
    pub end: Day,
}

impl DateRange {
    pub fn new(start: Day, end: Day) -> Self {
        debug_assert!(start <= end, "DateRange start must not be after end");
        Self { start, end }
    }

    /// Checked constructor for caller-supplied bounds.
    pub fn try_new(start: Day, end: Day) -> Result<Self, EngineError> {
        if end < start {
            return Err(EngineError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(day: Day) -> Self {
        Self { start: day, end: day }
    }

    /// `end - start` in days; zero for a single-day range.
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Number of calendar days covered (inclusive).
    pub fn len_days(&self) -> i64 {
        self.duration_days() + 1
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn contains(&self, day: Day) -> bool {
        self.start <= day && day <= self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_range(&self, other: &DateRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersection(&self, other: &DateRange) -> Option<DateRange> {
        if !self.overlaps(other) {
            return None;
        }
        Some(DateRange::new(self.start.max(other.start), self.end.min(other.end)))
    }

    /// Same duration, re-anchored at `start`.
    pub fn anchored_at(&self, start: Day) -> Option<DateRange> {
        let end = start.checked_add_days(chrono::Days::new(self.duration_days() as u64))?;
        Some(DateRange::new(start, end))
    }

    /// Every day in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = Day> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_day() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}..={}", self.start, self.end)
        }
    }
}

/// Zero-padded 24-hour `"HH:MM"` time of day.
///
/// Ordering is plain string ordering, which is correct because the format is fixed-width.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(String);

impl ClockTime {
    pub fn parse(s: &str) -> Result<Self, EngineError> {
        let b = s.as_bytes();
        let well_formed = b.len() == 5
            && b[2] == b':'
            && b[0].is_ascii_digit()
            && b[1].is_ascii_digit()
            && b[3].is_ascii_digit()
            && b[4].is_ascii_digit();
        if !well_formed {
            return Err(EngineError::InvalidTime(s.to_string()));
        }
        let hours = (b[0] - b'0') * 10 + (b[1] - b'0');
        let minutes = (b[3] - b'0') * 10 + (b[4] - b'0');
        if hours > 23 || minutes > 59 {
            return Err(EngineError::InvalidTime(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Minutes since midnight, clamped to `23:59`.
    pub fn from_minutes(minutes: u32) -> Self {
        let m = minutes.min(23 * 60 + 59);
        Self(format!("{:02}:{:02}", m / 60, m % 60))
    }

    pub fn minutes(&self) -> u32 {
        let b = self.0.as_bytes();
        let hours = u32::from((b[0] - b'0') * 10 + (b[1] - b'0'));
        let minutes = u32::from((b[3] - b'0') * 10 + (b[4] - b'0'));
        hours * 60 + minutes
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClockTime {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.0
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Half-open time-of-day window `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeSlot {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, EngineError> {
        Ok(Self::new(ClockTime::parse(start)?, ClockTime::parse(end)?))
    }

    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// What a resource is. Technical rooms never collide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    #[default]
    StandardRoom,
    TechnicalRoom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Ulid,
    pub name: String,
    pub kind: ResourceKind,
}

impl Resource {
    pub fn new(id: Ulid, name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }
}

/// Lookup of a resource's kind by id. Owned by whoever holds the resource list.
pub trait ResourceCatalog {
    fn kind_of(&self, id: &Ulid) -> Option<ResourceKind>;

    /// Unknown resources are treated as standard rooms.
    fn is_technical(&self, id: &Ulid) -> bool {
        matches!(self.kind_of(id), Some(ResourceKind::TechnicalRoom))
    }
}

impl ResourceCatalog for HashMap<Ulid, Resource> {
    fn kind_of(&self, id: &Ulid) -> Option<ResourceKind> {
        self.get(id).map(|r| r.kind)
    }
}

impl ResourceCatalog for [Resource] {
    fn kind_of(&self, id: &Ulid) -> Option<ResourceKind> {
        self.iter().find(|r| r.id == *id).map(|r| r.kind)
    }
}

impl ResourceCatalog for Vec<Resource> {
    fn kind_of(&self, id: &Ulid) -> Option<ResourceKind> {
        self.as_slice().kind_of(id)
    }
}

/// Billable material line. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub material_id: Ulid,
    pub quantity: u32,
    pub unit_price: i64,
}

/// A booked occupancy of one resource for a date (and optionally time) range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// `None` until committed.
    pub id: Option<Ulid>,
    pub resource_id: Ulid,
    pub project_id: Ulid,
    pub client_id: Ulid,
    pub personnel_id: Option<Ulid>,
    pub dates: DateRange,
    pub time: Option<TimeSlot>,
    pub services: Vec<Ulid>,
    pub materials: Vec<MaterialLine>,
    pub notes: String,
    pub do_not_charge_resource: bool,
    /// Set when committed over a detected collision.
    pub forced: bool,
    pub billed: bool,
    pub billed_on: Option<Day>,
}

impl Reservation {
    pub fn new(resource_id: Ulid, project_id: Ulid, client_id: Ulid, dates: DateRange) -> Self {
        Self {
            id: None,
            resource_id,
            project_id,
            client_id,
            personnel_id: None,
            dates,
            time: None,
            services: Vec::new(),
            materials: Vec::new(),
            notes: String::new(),
            do_not_charge_resource: false,
            forced: false,
            billed: false,
            billed_on: None,
        }
    }

    pub fn with_time(mut self, time: TimeSlot) -> Self {
        self.time = Some(time);
        self
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Uncommitted copy of this reservation over another range.
    pub fn sibling(&self, dates: DateRange) -> Self {
        Self {
            id: None,
            dates,
            ..self.clone()
        }
    }

    /// Uncommitted copy of this reservation on another resource.
    pub fn on_resource(&self, resource_id: Ulid) -> Self {
        Self {
            id: None,
            resource_id,
            ..self.clone()
        }
    }
}

/// Flat record of one committed mutation, applied by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    Inserted(Reservation),
    Updated(Reservation),
    Deleted { id: Ulid, resource_id: Ulid },
}

impl Change {
    pub fn resource_id(&self) -> Ulid {
        match self {
            Change::Inserted(r) | Change::Updated(r) => r.resource_id,
            Change::Deleted { resource_id, .. } => *resource_id,
        }
    }

    pub fn reservation_id(&self) -> Option<Ulid> {
        match self {
            Change::Inserted(r) | Change::Updated(r) => r.id,
            Change::Deleted { id, .. } => Some(*id),
        }
    }
}

/// Form-level input before validation: every field may still be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationDraft {
    pub id: Option<Ulid>,
    pub resource_id: Option<Ulid>,
    pub project_id: Option<Ulid>,
    pub client_id: Option<Ulid>,
    pub personnel_id: Option<Ulid>,
    pub start: Option<Day>,
    pub end: Option<Day>,
    pub start_time: Option<ClockTime>,
    pub end_time: Option<ClockTime>,
    pub services: Vec<Ulid>,
    pub materials: Vec<MaterialLine>,
    pub notes: String,
    pub do_not_charge_resource: bool,
}

impl ReservationDraft {
    /// Turn a draft into a reservation, rejecting what a booking form would reject.
    pub fn validate(&self, catalog: &(impl ResourceCatalog + ?Sized)) -> Result<Reservation, EngineError> {
        let resource_id = self.resource_id.ok_or(EngineError::MissingField("resource"))?;
        let project_id = self.project_id.ok_or(EngineError::MissingField("project"))?;
        let client_id = self.client_id.ok_or(EngineError::MissingField("client"))?;
        let start = self.start.ok_or(EngineError::MissingField("start date"))?;
        let end = self.end.ok_or(EngineError::MissingField("end date"))?;
        let dates = DateRange::try_new(start, end)?;
        if dates.len_days() > MAX_SPAN_DAYS {
            return Err(EngineError::LimitExceeded("date range too wide"));
        }
        if self.notes.len() > MAX_NOTES_LEN {
            return Err(EngineError::LimitExceeded("notes too long"));
        }
        if self.services.len() + self.materials.len() > MAX_LINE_ITEMS {
            return Err(EngineError::LimitExceeded("too many line items"));
        }

        let technical = catalog.is_technical(&resource_id);
        let time = match (&self.start_time, &self.end_time) {
            (Some(s), Some(e)) => Some(TimeSlot::new(s.clone(), e.clone())),
            (None, None) if technical => None,
            (None, None) => return Err(EngineError::MissingField("start/end time")),
            (Some(_), None) => return Err(EngineError::MissingField("end time")),
            (None, Some(_)) => return Err(EngineError::MissingField("start time")),
        };
        if let Some(slot) = &time
            && !technical
            && dates.is_single_day()
            && slot.start >= slot.end
        {
            return Err(EngineError::InvalidTime(format!(
                "end time {} must be after start time {}",
                slot.end, slot.start
            )));
        }

        Ok(Reservation {
            id: self.id,
            resource_id,
            project_id,
            client_id,
            personnel_id: self.personnel_id,
            dates,
            time,
            services: self.services.clone(),
            materials: self.materials.clone(),
            notes: self.notes.clone(),
            do_not_charge_resource: self.do_not_charge_resource,
            forced: false,
            billed: false,
            billed_on: None,
        })
    }
}

/// Fridays and Saturdays are the skippable days in a Sunday-started week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeekendDay {
    Friday,
    Saturday,
}

impl WeekendDay {
    pub fn weekday(self) -> Weekday {
        match self {
            WeekendDay::Friday => Weekday::Fri,
            WeekendDay::Saturday => Weekday::Sat,
        }
    }

    pub fn of(day: Day) -> Option<WeekendDay> {
        match day.weekday() {
            Weekday::Fri => Some(WeekendDay::Friday),
            Weekday::Sat => Some(WeekendDay::Saturday),
            _ => None,
        }
    }
}
