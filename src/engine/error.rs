use ulid::Ulid;

use crate::model::Day;

#[derive(Debug)]
pub enum EngineError {
    NotFound(Ulid),
    MissingField(&'static str),
    InvalidRange { start: Day, end: Day },
    InvalidTime(String),
    /// The dragged day is not part of the dragged reservation.
    DayOutsideReservation { id: Ulid, day: Day },
    /// Creation chunking skipped every day of the request.
    NoBookableDays,
    /// Every day of the candidate is blocked by a collision.
    NoAvailableDays,
    NothingToUndo,
    /// Force is only offered for a single reservation.
    NotForceable(usize),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::MissingField(field) => write!(f, "missing required field: {field}"),
            EngineError::InvalidRange { start, end } => {
                write!(f, "end date {end} is before start date {start}")
            }
            EngineError::InvalidTime(msg) => write!(f, "invalid time: {msg}"),
            EngineError::DayOutsideReservation { id, day } => {
                write!(f, "day {day} is not part of reservation {id}")
            }
            EngineError::NoBookableDays => write!(f, "no bookable days in range"),
            EngineError::NoAvailableDays => write!(f, "no available days in range"),
            EngineError::NothingToUndo => write!(f, "nothing to undo"),
            EngineError::NotForceable(n) => {
                write!(f, "cannot force a batch of {n} reservations")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
