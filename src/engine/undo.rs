use crate::model::Reservation;

/// Single-slot undo: the reservation set as it was before the last committed
/// mutation. Each commit overwrites the slot; undo consumes it.
#[derive(Debug, Default)]
pub struct ChangeLog {
    slot: Option<Vec<Reservation>>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, snapshot: Vec<Reservation>) {
        self.slot = Some(snapshot);
    }

    pub fn take(&mut self) -> Option<Vec<Reservation>> {
        self.slot.take()
    }

    pub fn can_undo(&self) -> bool {
        self.slot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DateRange;
    use chrono::NaiveDate;
    use ulid::Ulid;

    fn one() -> Reservation {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        Reservation::new(Ulid::new(), Ulid::new(), Ulid::new(), DateRange::single(day))
    }

    #[test]
    fn empty_log_has_nothing_to_undo() {
        let mut log = ChangeLog::new();
        assert!(!log.can_undo());
        assert!(log.take().is_none());
    }

    #[test]
    fn record_overwrites_previous_snapshot() {
        let mut log = ChangeLog::new();
        log.record(vec![one()]);
        log.record(Vec::new());
        assert!(log.can_undo());
        assert_eq!(log.take(), Some(Vec::new()));
        assert!(!log.can_undo());
    }
}
