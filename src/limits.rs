/// Longest date range a single request may cover, in calendar days.
pub const MAX_SPAN_DAYS: i64 = 366;

/// Max reservations committed in one batch.
pub const MAX_BATCH_SIZE: usize = 512;

/// Max additional resources a creation or edit may fan out to.
pub const MAX_EXTRA_RESOURCES: usize = 32;

/// Max bytes of free-text notes on a reservation.
pub const MAX_NOTES_LEN: usize = 4096;

/// Max service + material lines carried by a reservation.
pub const MAX_LINE_ITEMS: usize = 256;
