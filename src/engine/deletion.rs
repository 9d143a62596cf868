use serde::{Deserialize, Serialize};

use crate::model::*;

/// Which end of a reservation an edge-trim removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Head,
    Tail,
}

/// Classification of a partial-range deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionOutcome {
    /// The range covers the whole reservation.
    FullDelete,
    /// The range misses the reservation entirely.
    NoOp,
    /// Only one side survives; `remaining` is the reservation's new span.
    EdgeTrim { removed: Edge, remaining: DateRange },
    /// Both sides survive. The original keeps `head`; a new sibling takes `tail`.
    MiddleSplit { head: DateRange, tail: DateRange },
}

pub fn split_for_deletion(reservation: &Reservation, range: DateRange) -> DeletionOutcome {
    let own = reservation.dates;
    let Some(deleted) = own.intersection(&range) else {
        return DeletionOutcome::NoOp;
    };
    if deleted == own {
        return DeletionOutcome::FullDelete;
    }

    let head = deleted
        .start
        .pred_opt()
        .filter(|end| own.start <= *end)
        .map(|end| DateRange::new(own.start, end));
    let tail = deleted
        .end
        .succ_opt()
        .filter(|start| *start <= own.end)
        .map(|start| DateRange::new(start, own.end));

    match (head, tail) {
        (Some(head), Some(tail)) => DeletionOutcome::MiddleSplit { head, tail },
        (Some(head), None) => DeletionOutcome::EdgeTrim {
            removed: Edge::Tail,
            remaining: head,
        },
        (None, Some(tail)) => DeletionOutcome::EdgeTrim {
            removed: Edge::Head,
            remaining: tail,
        },
        (None, None) => DeletionOutcome::FullDelete,
    }
}

impl DeletionOutcome {
    /// What survives of `original`: the original (id kept) with its new span,
    /// followed by an uncommitted sibling on a middle split.
    pub fn survivors(&self, original: &Reservation) -> Vec<Reservation> {
        match self {
            DeletionOutcome::FullDelete => Vec::new(),
            DeletionOutcome::NoOp => vec![original.clone()],
            DeletionOutcome::EdgeTrim { remaining, .. } => vec![Reservation {
                dates: *remaining,
                ..original.clone()
            }],
            DeletionOutcome::MiddleSplit { head, tail } => vec![
                Reservation {
                    dates: *head,
                    ..original.clone()
                },
                original.sibling(*tail),
            ],
        }
    }
}
