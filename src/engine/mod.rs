mod chunking;
mod conflict;
mod deletion;
mod error;
mod mutations;
mod queries;
mod relocation;
mod store;
mod undo;

pub use chunking::{
    blocked_days, chunk_available_days, chunk_for_creation, partition_days, WeekendPolicy,
};
pub use conflict::{check_batch, find_collisions, find_draft_collisions, Conflict};
pub use deletion::{split_for_deletion, DeletionOutcome, Edge};
pub use error::EngineError;
pub use relocation::{
    decide_move, future_siblings, plan_series_move, plan_span_move, MoveDecision, MovePlan,
    MoveRequest, SeriesChoice, SpanChoice,
};
pub use store::InMemoryStore;
pub use undo::ChangeLog;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ulid::Ulid;

use crate::config::EngineConfig;
use crate::model::*;
use crate::notify::NotifyHub;
use crate::observability::{self, Op};

/// Result of a committing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Applied to the store, in this order.
    Committed(Vec<Change>),
    /// Nothing was applied; every conflicting candidate is listed.
    Conflicts(Vec<Conflict>),
}

impl Outcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Outcome::Committed(_))
    }
}

/// Result of [`Engine::move_reservation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Done(Outcome),
    /// The caller must answer with `resolve_series_move` or `resolve_span_move`.
    NeedsChoice(MoveDecision),
}

/// "Book `template` on its resource and on `extra_resources`."
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub template: Reservation,
    pub extra_resources: Vec<Ulid>,
    /// Falls back to the configured default when `None`.
    pub weekend: Option<WeekendPolicy>,
}

impl CreateRequest {
    pub fn new(template: Reservation) -> Self {
        Self {
            template,
            extra_resources: Vec::new(),
            weekend: None,
        }
    }
}

/// Booking engine over a shared store.
///
/// Mutations take `&mut self`: callers serialize them, one in flight at a
/// time. Every mutation validates against a fresh snapshot and either commits
/// all of its changes or none.
pub struct Engine {
    store: Arc<InMemoryStore>,
    pub notify: Arc<NotifyHub>,
    change_log: ChangeLog,
    config: EngineConfig,
}

impl Engine {
    pub fn new(store: Arc<InMemoryStore>, notify: Arc<NotifyHub>, config: EngineConfig) -> Self {
        Self {
            store,
            notify,
            change_log: ChangeLog::new(),
            config,
        }
    }

    pub fn store(&self) -> &Arc<InMemoryStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        self.change_log.can_undo()
    }

    /// Snapshot into the undo slot, assign ids, apply, notify.
    pub(super) fn commit(&mut self, op: Op, changes: Vec<Change>) -> Vec<Change> {
        let before = self.store.reservations();
        let previous = resource_index(&before);
        self.change_log.record(before);

        let changes: Vec<Change> = changes
            .into_iter()
            .map(|change| match change {
                Change::Inserted(mut r) => {
                    r.id.get_or_insert_with(Ulid::new);
                    Change::Inserted(r)
                }
                other => other,
            })
            .collect();

        for change in &changes {
            self.store.apply(change);
            self.publish(change, &previous);
        }

        metrics::counter!(observability::COMMITS_TOTAL, "op" => op.label()).increment(1);
        metrics::gauge!(observability::RESERVATIONS_ACTIVE).set(self.store.reservation_count() as f64);
        tracing::info!(op = op.label(), changes = changes.len(), "committed");
        changes
    }

    /// Notify the affected resource, and the old one too when a reservation moved.
    pub(super) fn publish(&self, change: &Change, previous: &HashMap<Ulid, Ulid>) {
        let resource_id = change.resource_id();
        self.notify.send(resource_id, change);
        if let Change::Updated(r) = change
            && let Some(id) = r.id
            && let Some(old) = previous.get(&id)
            && *old != resource_id
        {
            self.notify.send(*old, change);
        }
    }

    pub(super) fn report_conflicts(&self, op: Op, batch_len: usize, conflicts: Vec<Conflict>) -> Outcome {
        metrics::counter!(observability::CONFLICTS_TOTAL).increment(conflicts.len() as u64);
        if batch_len > 1 {
            metrics::counter!(observability::BATCH_BLOCKED_TOTAL).increment(1);
            tracing::warn!(
                op = op.label(),
                batch = batch_len,
                conflicts = conflicts.len(),
                "batch blocked by conflicts"
            );
        } else {
            tracing::debug!(op = op.label(), conflicts = conflicts.len(), "conflict surfaced");
        }
        Outcome::Conflicts(conflicts)
    }
}

/// Reservation id to the resource it sits on.
pub(super) fn resource_index(reservations: &[Reservation]) -> HashMap<Ulid, Ulid> {
    reservations
        .iter()
        .filter_map(|r| r.id.map(|id| (id, r.resource_id)))
        .collect()
}

/// Changes that turn `current` into `target`, by id.
pub(super) fn diff(current: &[Reservation], target: &[Reservation]) -> Vec<Change> {
    let now: HashMap<Ulid, &Reservation> = current
        .iter()
        .filter_map(|r| r.id.map(|id| (id, r)))
        .collect();
    let kept: HashSet<Ulid> = target.iter().filter_map(|r| r.id).collect();

    let mut changes: Vec<Change> = current
        .iter()
        .filter_map(|r| {
            let id = r.id?;
            (!kept.contains(&id)).then_some(Change::Deleted {
                id,
                resource_id: r.resource_id,
            })
        })
        .collect();
    for r in target {
        let Some(id) = r.id else { continue };
        match now.get(&id) {
            None => changes.push(Change::Inserted(r.clone())),
            Some(existing) if *existing != r => changes.push(Change::Updated(r.clone())),
            Some(_) => {}
        }
    }
    changes
}

/// Insert for uncommitted reservations, update for existing ones.
pub(super) fn upserts(reservations: impl IntoIterator<Item = Reservation>) -> Vec<Change> {
    reservations
        .into_iter()
        .map(|r| {
            if r.is_new() {
                Change::Inserted(r)
            } else {
                Change::Updated(r)
            }
        })
        .collect()
}
