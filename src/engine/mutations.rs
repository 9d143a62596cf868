use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability::{self, Op};

use super::chunking::{chunk_available_days, chunk_for_creation, WeekendPolicy};
use super::conflict::{check_batch, find_collisions};
use super::deletion::{split_for_deletion, DeletionOutcome};
use super::relocation::{
    decide_move, plan_series_move, plan_span_move, MoveDecision, MovePlan, MoveRequest,
    SeriesChoice, SpanChoice,
};
use super::{diff, resource_index, upserts, CreateRequest, Engine, EngineError, MoveOutcome, Outcome};

impl Engine {
    fn check_reservation_limits(&self, r: &Reservation) -> Result<(), EngineError> {
        if r.dates.len_days() > self.config.max_span_days {
            return Err(EngineError::LimitExceeded("date range too wide"));
        }
        if r.notes.len() > MAX_NOTES_LEN {
            return Err(EngineError::LimitExceeded("notes too long"));
        }
        if r.services.len() + r.materials.len() > MAX_LINE_ITEMS {
            return Err(EngineError::LimitExceeded("too many line items"));
        }
        Ok(())
    }

    fn check_fan_out(extra_resources: &[Ulid]) -> Result<(), EngineError> {
        if extra_resources.len() > MAX_EXTRA_RESOURCES {
            return Err(EngineError::LimitExceeded("too many additional resources"));
        }
        Ok(())
    }

    /// Check the whole batch against one snapshot, then commit all of it or nothing.
    fn check_and_commit(&mut self, op: Op, batch: Vec<Reservation>) -> Result<Outcome, EngineError> {
        if batch.len() > MAX_BATCH_SIZE {
            return Err(EngineError::LimitExceeded("batch too large"));
        }
        let existing = self.store.reservations();
        let conflicts = check_batch(&batch, &existing, self.store.as_ref());
        if !conflicts.is_empty() {
            return Ok(self.report_conflicts(op, batch.len(), conflicts));
        }
        Ok(Outcome::Committed(self.commit(op, upserts(batch))))
    }

    fn existing(&self, id: Ulid) -> Result<Reservation, EngineError> {
        self.store.get(&id).ok_or(EngineError::NotFound(id))
    }

    // ── Creation and editing ────────────────────────────────

    /// Chunk the request around skipped weekend days, fan it out over every
    /// requested resource, and commit the batch if nothing collides.
    pub fn create(&mut self, request: CreateRequest) -> Result<Outcome, EngineError> {
        let CreateRequest {
            mut template,
            extra_resources,
            weekend,
        } = request;
        Self::check_fan_out(&extra_resources)?;
        self.check_reservation_limits(&template)?;
        template.id = None;
        template.forced = false;

        let mut resource_ids = vec![template.resource_id];
        for rid in extra_resources {
            if !resource_ids.contains(&rid) {
                resource_ids.push(rid);
            }
        }
        let policy = weekend.unwrap_or(self.config.default_weekend);
        let batch = chunk_for_creation(&template, &resource_ids, policy)?;
        metrics::histogram!(observability::CHUNKS_PER_REQUEST).record(batch.len() as f64);
        tracing::debug!(
            resources = resource_ids.len(),
            reservations = batch.len(),
            dates = %template.dates,
            "creation chunked"
        );
        self.check_and_commit(Op::Create, batch)
    }

    /// Update an existing reservation in place (no weekend splitting) and copy it
    /// onto each additional resource.
    pub fn edit(&mut self, reservation: Reservation, extra_resources: &[Ulid]) -> Result<Outcome, EngineError> {
        Self::check_fan_out(extra_resources)?;
        self.check_reservation_limits(&reservation)?;
        let id = reservation.id.ok_or(EngineError::MissingField("id"))?;
        let stored = self.existing(id)?;

        let updated = Reservation {
            billed: stored.billed,
            billed_on: stored.billed_on,
            ..reservation
        };
        let mut batch = vec![updated.clone()];
        batch.extend(
            extra_resources
                .iter()
                .filter(|rid| **rid != updated.resource_id)
                .map(|rid| Reservation {
                    billed: false,
                    billed_on: None,
                    ..updated.on_resource(*rid)
                }),
        );
        self.check_and_commit(Op::Edit, batch)
    }

    /// Validate a draft and route it to [`Engine::create`] or [`Engine::edit`]
    /// depending on whether it already has an id.
    pub fn save(
        &mut self,
        draft: &ReservationDraft,
        extra_resources: &[Ulid],
        weekend: Option<WeekendPolicy>,
    ) -> Result<Outcome, EngineError> {
        let reservation = draft.validate(self.store.as_ref())?;
        if reservation.is_new() {
            self.create(CreateRequest {
                template: reservation,
                extra_resources: extra_resources.to_vec(),
                weekend,
            })
        } else {
            self.edit(reservation, extra_resources)
        }
    }

    /// Commit a single candidate despite its conflicts. Only a batch of exactly
    /// one reservation can be forced.
    pub fn force(&mut self, batch: Vec<Reservation>) -> Result<Vec<Change>, EngineError> {
        let [candidate] = <[Reservation; 1]>::try_from(batch).map_err(|b| EngineError::NotForceable(b.len()))?;
        self.check_reservation_limits(&candidate)?;
        if let Some(id) = candidate.id {
            self.existing(id)?;
        }
        let forced = Reservation {
            forced: true,
            ..candidate
        };
        tracing::info!(resource = %forced.resource_id, dates = %forced.dates, "forcing reservation");
        Ok(self.commit(Op::Force, upserts([forced])))
    }

    /// Book only the days of `candidate` that nothing currently occupies.
    ///
    /// Collisions are recomputed against the current store. If the candidate
    /// already exists it is replaced by the resulting chunks.
    pub fn book_available(&mut self, candidate: Reservation) -> Result<Vec<Change>, EngineError> {
        self.check_reservation_limits(&candidate)?;
        let replaced = candidate.id.map(|id| self.existing(id)).transpose()?;
        let existing = self.store.reservations();
        let collisions = find_collisions(&candidate, &existing, self.store.as_ref());
        let chunks = chunk_available_days(&candidate, collisions)?;
        metrics::histogram!(observability::CHUNKS_PER_REQUEST).record(chunks.len() as f64);

        let mut changes = Vec::with_capacity(chunks.len() + 1);
        if let Some(old) = replaced
            && let Some(id) = old.id
        {
            changes.push(Change::Deleted {
                id,
                resource_id: old.resource_id,
            });
        }
        changes.extend(chunks.into_iter().map(Change::Inserted));
        Ok(self.commit(Op::BookAvailable, changes))
    }

    // ── Deletion ─────────────────────────────────────────────

    pub fn delete(&mut self, id: Ulid) -> Result<Vec<Change>, EngineError> {
        let existing = self.existing(id)?;
        self.delete_range(id, existing.dates)
    }

    pub fn delete_day(&mut self, id: Ulid, day: Day) -> Result<Vec<Change>, EngineError> {
        self.delete_range(id, DateRange::single(day))
    }

    /// Remove `range` from a reservation, trimming or splitting what is left.
    /// A range that misses the reservation commits nothing.
    pub fn delete_range(&mut self, id: Ulid, range: DateRange) -> Result<Vec<Change>, EngineError> {
        let existing = self.existing(id)?;
        let outcome = split_for_deletion(&existing, range);
        tracing::debug!(%id, %range, ?outcome, "deletion classified");

        let changes = match outcome {
            DeletionOutcome::NoOp => return Ok(Vec::new()),
            DeletionOutcome::FullDelete => vec![Change::Deleted {
                id,
                resource_id: existing.resource_id,
            }],
            DeletionOutcome::EdgeTrim { .. } | DeletionOutcome::MiddleSplit { .. } => {
                upserts(outcome.survivors(&existing))
            }
        };
        Ok(self.commit(Op::Delete, changes))
    }

    // ── Relocation ───────────────────────────────────────────

    /// Handle a drag. A single-day move with nothing else to decide is checked
    /// and committed; everything else comes back as a choice for the caller.
    pub fn move_reservation(&mut self, request: MoveRequest) -> Result<MoveOutcome, EngineError> {
        let existing = self.store.reservations();
        let decision = decide_move(&request, &existing)?;
        tracing::debug!(reservation = %request.reservation_id, ?decision, "move decided");
        match decision {
            MoveDecision::DirectMove { moved } => {
                Ok(MoveOutcome::Done(self.check_and_commit(Op::Move, vec![moved])?))
            }
            other => Ok(MoveOutcome::NeedsChoice(other)),
        }
    }

    pub fn resolve_series_move(&mut self, request: MoveRequest, choice: SeriesChoice) -> Result<Outcome, EngineError> {
        let existing = self.store.reservations();
        let plan = plan_series_move(&request, &existing, choice)?;
        self.apply_plan(plan, &existing)
    }

    pub fn resolve_span_move(&mut self, request: MoveRequest, choice: SpanChoice) -> Result<Outcome, EngineError> {
        let existing = self.store.reservations();
        let plan = plan_span_move(&request, &existing, choice)?;
        self.apply_plan(plan, &existing)
    }

    /// Check every placement against the store as it will look once the plan's
    /// shrinking is applied. Any conflict blocks the whole plan.
    fn apply_plan(&mut self, plan: MovePlan, existing: &[Reservation]) -> Result<Outcome, EngineError> {
        if plan.placed.len() > MAX_BATCH_SIZE {
            return Err(EngineError::LimitExceeded("batch too large"));
        }
        if plan.is_empty() {
            return Ok(Outcome::Committed(Vec::new()));
        }
        let baseline = plan.baseline(existing);
        let conflicts = check_batch(&plan.placed, &baseline, self.store.as_ref());
        if !conflicts.is_empty() {
            return Ok(self.report_conflicts(Op::Move, plan.placed.len(), conflicts));
        }
        let mut changes: Vec<Change> = plan
            .removed
            .iter()
            .filter_map(|r| {
                r.id.map(|id| Change::Deleted {
                    id,
                    resource_id: r.resource_id,
                })
            })
            .collect();
        changes.extend(upserts(plan.shrunk.into_iter().chain(plan.placed)));
        Ok(Outcome::Committed(self.commit(Op::Move, changes)))
    }

    // ── Undo ─────────────────────────────────────────────────

    /// Restore the reservation set captured before the last commit and clear the slot.
    pub fn undo(&mut self) -> Result<Vec<Change>, EngineError> {
        let snapshot = self.change_log.take().ok_or(EngineError::NothingToUndo)?;
        let current = self.store.reservations();
        let previous = resource_index(&current);
        let changes = diff(&current, &snapshot);
        for change in &changes {
            self.store.apply(change);
            self.publish(change, &previous);
        }
        metrics::counter!(observability::UNDO_TOTAL).increment(1);
        metrics::gauge!(observability::RESERVATIONS_ACTIVE).set(self.store.reservation_count() as f64);
        tracing::info!(changes = changes.len(), "undo applied");
        Ok(changes)
    }
}
