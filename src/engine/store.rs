use dashmap::DashMap;
use ulid::Ulid;

use crate::model::*;

/// Authoritative resource catalog and reservation set.
///
/// Reservations are keyed by id; an uncommitted reservation (`id == None`)
/// never reaches the store.
pub struct InMemoryStore {
    resources: DashMap<Ulid, Resource>,
    reservations: DashMap<Ulid, Reservation>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            resources: DashMap::new(),
            reservations: DashMap::new(),
        }
    }

    // ── Resources ────────────────────────────────────────────

    pub fn insert_resource(&self, resource: Resource) {
        self.resources.insert(resource.id, resource);
    }

    pub fn resource(&self, id: &Ulid) -> Option<Resource> {
        self.resources.get(id).map(|e| e.value().clone())
    }

    pub fn resources(&self) -> Vec<Resource> {
        let mut all: Vec<Resource> = self.resources.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        all
    }

    // ── Reservations ─────────────────────────────────────────

    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    pub fn get(&self, id: &Ulid) -> Option<Reservation> {
        self.reservations.get(id).map(|e| e.value().clone())
    }

    /// Point-in-time copy, ordered by start date then id.
    pub fn reservations(&self) -> Vec<Reservation> {
        let mut all: Vec<Reservation> = self.reservations.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|r| (r.dates.start, r.id));
        all
    }

    /// Apply one committed change. Inserted and updated reservations must carry an id.
    pub fn apply(&self, change: &Change) {
        match change {
            Change::Inserted(r) | Change::Updated(r) => {
                if let Some(id) = r.id {
                    self.reservations.insert(id, r.clone());
                }
            }
            Change::Deleted { id, .. } => {
                self.reservations.remove(id);
            }
        }
    }

    /// Replace the whole reservation set.
    pub fn replace_all(&self, reservations: Vec<Reservation>) {
        self.reservations.clear();
        for r in reservations {
            if let Some(id) = r.id {
                self.reservations.insert(id, r);
            }
        }
    }

    /// Billing workflow: flip the billed flag (and billed date) on each listed
    /// reservation. Unknown ids are skipped. Returns how many were updated.
    pub fn set_billed(&self, ids: &[Ulid], billed: bool, on: Option<Day>) -> usize {
        let mut updated = 0;
        for id in ids {
            if let Some(mut entry) = self.reservations.get_mut(id) {
                entry.billed = billed;
                entry.billed_on = if billed { on } else { None };
                updated += 1;
            }
        }
        updated
    }
}

impl ResourceCatalog for InMemoryStore {
    fn kind_of(&self, id: &Ulid) -> Option<ResourceKind> {
        self.resources.get(id).map(|e| e.value().kind)
    }
}
