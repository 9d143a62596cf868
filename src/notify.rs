use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::Change;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for committed changes, one channel per resource.
///
/// A subscriber hears every change touching its resource, in commit order.
/// An `Updated` that moves a reservation between resources is published to
/// both, so the old resource learns that the reservation left. Undo publishes
/// its restoring changes the same way. Slow receivers lag rather than block
/// commits.
pub struct NotifyHub {
    channels: DashMap<Ulid, broadcast::Sender<Change>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to changes on a resource. Creates the channel if needed.
    pub fn subscribe(&self, resource_id: Ulid) -> broadcast::Receiver<Change> {
        let sender = self
            .channels
            .entry(resource_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send a change to one resource's subscribers. No-op if nobody is listening.
    pub fn send(&self, resource_id: Ulid, change: &Change) {
        if let Some(sender) = self.channels.get(&resource_id) {
            let _ = sender.send(change.clone());
        }
    }

    /// Drop a resource's channel; open receivers see it closed.
    pub fn remove(&self, resource_id: &Ulid) {
        self.channels.remove(resource_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DateRange, Reservation};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let rid = Ulid::new();
        let mut rx = hub.subscribe(rid);

        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let mut r = Reservation::new(rid, Ulid::new(), Ulid::new(), DateRange::single(day));
        r.id = Some(Ulid::new());
        let change = Change::Inserted(r);
        hub.send(rid, &change);

        assert_eq!(rx.recv().await.unwrap(), change);
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        let rid = Ulid::new();
        hub.send(
            rid,
            &Change::Deleted {
                id: Ulid::new(),
                resource_id: rid,
            },
        );
    }

    #[tokio::test]
    async fn removed_channel_closes_receivers() {
        let hub = NotifyHub::new();
        let rid = Ulid::new();
        let mut rx = hub.subscribe(rid);
        hub.remove(&rid);
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
