//! Broadcast implementation of `ScoreEvents`.
//!
//! Events go to whoever is subscribed at the time; with nobody listening they
//! are dropped. Slow subscribers lag rather than block the publisher.

use domains::{ScoreEvent, ScoreEvents};
use tokio::sync::broadcast;

pub struct BroadcastEvents {
    tx: broadcast::Sender<ScoreEvent>,
}

impl BroadcastEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScoreEvent> {
        self.tx.subscribe()
    }
}

impl ScoreEvents for BroadcastEvents {
    fn publish(&self, event: ScoreEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("score event dropped, no subscribers");
        }
    }
}
