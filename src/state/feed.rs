use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::sse::GameEvent;

/// Broadcast hub wrapping the channel of a single game feed.
pub struct SseHub {
    sender: broadcast::Sender<GameEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    /// Feeds whose channels buffer `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: GameEvent) {
        let _ = self.sender.send(event);
    }

    fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Change feeds keyed by game id. A hub exists only while someone listens.
pub struct GameFeeds {
    hubs: DashMap<Uuid, SseHub>,
    capacity: usize,
}

impl GameFeeds {
    pub fn new(capacity: usize) -> Self {
        Self {
            hubs: DashMap::new(),
            capacity,
        }
    }

    /// Subscribe to the feed of `game_id`, creating it on first use.
    pub fn subscribe(&self, game_id: Uuid) -> broadcast::Receiver<GameEvent> {
        self.hubs
            .entry(game_id)
            .or_insert_with(|| SseHub::new(self.capacity))
            .subscribe()
    }

    /// Publish to the subscribers of `game_id`; a no-op when nobody listens.
    pub fn publish(&self, game_id: Uuid, event: GameEvent) {
        if let Some(hub) = self.hubs.get(&game_id) {
            hub.broadcast(event);
        }
    }

    /// Drop the hub of `game_id` once its last subscriber went away.
    pub fn release(&self, game_id: Uuid) {
        self.hubs
            .remove_if(&game_id, |_, hub| hub.receiver_count() == 0);
    }

    /// Number of games with at least one live hub.
    pub fn active_feeds(&self) -> usize {
        self.hubs.len()
    }
}
