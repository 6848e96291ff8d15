use serde::Serialize;

/// Names of the events written to a game stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEventKind {
    /// Sent once to a new subscriber with the current view.
    Snapshot,
    /// Sent after an accepted move or a claimed seat.
    Updated,
}

impl GameEventKind {
    /// Value of the SSE `event:` field.
    pub fn name(self) -> &'static str {
        match self {
            GameEventKind::Snapshot => "game.snapshot",
            GameEventKind::Updated => "game.updated",
        }
    }
}

/// Serialized game payload tagged with its event name.
#[derive(Clone, Debug)]
pub struct GameEvent {
    /// Event name.
    pub kind: GameEventKind,
    /// JSON-encoded `GameView`.
    pub data: String,
}

impl GameEvent {
    /// Serialize `payload` into the data field.
    pub fn json<T: Serialize>(kind: GameEventKind, payload: &T) -> serde_json::Result<Self> {
        Ok(Self {
            kind,
            data: serde_json::to_string(payload)?,
        })
    }
}
