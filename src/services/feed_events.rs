use tracing::warn;

use crate::{
    dto::{
        game::GameView,
        sse::{GameEvent, GameEventKind},
    },
    state::SharedState,
};

/// First event of every game stream: the full current view.
pub fn snapshot_event(view: &GameView) -> Option<GameEvent> {
    to_event(GameEventKind::Snapshot, view)
}

/// Broadcast the new view of a game after an accepted move or seat claim.
pub fn broadcast_game_updated(state: &SharedState, view: &GameView) {
    if let Some(event) = to_event(GameEventKind::Updated, view) {
        state.feeds().publish(view.id, event);
    }
}

fn to_event(kind: GameEventKind, view: &GameView) -> Option<GameEvent> {
    match GameEvent::json(kind, view) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event = kind.name(), game_id = %view.id, error = %err, "failed to serialize game SSE payload");
            None
        }
    }
}
