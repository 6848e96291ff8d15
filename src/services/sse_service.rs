use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::{game::GameView, sse::GameEvent},
    error::ServiceError,
    services::{
        feed_events,
        game_service::{not_found, parse_game_id},
    },
    state::SharedState,
};

/// A live subscription to one game feed, primed with the current snapshot.
pub struct GameSubscription {
    /// Game being watched.
    pub game_id: Uuid,
    /// View at subscription time.
    pub snapshot: Option<GameEvent>,
    /// Later updates.
    pub receiver: broadcast::Receiver<GameEvent>,
}

/// Subscribe to the feed of a game and read its current state.
///
/// The subscription is taken before the read so no update slips between the
/// snapshot and the first live event.
pub async fn subscribe_game(
    state: &SharedState,
    raw_id: &str,
) -> Result<GameSubscription, ServiceError> {
    let game_id = parse_game_id(raw_id)?;
    let reader = state.require_public().await?;
    let receiver = state.feeds().subscribe(game_id);

    let view = match reader.find_game(game_id).await {
        Ok(Some(game)) => GameView::try_from(game).map_err(ServiceError::from),
        Ok(None) => Err(not_found(game_id)),
        Err(err) => Err(err.into()),
    };
    let view = match view {
        Ok(view) => view,
        Err(err) => {
            drop(receiver);
            state.feeds().release(game_id);
            return Err(err);
        }
    };

    Ok(GameSubscription {
        game_id,
        snapshot: feed_events::snapshot_event(&view),
        receiver,
    })
}

/// Convert a game subscription into an SSE response, forwarding events and
/// releasing the feed once the client disconnects.
pub fn to_sse_stream(
    state: SharedState,
    subscription: GameSubscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let GameSubscription {
        game_id,
        snapshot,
        mut receiver,
    } = subscription;

    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        let primed = match snapshot {
            Some(payload) => tx.send(Ok(to_event(payload))).await.is_ok(),
            None => true,
        };

        while primed && !tx.is_closed() {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Every update is a full snapshot; the next one supersedes the missed ones.
                            info!(game_id = %game_id, skipped, "game SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        drop(receiver);
        state.feeds().release(game_id);
        info!(game_id = %game_id, "game SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: GameEvent) -> Event {
    Event::default().event(payload.kind.name()).data(payload.data)
}
