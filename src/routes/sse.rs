use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{error::AppError, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/game/{id}/events",
    tag = "sse",
    params(("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Snapshot, then one event per accepted move or seat claim", content_type = "text/event-stream", body = String),
        (status = 404, description = "Unknown game")
    )
)]
/// Stream the state of one game: a `game.snapshot` event, then `game.updated` events.
pub async fn game_stream(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let subscription = sse_service::subscribe_game(&state, &id).await?;
    info!(game_id = %subscription.game_id, "new game SSE connection");
    Ok(sse_service::to_sse_stream(state, subscription))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/game/{id}/events", get(game_stream))
}
