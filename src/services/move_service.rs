use std::time::SystemTime;

use tracing::{info, warn};

use crate::{
    dao::models::{GameEntity, GameStatus, MoveWrite},
    dto::game::{GameView, MoveRequest, MoveResponse},
    error::ServiceError,
    rules::{ChessGame, MoveInput},
    services::{
        feed_events,
        game_service::{not_found, parse_game_id},
    },
    state::{
        SharedState,
        session::{advance, authorize_move},
    },
};

/// Validate and apply one move, then publish the new state of the game.
///
/// Writers of the same game are serialized by the per-game gate; the
/// conditional write keyed on the previous notation covers writers in other
/// processes. A lost write is re-validated against the fresh record, at most
/// `move_retry_limit` times.
pub async fn make_move(
    state: &SharedState,
    request: MoveRequest,
) -> Result<MoveResponse, ServiceError> {
    let id = parse_game_id(&request.game_id)?;
    let input = request.move_input();
    let player = request.player_id.as_deref();
    let store = state.require_privileged().await?;
    let limit = state.config().move_retry_limit;

    let _gate = state.gates().acquire(id).await;

    for attempt in 0..=limit {
        let game = store.find_game(id).await?.ok_or_else(|| not_found(id))?;
        let (write, position) = plan_move(&game, &input, player, SystemTime::now())?;

        match store.apply_move(id, game.pgn, write).await? {
            Some(updated) => {
                info!(
                    game_id = %id,
                    from = %input.from,
                    to = %input.to,
                    status = ?updated.status,
                    "move accepted"
                );
                let pgn = updated.pgn.clone();
                feed_events::broadcast_game_updated(state, &GameView::project(updated, &position));
                return Ok(MoveResponse { success: true, pgn });
            }
            None => warn!(game_id = %id, attempt, "game changed during move; re-validating"),
        }
    }

    Err(ServiceError::Conflict(format!(
        "game `{id}` kept changing; move not applied"
    )))
}

/// Decide the write for `input` against `game` without touching storage.
///
/// Returns the fields to persist and the position after the move.
pub fn plan_move(
    game: &GameEntity,
    input: &MoveInput,
    player: Option<&str>,
    at: SystemTime,
) -> Result<(MoveWrite, ChessGame), ServiceError> {
    if game.status == GameStatus::Complete {
        return Err(ServiceError::GameOver);
    }

    let mut position = ChessGame::from_pgn(&game.pgn)?;
    authorize_move(
        game.player_white.as_deref(),
        game.player_black.as_deref(),
        player,
        position.side_to_move(),
    )?;
    position.play(input)?;
    let transition = advance(game.status, position.outcome())?;

    let write = MoveWrite {
        pgn: position.to_pgn(),
        status: transition.status,
        result: transition.result,
        updated_at: at,
    };
    Ok((write, position))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    use futures::future::BoxFuture;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::{GameReader, GameStore, StorageHandles, memory::MemoryGameStore},
            models::{GameResult, Seat},
            storage::StorageResult,
        },
        state::AppState,
    };

    const WHITE: &str = "white-player";
    const BLACK: &str = "black-player";

    fn seated_game() -> GameEntity {
        let mut game = GameEntity::new();
        game.player_white = Some(WHITE.into());
        game.player_black = Some(BLACK.into());
        game
    }

    fn request(game_id: Uuid, from: &str, to: &str, player: &str) -> MoveRequest {
        MoveRequest {
            game_id: game_id.to_string(),
            from: from.into(),
            to: to.into(),
            promotion: None,
            player_id: Some(player.into()),
        }
    }

    async fn state_for(store: Arc<MemoryGameStore>) -> SharedState {
        AppState::with_storage(AppConfig::default(), StorageHandles::shared(store)).await
    }

    #[tokio::test]
    async fn first_move_activates_the_game() {
        let store = Arc::new(MemoryGameStore::new());
        let game = seated_game();
        store.insert(game.clone());
        let state = state_for(store.clone()).await;

        let response = make_move(&state, request(game.id, "e2", "e4", WHITE))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.pgn, "1. e4");
        let stored = store.get(game.id).unwrap();
        assert_eq!(stored.status, GameStatus::Active);
        assert_eq!(stored.result, None);

        let position = ChessGame::from_pgn(&stored.pgn).unwrap();
        assert_eq!(Seat::from(position.side_to_move()), Seat::Black);
    }

    #[tokio::test]
    async fn illegal_moves_leave_the_record_unchanged() {
        let store = Arc::new(MemoryGameStore::new());
        let game = seated_game();
        store.insert(game.clone());
        let state = state_for(store.clone()).await;

        let err = make_move(&state, request(game.id, "e2", "e5", WHITE))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::IllegalMove(_)));
        assert_eq!(store.get(game.id), Some(game));
    }

    #[tokio::test]
    async fn fools_mate_completes_the_game() {
        let store = Arc::new(MemoryGameStore::new());
        let game = seated_game();
        store.insert(game.clone());
        let state = state_for(store.clone()).await;

        for (from, to, player) in [
            ("f2", "f3", WHITE),
            ("e7", "e5", BLACK),
            ("g2", "g4", WHITE),
            ("d8", "h4", BLACK),
        ] {
            make_move(&state, request(game.id, from, to, player))
                .await
                .unwrap();
        }

        let stored = store.get(game.id).unwrap();
        assert_eq!(stored.pgn, "1. f3 e5 2. g4 Qh4#");
        assert_eq!(stored.status, GameStatus::Complete);
        assert_eq!(stored.result, Some(GameResult::BlackWins));

        let err = make_move(&state, request(game.id, "a2", "a3", WHITE))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::GameOver));
        assert_eq!(store.get(game.id), Some(stored));
    }

    #[tokio::test]
    async fn wrong_seat_and_spectators_are_rejected() {
        let store = Arc::new(MemoryGameStore::new());
        let game = seated_game();
        store.insert(game.clone());
        let state = state_for(store.clone()).await;

        for player in [BLACK, "spectator"] {
            let err = make_move(&state, request(game.id, "e2", "e4", player))
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Unauthorized(_)));
        }

        let mut anonymous = request(game.id, "e2", "e4", WHITE);
        anonymous.player_id = None;
        let err = make_move(&state, anonymous).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        assert_eq!(store.get(game.id), Some(game));
    }

    #[tokio::test]
    async fn unknown_games_are_not_found() {
        let store = Arc::new(MemoryGameStore::new());
        let state = state_for(store).await;

        let err = make_move(&state, request(Uuid::new_v4(), "e2", "e4", WHITE))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_conflicting_moves_accept_exactly_one() {
        let store = Arc::new(MemoryGameStore::new());
        let game = seated_game();
        store.insert(game.clone());
        let state = state_for(store.clone()).await;

        let (a, b) = tokio::join!(
            make_move(&state, request(game.id, "e2", "e4", WHITE)),
            make_move(&state, request(game.id, "d2", "d4", WHITE)),
        );

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let stored = store.get(game.id).unwrap();
        assert!(stored.pgn == "1. e4" || stored.pgn == "1. d4");
    }

    /// Store that lets another writer slip in right before the first conditional write.
    struct RacingStore {
        inner: MemoryGameStore,
        raced: AtomicBool,
    }

    impl GameReader for RacingStore {
        fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            self.inner.find_game(id)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }
    }

    impl GameStore for RacingStore {
        fn insert_game(&self) -> BoxFuture<'static, StorageResult<GameEntity>> {
            self.inner.insert_game()
        }

        fn apply_move(
            &self,
            id: Uuid,
            expected_pgn: String,
            write: MoveWrite,
        ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                if let Some(game) = self.inner.get(id) {
                    self.inner.insert(GameEntity {
                        pgn: "1. d4".into(),
                        status: GameStatus::Active,
                        ..game
                    });
                }
            }
            self.inner.apply_move(id, expected_pgn, write)
        }

        fn claim_seat(
            &self,
            id: Uuid,
            seat: Seat,
            player_id: String,
            at: SystemTime,
        ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            self.inner.claim_seat(id, seat, player_id, at)
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }

    #[tokio::test]
    async fn lost_write_is_revalidated_against_the_new_state() {
        let inner = MemoryGameStore::new();
        let game = seated_game();
        inner.insert(game.clone());
        let store = Arc::new(RacingStore {
            inner: inner.clone(),
            raced: AtomicBool::new(false),
        });
        let state = AppState::with_storage(AppConfig::default(), StorageHandles::shared(store)).await;

        // After the foreign write it is Black's turn, so White's retry is refused.
        let err = make_move(&state, request(game.id, "e2", "e4", WHITE))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Unauthorized(_)));
        assert_eq!(inner.get(game.id).unwrap().pgn, "1. d4");
    }

    #[test]
    fn plan_move_defaults_promotion_to_queen() {
        let mut game = seated_game();
        game.pgn = "[FEN \"8/P7/8/8/8/8/8/k6K w - - 0 1\"]\n\n*".into();
        game.status = GameStatus::Active;
        let input = MoveInput {
            from: "a7".into(),
            to: "a8".into(),
            promotion: None,
        };

        let (write, position) =
            plan_move(&game, &input, Some(WHITE), SystemTime::UNIX_EPOCH).unwrap();

        assert!(write.pgn.ends_with("1. a8=Q+"));
        assert_eq!(write.status, GameStatus::Active);
        assert!(position.fen().starts_with("Q7/8/8/8/8/8/8/k6K b"));
    }
}
