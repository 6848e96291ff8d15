/// Process-local store.
pub mod memory;
/// Store backed by a PostgREST endpoint.
#[cfg(feature = "rest-store")]
pub mod postgrest;

use std::{sync::Arc, time::SystemTime};

use crate::dao::models::{GameEntity, MoveWrite, Seat};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Read-only access to game records, safe to back with a public credential.
pub trait GameReader: Send + Sync {
    /// Fetch one record; `Ok(None)` when no game has this id.
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Privileged access to game records.
///
/// Both mutating operations are conditional: they return `Ok(None)` when the
/// guard no longer holds (the record changed since it was read, or it does
/// not exist) and the caller decides whether to re-read and retry.
pub trait GameStore: GameReader {
    /// Insert a record with every field at its default.
    fn insert_game(&self) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// Replace `pgn`, `status`, `result` and `updated_at`, provided the stored
    /// notation still equals `expected_pgn` and the game is not complete.
    fn apply_move(
        &self,
        id: Uuid,
        expected_pgn: String,
        write: MoveWrite,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Write `player_id` into `seat`, provided the seat is still empty and the
    /// player does not already hold the other seat.
    fn claim_seat(
        &self,
        id: Uuid,
        seat: Seat,
        player_id: String,
        at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Storage handles injected into the services, one per credential scope.
#[derive(Clone)]
pub struct StorageHandles {
    /// Row-level-security constrained reader for client-facing reads.
    pub public: Arc<dyn GameReader>,
    /// Service-role store used for every write and every read inside a write.
    pub privileged: Arc<dyn GameStore>,
}

impl StorageHandles {
    /// Use a single backend for both scopes (local and test setups).
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: GameStore + 'static,
    {
        Self {
            public: store.clone(),
            privileged: store,
        }
    }
}
