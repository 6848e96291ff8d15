use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-game async mutexes serializing writers of the same game inside this process.
#[derive(Default)]
pub struct GameGates {
    gates: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl GameGates {
    /// No gates yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other writer holds the gate of `game_id`.
    pub async fn acquire(&self, game_id: Uuid) -> GateGuard<'_> {
        let gate = self
            .gates
            .entry(game_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = gate.lock_owned().await;

        GateGuard {
            gates: self,
            game_id,
            guard: Some(guard),
        }
    }

    fn prune(&self, game_id: Uuid) {
        // Only the map itself still references an idle gate.
        self.gates
            .remove_if(&game_id, |_, gate| Arc::strong_count(gate) == 1);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.gates.len()
    }
}

/// Held for the duration of a write; the gate is pruned when nobody waits on it.
pub struct GateGuard<'a> {
    gates: &'a GameGates,
    game_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.gates.prune(self.game_id);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn second_writer_waits_for_the_first() {
        let gates = Arc::new(GameGates::new());
        let game = Uuid::new_v4();

        let first = gates.acquire(game).await;
        let contender = {
            let gates = gates.clone();
            tokio::spawn(async move {
                let _guard = gates.acquire(game).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(first);
        contender.await.unwrap();
        assert_eq!(gates.len(), 0);
    }

    #[tokio::test]
    async fn different_games_do_not_block_each_other() {
        let gates = GameGates::new();
        let _a = gates.acquire(Uuid::new_v4()).await;
        let _b = gates.acquire(Uuid::new_v4()).await;
        assert_eq!(gates.len(), 2);
    }
}
