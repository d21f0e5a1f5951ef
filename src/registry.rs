//! Process-wide registry of live games.
//!
//! Games sit behind `Arc<Mutex<_>>` so transport handlers can lock one
//! game without serializing the whole registry. Ids are handed out from a
//! rolling counter and skip ids that are still occupied.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::domain::game::{DurakGame, GameId};
use crate::errors::domain::{DomainError, NotFoundKind};

const ID_COUNTER_START: GameId = 3865;
const ID_COUNTER_WRAP: GameId = 10_000;

pub type SharedGame = Arc<Mutex<DurakGame>>;

#[derive(Debug)]
pub struct GameRegistry {
    games: DashMap<GameId, SharedGame>,
    next_id: Mutex<GameId>,
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRegistry {
    pub fn new() -> Self {
        Self {
            games: DashMap::new(),
            next_id: Mutex::new(ID_COUNTER_START),
        }
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Create a game under the next free id and return its handle.
    pub fn create(&self, name: impl Into<String>) -> SharedGame {
        let id = self.allocate_id();
        let game: SharedGame = Arc::new(Mutex::new(DurakGame::new(id, name)));
        self.games.insert(id, Arc::clone(&game));
        info!(game_id = id, total = self.games.len(), "game created");
        game
    }

    pub fn get(&self, id: GameId) -> Result<SharedGame, DomainError> {
        self.games
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Game, format!("no game with id {id}"))
            })
    }

    pub fn remove(&self, id: GameId) -> Result<(), DomainError> {
        self.games.remove(&id).map(|_| ()).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Game, format!("no game with id {id}"))
        })
    }

    pub fn ids(&self) -> Vec<GameId> {
        self.games.iter().map(|entry| *entry.key()).collect()
    }

    /// Drop every game idle for longer than `max_age`. The caller owns the
    /// schedule; this only does one sweep. Returns the number evicted.
    pub fn collect_garbage(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let before = self.games.len();
        self.games.retain(|id, game| {
            let idle = now.duration_since(game.lock().last_activity());
            let keep = idle <= max_age;
            if !keep {
                debug!(game_id = *id, idle_secs = idle.as_secs(), "evicting idle game");
            }
            keep
        });
        let evicted = before - self.games.len();
        if evicted > 0 {
            info!(evicted, remaining = self.games.len(), "idle games evicted");
        }
        evicted
    }

    /// Counter wraps below [`ID_COUNTER_WRAP`] and steps over ids still in
    /// use, so a long-lived game never gets its id reissued.
    fn allocate_id(&self) -> GameId {
        let mut next = self.next_id.lock();
        loop {
            let id = *next;
            *next = (*next + 1) % ID_COUNTER_WRAP;
            if !self.games.contains_key(&id) {
                return id;
            }
        }
    }
}
