//! Shared fixtures for integration tests: sled-backed coordinators and store
//! wrappers that record, slow down, or fail store calls.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use castaway::game::{
    ContentCatalog, GameError, GameStore, GameStoreBuilder, MutationCoordinator, PlayerState,
    PlayerStore,
};

/// Path to the catalog shipped in the repository.
#[allow(dead_code)]
pub fn shipped_catalog_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("seeds")
        .join("catalog.json")
}

#[allow(dead_code)]
pub fn canonical() -> Arc<ContentCatalog> {
    Arc::new(ContentCatalog::canonical().expect("canonical catalog"))
}

#[allow(dead_code)]
pub fn open_store(dir: &Path) -> GameStore {
    GameStoreBuilder::new(dir).open().expect("store")
}

/// Seeds 1, 2, 3, ... so runs are reproducible.
#[allow(dead_code)]
pub fn counting_seeds() -> castaway::game::SeedSource {
    let next = Arc::new(AtomicU64::new(1));
    Arc::new(move || next.fetch_add(1, Ordering::SeqCst))
}

#[allow(dead_code)]
pub fn sled_coordinator(dir: &Path) -> MutationCoordinator<GameStore> {
    MutationCoordinator::new(Arc::new(open_store(dir)), canonical())
        .with_seed_source(counting_seeds())
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Get { id: String, stamina: Option<u32> },
    Put { id: String, stamina: u32 },
}

/// Records every get/put in order. `get` sleeps for `read_delay` after reading
/// to widen the window in which overlapping mutations would interleave.
#[allow(dead_code)]
pub struct RecordingStore<S: PlayerStore> {
    pub inner: S,
    pub read_delay: Duration,
    pub events: Mutex<Vec<StoreEvent>>,
}

#[allow(dead_code)]
impl<S: PlayerStore> RecordingStore<S> {
    pub fn new(inner: S, read_delay: Duration) -> Self {
        Self {
            inner,
            read_delay,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.events.lock().expect("events").clone()
    }

    pub fn clear(&self) {
        self.events.lock().expect("events").clear();
    }
}

impl<S: PlayerStore> PlayerStore for RecordingStore<S> {
    fn get_player(&self, player_id: &str) -> Result<Option<PlayerState>, GameError> {
        let player = self.inner.get_player(player_id)?;
        self.events.lock().expect("events").push(StoreEvent::Get {
            id: player_id.to_string(),
            stamina: player.as_ref().map(|p| p.stamina),
        });
        std::thread::sleep(self.read_delay);
        Ok(player)
    }

    fn put_player(&self, player: &PlayerState) -> Result<(), GameError> {
        self.inner.put_player(player)?;
        self.events.lock().expect("events").push(StoreEvent::Put {
            id: player.id.clone(),
            stamina: player.stamina,
        });
        Ok(())
    }

    fn delete_player(&self, player_id: &str) -> Result<bool, GameError> {
        self.inner.delete_player(player_id)
    }

    fn list_player_ids(&self) -> Result<Vec<String>, GameError> {
        self.inner.list_player_ids()
    }
}

/// Reads work; writes fail while `fail_writes` is set.
#[allow(dead_code)]
pub struct FlakyStore<S: PlayerStore> {
    pub inner: S,
    pub fail_writes: std::sync::atomic::AtomicBool,
}

#[allow(dead_code)]
impl<S: PlayerStore> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_writes: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }
}

impl<S: PlayerStore> PlayerStore for FlakyStore<S> {
    fn get_player(&self, player_id: &str) -> Result<Option<PlayerState>, GameError> {
        self.inner.get_player(player_id)
    }

    fn put_player(&self, player: &PlayerState) -> Result<(), GameError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GameError::Persistence("disk unavailable".to_string()));
        }
        self.inner.put_player(player)
    }

    fn delete_player(&self, player_id: &str) -> Result<bool, GameError> {
        self.inner.delete_player(player_id)
    }

    fn list_player_ids(&self) -> Result<Vec<String>, GameError> {
        self.inner.list_player_ids()
    }
}
