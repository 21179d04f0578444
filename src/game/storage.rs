use std::path::{Path, PathBuf};

use sled::IVec;

use crate::game::errors::GameError;
use crate::game::types::{PlayerState, PLAYER_SCHEMA_VERSION};

const TREE_PLAYERS: &str = "castaway_players";

/// Keyed player persistence. A `put` must replace the whole record in one
/// write so that a failed mutation leaves the previous record intact.
pub trait PlayerStore: Send + Sync {
    fn get_player(&self, player_id: &str) -> Result<Option<PlayerState>, GameError>;

    fn put_player(&self, player: &PlayerState) -> Result<(), GameError>;

    /// Returns whether a record was removed.
    fn delete_player(&self, player_id: &str) -> Result<bool, GameError>;

    fn list_player_ids(&self) -> Result<Vec<String>, GameError>;
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct GameStoreBuilder {
    path: PathBuf,
    flush_every_write: bool,
}

impl GameStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flush_every_write: true,
        }
    }

    /// Skip the fsync after each write (useful for bulk tests).
    pub fn without_flush(mut self) -> Self {
        self.flush_every_write = false;
        self
    }

    pub fn open(self) -> Result<GameStore, GameError> {
        GameStore::open_with_options(self.path, self.flush_every_write)
    }
}

/// Sled-backed persistence for player state.
pub struct GameStore {
    _db: sled::Db,
    players: sled::Tree,
    flush_every_write: bool,
}

impl GameStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        Self::open_with_options(path, true)
    }

    fn open_with_options<P: AsRef<Path>>(
        path: P,
        flush_every_write: bool,
    ) -> Result<Self, GameError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let players = db.open_tree(TREE_PLAYERS)?;
        Ok(Self {
            _db: db,
            players,
            flush_every_write,
        })
    }

    fn player_key(player_id: &str) -> Vec<u8> {
        format!("players:{}", player_id).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, GameError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }
}

impl PlayerStore for GameStore {
    fn get_player(&self, player_id: &str) -> Result<Option<PlayerState>, GameError> {
        let key = Self::player_key(player_id);
        let Some(bytes) = self.players.get(&key)? else {
            return Ok(None);
        };
        let record: PlayerState = Self::deserialize(bytes)?;
        if record.schema_version != PLAYER_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(Some(record))
    }

    fn put_player(&self, player: &PlayerState) -> Result<(), GameError> {
        let mut record = player.clone();
        record.schema_version = PLAYER_SCHEMA_VERSION;
        let bytes = Self::serialize(&record)?;
        self.players.insert(Self::player_key(&record.id), bytes)?;
        if self.flush_every_write {
            self.players.flush()?;
        }
        Ok(())
    }

    fn delete_player(&self, player_id: &str) -> Result<bool, GameError> {
        let removed = self.players.remove(Self::player_key(player_id))?;
        if self.flush_every_write {
            self.players.flush()?;
        }
        Ok(removed.is_some())
    }

    fn list_player_ids(&self) -> Result<Vec<String>, GameError> {
        let mut ids = Vec::new();
        for entry in self.players.scan_prefix(b"players:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(id) = text.strip_prefix("players:") {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::ContentCatalog;
    use tempfile::TempDir;

    fn player(id: &str) -> PlayerState {
        ContentCatalog::canonical()
            .expect("catalog")
            .new_player(id, "Tester")
    }

    #[test]
    fn store_round_trip_player() {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStoreBuilder::new(dir.path()).open().expect("store");
        let mut record = player("1001");
        record.experience = 42;
        record.exploration_progress = 7;
        store.put_player(&record).expect("put");
        let fetched = store.get_player("1001").expect("get").expect("present");
        assert_eq!(fetched, record);
        assert_eq!(fetched.schema_version, PLAYER_SCHEMA_VERSION);
    }

    #[test]
    fn missing_player_is_none() {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStoreBuilder::new(dir.path()).open().expect("store");
        assert!(store.get_player("ghost").expect("get").is_none());
    }

    #[test]
    fn records_survive_reopen() {
        let dir = TempDir::new().expect("tempdir");
        {
            let store = GameStoreBuilder::new(dir.path()).open().expect("store");
            store.put_player(&player("a")).expect("put");
            store.put_player(&player("b")).expect("put");
        }
        let store = GameStore::open(dir.path()).expect("reopen");
        let mut ids = store.list_player_ids().expect("list");
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn stale_schema_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStoreBuilder::new(dir.path()).open().expect("store");
        let mut record = player("old");
        record.schema_version = 0;
        let bytes = bincode::serialize(&record).expect("encode");
        store
            .players
            .insert(GameStore::player_key("old"), bytes)
            .expect("raw insert");
        assert!(matches!(
            store.get_player("old"),
            Err(GameError::SchemaMismatch { found: 0, .. })
        ));
    }

    #[test]
    fn delete_reports_presence() {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStoreBuilder::new(dir.path())
            .without_flush()
            .open()
            .expect("store");
        store.put_player(&player("gone")).expect("put");
        assert!(store.delete_player("gone").expect("delete"));
        assert!(!store.delete_player("gone").expect("delete again"));
        assert!(store.get_player("gone").expect("get").is_none());
    }
}
