use thiserror::Error;

use crate::game::types::RecipeMaterial;

/// Errors that can arise while loading content or mutating player state.
#[derive(Debug, Error)]
pub enum GameError {
    /// Content catalog is missing a required tuning constant or is malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Mutation requested for a player with no stored state.
    #[error("player not found: {0}")]
    PlayerNotFound(String),

    /// Onboarding requested for a player that already has state.
    #[error("player already exists: {0}")]
    PlayerExists(String),

    /// Inventory operation on an item the player is not carrying.
    #[error("item not in inventory: {0}")]
    ItemNotFound(String),

    /// Crafting requested for a recipe the catalog does not define.
    #[error("unknown recipe: {0}")]
    UnknownRecipe(String),

    /// The player lacks some of a recipe's materials.
    #[error("missing materials for {recipe}")]
    MissingMaterials {
        recipe: String,
        missing: Vec<RecipeMaterial>,
    },

    /// The product of an action does not fit in the pack.
    #[error("no room for {item}: needs {needed}, {remaining} left")]
    NoSpace {
        item: String,
        needed: u32,
        remaining: i64,
    },

    /// The per-player mutation slot could not be acquired in time.
    #[error("concurrent action in progress for player {0}")]
    ConcurrencyConflict(String),

    /// Actions are paused for everyone except operators.
    #[error("maintenance mode is active")]
    Maintenance,

    /// Generic store failure reported by a `PlayerStore` implementation.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, seed files).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },
}

impl GameError {
    /// True for failures of the backing store. Nothing was written when one of
    /// these is returned from a mutation, so the player may simply retry.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            GameError::Persistence(_)
                | GameError::Sled(_)
                | GameError::Bincode(_)
                | GameError::Io(_)
                | GameError::SchemaMismatch { .. }
        )
    }

    /// True when retrying the same action later may succeed.
    pub fn is_transient(&self) -> bool {
        self.is_persistence_failure()
            || matches!(self, GameError::ConcurrencyConflict(_) | GameError::Maintenance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_store_failures() {
        assert!(GameError::Persistence("disk full".into()).is_persistence_failure());
        assert!(GameError::SchemaMismatch {
            entity: "player",
            expected: 2,
            found: 1
        }
        .is_persistence_failure());
        assert!(!GameError::PlayerNotFound("42".into()).is_persistence_failure());
    }

    #[test]
    fn conflicts_are_transient_but_config_is_not() {
        assert!(GameError::ConcurrencyConflict("42".into()).is_transient());
        assert!(!GameError::Configuration("missing base_xp".into()).is_transient());
    }
}
