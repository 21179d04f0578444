//! Island survival game engine: content catalog, progression formulas,
//! inventory capacity, exploration resolution, crafting and the per-player
//! mutation coordinator that commits it all.

pub mod catalog;
pub mod commands;
pub mod coordinator;
pub mod crafting;
pub mod errors;
pub mod exploration;
pub mod inventory;
pub mod progression;
pub mod storage;
pub mod types;

pub use catalog::{canonical_seed, CatalogSeed, ContentCatalog, Tuning};
pub use commands::{describe_error, handle_command, CommandSession, GameCommand};
pub use coordinator::{MutationCoordinator, SeedSource, DEFAULT_MUTATION_TIMEOUT_MS};
pub use errors::GameError;
pub use exploration::{resolve, resolve_area, resolve_with_rng};
pub use inventory::Admission;
pub use progression::{apply_experience, experience_threshold, threshold_table};
pub use storage::{GameStore, GameStoreBuilder, PlayerStore};
pub use types::{
    ActionContext, AreaDefinition, Crafted, CraftingRecipe, Expedition, ExplorationOutcome,
    ExplorationResult, ExploreEvent, InventoryItem, ItemDefinition, ItemDrop, ItemEffect, ItemUse,
    LevelUp, PlayerState, PlayerStatus, Rarity, RecipeMaterial, PLAYER_SCHEMA_VERSION,
};
