//! # Castaway - island survival text adventure engine
//!
//! Castaway is the progression and exploration engine behind a chat-driven
//! survival game. Players wash up on an island, explore increasingly harsh
//! areas, collect what fits in their pack, level up, and occasionally collapse
//! from exhaustion and lose everything they carried.
//!
//! ## Features
//!
//! - **Content Catalog**: areas, items, encounter text and every tuning number
//!   come from one JSON document, validated once at startup.
//! - **Deterministic Exploration**: outcomes are sampled from a seeded RNG, so a
//!   `(player, seed)` pair always resolves the same way.
//! - **Serialized Mutations**: each player's read-modify-write cycle runs alone;
//!   different players never wait on each other.
//! - **Crafting**: data-driven recipes turn carried materials into tools and
//!   shelters, under the same pack capacity rules.
//! - **Sled Persistence**: player records are bincode values keyed by id.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use castaway::game::{ActionContext, ContentCatalog, GameStore, MutationCoordinator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = Arc::new(ContentCatalog::load_from_json("data/seeds/catalog.json")?);
//!     let store = Arc::new(GameStore::open("data/castaway.db")?);
//!     let coordinator = MutationCoordinator::new(store, catalog);
//!
//!     let ctx = ActionContext::player();
//!     coordinator.create_player("1001", "Kai", &ctx).await?;
//!     let result = coordinator.perform_explore("1001", &ctx).await?;
//!     println!("{}", result.narration);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - catalog, formulas, resolver, crafting, coordinator, storage and commands
//! - [`config`] - TOML configuration
//! - [`logutil`] - single-line log escaping

pub mod config;
pub mod game;
pub mod logutil;
