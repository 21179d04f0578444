//! Mutation coordinator.
//!
//! Owns the read-modify-write cycle for every player action. Each cycle runs
//! while holding that player's slot, so two actions for the same id never
//! interleave; actions for different ids share nothing but the map of slots.
//! A cycle either ends in one `put_player` or writes nothing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::{Mutex as SlotMutex, OwnedMutexGuard};

use crate::game::catalog::ContentCatalog;
use crate::game::crafting;
use crate::game::errors::GameError;
use crate::game::exploration;
use crate::game::inventory::{self, Admission};
use crate::game::progression;
use crate::game::storage::PlayerStore;
use crate::game::types::{
    ActionContext, Crafted, ExplorationOutcome, ExplorationResult, ExploreEvent, ItemDrop,
    ItemUse, PlayerState, PlayerStatus,
};
use crate::logutil::escape_log;

pub const DEFAULT_MUTATION_TIMEOUT_MS: u64 = 5_000;

/// Supplies the seed for each exploration roll.
pub type SeedSource = Arc<dyn Fn() -> u64 + Send + Sync>;

type SlotMap = Mutex<HashMap<String, Arc<SlotMutex<()>>>>;

/// What a mutation closure wants done with the modified state.
enum Mutation<T> {
    Commit(T),
    Discard(T),
}

/// Held for the duration of one player's mutation. Dropping it releases the
/// slot and forgets the map entry once nobody else is waiting on it.
struct PlayerSlot<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    player_id: String,
    slots: &'a SlotMap,
}

impl Drop for PlayerSlot<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut slots = match self.slots.lock() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        };
        let idle = slots
            .get(&self.player_id)
            .map(|slot| Arc::strong_count(slot) == 1)
            .unwrap_or(false);
        if idle {
            slots.remove(&self.player_id);
        }
    }
}

pub struct MutationCoordinator<S: PlayerStore> {
    store: Arc<S>,
    catalog: Arc<ContentCatalog>,
    slots: SlotMap,
    seeds: SeedSource,
    mutation_timeout: Duration,
}

impl<S: PlayerStore> MutationCoordinator<S> {
    pub fn new(store: Arc<S>, catalog: Arc<ContentCatalog>) -> Self {
        Self {
            store,
            catalog,
            slots: Mutex::new(HashMap::new()),
            seeds: Arc::new(rand::random::<u64>),
            mutation_timeout: Duration::from_millis(DEFAULT_MUTATION_TIMEOUT_MS),
        }
    }

    /// Replace the random seed source (tests inject fixed sequences here).
    pub fn with_seed_source(mut self, seeds: SeedSource) -> Self {
        self.seeds = seeds;
        self
    }

    /// How long an action waits for the player's slot before giving up with
    /// `ConcurrencyConflict`.
    pub fn with_mutation_timeout(mut self, timeout: Duration) -> Self {
        self.mutation_timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve one exploration attempt and commit it.
    pub async fn perform_explore(
        &self,
        player_id: &str,
        ctx: &ActionContext,
    ) -> Result<ExplorationResult, GameError> {
        let catalog = Arc::clone(&self.catalog);
        let seed = Arc::clone(&self.seeds);
        self.mutate(player_id, ctx, "explore", move |state| {
            let outcome = exploration::resolve(state, &catalog, (*seed)());
            Ok(apply_outcome(state, outcome, &catalog))
        })
        .await
    }

    /// Onboarding: Uninitialized -> Active.
    pub async fn create_player(
        &self,
        player_id: &str,
        name: &str,
        ctx: &ActionContext,
    ) -> Result<PlayerState, GameError> {
        self.check_gate(player_id, ctx, "create")?;
        let _slot = self.acquire(player_id).await?;
        if self.load(player_id)?.is_some() {
            return Err(GameError::PlayerExists(player_id.to_string()));
        }
        let state = self.catalog.new_player(player_id, name);
        self.persist(&state)?;
        info!(
            "created player {} ({})",
            escape_log(player_id),
            escape_log(name)
        );
        Ok(state)
    }

    /// Reset an existing player to a fresh level-1 castaway, keeping id and name.
    pub async fn restart_adventure(
        &self,
        player_id: &str,
        ctx: &ActionContext,
    ) -> Result<PlayerState, GameError> {
        let catalog = Arc::clone(&self.catalog);
        self.mutate(player_id, ctx, "restart", move |state| {
            let mut fresh = catalog.new_player(&state.id, &state.name);
            fresh.created_at = state.created_at;
            *state = fresh;
            info!("player {} restarted their adventure", escape_log(&state.id));
            Ok(Mutation::Commit(state.clone()))
        })
        .await
    }

    /// Consume the earliest carried item with this name, applying its effect.
    pub async fn use_item(
        &self,
        player_id: &str,
        item_name: &str,
        ctx: &ActionContext,
    ) -> Result<ItemUse, GameError> {
        let catalog = Arc::clone(&self.catalog);
        let item_name = item_name.to_string();
        self.mutate(player_id, ctx, "use", move |state| {
            let item = inventory::remove_item(state, &item_name)
                .ok_or_else(|| GameError::ItemNotFound(item_name.clone()))?;
            let effect = catalog
                .item(&item.name)
                .and_then(|definition| definition.effect)
                .unwrap_or_default();
            let health_restored = state.restore_health(effect.restore_health);
            let stamina_restored = state.restore_stamina(effect.restore_stamina);
            state.touch();
            debug!(
                "player {} used {}: +{} health, +{} stamina",
                escape_log(&state.id),
                escape_log(&item.name),
                health_restored,
                stamina_restored
            );
            Ok(Mutation::Commit(ItemUse {
                item: item.name,
                health_restored,
                stamina_restored,
                player: state.clone(),
            }))
        })
        .await
    }

    /// Discard the earliest carried item with this name to free its space.
    pub async fn drop_item(
        &self,
        player_id: &str,
        item_name: &str,
        ctx: &ActionContext,
    ) -> Result<ItemDrop, GameError> {
        let item_name = item_name.to_string();
        self.mutate(player_id, ctx, "drop", move |state| {
            let item = inventory::remove_item(state, &item_name)
                .ok_or_else(|| GameError::ItemNotFound(item_name.clone()))?;
            state.touch();
            debug!(
                "player {} dropped {}",
                escape_log(&state.id),
                escape_log(&item.name)
            );
            Ok(Mutation::Commit(ItemDrop {
                item: item.name,
                player: state.clone(),
            }))
        })
        .await
    }

    /// Consume a recipe's materials and add its product to the pack.
    pub async fn craft(
        &self,
        player_id: &str,
        recipe: &str,
        ctx: &ActionContext,
    ) -> Result<Crafted, GameError> {
        let catalog = Arc::clone(&self.catalog);
        let key = recipe.to_string();
        self.mutate(player_id, ctx, "craft", move |state| {
            let recipe = catalog
                .recipe(&key)
                .ok_or_else(|| GameError::UnknownRecipe(key.clone()))?;
            let product = crafting::craft(state, recipe, &catalog)?;
            state.touch();
            info!(
                "player {} crafted {}",
                escape_log(&state.id),
                escape_log(&product)
            );
            Ok(Mutation::Commit(Crafted {
                recipe: recipe.name.clone(),
                product,
                consumed: recipe.materials.clone(),
                player: state.clone(),
            }))
        })
        .await
    }

    /// Remove a player's record entirely. Returns whether one existed.
    pub async fn delete_player(
        &self,
        player_id: &str,
        ctx: &ActionContext,
    ) -> Result<bool, GameError> {
        self.check_gate(player_id, ctx, "delete")?;
        let _slot = self.acquire(player_id).await?;
        let removed = self.store.delete_player(player_id).map_err(|e| {
            error!("failed to delete player {}: {}", escape_log(player_id), e);
            e
        })?;
        if removed {
            info!("deleted player {}", escape_log(player_id));
        }
        Ok(removed)
    }

    /// Read-only snapshot with derived capacity and progression figures.
    pub fn player_status(&self, player_id: &str) -> Result<PlayerStatus, GameError> {
        let player = self
            .load(player_id)?
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;
        let catalog = &self.catalog;
        let capacity = inventory::capacity(player.level, &player.location, catalog);
        let used_space = inventory::used_space(&player.inventory, catalog);
        let next_threshold =
            progression::experience_threshold(player.level, &catalog.tuning.progression);
        Ok(PlayerStatus {
            capacity,
            used_space,
            remaining_space: capacity - used_space,
            next_threshold,
            at_level_cap: player.level >= catalog.tuning.progression.level_cap,
            player,
        })
    }

    pub fn list_players(&self) -> Result<Vec<String>, GameError> {
        self.store.list_player_ids()
    }

    /// Serialized read-modify-write. The closure sees the stored state; a
    /// `Commit` result is written back in one put, anything else writes nothing.
    async fn mutate<T, F>(
        &self,
        player_id: &str,
        ctx: &ActionContext,
        action: &str,
        f: F,
    ) -> Result<T, GameError>
    where
        F: FnOnce(&mut PlayerState) -> Result<Mutation<T>, GameError>,
    {
        self.check_gate(player_id, ctx, action)?;
        let _slot = self.acquire(player_id).await?;

        let mut state = self
            .load(player_id)?
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;

        match f(&mut state)? {
            Mutation::Commit(result) => {
                self.persist(&state)?;
                Ok(result)
            }
            Mutation::Discard(result) => Ok(result),
        }
    }

    fn check_gate(
        &self,
        player_id: &str,
        ctx: &ActionContext,
        action: &str,
    ) -> Result<(), GameError> {
        if ctx.is_blocked() {
            warn!(
                "rejected {} for player {}: maintenance mode",
                action,
                escape_log(player_id)
            );
            return Err(GameError::Maintenance);
        }
        Ok(())
    }

    async fn acquire(&self, player_id: &str) -> Result<PlayerSlot<'_>, GameError> {
        let slot = {
            let mut slots = match self.slots.lock() {
                Ok(slots) => slots,
                Err(poisoned) => poisoned.into_inner(),
            };
            Arc::clone(
                slots
                    .entry(player_id.to_string())
                    .or_insert_with(|| Arc::new(SlotMutex::new(()))),
            )
        };

        // Build the slot before awaiting so a timed-out waiter still prunes.
        let mut held = PlayerSlot {
            guard: None,
            player_id: player_id.to_string(),
            slots: &self.slots,
        };
        match tokio::time::timeout(self.mutation_timeout, slot.lock_owned()).await {
            Ok(guard) => {
                held.guard = Some(guard);
                Ok(held)
            }
            Err(_) => {
                warn!(
                    "player {} still busy after {:?}",
                    escape_log(player_id),
                    self.mutation_timeout
                );
                Err(GameError::ConcurrencyConflict(player_id.to_string()))
            }
        }
    }

    fn load(&self, player_id: &str) -> Result<Option<PlayerState>, GameError> {
        self.store.get_player(player_id).map_err(|e| {
            error!("failed to load player {}: {}", escape_log(player_id), e);
            e
        })
    }

    fn persist(&self, state: &PlayerState) -> Result<(), GameError> {
        self.store.put_player(state).map_err(|e| {
            error!("failed to save player {}: {}", escape_log(&state.id), e);
            e
        })
    }
}

/// Commit order: move and pick up, pay the costs, then either die (losing the
/// pack) or bank the experience. Death skips the experience entirely.
fn apply_outcome(
    state: &mut PlayerState,
    outcome: ExplorationOutcome,
    catalog: &ContentCatalog,
) -> Mutation<ExplorationResult> {
    let expedition = match outcome {
        ExplorationOutcome::InventoryFull { area, narration } => {
            debug!("player {} has a full pack", escape_log(&state.id));
            return Mutation::Discard(ExplorationResult {
                player: state.clone(),
                narration,
                area,
                stamina_spent: 0,
                health_lost: 0,
                event: ExploreEvent::InventoryFull,
            });
        }
        ExplorationOutcome::Explored(expedition) => expedition,
    };

    state.location = expedition.area.clone();
    let mut collected = Vec::with_capacity(expedition.items_offered.len());
    for item in expedition.items_offered {
        match inventory::add_item(state, &item, catalog) {
            Admission::Fits { .. } => collected.push(item),
            Admission::NoSpace { needed, remaining } => {
                debug!(
                    "skipping {}: needs {} with {} left",
                    item.name, needed, remaining
                );
                break;
            }
        }
    }

    let health_before = state.health;
    state.spend_stamina(expedition.stamina_cost);
    state.take_damage(expedition.forced_health_loss);
    let health_lost = health_before - state.health;

    let event = if state.health == 0 {
        let items_lost = state.inventory.len();
        state.inventory.clear();
        state.stamina = state.max_stamina;
        state.health = state.max_health;
        info!(
            "player {} collapsed in {} and lost {} items",
            escape_log(&state.id),
            expedition.area,
            items_lost
        );
        ExploreEvent::Died { items_lost }
    } else {
        let level_up = progression::apply_experience(
            state,
            expedition.experience_gained,
            &catalog.tuning.progression,
        );
        ExploreEvent::Explored {
            items_collected: collected,
            experience_gained: expedition.experience_gained,
            level_up,
        }
    };

    state.exploration_progress = state.exploration_progress.saturating_add(1);
    state.started_adventure = true;
    state.touch();

    Mutation::Commit(ExplorationResult {
        player: state.clone(),
        narration: expedition.narration,
        area: expedition.area,
        stamina_spent: expedition.stamina_cost,
        health_lost,
        event,
    })
}
