//! Exploration resolution.
//!
//! Turns a read-only player snapshot into an [`ExplorationOutcome`] without
//! touching the snapshot. All randomness comes from a caller-supplied RNG, and
//! [`resolve`] seeds a `StdRng` from a `u64`, so the same `(state, seed)` pair
//! always yields the same outcome.
//!
//! Steps, in draw order:
//! 1. area from `exploration_progress` (last area whose threshold is reached)
//! 2. capacity gate against that area; no space means no exploration
//! 3. haul size from the weighted haul table, then items drawn by rarity
//!    weight without replacement, admitted one at a time until one does not fit
//! 4. experience for the items actually admitted
//! 5. encounter line, plus the area flavor or (failing that) a random event
//! 6. stamina cost, and exhaustion damage if stamina would land on zero

use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::game::catalog::{ContentCatalog, ExplorationTuning};
use crate::game::inventory;
use crate::game::types::{
    AreaDefinition, Expedition, ExplorationOutcome, ItemDefinition, PlayerState,
};

pub const INVENTORY_FULL_NARRATION: &str =
    "Your pack is full. You need to free up space before exploring again.";

const QUIET_NARRATION: &str = "You look around, but the island is quiet.";

/// Resolve one attempt with a `StdRng` seeded from `seed`.
pub fn resolve(state: &PlayerState, catalog: &ContentCatalog, seed: u64) -> ExplorationOutcome {
    let mut rng = StdRng::seed_from_u64(seed);
    resolve_with_rng(state, catalog, &mut rng)
}

pub fn resolve_with_rng<R: Rng + ?Sized>(
    state: &PlayerState,
    catalog: &ContentCatalog,
    rng: &mut R,
) -> ExplorationOutcome {
    let tuning = &catalog.tuning.exploration;
    let area = resolve_area(state.exploration_progress, catalog);

    let mut remaining = inventory::remaining_at(state, &area.name, catalog);
    if remaining <= 0 {
        debug!(
            "player {} has no space ({} remaining) in {}",
            state.id, remaining, area.name
        );
        return ExplorationOutcome::InventoryFull {
            area: area.name.clone(),
            narration: INVENTORY_FULL_NARRATION.to_string(),
        };
    }

    let pool = catalog.items_in(&area.name);
    let haul = sample_haul_size(rng, &tuning.haul_weights, pool.len());
    let mut items_offered = Vec::with_capacity(haul);
    for item in sample_items(rng, pool, haul, catalog) {
        let cost = item.space_cost as i64;
        if cost > remaining {
            break;
        }
        remaining -= cost;
        items_offered.push(item.clone());
    }

    let experience_gained = experience_for_haul(state.level, items_offered.len(), tuning);
    let narration = narrate(rng, area, catalog);

    let stamina_cost = rng.gen_range(tuning.stamina_cost.min..=tuning.stamina_cost.max);
    let forced_health_loss = if state.stamina.saturating_sub(stamina_cost) == 0 {
        rng.gen_range(tuning.exhaustion_damage.min..=tuning.exhaustion_damage.max)
    } else {
        0
    };

    debug!(
        "player {} explores {}: {} items, {} xp, -{} stamina, -{} health",
        state.id,
        area.name,
        items_offered.len(),
        experience_gained,
        stamina_cost,
        forced_health_loss
    );

    ExplorationOutcome::Explored(Expedition {
        area: area.name.clone(),
        items_offered,
        experience_gained,
        narration,
        stamina_cost,
        forced_health_loss,
    })
}

/// Monotonic step function from progress to the unlocked area.
pub fn resolve_area(progress: u32, catalog: &ContentCatalog) -> &AreaDefinition {
    catalog
        .areas()
        .iter()
        .take_while(|area| area.unlock_threshold <= progress)
        .last()
        .unwrap_or_else(|| catalog.starting_area())
}

/// `xp_per_item * collected`, scaled by `xp_level_multiplier ^ (level - 1)`.
pub fn experience_for_haul(level: u32, collected: usize, tuning: &ExplorationTuning) -> u32 {
    let base = tuning.xp_per_item as f64 * collected as f64;
    let exponent = level.saturating_sub(1).min(i32::MAX as u32) as i32;
    (base * tuning.xp_level_multiplier.powi(exponent)).floor() as u32
}

/// Haul size in `1..=min(available, weights.len())`; zero only when nothing is available.
fn sample_haul_size<R: Rng + ?Sized>(rng: &mut R, weights: &[f64], available: usize) -> usize {
    let cap = available.min(weights.len());
    if cap == 0 {
        return 0;
    }
    match WeightedIndex::new(&weights[..cap]) {
        Ok(dist) => dist.sample(rng) + 1,
        // every admissible size had zero weight
        Err(_) => cap,
    }
}

fn sample_items<'a, R: Rng + ?Sized>(
    rng: &mut R,
    mut pool: Vec<&'a ItemDefinition>,
    count: usize,
    catalog: &ContentCatalog,
) -> Vec<&'a ItemDefinition> {
    let mut picked = Vec::with_capacity(count);
    while picked.len() < count && !pool.is_empty() {
        let weights: Vec<f64> = pool
            .iter()
            .map(|item| catalog.rarity_weight(item.rarity))
            .collect();
        let Ok(dist) = WeightedIndex::new(&weights) else {
            break;
        };
        picked.push(pool.remove(dist.sample(rng)));
    }
    picked
}

/// Area flavor takes precedence; the random event roll only happens without one.
fn narrate<R: Rng + ?Sized>(
    rng: &mut R,
    area: &AreaDefinition,
    catalog: &ContentCatalog,
) -> String {
    let encounter = catalog
        .encounters(&area.name)
        .choose(rng)
        .map(String::as_str)
        .unwrap_or(QUIET_NARRATION);

    if let Some(flavor) = &area.flavor {
        return format!("{} {}", encounter, flavor);
    }
    let chance = catalog.tuning.exploration.random_event_chance;
    if rng.gen::<f64>() < chance {
        if let Some(event) = catalog.random_events().choose(rng) {
            return format!("{} {}", encounter, event);
        }
    }
    encounter.to_string()
}
