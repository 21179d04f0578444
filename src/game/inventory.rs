/// Inventory capacity model for the island survival game
use super::catalog::{CapacityTuning, ContentCatalog};
use super::types::{InventoryItem, ItemDefinition, PlayerState};

// ============================================================================
// Capacity
// ============================================================================

/// Whether an item fits in the remaining space. `NoSpace` is handled by the
/// caller by skipping the item; it is never raised as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Fits { remaining_after: i64 },
    NoSpace { needed: u32, remaining: i64 },
}

impl Admission {
    pub fn fits(&self) -> bool {
        matches!(self, Admission::Fits { .. })
    }
}

/// Step function over level: the highest tier whose `min_level` has been reached.
pub fn base_capacity_for_level(level: u32, tuning: &CapacityTuning) -> u32 {
    tuning
        .tiers
        .iter()
        .take_while(|tier| tier.min_level <= level)
        .last()
        .map(|tier| tier.capacity)
        .unwrap_or(0)
}

/// Unknown locations carry no adjustment.
pub fn location_modifier(location: &str, catalog: &ContentCatalog) -> i32 {
    catalog
        .area(location)
        .map(|area| area.capacity_modifier)
        .unwrap_or(0)
}

/// Evaluated on every call; depends on the current level and location.
pub fn capacity(level: u32, location: &str, catalog: &ContentCatalog) -> i64 {
    let total = base_capacity_for_level(level, &catalog.tuning.capacity) as i64
        + location_modifier(location, catalog) as i64;
    total.max(0)
}

pub fn used_space(inventory: &[InventoryItem], catalog: &ContentCatalog) -> i64 {
    inventory
        .iter()
        .map(|item| catalog.space_cost(&item.name, item.rarity) as i64)
        .sum()
}

/// Space left at the player's current location. Negative when a harsher
/// biome shrank capacity below what is already carried.
pub fn remaining(state: &PlayerState, catalog: &ContentCatalog) -> i64 {
    remaining_at(state, &state.location, catalog)
}

/// Space left if the player were standing in `location`.
pub fn remaining_at(state: &PlayerState, location: &str, catalog: &ContentCatalog) -> i64 {
    capacity(state.level, location, catalog) - used_space(&state.inventory, catalog)
}

pub fn check_admission(
    state: &PlayerState,
    item: &ItemDefinition,
    catalog: &ContentCatalog,
) -> Admission {
    let remaining = remaining(state, catalog);
    let needed = item.space_cost;
    if remaining >= needed as i64 {
        Admission::Fits {
            remaining_after: remaining - needed as i64,
        }
    } else {
        Admission::NoSpace { needed, remaining }
    }
}

// ============================================================================
// Inventory Operations
// ============================================================================

/// Append an item if it fits; the inventory is untouched otherwise.
pub fn add_item(
    state: &mut PlayerState,
    item: &ItemDefinition,
    catalog: &ContentCatalog,
) -> Admission {
    let admission = check_admission(state, item, catalog);
    if admission.fits() {
        state.inventory.push(InventoryItem::from_definition(item));
    }
    admission
}

/// Remove the earliest acquired item with this name (case-insensitive).
pub fn remove_item(state: &mut PlayerState, name: &str) -> Option<InventoryItem> {
    let index = state
        .inventory
        .iter()
        .position(|item| item.name.eq_ignore_ascii_case(name))?;
    Some(state.inventory.remove(index))
}

pub fn count_item(state: &PlayerState, name: &str) -> usize {
    state
        .inventory
        .iter()
        .filter(|item| item.name.eq_ignore_ascii_case(name))
        .count()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::{BEACH, FOREST, MOUNTAINS};
    use crate::game::types::Rarity;

    fn catalog() -> ContentCatalog {
        ContentCatalog::canonical().expect("catalog")
    }

    fn shell() -> ItemDefinition {
        ItemDefinition::new("Shell", Rarity::Common, BEACH, 1)
    }

    fn pearl() -> ItemDefinition {
        ItemDefinition::new("Pearl", Rarity::Rare, BEACH, 2)
    }

    #[test]
    fn base_capacity_steps_at_tiers() {
        let catalog = catalog();
        let tuning = &catalog.tuning.capacity;
        assert_eq!(base_capacity_for_level(1, tuning), 20);
        assert_eq!(base_capacity_for_level(9, tuning), 20);
        assert_eq!(base_capacity_for_level(10, tuning), 25);
        assert_eq!(base_capacity_for_level(29, tuning), 30);
        assert_eq!(base_capacity_for_level(40, tuning), 40);
        assert_eq!(base_capacity_for_level(50, tuning), 40);
    }

    #[test]
    fn harsher_biomes_shrink_capacity() {
        let catalog = catalog();
        assert_eq!(capacity(1, BEACH, &catalog), 20);
        assert_eq!(capacity(1, FOREST, &catalog), 19);
        assert_eq!(capacity(1, MOUNTAINS, &catalog), 17);
        assert_eq!(capacity(1, "Nowhere", &catalog), 20);
    }

    #[test]
    fn used_space_sums_rarity_costs() {
        let catalog = catalog();
        let mut player = catalog.new_player("1", "Kai");
        add_item(&mut player, &shell(), &catalog);
        add_item(&mut player, &pearl(), &catalog);
        add_item(&mut player, &shell(), &catalog);
        assert_eq!(used_space(&player.inventory, &catalog), 4);
        assert_eq!(remaining(&player, &catalog), 16);
    }

    #[test]
    fn add_rejects_when_space_runs_out() {
        let catalog = catalog();
        let mut player = catalog.new_player("1", "Kai");
        for _ in 0..19 {
            assert!(add_item(&mut player, &shell(), &catalog).fits());
        }
        let result = add_item(&mut player, &pearl(), &catalog);
        assert_eq!(
            result,
            Admission::NoSpace {
                needed: 2,
                remaining: 1
            }
        );
        assert_eq!(player.inventory.len(), 19);
        assert!(add_item(&mut player, &shell(), &catalog).fits());
        assert_eq!(remaining(&player, &catalog), 0);
    }

    #[test]
    fn remaining_can_go_negative_after_moving() {
        let catalog = catalog();
        let mut player = catalog.new_player("1", "Kai");
        for _ in 0..20 {
            add_item(&mut player, &shell(), &catalog);
        }
        assert_eq!(remaining_at(&player, MOUNTAINS, &catalog), -3);
    }

    #[test]
    fn remove_takes_earliest_match() {
        let catalog = catalog();
        let mut player = catalog.new_player("1", "Kai");
        add_item(&mut player, &shell(), &catalog);
        add_item(&mut player, &pearl(), &catalog);
        add_item(&mut player, &shell(), &catalog);
        let removed = remove_item(&mut player, "SHELL").expect("removed");
        assert_eq!(removed.name, "Shell");
        assert_eq!(player.inventory[0].name, "Pearl");
        assert_eq!(count_item(&player, "shell"), 1);
        assert!(remove_item(&mut player, "Coconut").is_none());
    }
}
