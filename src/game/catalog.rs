//! Read-only content tables and tuning constants.
//!
//! The catalog is loaded once at startup from a JSON seed document
//! (`data/seeds/catalog.json`) or built from the canonical island seed. Every
//! tuning constant is optional in the document and required after loading: a
//! missing key is a [`GameError::Configuration`], never a built-in default.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::game::errors::GameError;
use crate::game::progression;
use crate::game::types::{
    AreaDefinition, CraftingRecipe, ItemDefinition, ItemEffect, PlayerState, Rarity,
};

// ============================================================================
// Resolved tuning
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionTuning {
    pub base_xp: u32,
    pub xp_multiplier: f64,
    pub base_health: u32,
    pub health_per_level: u32,
    pub base_stamina: u32,
    pub stamina_per_level: u32,
    pub level_cap: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapacityTier {
    pub min_level: u32,
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapacityTuning {
    /// Ascending by `min_level`, first tier at level 1.
    pub tiers: Vec<CapacityTier>,
    pub common_space: u32,
    pub rare_space: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RollRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorationTuning {
    pub stamina_cost: RollRange,
    pub exhaustion_damage: RollRange,
    pub xp_per_item: u32,
    pub xp_level_multiplier: f64,
    /// Index `i` is the relative weight of a haul of `i + 1` items.
    pub haul_weights: Vec<f64>,
    pub random_event_chance: f64,
    pub common_weight: f64,
    pub rare_weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tuning {
    pub progression: ProgressionTuning,
    pub capacity: CapacityTuning,
    pub exploration: ExplorationTuning,
}

// ============================================================================
// Seed document
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolSeed {
    pub base: Option<u32>,
    pub per_level: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressionSeed {
    pub base_xp: Option<u32>,
    pub xp_multiplier: Option<f64>,
    #[serde(default)]
    pub max_health: PoolSeed,
    #[serde(default)]
    pub max_stamina: PoolSeed,
    pub level_cap: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RarityTable<T> {
    pub common: Option<T>,
    pub rare: Option<T>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapacitySeed {
    #[serde(default)]
    pub tiers: Vec<CapacityTier>,
    #[serde(default)]
    pub space_per_rarity: RarityTable<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplorationSeed {
    pub stamina_cost: Option<RollRange>,
    pub exhaustion_damage: Option<RollRange>,
    pub xp_per_item: Option<u32>,
    pub xp_level_multiplier: Option<f64>,
    #[serde(default)]
    pub haul_weights: Vec<f64>,
    pub random_event_chance: Option<f64>,
    #[serde(default)]
    pub rarity_weights: RarityTable<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TuningSeed {
    #[serde(default)]
    pub progression: ProgressionSeed,
    #[serde(default)]
    pub capacity: CapacitySeed,
    #[serde(default)]
    pub exploration: ExplorationSeed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSeed {
    pub name: String,
    pub rarity: Rarity,
    pub location: String,
    /// Falls back to the rarity's space cost when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_cost: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<ItemEffect>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub crafted: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub tuning: TuningSeed,
    #[serde(default)]
    pub areas: Vec<AreaDefinition>,
    #[serde(default)]
    pub items: Vec<ItemSeed>,
    #[serde(default)]
    pub encounters: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub random_events: Vec<String>,
    #[serde(default)]
    pub recipes: Vec<CraftingRecipe>,
}

fn missing(key: &str) -> GameError {
    GameError::Configuration(format!("missing tuning constant `{}`", key))
}

fn required<T>(value: Option<T>, key: &str) -> Result<T, GameError> {
    value.ok_or_else(|| missing(key))
}

fn invalid(message: impl Into<String>) -> GameError {
    GameError::Configuration(message.into())
}

fn check_range(range: RollRange, key: &str) -> Result<RollRange, GameError> {
    if range.min > range.max {
        return Err(invalid(format!(
            "`{}` has min {} greater than max {}",
            key, range.min, range.max
        )));
    }
    Ok(range)
}

impl TuningSeed {
    fn resolve(self) -> Result<Tuning, GameError> {
        let p = self.progression;
        let progression = ProgressionTuning {
            base_xp: required(p.base_xp, "progression.base_xp")?,
            xp_multiplier: required(p.xp_multiplier, "progression.xp_multiplier")?,
            base_health: required(p.max_health.base, "progression.max_health.base")?,
            health_per_level: required(
                p.max_health.per_level,
                "progression.max_health.per_level",
            )?,
            base_stamina: required(p.max_stamina.base, "progression.max_stamina.base")?,
            stamina_per_level: required(
                p.max_stamina.per_level,
                "progression.max_stamina.per_level",
            )?,
            level_cap: required(p.level_cap, "progression.level_cap")?,
        };
        if progression.base_xp == 0 {
            return Err(invalid("`progression.base_xp` must be at least 1"));
        }
        // Thresholds stay strictly increasing after flooring only when the
        // curve grows at least linearly.
        if !progression.xp_multiplier.is_finite() || progression.xp_multiplier < 1.0 {
            return Err(invalid(
                "`progression.xp_multiplier` must be a finite value >= 1.0",
            ));
        }
        if progression.level_cap == 0 {
            return Err(invalid("`progression.level_cap` must be at least 1"));
        }
        if progression::checked_threshold(progression.level_cap, &progression).is_none() {
            return Err(invalid(format!(
                "`progression` experience thresholds overflow before level_cap {}",
                progression.level_cap
            )));
        }
        if progression.base_health == 0 {
            return Err(invalid("`progression.max_health.base` must be at least 1"));
        }

        let c = self.capacity;
        if c.tiers.is_empty() {
            return Err(missing("capacity.tiers"));
        }
        if c.tiers[0].min_level != 1 {
            return Err(invalid("`capacity.tiers` must start at level 1"));
        }
        for pair in c.tiers.windows(2) {
            if pair[1].min_level <= pair[0].min_level || pair[1].capacity < pair[0].capacity {
                return Err(invalid(
                    "`capacity.tiers` must ascend by level without shrinking capacity",
                ));
            }
        }
        let capacity = CapacityTuning {
            tiers: c.tiers,
            common_space: required(
                c.space_per_rarity.common,
                "capacity.space_per_rarity.common",
            )?,
            rare_space: required(c.space_per_rarity.rare, "capacity.space_per_rarity.rare")?,
        };

        let e = self.exploration;
        let exploration = ExplorationTuning {
            stamina_cost: check_range(
                required(e.stamina_cost, "exploration.stamina_cost")?,
                "exploration.stamina_cost",
            )?,
            exhaustion_damage: check_range(
                required(e.exhaustion_damage, "exploration.exhaustion_damage")?,
                "exploration.exhaustion_damage",
            )?,
            xp_per_item: required(e.xp_per_item, "exploration.xp_per_item")?,
            xp_level_multiplier: required(
                e.xp_level_multiplier,
                "exploration.xp_level_multiplier",
            )?,
            haul_weights: e.haul_weights,
            random_event_chance: required(
                e.random_event_chance,
                "exploration.random_event_chance",
            )?,
            common_weight: required(
                e.rarity_weights.common,
                "exploration.rarity_weights.common",
            )?,
            rare_weight: required(e.rarity_weights.rare, "exploration.rarity_weights.rare")?,
        };
        if exploration.haul_weights.is_empty() {
            return Err(missing("exploration.haul_weights"));
        }
        if exploration.haul_weights.iter().any(|w| !w.is_finite() || *w < 0.0)
            || !exploration.haul_weights.iter().any(|w| *w > 0.0)
        {
            return Err(invalid(
                "`exploration.haul_weights` must be non-negative with at least one positive weight",
            ));
        }
        if !(0.0..=1.0).contains(&exploration.random_event_chance) {
            return Err(invalid(
                "`exploration.random_event_chance` must be within [0, 1]",
            ));
        }
        if exploration.common_weight.is_nan()
            || exploration.rare_weight.is_nan()
            || exploration.common_weight <= 0.0
            || exploration.rare_weight <= 0.0
        {
            return Err(invalid("`exploration.rarity_weights` must be positive"));
        }
        if exploration.xp_level_multiplier.is_nan() || exploration.xp_level_multiplier <= 0.0 {
            return Err(invalid("`exploration.xp_level_multiplier` must be positive"));
        }

        Ok(Tuning {
            progression,
            capacity,
            exploration,
        })
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Clone)]
pub struct ContentCatalog {
    pub tuning: Tuning,
    areas: Vec<AreaDefinition>,
    items: Vec<ItemDefinition>,
    encounters: BTreeMap<String, Vec<String>>,
    random_events: Vec<String>,
    recipes: Vec<CraftingRecipe>,
}

impl ContentCatalog {
    /// Validate a seed document and freeze it into a catalog.
    pub fn from_seed(seed: CatalogSeed) -> Result<Self, GameError> {
        let tuning = seed.tuning.resolve()?;

        if seed.areas.is_empty() {
            return Err(invalid("catalog defines no areas"));
        }
        if seed.areas[0].unlock_threshold != 0 {
            return Err(invalid(format!(
                "first area `{}` must unlock at progress 0",
                seed.areas[0].name
            )));
        }
        for pair in seed.areas.windows(2) {
            if pair[1].unlock_threshold <= pair[0].unlock_threshold {
                return Err(invalid(format!(
                    "area `{}` must unlock after `{}`",
                    pair[1].name, pair[0].name
                )));
            }
        }
        for area in &seed.areas {
            let lines = seed.encounters.get(&area.name).map(Vec::len).unwrap_or(0);
            if lines == 0 {
                return Err(invalid(format!("area `{}` has no encounter text", area.name)));
            }
        }

        // Carried items are accounted by name, so names must be unique.
        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(seed.items.len());
        for item in seed.items {
            if !seed.areas.iter().any(|a| a.name == item.location) {
                return Err(invalid(format!(
                    "item `{}` references unknown area `{}`",
                    item.name, item.location
                )));
            }
            if !seen.insert(item.name.to_ascii_lowercase()) {
                return Err(invalid(format!("item `{}` is defined twice", item.name)));
            }
            let space_cost = item.space_cost.unwrap_or(match item.rarity {
                Rarity::Common => tuning.capacity.common_space,
                Rarity::Rare => tuning.capacity.rare_space,
            });
            items.push(ItemDefinition {
                name: item.name,
                rarity: item.rarity,
                location: item.location,
                space_cost,
                effect: item.effect,
                crafted: item.crafted,
            });
        }

        let mut recipe_ids = HashSet::new();
        for recipe in &seed.recipes {
            if !recipe_ids.insert(recipe.id.to_ascii_lowercase()) {
                return Err(invalid(format!("recipe `{}` is defined twice", recipe.id)));
            }
            let known = |name: &str| items.iter().any(|i| i.name.eq_ignore_ascii_case(name));
            if !known(&recipe.product) {
                return Err(invalid(format!(
                    "recipe `{}` produces unknown item `{}`",
                    recipe.id, recipe.product
                )));
            }
            if recipe.materials.is_empty() {
                return Err(invalid(format!("recipe `{}` lists no materials", recipe.id)));
            }
            for material in &recipe.materials {
                if !known(&material.item) || material.quantity == 0 {
                    return Err(invalid(format!(
                        "recipe `{}` has invalid material `{}` x{}",
                        recipe.id, material.item, material.quantity
                    )));
                }
            }
        }

        debug!(
            "content catalog ready: {} areas, {} items, {} recipes, {} random events",
            seed.areas.len(),
            items.len(),
            seed.recipes.len(),
            seed.random_events.len()
        );

        Ok(Self {
            tuning,
            areas: seed.areas,
            items,
            encounters: seed.encounters,
            random_events: seed.random_events,
            recipes: seed.recipes,
        })
    }

    /// Load the catalog from a JSON seed file. Any failure here is fatal at startup.
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let seed: CatalogSeed = serde_json::from_str(&contents).map_err(|e| {
            GameError::Configuration(format!("failed to parse {}: {}", path.display(), e))
        })?;
        Self::from_seed(seed)
    }

    /// Built-in island content.
    pub fn canonical() -> Result<Self, GameError> {
        Self::from_seed(canonical_seed())
    }

    pub fn areas(&self) -> &[AreaDefinition] {
        &self.areas
    }

    pub fn items(&self) -> &[ItemDefinition] {
        &self.items
    }

    pub fn starting_area(&self) -> &AreaDefinition {
        &self.areas[0]
    }

    pub fn area(&self, name: &str) -> Option<&AreaDefinition> {
        self.areas.iter().find(|a| a.name == name)
    }

    pub fn item(&self, name: &str) -> Option<&ItemDefinition> {
        self.items.iter().find(|i| i.name.eq_ignore_ascii_case(name))
    }

    /// Items that can be found while exploring `area`.
    pub fn items_in(&self, area: &str) -> Vec<&ItemDefinition> {
        self.items
            .iter()
            .filter(|i| i.location == area && !i.crafted)
            .collect()
    }

    pub fn encounters(&self, area: &str) -> &[String] {
        self.encounters.get(area).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn random_events(&self) -> &[String] {
        &self.random_events
    }

    pub fn recipes(&self) -> &[CraftingRecipe] {
        &self.recipes
    }

    pub fn recipe(&self, key: &str) -> Option<&CraftingRecipe> {
        self.recipes.iter().find(|r| r.matches(key))
    }

    /// Space an item takes. Items that left the catalog fall back to their rarity's cost.
    pub fn space_cost(&self, name: &str, rarity: Rarity) -> u32 {
        match self.item(name) {
            Some(item) => item.space_cost,
            None => match rarity {
                Rarity::Common => self.tuning.capacity.common_space,
                Rarity::Rare => self.tuning.capacity.rare_space,
            },
        }
    }

    pub fn rarity_weight(&self, rarity: Rarity) -> f64 {
        match rarity {
            Rarity::Common => self.tuning.exploration.common_weight,
            Rarity::Rare => self.tuning.exploration.rare_weight,
        }
    }

    /// Fresh level-1 player standing in the first area.
    pub fn new_player(&self, id: &str, name: &str) -> PlayerState {
        let p = &self.tuning.progression;
        PlayerState::new(
            id,
            name,
            &self.starting_area().name,
            progression::max_health(1, p),
            progression::max_stamina(1, p),
        )
    }
}

// ============================================================================
// Canonical island seed
// ============================================================================

pub const BEACH: &str = "Beach";
pub const FOREST: &str = "Forest";
pub const MOUNTAINS: &str = "Mountains";
pub const TEMPLE: &str = "Ancient Temple";

fn item(name: &str, rarity: Rarity, location: &str) -> ItemSeed {
    ItemSeed {
        name: name.to_string(),
        rarity,
        location: location.to_string(),
        space_cost: None,
        effect: None,
        crafted: false,
    }
}

fn crafted(name: &str, location: &str, space_cost: u32, effect: Option<ItemEffect>) -> ItemSeed {
    ItemSeed {
        space_cost: Some(space_cost),
        effect,
        crafted: true,
        ..item(name, Rarity::Rare, location)
    }
}

fn rest(restore_health: u32, restore_stamina: u32) -> Option<ItemEffect> {
    Some(ItemEffect {
        restore_health,
        restore_stamina,
    })
}

fn consumable(name: &str, location: &str, restore_health: u32, restore_stamina: u32) -> ItemSeed {
    ItemSeed {
        effect: rest(restore_health, restore_stamina),
        ..item(name, Rarity::Common, location)
    }
}

fn tier(min_level: u32, capacity: u32) -> CapacityTier {
    CapacityTier {
        min_level,
        capacity,
    }
}

fn lines(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

/// The island shipped with the game; `castaway init` writes this to disk.
pub fn canonical_seed() -> CatalogSeed {
    let tuning = TuningSeed {
        progression: ProgressionSeed {
            base_xp: Some(100),
            xp_multiplier: Some(1.5),
            max_health: PoolSeed {
                base: Some(100),
                per_level: Some(10),
            },
            max_stamina: PoolSeed {
                base: Some(50),
                per_level: Some(5),
            },
            level_cap: Some(50),
        },
        capacity: CapacitySeed {
            tiers: vec![
                tier(1, 20),
                tier(10, 25),
                tier(20, 30),
                tier(30, 35),
                tier(40, 40),
            ],
            space_per_rarity: RarityTable {
                common: Some(1),
                rare: Some(2),
            },
        },
        exploration: ExplorationSeed {
            stamina_cost: Some(RollRange { min: 4, max: 8 }),
            exhaustion_damage: Some(RollRange { min: 5, max: 12 }),
            xp_per_item: Some(10),
            xp_level_multiplier: Some(1.05),
            haul_weights: vec![0.1, 0.2, 0.3, 0.4],
            random_event_chance: Some(0.10),
            rarity_weights: RarityTable {
                common: Some(3.0),
                rare: Some(1.0),
            },
        },
    };

    let areas = vec![
        AreaDefinition {
            name: BEACH.to_string(),
            unlock_threshold: 0,
            capacity_modifier: 0,
            flavor: None,
        },
        AreaDefinition {
            name: FOREST.to_string(),
            unlock_threshold: 10,
            capacity_modifier: -1,
            flavor: None,
        },
        AreaDefinition {
            name: MOUNTAINS.to_string(),
            unlock_threshold: 20,
            capacity_modifier: -3,
            flavor: Some("The air is thin up here.".to_string()),
        },
        AreaDefinition {
            name: TEMPLE.to_string(),
            unlock_threshold: 30,
            capacity_modifier: -2,
            flavor: Some("Whispers drift between the old stones.".to_string()),
        },
    ];

    let items = vec![
        item("Shell", Rarity::Common, BEACH),
        item("Driftwood", Rarity::Common, BEACH),
        consumable("Coconut", BEACH, 0, 10),
        consumable("Fish", BEACH, 8, 0),
        item("Pearl", Rarity::Rare, BEACH),
        item("Wood", Rarity::Common, FOREST),
        item("Leaves", Rarity::Common, FOREST),
        consumable("Berries", FOREST, 5, 0),
        consumable("Herbs", FOREST, 12, 0),
        ItemSeed {
            effect: rest(0, 20),
            ..item("Honeycomb", Rarity::Rare, FOREST)
        },
        item("Stone", Rarity::Common, MOUNTAINS),
        item("Flint", Rarity::Common, MOUNTAINS),
        consumable("Spring Water", MOUNTAINS, 0, 15),
        item("Iron Ore", Rarity::Rare, MOUNTAINS),
        item("Torch", Rarity::Common, TEMPLE),
        item("Clay Tablet", Rarity::Common, TEMPLE),
        item("Ancient Coin", Rarity::Rare, TEMPLE),
        item("Relic Shard", Rarity::Rare, TEMPLE),
        crafted("Stone Spear", FOREST, 2, None),
        crafted("Lean-to", BEACH, 3, rest(0, 10)),
        crafted("Thatched Shelter", FOREST, 3, rest(10, 15)),
        crafted("Stone Shelter", MOUNTAINS, 4, rest(15, 20)),
        crafted("Fortified Shelter", MOUNTAINS, 4, rest(25, 30)),
    ];

    // Shelters are carried as kits and used up when the castaway rests in one.
    let recipes = vec![
        CraftingRecipe::new("stone_spear", "Stone Spear", "Stone Spear")
            .with_material("Wood", 1)
            .with_material("Stone", 1)
            .with_description("A sharpened stone lashed to a wooden shaft."),
        CraftingRecipe::new("lean_to", "Lean-to", "Lean-to")
            .with_material("Wood", 3)
            .with_description("A few poles against a tree. Better than nothing."),
        CraftingRecipe::new("thatched_shelter", "Thatched Shelter", "Thatched Shelter")
            .with_material("Wood", 3)
            .with_material("Leaves", 2)
            .with_description("A frame roofed with leaves that keeps the rain off."),
        CraftingRecipe::new("stone_shelter", "Stone Shelter", "Stone Shelter")
            .with_material("Wood", 3)
            .with_material("Stone", 2)
            .with_description("Wooden walls on a stone footing."),
        CraftingRecipe::new("fortified_shelter", "Fortified Shelter", "Fortified Shelter")
            .with_material("Wood", 3)
            .with_material("Stone", 2)
            .with_material("Leaves", 2)
            .with_description("Stone footing, wooden walls and a thatched roof."),
    ];

    let mut encounters = BTreeMap::new();
    encounters.insert(
        BEACH.to_string(),
        lines(&[
            "Waves wash over the sand, leaving treasures behind.",
            "A crab scuttles away as you comb the tideline.",
            "You find a bush full of berries at the edge of the dunes.",
        ]),
    );
    encounters.insert(
        FOREST.to_string(),
        lines(&[
            "You push through dense undergrowth.",
            "You found an abandoned tribal village.",
            "A wild boar crashes through the ferns nearby.",
        ]),
    );
    encounters.insert(
        MOUNTAINS.to_string(),
        lines(&[
            "You found a hidden cave with strange markings.",
            "Loose scree slides beneath your feet.",
            "An eagle circles high above the ridge.",
        ]),
    );
    encounters.insert(
        TEMPLE.to_string(),
        lines(&[
            "You discovered an old temple with mystical powers.",
            "Vines choke a collapsed archway.",
            "Faded murals cover the walls of a silent hall.",
        ]),
    );

    CatalogSeed {
        tuning,
        areas,
        items,
        encounters,
        random_events: lines(&[
            "A peddler offers you supplies in exchange for resources.",
            "Distant drums echo across the island.",
            "A sudden squall forces you to take cover.",
            "You spot smoke rising from the far side of the island.",
        ]),
        recipes,
    }
}
