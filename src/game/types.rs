use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PLAYER_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
}

impl Rarity {
    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
        }
    }
}

/// Restorative effect applied when a carried item is used.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemEffect {
    #[serde(default)]
    pub restore_health: u32,
    #[serde(default)]
    pub restore_stamina: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemDefinition {
    pub name: String,
    pub rarity: Rarity,
    /// Area whose item pool this item belongs to
    pub location: String,
    pub space_cost: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<ItemEffect>,
    /// Only obtainable from a recipe; never found while exploring.
    #[serde(default)]
    pub crafted: bool,
}

impl ItemDefinition {
    pub fn new(name: &str, rarity: Rarity, location: &str, space_cost: u32) -> Self {
        Self {
            name: name.to_string(),
            rarity,
            location: location.to_string(),
            space_cost,
            effect: None,
            crafted: false,
        }
    }

    pub fn with_effect(mut self, restore_health: u32, restore_stamina: u32) -> Self {
        self.effect = Some(ItemEffect {
            restore_health,
            restore_stamina,
        });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeMaterial {
    pub item: String,
    pub quantity: u32,
}

/// Data-driven crafting recipe: consumes every material, yields one product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CraftingRecipe {
    pub id: String,
    pub name: String,
    /// Catalog item produced
    pub product: String,
    pub materials: Vec<RecipeMaterial>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl CraftingRecipe {
    pub fn new(id: &str, name: &str, product: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            product: product.to_string(),
            materials: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_material(mut self, item: &str, quantity: u32) -> Self {
        self.materials.push(RecipeMaterial {
            item: item.to_string(),
            quantity,
        });
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Case-insensitive match on either the id or the display name.
    pub fn matches(&self, key: &str) -> bool {
        self.id.eq_ignore_ascii_case(key) || self.name.eq_ignore_ascii_case(key)
    }
}

/// A biome unlocked once `exploration_progress` reaches `unlock_threshold`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AreaDefinition {
    pub name: String,
    pub unlock_threshold: u32,
    /// Signed carrying adjustment; harsher biomes are negative.
    #[serde(default)]
    pub capacity_modifier: i32,
    /// Fixed flavor line appended to every encounter in this area.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
}

/// One carried item. Insertion order is acquisition order; duplicates allowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub name: String,
    pub rarity: Rarity,
    pub acquired_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn from_definition(item: &ItemDefinition) -> Self {
        Self {
            name: item.name.clone(),
            rarity: item.rarity,
            acquired_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerState {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub experience: u32,
    pub health: u32,
    pub max_health: u32,
    pub stamina: u32,
    pub max_stamina: u32,
    pub location: String,
    pub exploration_progress: u32,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub started_adventure: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PlayerState {
    pub fn new(id: &str, name: &str, location: &str, max_health: u32, max_stamina: u32) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            name: name.to_string(),
            level: 1,
            experience: 0,
            health: max_health,
            max_health,
            stamina: max_stamina,
            max_stamina,
            location: location.to_string(),
            exploration_progress: 0,
            inventory: Vec::new(),
            started_adventure: false,
            created_at: now,
            updated_at: now,
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Exhausted is transient: it only shapes the forced health loss roll.
    pub fn is_exhausted(&self) -> bool {
        self.stamina == 0
    }

    pub fn spend_stamina(&mut self, amount: u32) {
        self.stamina = self.stamina.saturating_sub(amount);
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    /// Returns the amount actually restored.
    pub fn restore_health(&mut self, amount: u32) -> u32 {
        let before = self.health;
        self.health = self.health.saturating_add(amount).min(self.max_health);
        self.health - before
    }

    /// Returns the amount actually restored.
    pub fn restore_stamina(&mut self, amount: u32) -> u32 {
        let before = self.stamina;
        self.stamina = self.stamina.saturating_add(amount).min(self.max_stamina);
        self.stamina - before
    }
}

/// Per-call context injected by the chat layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionContext {
    pub maintenance: bool,
    pub operator: bool,
}

impl ActionContext {
    pub fn player() -> Self {
        Self::default()
    }

    pub fn operator() -> Self {
        Self {
            maintenance: false,
            operator: true,
        }
    }

    pub fn during_maintenance(mut self) -> Self {
        self.maintenance = true;
        self
    }

    pub fn is_blocked(&self) -> bool {
        self.maintenance && !self.operator
    }
}

/// Result of one exploration attempt before anything is committed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ExplorationOutcome {
    /// No space left; exploration did not happen and costs nothing.
    InventoryFull { area: String, narration: String },
    Explored(Expedition),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expedition {
    pub area: String,
    /// Already space-checked against the player's remaining capacity.
    pub items_offered: Vec<ItemDefinition>,
    pub experience_gained: u32,
    pub narration: String,
    pub stamina_cost: u32,
    pub forced_health_loss: u32,
}

impl ExplorationOutcome {
    pub fn area(&self) -> &str {
        match self {
            ExplorationOutcome::InventoryFull { area, .. } => area,
            ExplorationOutcome::Explored(expedition) => &expedition.area,
        }
    }

    pub fn narration(&self) -> &str {
        match self {
            ExplorationOutcome::InventoryFull { narration, .. } => narration,
            ExplorationOutcome::Explored(expedition) => &expedition.narration,
        }
    }

    pub fn items_offered(&self) -> &[ItemDefinition] {
        match self {
            ExplorationOutcome::InventoryFull { .. } => &[],
            ExplorationOutcome::Explored(expedition) => &expedition.items_offered,
        }
    }

    pub fn stamina_cost(&self) -> u32 {
        match self {
            ExplorationOutcome::InventoryFull { .. } => 0,
            ExplorationOutcome::Explored(expedition) => expedition.stamina_cost,
        }
    }

    pub fn forced_health_loss(&self) -> u32 {
        match self {
            ExplorationOutcome::InventoryFull { .. } => 0,
            ExplorationOutcome::Explored(expedition) => expedition.forced_health_loss,
        }
    }

    pub fn experience_gained(&self) -> u32 {
        match self {
            ExplorationOutcome::InventoryFull { .. } => 0,
            ExplorationOutcome::Explored(expedition) => expedition.experience_gained,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelUp {
    pub from_level: u32,
    pub to_level: u32,
}

impl LevelUp {
    pub fn levels_gained(&self) -> u32 {
        self.to_level - self.from_level
    }
}

/// How an explore call ended, for the chat layer to render.
#[derive(Debug, Clone, PartialEq)]
pub enum ExploreEvent {
    InventoryFull,
    Explored {
        items_collected: Vec<ItemDefinition>,
        experience_gained: u32,
        level_up: Option<LevelUp>,
    },
    /// Health hit zero; inventory was lost and the player was revived.
    Died { items_lost: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorationResult {
    pub player: PlayerState,
    pub narration: String,
    pub area: String,
    pub stamina_spent: u32,
    pub health_lost: u32,
    pub event: ExploreEvent,
}

impl ExplorationResult {
    pub fn died(&self) -> bool {
        matches!(self.event, ExploreEvent::Died { .. })
    }

    pub fn level_up(&self) -> Option<LevelUp> {
        match &self.event {
            ExploreEvent::Explored { level_up, .. } => *level_up,
            _ => None,
        }
    }
}

/// What using an item did.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemUse {
    pub item: String,
    pub health_restored: u32,
    pub stamina_restored: u32,
    pub player: PlayerState,
}

/// What dropping an item did.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDrop {
    pub item: String,
    pub player: PlayerState,
}

/// What a successful craft consumed and produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Crafted {
    pub recipe: String,
    pub product: String,
    pub consumed: Vec<RecipeMaterial>,
    pub player: PlayerState,
}

/// Read-only view for "check status" style display.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStatus {
    pub player: PlayerState,
    pub capacity: i64,
    pub used_space: i64,
    pub remaining_space: i64,
    pub next_threshold: u32,
    pub at_level_cap: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_and_spending_clamp_at_zero() {
        let mut player = PlayerState::new("7", "Ada", "Beach", 100, 50);
        player.spend_stamina(80);
        player.take_damage(250);
        assert_eq!(player.stamina, 0);
        assert_eq!(player.health, 0);
        assert!(player.is_exhausted());
    }

    #[test]
    fn restores_clamp_at_maximum() {
        let mut player = PlayerState::new("7", "Ada", "Beach", 100, 50);
        player.health = 95;
        player.stamina = 10;
        assert_eq!(player.restore_health(20), 5);
        assert_eq!(player.restore_stamina(15), 15);
        assert_eq!(player.health, 100);
        assert_eq!(player.stamina, 25);
    }

    #[test]
    fn recipes_match_id_or_name() {
        let recipe = CraftingRecipe::new("stone_spear", "Stone Spear", "Stone Spear")
            .with_material("Wood", 1)
            .with_material("Stone", 1);
        assert!(recipe.matches("STONE_SPEAR"));
        assert!(recipe.matches("stone spear"));
        assert!(!recipe.matches("spear"));
        assert_eq!(recipe.materials.len(), 2);
    }

    #[test]
    fn maintenance_only_blocks_regular_players() {
        assert!(ActionContext::player().during_maintenance().is_blocked());
        assert!(!ActionContext::operator().during_maintenance().is_blocked());
        assert!(!ActionContext::player().is_blocked());
    }

    #[test]
    fn inventory_full_outcome_costs_nothing() {
        let outcome = ExplorationOutcome::InventoryFull {
            area: "Beach".into(),
            narration: "Your pack is full.".into(),
        };
        assert!(outcome.items_offered().is_empty());
        assert_eq!(outcome.stamina_cost(), 0);
        assert_eq!(outcome.forced_health_loss(), 0);
        assert_eq!(outcome.area(), "Beach");
    }
}
