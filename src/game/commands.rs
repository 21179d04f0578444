//! Chat command parsing and dispatch.
//!
//! Maps one line of player input onto a [`GameCommand`] and renders the
//! coordinator's results as plain text lines for whatever transport sits in
//! front of it.

use log::debug;

use crate::game::coordinator::MutationCoordinator;
use crate::game::crafting;
use crate::game::errors::GameError;
use crate::game::progression;
use crate::game::storage::PlayerStore;
use crate::game::types::{
    ActionContext, ExplorationResult, ExploreEvent, PlayerState, RecipeMaterial,
};
use crate::logutil::escape_log;

const DEFAULT_THRESHOLD_ROWS: u32 = 10;
const MAX_THRESHOLD_ROWS: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameCommand {
    Start,            // START, NEW
    Explore,          // E, EXPLORE
    Status,           // S, STATUS, STATS
    Inventory,        // I, INV
    Use(String),      // U item
    Drop(String),     // D item
    Craft(String),    // C recipe
    Recipes,          // R, RECIPES
    Restart,          // RESTART
    Thresholds(u32),  // XP [levels]
    Help,             // H, ?, HELP
    Quit,             // Q, QUIT
    Unknown(String),
}

impl GameCommand {
    pub fn parse(input: &str) -> GameCommand {
        let trimmed = input.trim();
        let mut parts = trimmed.split_whitespace();
        let Some(verb) = parts.next() else {
            return GameCommand::Unknown(String::new());
        };
        let rest = parts.collect::<Vec<_>>().join(" ");

        match verb.to_uppercase().as_str() {
            "START" | "NEW" => GameCommand::Start,
            "E" | "EXPLORE" => GameCommand::Explore,
            "S" | "STATUS" | "STATS" => GameCommand::Status,
            "I" | "INV" | "INVENTORY" => GameCommand::Inventory,
            "U" | "USE" | "EAT" if !rest.is_empty() => GameCommand::Use(rest),
            "D" | "DROP" if !rest.is_empty() => GameCommand::Drop(rest),
            "C" | "CRAFT" | "BUILD" if !rest.is_empty() => GameCommand::Craft(rest),
            "R" | "RECIPES" => GameCommand::Recipes,
            "RESTART" => GameCommand::Restart,
            "XP" | "THRESHOLDS" => {
                let levels = rest
                    .parse::<u32>()
                    .unwrap_or(DEFAULT_THRESHOLD_ROWS)
                    .clamp(1, MAX_THRESHOLD_ROWS);
                GameCommand::Thresholds(levels)
            }
            "H" | "?" | "HELP" => GameCommand::Help,
            "Q" | "QUIT" | "EXIT" => GameCommand::Quit,
            _ => GameCommand::Unknown(trimmed.to_string()),
        }
    }
}

/// Who is typing, and with what privileges.
#[derive(Debug, Clone)]
pub struct CommandSession {
    pub player_id: String,
    pub display_name: String,
    pub context: ActionContext,
}

/// Run one command and return the lines to show the player. Failures become
/// messages here; nothing is propagated to the transport.
pub async fn handle_command<S: PlayerStore>(
    coordinator: &MutationCoordinator<S>,
    session: &CommandSession,
    command: GameCommand,
) -> Vec<String> {
    debug!(
        "player {} -> {:?}",
        escape_log(&session.player_id),
        command
    );
    let id = session.player_id.as_str();
    let ctx = &session.context;

    let outcome = match command {
        GameCommand::Start => coordinator
            .create_player(id, &session.display_name, ctx)
            .await
            .map(|player| {
                vec![
                    format!("Welcome, {}. You wash up on the {}.", player.name, player.location),
                    "Type EXPLORE to look around, or HELP for commands.".to_string(),
                ]
            }),
        GameCommand::Explore => coordinator
            .perform_explore(id, ctx)
            .await
            .map(|result| render_exploration(&result)),
        GameCommand::Status => coordinator.player_status(id).map(|status| {
            let p = &status.player;
            let mut lines = vec![
                format!("{} - level {} in the {}", p.name, p.level, p.location),
                format!(
                    "Health {}/{}  Stamina {}/{}",
                    p.health, p.max_health, p.stamina, p.max_stamina
                ),
                format!(
                    "Pack {}/{} ({} free)",
                    status.used_space, status.capacity, status.remaining_space
                ),
            ];
            if status.at_level_cap {
                lines.push("Experience: max level reached".to_string());
            } else {
                lines.push(format!("Experience {}/{}", p.experience, status.next_threshold));
            }
            lines
        }),
        GameCommand::Inventory => coordinator
            .player_status(id)
            .map(|status| render_inventory(&status.player)),
        GameCommand::Use(name) => coordinator.use_item(id, &name, ctx).await.map(|used| {
            let mut line = format!("You use the {}.", used.item);
            if used.health_restored > 0 {
                line.push_str(&format!(" +{} health.", used.health_restored));
            }
            if used.stamina_restored > 0 {
                line.push_str(&format!(" +{} stamina.", used.stamina_restored));
            }
            if used.health_restored == 0 && used.stamina_restored == 0 {
                line.push_str(" Nothing happens.");
            }
            vec![line]
        }),
        GameCommand::Drop(name) => coordinator
            .drop_item(id, &name, ctx)
            .await
            .map(|dropped| vec![format!("You leave the {} behind.", dropped.item)]),
        GameCommand::Craft(recipe) => coordinator.craft(id, &recipe, ctx).await.map(|crafted| {
            vec![
                format!("You craft a {}.", crafted.product),
                format!("Used: {}", list_materials(&crafted.consumed)),
            ]
        }),
        GameCommand::Recipes => coordinator.player_status(id).map(|status| {
            coordinator
                .catalog()
                .recipes()
                .iter()
                .map(|recipe| {
                    let missing = crafting::missing_materials(&status.player, recipe);
                    if missing.is_empty() {
                        format!("{} - ready", recipe.name)
                    } else {
                        format!("{} - need {}", recipe.name, list_materials(&missing))
                    }
                })
                .collect()
        }),
        GameCommand::Restart => coordinator
            .restart_adventure(id, ctx)
            .await
            .map(|player| vec![format!("A new adventure begins on the {}.", player.location)]),
        GameCommand::Thresholds(levels) => Ok(progression::threshold_table(
            levels,
            &coordinator.catalog().tuning.progression,
        )
        .into_iter()
        .map(|(level, needed)| format!("Level {:>2}: {} xp", level, needed))
        .collect()),
        GameCommand::Help => Ok(help_lines()),
        GameCommand::Quit => Ok(vec!["See you on the island.".to_string()]),
        GameCommand::Unknown(text) if text.is_empty() => Ok(Vec::new()),
        GameCommand::Unknown(text) => Ok(vec![format!(
            "Unknown command '{}'. Type HELP for commands.",
            text
        )]),
    };

    outcome.unwrap_or_else(|err| vec![describe_error(&err)])
}

pub fn render_exploration(result: &ExplorationResult) -> Vec<String> {
    let mut lines = vec![format!("[{}] {}", result.area, result.narration)];
    match &result.event {
        ExploreEvent::InventoryFull => {
            lines.push("Use or drop something to make room.".to_string());
        }
        ExploreEvent::Died { items_lost } => {
            lines.push(format!(
                "You collapse from exhaustion and lose {} item(s).",
                items_lost
            ));
            lines.push("You wake up on the shore, rested but empty-handed.".to_string());
        }
        ExploreEvent::Explored {
            items_collected,
            experience_gained,
            level_up,
        } => {
            if items_collected.is_empty() {
                lines.push("You find nothing useful.".to_string());
            } else {
                let names: Vec<&str> = items_collected.iter().map(|i| i.name.as_str()).collect();
                lines.push(format!("Found: {}", names.join(", ")));
            }
            let mut cost = format!("-{} stamina", result.stamina_spent);
            if result.health_lost > 0 {
                cost.push_str(&format!(", -{} health", result.health_lost));
            }
            lines.push(format!("{}, +{} xp", cost, experience_gained));
            if let Some(up) = level_up {
                lines.push(format!(
                    "Level up! You are now level {}. Health and stamina restored.",
                    up.to_level
                ));
            }
        }
    }
    lines
}

fn render_inventory(player: &PlayerState) -> Vec<String> {
    if player.inventory.is_empty() {
        return vec!["Your pack is empty.".to_string()];
    }
    // Group duplicates, keeping first-acquired order.
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in &player.inventory {
        match counts.iter_mut().find(|(name, _)| *name == item.name) {
            Some((_, count)) => *count += 1,
            None => counts.push((item.name.as_str(), 1)),
        }
    }
    counts
        .into_iter()
        .map(|(name, count)| {
            if count > 1 {
                format!("{} x{}", name, count)
            } else {
                name.to_string()
            }
        })
        .collect()
}

fn list_materials(materials: &[RecipeMaterial]) -> String {
    materials
        .iter()
        .map(|m| format!("{} x{}", m.item, m.quantity))
        .collect::<Vec<_>>()
        .join(", ")
}

fn help_lines() -> Vec<String> {
    vec![
        "START - wash ashore".to_string(),
        "E - explore  S - status  I - inventory".to_string(),
        "U <item> - use  D <item> - drop".to_string(),
        "R - recipes  C <recipe> - craft or build".to_string(),
        "XP [n] - experience table  RESTART - start over".to_string(),
        "Q - quit".to_string(),
    ]
}

/// One distinct message per failure kind.
pub fn describe_error(err: &GameError) -> String {
    match err {
        GameError::PlayerNotFound(_) => "You haven't started yet. Type START to begin.".into(),
        GameError::PlayerExists(_) => {
            "You're already on the island. Type RESTART to start over.".into()
        }
        GameError::ItemNotFound(name) => format!("You aren't carrying any {}.", name),
        GameError::UnknownRecipe(name) => {
            format!("You don't know how to make '{}'. Type RECIPES for a list.", name)
        }
        GameError::MissingMaterials { recipe, missing } => format!(
            "To make the {} you still need {}.",
            recipe,
            list_materials(missing)
        ),
        GameError::NoSpace { item, .. } => {
            format!("There's no room in your pack for the {}.", item)
        }
        GameError::ConcurrencyConflict(_) => {
            "Still working on your last action. Try again in a moment.".into()
        }
        GameError::Maintenance => {
            "The island is closed for maintenance. Please come back later.".into()
        }
        GameError::Configuration(_) => {
            "The game is misconfigured. Please tell an operator.".into()
        }
        e if e.is_persistence_failure() => {
            "Couldn't save your progress. Nothing was changed; please try again.".into()
        }
        _ => "Something went wrong. Please try again.".into(),
    }
}
