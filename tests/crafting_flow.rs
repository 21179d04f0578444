/// Crafting and shelter building against a sled-backed store
mod common;

use tempfile::TempDir;

use castaway::game::inventory::{capacity, used_space};
use castaway::game::{
    handle_command, ActionContext, CommandSession, ContentCatalog, GameCommand, GameError,
    InventoryItem, PlayerState, PlayerStore,
};

use common::sled_coordinator;

fn give(player: &mut PlayerState, catalog: &ContentCatalog, names: &[&str]) {
    for name in names {
        let item = catalog.item(name).expect("item");
        player.inventory.push(InventoryItem::from_definition(item));
    }
}

#[tokio::test]
async fn building_a_shelter_consumes_materials() {
    let dir = TempDir::new().expect("tempdir");
    let coordinator = sled_coordinator(dir.path());
    let ctx = ActionContext::player();
    let mut player = coordinator.create_player("1", "Kai", &ctx).await.expect("create");
    give(
        &mut player,
        coordinator.catalog(),
        &["Wood", "Stone", "Wood", "Leaves", "Wood", "Stone", "Leaves", "Shell"],
    );
    coordinator.store().put_player(&player).expect("put");

    let crafted = coordinator
        .craft("1", "Fortified Shelter", &ctx)
        .await
        .expect("craft");
    assert_eq!(crafted.product, "Fortified Shelter");
    assert_eq!(crafted.consumed.len(), 3);

    let stored = coordinator.store().get_player("1").expect("get").expect("stored");
    let names: Vec<&str> = stored.inventory.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Shell", "Fortified Shelter"]);
    let catalog = coordinator.catalog();
    assert_eq!(used_space(&stored.inventory, catalog), 5);
    assert!(
        used_space(&stored.inventory, catalog) <= capacity(stored.level, &stored.location, catalog)
    );

    // Resting in the shelter uses it up.
    let mut tired = stored.clone();
    tired.stamina = 10;
    tired.health = 60;
    coordinator.store().put_player(&tired).expect("put");
    let rested = coordinator
        .use_item("1", "fortified shelter", &ctx)
        .await
        .expect("use");
    assert_eq!(rested.health_restored, 25);
    assert_eq!(rested.stamina_restored, 30);
    assert_eq!(rested.player.inventory.len(), 1);
}

#[tokio::test]
async fn failed_craft_writes_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let coordinator = sled_coordinator(dir.path());
    let ctx = ActionContext::player();
    let mut player = coordinator.create_player("2", "Ada", &ctx).await.expect("create");
    give(&mut player, coordinator.catalog(), &["Wood", "Wood", "Stone"]);
    coordinator.store().put_player(&player).expect("put");
    let before = coordinator.store().get_player("2").expect("get").expect("stored");

    let err = coordinator
        .craft("2", "stone_shelter", &ctx)
        .await
        .expect_err("short on materials");
    let GameError::MissingMaterials { missing, .. } = err else {
        panic!("expected missing materials");
    };
    let shortfall: Vec<(&str, u32)> = missing
        .iter()
        .map(|m| (m.item.as_str(), m.quantity))
        .collect();
    assert_eq!(shortfall, vec![("Wood", 1), ("Stone", 1)]);

    let after = coordinator.store().get_player("2").expect("get").expect("stored");
    assert_eq!(after, before);

    let blocked = coordinator
        .craft("2", "stone_spear", &ActionContext::player().during_maintenance())
        .await
        .expect_err("maintenance");
    assert!(matches!(blocked, GameError::Maintenance));
}

#[tokio::test]
async fn craft_and_recipes_commands() {
    let dir = TempDir::new().expect("tempdir");
    let coordinator = sled_coordinator(dir.path());
    let session = CommandSession {
        player_id: "3".to_string(),
        display_name: "Wren".to_string(),
        context: ActionContext::player(),
    };
    handle_command(&coordinator, &session, GameCommand::parse("start")).await;
    let mut player = coordinator.store().get_player("3").expect("get").expect("stored");
    give(&mut player, coordinator.catalog(), &["Wood", "Stone"]);
    coordinator.store().put_player(&player).expect("put");

    let recipes = handle_command(&coordinator, &session, GameCommand::parse("r")).await;
    assert_eq!(recipes.len(), 5);
    assert_eq!(recipes[0], "Stone Spear - ready");
    assert_eq!(recipes[1], "Lean-to - need Wood x2");

    let built =
        handle_command(&coordinator, &session, GameCommand::parse("craft stone spear")).await;
    assert_eq!(built[0], "You craft a Stone Spear.");
    assert_eq!(built[1], "Used: Wood x1, Stone x1");

    let again = handle_command(&coordinator, &session, GameCommand::parse("c stone_spear")).await;
    assert_eq!(
        again,
        vec!["To make the Stone Spear you still need Wood x1, Stone x1.".to_string()]
    );

    let unknown = handle_command(&coordinator, &session, GameCommand::parse("build raft")).await;
    assert!(unknown[0].contains("RECIPES"));

    let dropped =
        handle_command(&coordinator, &session, GameCommand::parse("drop STONE SPEAR")).await;
    assert_eq!(dropped, vec!["You leave the Stone Spear behind.".to_string()]);
}
