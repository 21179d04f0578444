//! Crafting: turn carried materials into catalog items.
//!
//! Recipes live in the content catalog. Crafting consumes every listed
//! material and yields one product, which must fit in the pack once the
//! materials are gone.

use crate::game::catalog::ContentCatalog;
use crate::game::errors::GameError;
use crate::game::inventory::{self, Admission};
use crate::game::types::{CraftingRecipe, PlayerState, RecipeMaterial};

/// Materials still needed, with the shortfall as the quantity. Empty when the
/// recipe can be crafted.
pub fn missing_materials(state: &PlayerState, recipe: &CraftingRecipe) -> Vec<RecipeMaterial> {
    recipe
        .materials
        .iter()
        .filter_map(|material| {
            let held = inventory::count_item(state, &material.item) as u32;
            (held < material.quantity).then(|| RecipeMaterial {
                item: material.item.clone(),
                quantity: material.quantity - held,
            })
        })
        .collect()
}

/// Consume the materials and add the product. On any error `state` is left
/// exactly as it was.
pub fn craft(
    state: &mut PlayerState,
    recipe: &CraftingRecipe,
    catalog: &ContentCatalog,
) -> Result<String, GameError> {
    let missing = missing_materials(state, recipe);
    if !missing.is_empty() {
        return Err(GameError::MissingMaterials {
            recipe: recipe.name.clone(),
            missing,
        });
    }
    let product = catalog
        .item(&recipe.product)
        .ok_or_else(|| GameError::UnknownRecipe(recipe.id.clone()))?;

    let mut next = state.clone();
    for material in &recipe.materials {
        for _ in 0..material.quantity {
            inventory::remove_item(&mut next, &material.item);
        }
    }
    match inventory::add_item(&mut next, product, catalog) {
        Admission::Fits { .. } => {
            *state = next;
            Ok(product.name.clone())
        }
        Admission::NoSpace { needed, remaining } => Err(GameError::NoSpace {
            item: product.name.clone(),
            needed,
            remaining,
        }),
    }
}
