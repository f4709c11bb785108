use std::cmp::Reverse;

use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    repo::RecipeStore,
    repo_types::{Category, NewRecipe, Recipe, RecipePatch},
};
use crate::error::StoreError;

/// Process-local recipe store. Records are kept in insertion order.
#[derive(Default)]
pub struct MemoryRecipeStore {
    recipes: RwLock<Vec<Recipe>>,
}

/// Newest first; among equal timestamps the later insert wins.
fn newest_first<'a>(matches: impl DoubleEndedIterator<Item = &'a Recipe>) -> Vec<Recipe> {
    let mut out: Vec<Recipe> = matches.rev().cloned().collect();
    out.sort_by_key(|r| Reverse(r.created_at));
    out
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Recipe>, StoreError> {
        let recipes = self.recipes.read().await;
        Ok(recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn list_by_owner(
        &self,
        owner: Uuid,
        category: Option<Category>,
    ) -> Result<Vec<Recipe>, StoreError> {
        let recipes = self.recipes.read().await;
        Ok(newest_first(
            recipes
                .iter()
                .filter(|r| r.owner == owner)
                .filter(|r| category.map_or(true, |c| r.category == c)),
        ))
    }

    async fn search_by_owner(&self, owner: Uuid, query: &str) -> Result<Vec<Recipe>, StoreError> {
        let needle = query.to_lowercase();
        let recipes = self.recipes.read().await;
        Ok(newest_first(recipes.iter().filter(|r| r.owner == owner).filter(
            |r| {
                r.title.to_lowercase().contains(&needle)
                    || r.ingredients.to_lowercase().contains(&needle)
            },
        )))
    }

    async fn create(&self, owner: Uuid, new: NewRecipe) -> Result<Recipe, StoreError> {
        let now = OffsetDateTime::now_utc();
        let recipe = Recipe {
            id: Uuid::new_v4(),
            title: new.title,
            ingredients: new.ingredients,
            instructions: new.instructions,
            category: new.category,
            photo_url: new.photo_url,
            cooking_time: new.cooking_time,
            owner,
            created_at: now,
            updated_at: now,
        };
        self.recipes.write().await.push(recipe.clone());
        Ok(recipe)
    }

    async fn update(&self, recipe: &Recipe, patch: RecipePatch) -> Result<Recipe, StoreError> {
        let mut recipes = self.recipes.write().await;
        let stored = recipes
            .iter_mut()
            .find(|r| r.id == recipe.id && r.owner == recipe.owner)
            .ok_or(StoreError::NotFound)?;
        patch.apply_to(stored);
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(stored.clone())
    }

    async fn delete(&self, recipe: &Recipe) -> Result<(), StoreError> {
        let mut recipes = self.recipes.write().await;
        let pos = recipes
            .iter()
            .position(|r| r.id == recipe.id && r.owner == recipe.owner)
            .ok_or(StoreError::NotFound)?;
        recipes.remove(pos);
        Ok(())
    }
}
