use tracing::warn;
use uuid::Uuid;

use super::repo_types::Recipe;
use crate::{auth::repo::User, error::AppError, state::AppState};

/// What the caller intends to do with the recipe. Ownership is all-or-nothing
/// today, so every variant gets the same decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Update,
    Delete,
}

impl Access {
    fn denial(self) -> &'static str {
        match self {
            Access::Read => "Access denied",
            Access::Update | Access::Delete => "Not authorized",
        }
    }
}

pub fn recipe_not_found() -> AppError {
    AppError::NotFound("Recipe not found".into())
}

/// Loads `recipe_id` and hands it back only if `principal` owns it.
pub async fn authorize(
    state: &AppState,
    principal: &User,
    recipe_id: Uuid,
    access: Access,
) -> Result<Recipe, AppError> {
    let Some(recipe) = state.recipes.find_by_id(recipe_id).await? else {
        return Err(recipe_not_found());
    };

    if recipe.owner != principal.id {
        warn!(
            user_id = %principal.id,
            recipe_id = %recipe_id,
            access = ?access,
            "access to foreign recipe refused"
        );
        if state.config.conceal_foreign_recipes {
            return Err(recipe_not_found());
        }
        return Err(AppError::Forbidden(access.denial().into()));
    }

    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        auth::repo::NewUser,
        config::test_config,
        recipes::repo_types::{Category, NewRecipe},
    };

    async fn user(state: &AppState, name: &str) -> User {
        state
            .users
            .create(NewUser {
                username: name.into(),
                email: format!("{name}@example.com"),
                password_hash: "$argon2id$stub".into(),
            })
            .await
            .unwrap()
    }

    async fn recipe_of(state: &AppState, owner: &User) -> Recipe {
        state
            .recipes
            .create(
                owner.id,
                NewRecipe {
                    title: "Pho".into(),
                    ingredients: "noodles, broth".into(),
                    instructions: "simmer for hours".into(),
                    category: Category::Dinner,
                    photo_url: "https://img.example/pho.jpg".into(),
                    cooking_time: 240,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn owner_gets_the_recipe() {
        let state = AppState::fake();
        let a = user(&state, "a").await;
        let r = recipe_of(&state, &a).await;

        for access in [Access::Read, Access::Update, Access::Delete] {
            let got = authorize(&state, &a, r.id, access).await.unwrap();
            assert_eq!(got.id, r.id);
        }
    }

    #[tokio::test]
    async fn stranger_is_forbidden() {
        let state = AppState::fake();
        let a = user(&state, "a").await;
        let b = user(&state, "b").await;
        let r = recipe_of(&state, &a).await;

        for access in [Access::Read, Access::Update, Access::Delete] {
            let err = authorize(&state, &b, r.id, access).await.unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
        }
    }

    #[tokio::test]
    async fn missing_recipe_is_not_found() {
        let state = AppState::fake();
        let a = user(&state, "a").await;
        let err = authorize(&state, &a, Uuid::new_v4(), Access::Read)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn concealment_hides_foreign_recipes() {
        let mut config = test_config();
        config.conceal_foreign_recipes = true;
        let state = AppState::in_memory(Arc::new(config));
        let a = user(&state, "a").await;
        let b = user(&state, "b").await;
        let r = recipe_of(&state, &a).await;

        let err = authorize(&state, &b, r.id, Access::Read).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
