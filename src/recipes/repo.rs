use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Category, NewRecipe, Recipe, RecipePatch, RecipeRow};
use crate::error::StoreError;

/// Recipe persistence. Every query except `find_by_id` is scoped to one owner
/// in the query itself; `find_by_id` exists for the ownership guard.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Recipe>, StoreError>;

    /// Newest first.
    async fn list_by_owner(
        &self,
        owner: Uuid,
        category: Option<Category>,
    ) -> Result<Vec<Recipe>, StoreError>;

    /// Case-insensitive literal substring match on title or ingredients, newest first.
    async fn search_by_owner(&self, owner: Uuid, query: &str) -> Result<Vec<Recipe>, StoreError>;

    async fn create(&self, owner: Uuid, new: NewRecipe) -> Result<Recipe, StoreError>;

    /// Fails with [`StoreError::NotFound`] if the recipe vanished in the meantime.
    async fn update(&self, recipe: &Recipe, patch: RecipePatch) -> Result<Recipe, StoreError>;

    async fn delete(&self, recipe: &Recipe) -> Result<(), StoreError>;
}

const RECIPE_COLUMNS: &str = "id, owner_id, title, ingredients, instructions, category, \
                              photo_url, cooking_time, created_at, updated_at";

pub struct PgRecipeStore {
    db: PgPool,
}

impl PgRecipeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_recipes(rows: Vec<RecipeRow>) -> Result<Vec<Recipe>, StoreError> {
    rows.into_iter()
        .map(|r| Recipe::try_from(r).context("decode recipe row").map_err(StoreError::from))
        .collect()
}

fn into_recipe(row: RecipeRow) -> Result<Recipe, StoreError> {
    Ok(Recipe::try_from(row).context("decode recipe row")?)
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Recipe>, StoreError> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(into_recipe).transpose()
    }

    async fn list_by_owner(
        &self,
        owner: Uuid,
        category: Option<Category>,
    ) -> Result<Vec<Recipe>, StoreError> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            SELECT {RECIPE_COLUMNS}
            FROM recipes
            WHERE owner_id = $1
              AND ($2::text IS NULL OR category = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner)
        .bind(category.map(Category::as_str))
        .fetch_all(&self.db)
        .await?;
        into_recipes(rows)
    }

    async fn search_by_owner(&self, owner: Uuid, query: &str) -> Result<Vec<Recipe>, StoreError> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            SELECT {RECIPE_COLUMNS}
            FROM recipes
            WHERE owner_id = $1
              AND (title ILIKE $2 ESCAPE '\' OR ingredients ILIKE $2 ESCAPE '\')
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner)
        .bind(like_pattern(query))
        .fetch_all(&self.db)
        .await?;
        into_recipes(rows)
    }

    async fn create(&self, owner: Uuid, new: NewRecipe) -> Result<Recipe, StoreError> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            INSERT INTO recipes
                (id, owner_id, title, ingredients, instructions, category, photo_url, cooking_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&new.title)
        .bind(&new.ingredients)
        .bind(&new.instructions)
        .bind(new.category.as_str())
        .bind(&new.photo_url)
        .bind(new.cooking_time)
        .fetch_one(&self.db)
        .await?;
        into_recipe(row)
    }

    async fn update(&self, recipe: &Recipe, patch: RecipePatch) -> Result<Recipe, StoreError> {
        // owner_id is never written after insert.
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            UPDATE recipes SET
                title        = COALESCE($3, title),
                ingredients  = COALESCE($4, ingredients),
                instructions = COALESCE($5, instructions),
                category     = COALESCE($6, category),
                photo_url    = COALESCE($7, photo_url),
                cooking_time = COALESCE($8, cooking_time),
                updated_at   = clock_timestamp()
            WHERE id = $1 AND owner_id = $2
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(recipe.id)
        .bind(recipe.owner)
        .bind(patch.title)
        .bind(patch.ingredients)
        .bind(patch.instructions)
        .bind(patch.category.map(Category::as_str))
        .bind(patch.photo_url)
        .bind(patch.cooking_time)
        .fetch_optional(&self.db)
        .await?;
        row.map(into_recipe).transpose()?.ok_or(StoreError::NotFound)
    }

    async fn delete(&self, recipe: &Recipe) -> Result<(), StoreError> {
        let done = sqlx::query("DELETE FROM recipes WHERE id = $1 AND owner_id = $2")
            .bind(recipe.id)
            .bind(recipe.owner)
            .execute(&self.db)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// `%query%` with LIKE metacharacters escaped, so the match is a literal substring.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 2);
    out.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}
