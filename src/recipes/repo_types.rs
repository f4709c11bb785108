use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Breakfast,
    Lunch,
    Dinner,
    Dessert,
    Snack,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Breakfast,
        Category::Lunch,
        Category::Dinner,
        Category::Dessert,
        Category::Snack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Breakfast => "Breakfast",
            Category::Lunch => "Lunch",
            Category::Dinner => "Dinner",
            Category::Dessert => "Dessert",
            Category::Snack => "Snack",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A recipe as returned to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub ingredients: String,
    pub instructions: String,
    pub category: Category,
    pub photo_url: String,
    pub cooking_time: i32, // minutes
    pub owner: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub ingredients: String,
    pub instructions: String,
    pub category: String,
    pub photo_url: String,
    pub cooking_time: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = UnknownCategory;

    fn try_from(r: RecipeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            title: r.title,
            ingredients: r.ingredients,
            instructions: r.instructions,
            category: r.category.parse()?,
            photo_url: r.photo_url,
            cooking_time: r.cooking_time,
            owner: r.owner_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Fields of a recipe about to be created. Every field is present and non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub title: String,
    pub ingredients: String,
    pub instructions: String,
    pub category: Category,
    pub photo_url: String,
    pub cooking_time: i32,
}

/// Partial update. `None` leaves the stored value alone, `Some` replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
    pub category: Option<Category>,
    pub photo_url: Option<String>,
    pub cooking_time: Option<i32>,
}

impl RecipePatch {
    pub fn apply_to(self, recipe: &mut Recipe) {
        if let Some(v) = self.title {
            recipe.title = v;
        }
        if let Some(v) = self.ingredients {
            recipe.ingredients = v;
        }
        if let Some(v) = self.instructions {
            recipe.instructions = v;
        }
        if let Some(v) = self.category {
            recipe.category = v;
        }
        if let Some(v) = self.photo_url {
            recipe.photo_url = v;
        }
        if let Some(v) = self.cooking_time {
            recipe.cooking_time = v;
        }
    }
}
