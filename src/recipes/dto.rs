use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::repo_types::{Category, NewRecipe, RecipePatch};
use crate::error::AppError;

/// Body of `POST /recipes`. Everything is optional at the parse step so that a
/// missing field is reported as a validation error rather than a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub cooking_time: Option<f64>,
}

/// Body of `PUT /recipes/:id`; same shape as create, any subset may be sent.
pub type UpdateRecipeRequest = CreateRecipeRequest;

impl TryFrom<CreateRecipeRequest> for NewRecipe {
    type Error = AppError;

    fn try_from(req: CreateRecipeRequest) -> Result<Self, Self::Error> {
        let title = non_empty(req.title);
        let ingredients = non_empty(req.ingredients);
        let instructions = non_empty(req.instructions);
        let category = non_empty(req.category);
        let photo_url = non_empty(req.photo_url);
        let cooking_time = req.cooking_time.filter(|m| *m != 0.0);

        let missing: Vec<&str> = [
            ("title", title.is_none()),
            ("ingredients", ingredients.is_none()),
            ("instructions", instructions.is_none()),
            ("category", category.is_none()),
            ("photoUrl", photo_url.is_none()),
            ("cookingTime", cooking_time.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (title, ingredients, instructions, category, photo_url, cooking_time) {
            (
                Some(title),
                Some(ingredients),
                Some(instructions),
                Some(category),
                Some(photo_url),
                Some(minutes),
            ) => Ok(NewRecipe {
                title,
                ingredients,
                instructions,
                category: parse_category(&category)?,
                photo_url,
                cooking_time: positive_minutes(minutes)?,
            }),
            _ => Err(AppError::validation(format!(
                "Please fill all fields (missing: {})",
                missing.join(", ")
            ))),
        }
    }
}

/// Empty strings and a zero cooking time count as "not sent", so an update
/// can never blank out a field.
impl TryFrom<UpdateRecipeRequest> for RecipePatch {
    type Error = AppError;

    fn try_from(req: UpdateRecipeRequest) -> Result<Self, Self::Error> {
        Ok(RecipePatch {
            title: non_empty(req.title),
            ingredients: non_empty(req.ingredients),
            instructions: non_empty(req.instructions),
            category: non_empty(req.category)
                .map(|c| parse_category(&c))
                .transpose()?,
            photo_url: non_empty(req.photo_url),
            cooking_time: req
                .cooking_time
                .filter(|m| *m != 0.0)
                .map(positive_minutes)
                .transpose()?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

impl ListQuery {
    /// `None`, an empty value and the frontend's `All` all mean "no filter".
    pub fn category(&self) -> Result<Option<Category>, AppError> {
        match self.category.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(all) if all.eq_ignore_ascii_case("all") => Ok(None),
            Some(other) => parse_category(other).map(Some),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: Uuid,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

fn parse_category(raw: &str) -> Result<Category, AppError> {
    raw.parse()
        .map_err(|e: super::repo_types::UnknownCategory| AppError::validation(e.to_string()))
}

/// Whole minutes only; `45.0` passes, `45.5` does not.
fn positive_minutes(minutes: f64) -> Result<i32, AppError> {
    if minutes.is_finite()
        && minutes.fract() == 0.0
        && minutes > 0.0
        && minutes <= f64::from(i32::MAX)
    {
        Ok(minutes as i32)
    } else {
        Err(AppError::validation("cookingTime must be a positive number of minutes"))
    }
}

/// Accepts `45`, `45.0` and `"45"`, which is what HTML number inputs tend to post.
/// Range and fraction checks happen later so they surface as validation errors.
fn minutes<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(de)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom("cookingTime must be a number")),
    }
}
