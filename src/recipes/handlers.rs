use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderName, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateRecipeRequest, DeleteResponse, ListQuery, SearchQuery, UpdateRecipeRequest},
    guard::{authorize, recipe_not_found, Access},
    repo_types::{NewRecipe, Recipe, RecipePatch},
};
use crate::{
    auth::AuthUser,
    error::{AppError, StoreError},
    state::AppState,
};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/search", get(search_recipes))
        .route(
            "/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
}

/// A malformed id cannot name an existing recipe.
fn recipe_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id).map_err(|_| recipe_not_found())
}

/// The recipe was deleted between the guard check and the write.
fn vanished(e: StoreError) -> AppError {
    match e {
        StoreError::NotFound => recipe_not_found(),
        other => other.into(),
    }
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Recipe>>, AppError> {
    let Query(q) = query?;
    let category = q.category()?;
    let recipes = state.recipes.list_by_owner(user.id, category).await?;
    Ok(Json(recipes))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn search_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Recipe>>, AppError> {
    let Query(q) = query?;
    let query = q.query.as_deref().map(str::trim).unwrap_or_default();
    let recipes = state.recipes.search_by_owner(user.id, query).await?;
    Ok(Json(recipes))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateRecipeRequest>, JsonRejection>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<Recipe>), AppError> {
    let Json(payload) = payload?;
    let new = NewRecipe::try_from(payload)?;
    let recipe = state.recipes.create(user.id, new).await?;

    info!(recipe_id = %recipe.id, "recipe created");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/recipes/{}", recipe.id))],
        Json(recipe),
    ))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Recipe>, AppError> {
    let id = recipe_id(path)?;
    let recipe = authorize(&state, &user, id, Access::Read).await?;
    Ok(Json(recipe))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateRecipeRequest>, JsonRejection>,
) -> Result<Json<Recipe>, AppError> {
    let id = recipe_id(path)?;
    let recipe = authorize(&state, &user, id, Access::Update).await?;
    let Json(payload) = payload?;
    let patch = RecipePatch::try_from(payload)?;

    let updated = state.recipes.update(&recipe, patch).await.map_err(vanished)?;
    info!(recipe_id = %updated.id, "recipe updated");
    Ok(Json(updated))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id = recipe_id(path)?;
    let recipe = authorize(&state, &user, id, Access::Delete).await?;

    state.recipes.delete(&recipe).await.map_err(vanished)?;
    info!(recipe_id = %recipe.id, "recipe deleted");
    Ok(Json(DeleteResponse {
        message: "Recipe deleted successfully".into(),
        id: recipe.id,
    }))
}
