pub mod dto;
pub mod guard;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;

pub use repo_types::{Category, Recipe};

pub fn router() -> Router<AppState> {
    handlers::recipe_routes()
}
