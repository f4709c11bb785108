//! RecipeBox: a personal recipe API where every recipe is visible to its owner only.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod recipes;
pub mod state;
