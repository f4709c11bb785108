use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::repo::{MemoryUserStore, PgUserStore, UserStore};
use crate::config::AppConfig;
use crate::recipes::{
    memory::MemoryRecipeStore,
    repo::{PgRecipeStore, RecipeStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub recipes: Arc<dyn RecipeStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let Some(database_url) = config.database_url.clone() else {
            tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on exit");
            return Ok(Self::in_memory(config));
        };

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        Ok(Self {
            config,
            users: Arc::new(PgUserStore::new(db.clone())),
            recipes: Arc::new(PgRecipeStore::new(db)),
        })
    }

    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            users: Arc::new(MemoryUserStore::default()),
            recipes: Arc::new(MemoryRecipeStore::default()),
        }
    }

    #[cfg(test)]
    pub(crate) fn fake() -> Self {
        Self::in_memory(Arc::new(crate::config::test_config()))
    }
}
