use anyhow::Context;
use serde::Deserialize;

/// Session lifetime used when `JWT_TTL_MINUTES` is unset or unusable.
pub const DEFAULT_TTL_MINUTES: i64 = 60 * 24;
/// Ten years; longer lifetimes are clamped to this.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365 * 10;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres connection string. `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    /// Report recipes owned by someone else as missing instead of forbidden.
    pub conceal_foreign_recipes: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "recipebox".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "recipebox-users".into()),
            ttl_minutes: parse_ttl(std::env::var("JWT_TTL_MINUTES").ok().as_deref()),
        };
        let conceal_foreign_recipes = std::env::var("CONCEAL_FOREIGN_RECIPES")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        Ok(Self {
            database_url,
            jwt,
            conceal_foreign_recipes,
        })
    }
}

fn parse_ttl(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map_or(DEFAULT_TTL_MINUTES, |v| v.min(MAX_TTL_MINUTES))
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
        },
        conceal_foreign_recipes: false,
    }
}
