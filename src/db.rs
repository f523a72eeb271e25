use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::{Auth, PgUserStore};
use crate::config::AppConfig;

/// Open the connection pool and, if configured, apply embedded migrations.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;

    if config.run_migrations {
        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }
    }
    Ok(db)
}

/// Build an [`Auth`] facade over PostgreSQL from the environment.
pub async fn init_auth() -> anyhow::Result<Auth<PgUserStore>> {
    let config = AppConfig::from_env()?;
    let db = connect(&config).await?;
    Ok(Auth::new(PgUserStore::new(db)))
}
