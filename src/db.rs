use anyhow::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

/// Lazy pool for the server: connections are opened on first use, so the
/// bridge starts (and its health endpoint answers) even when Postgres is
/// unreachable.
pub fn connect_lazy(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_lazy(&config.database.url)?;

    Ok(pool)
}

/// Eager pool for one-shot commands (`init`), failing fast on bad URLs.
pub async fn connect(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;

    Ok(pool)
}
