use std::str::FromStr;

use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::info;

use crate::config::PoolConfig;

const APPLICATION_NAME: &str = "placementflow";

/// Connection options for `database_url` with the session settings from `cfg`
/// sent as startup parameters.
pub fn connect_options(database_url: &str, cfg: &PoolConfig) -> anyhow::Result<PgConnectOptions> {
    let mut opts = PgConnectOptions::from_str(database_url)
        .context("DATABASE_URL is not a valid postgres url")?
        .application_name(APPLICATION_NAME);

    let mut session: Vec<(&str, String)> = Vec::new();
    if cfg.disable_jit {
        session.push(("jit", "off".to_string()));
    }
    if let Some(timeout) = cfg.statement_timeout {
        session.push(("statement_timeout", format!("{}ms", timeout.as_millis())));
    }
    if !session.is_empty() {
        opts = opts.options(session);
    }

    Ok(opts)
}

pub async fn make_pool(database_url: &str, cfg: &PoolConfig) -> anyhow::Result<PgPool> {
    let opts = connect_options(database_url, cfg)?;

    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(cfg.acquire_timeout)
        .connect_with(opts)
        .await
        .context("connecting to postgres")?;

    info!(
        max_connections = cfg.max_connections,
        acquire_timeout_secs = cfg.acquire_timeout.as_secs(),
        "postgres pool ready"
    );
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("running migrations")?;
    Ok(())
}
