use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use crate::jobs::calendar::zone_from_offset_minutes;
use crate::jobs::scheduler::{ScheduleConfig, DEFAULT_DAILY_CRON, DEFAULT_FREQUENT_CRON};
use crate::jobs::AutoAdvanceConfig;

/// Runtime configuration, loaded from the environment (and `.env` when present).
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub admin_addr: Option<String>,
    pub migrate_on_startup: bool,

    pub scheduler_enabled: bool,
    pub daily_cron: String,
    pub frequent_cron: String,

    /// Evaluation zone for "today", as whole minutes east of UTC.
    pub utc_offset_minutes: i32,
    pub max_concurrent_updates: usize,

    pub pool: PoolConfig,
}

/// Connection pool settings, applied by [`crate::db::make_pool`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Server-side `statement_timeout`; `None` keeps the server default.
    pub statement_timeout: Option<Duration>,
    /// Sends `jit=off` at connect time.
    pub disable_jit: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 8,
            acquire_timeout: Duration::from_secs(10),
            statement_timeout: None,
            disable_jit: true,
        }
    }
}

impl PoolConfig {
    fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let max_connections = parse_bounded(
            "PLACEMENT_DB_MAX_CONNECTIONS",
            env_or_fallback("PLACEMENT_DB_MAX_CONNECTIONS", "DB_MAX_CONNECTIONS"),
            defaults.max_connections,
            1..=64,
        )?;

        let acquire_timeout_secs: u64 = parse_bounded(
            "PLACEMENT_DB_ACQUIRE_TIMEOUT_SECS",
            env_or_fallback("PLACEMENT_DB_ACQUIRE_TIMEOUT_SECS", "DB_ACQUIRE_TIMEOUT_SECS"),
            defaults.acquire_timeout.as_secs(),
            1..=120,
        )?;

        // 0 = no timeout
        let statement_timeout_ms: u64 = parse_bounded(
            "PLACEMENT_DB_STATEMENT_TIMEOUT_MS",
            env_or_fallback("PLACEMENT_DB_STATEMENT_TIMEOUT_MS", "DB_STATEMENT_TIMEOUT_MS"),
            0,
            0..=600_000,
        )?;

        Ok(Self {
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            statement_timeout: (statement_timeout_ms > 0)
                .then(|| Duration::from_millis(statement_timeout_ms)),
            disable_jit: env_bool("PLACEMENT_DB_DISABLE_JIT").unwrap_or(defaults.disable_jit),
        })
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL is missing"))?;

        let admin_addr = env_or_fallback("PLACEMENT_ADMIN_ADDR", "ADMIN_ADDR")
            .and_then(|s| normalize_optional_addr(&s));

        let migrate_on_startup = env_bool("PLACEMENT_MIGRATE_ON_STARTUP").unwrap_or(false);
        let scheduler_enabled = env_bool("PLACEMENT_SCHEDULER_ENABLED").unwrap_or(true);

        let daily_cron = env_or_fallback("PLACEMENT_DAILY_CRON", "DAILY_CRON")
            .unwrap_or_else(|| DEFAULT_DAILY_CRON.to_string());
        let frequent_cron = env_or_fallback("PLACEMENT_FREQUENT_CRON", "FREQUENT_CRON")
            .unwrap_or_else(|| DEFAULT_FREQUENT_CRON.to_string());

        let utc_offset_minutes = parse_bounded(
            "PLACEMENT_UTC_OFFSET_MINUTES",
            env_or_fallback("PLACEMENT_UTC_OFFSET_MINUTES", "UTC_OFFSET_MINUTES"),
            0,
            -(24 * 60 - 1)..=(24 * 60 - 1),
        )?;
        // fail at startup rather than on the first tick
        zone_from_offset_minutes(utc_offset_minutes)?;

        let max_concurrent_updates = parse_bounded(
            "PLACEMENT_MAX_CONCURRENT_UPDATES",
            env_or_fallback("PLACEMENT_MAX_CONCURRENT_UPDATES", "MAX_CONCURRENT_UPDATES"),
            8,
            1..=64,
        )?;

        Ok(Self {
            database_url,
            admin_addr,
            migrate_on_startup,
            scheduler_enabled,
            daily_cron,
            frequent_cron,
            utc_offset_minutes,
            max_concurrent_updates,
            pool: PoolConfig::from_env()?,
        })
    }

    pub fn auto_advance(&self) -> anyhow::Result<AutoAdvanceConfig> {
        Ok(AutoAdvanceConfig {
            zone: zone_from_offset_minutes(self.utc_offset_minutes)?,
            max_concurrent_updates: self.max_concurrent_updates,
        })
    }

    pub fn schedule(&self) -> ScheduleConfig {
        ScheduleConfig {
            daily_cron: self.daily_cron.clone(),
            frequent_cron: self.frequent_cron.clone(),
        }
    }
}

fn env_or_fallback(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| std::env::var(fallback).ok().filter(|s| !s.trim().is_empty()))
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

/// Unset means `default`; anything set must parse and lie in `range`.
fn parse_bounded<T>(
    key: &str,
    raw: Option<String>,
    default: T,
    range: RangeInclusive<T>,
) -> anyhow::Result<T>
where
    T: FromStr + PartialOrd + Display + Copy,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: T = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{key} is not a number: {raw:?}"))?;
    if !range.contains(&value) {
        anyhow::bail!(
            "{key} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        );
    }
    Ok(value)
}

fn normalize_optional_addr(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    if matches!(v.to_lowercase().as_str(), "0" | "off" | "false" | "none") {
        return None;
    }
    Some(v.to_string())
}
