use std::str::FromStr;

use anyhow::{anyhow, bail, Result};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5555";

/// What to do with the database schema at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbStartup {
    MakeTables,
    Keep,
}

impl FromStr for DbStartup {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "make_tables" => Ok(DbStartup::MakeTables),
            "none" => Ok(DbStartup::Keep),
            other => bail!("DB_STARTUP must be `make_tables` or `none`, was `{other}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub db_startup: DbStartup,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = var("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;
        let bind_addr = var("LEDGER_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let db_startup = match var("DB_STARTUP") {
            Some(value) => value.parse()?,
            None => DbStartup::MakeTables,
        };

        Ok(Self {
            database_url,
            bind_addr,
            db_startup,
        })
    }
}
