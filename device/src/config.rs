use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::sensor::Sensor;

pub const DEFAULT_SENSOR_NAMES: &[&str] = &["vibration", "current"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub connect_addr: String,
    pub workstation_code: String,
    pub sensor_names: Vec<String>,
    pub blink_interval: Duration,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let connect_addr = ledger_addr(&var)?;
        let workstation_code = var("WORKSTATION_CODE")
            .filter(|code| !code.is_empty())
            .ok_or_else(|| anyhow!("WORKSTATION_CODE must be set"))?;

        let sensor_names = match var("SENSOR_NAMES") {
            Some(names) => names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_SENSOR_NAMES.iter().map(|s| s.to_string()).collect(),
        };

        let blink_interval = match var("SENSOR_BLINK_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse()
                    .with_context(|| format!("SENSOR_BLINK_SECS must be whole seconds, was `{secs}`"))?,
            ),
            None => Duration::from_secs(1),
        };

        Ok(Self {
            connect_addr,
            workstation_code,
            sensor_names,
            blink_interval,
        })
    }

    /// Initial sensor set, all inactive, numbered from 1.
    pub fn sensors(&self) -> Vec<Sensor> {
        self.sensor_names
            .iter()
            .zip(1..)
            .map(|(name, id)| Sensor::new(id, name.as_str(), false))
            .collect()
    }
}

/// Ledger address alone, for tools that don't drive a workstation.
pub fn ledger_addr_from_env() -> Result<String> {
    dotenvy::dotenv().ok();
    ledger_addr(&|key: &str| std::env::var(key).ok())
}

fn ledger_addr(var: &impl Fn(&str) -> Option<String>) -> Result<String> {
    var("LEDGER_CONNECT_ADDR").ok_or_else(|| anyhow!("LEDGER_CONNECT_ADDR must be set"))
}
