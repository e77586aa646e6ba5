use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::net::TcpListener;
use tokio::signal;

use monitor_backend::config::{Config, DbStartup};
use monitor_backend::db::Db;
use monitor_backend::ledger::Ledger;
use monitor_backend::server;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;

    let mut db = Db::connect(&config.database_url)
        .with_context(|| format!("cannot open {}", config.database_url))?;
    if config.db_startup == DbStartup::MakeTables {
        db.create_tables()?;
    }
    let ledger = Arc::new(Mutex::new(Ledger::new(db)));

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.bind_addr))?;
    warn!("Ledger protocol is unauthenticated and unencrypted; expose it on trusted networks only");

    tokio::select! {
        res = server::serve(listener, ledger) => res?,
        Ok(()) = signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
