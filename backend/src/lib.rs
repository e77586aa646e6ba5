pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod schema;
pub mod server;
pub mod utils;
