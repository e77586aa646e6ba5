pub mod config;
pub mod connection;
pub mod device;
pub mod indicator;
pub mod listeners;
pub mod operator;
pub mod sensor;
pub mod state;
pub mod worker;

#[cfg(test)]
pub(crate) mod fakes;
