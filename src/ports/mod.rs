//! Port traits (hexagonal architecture boundaries).

pub mod config_port;
pub mod price_port;
pub mod ledger_port;
