//! Core domain types and logic.

pub mod price_table;
pub mod strategy;
pub mod trigger;
pub mod reference;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod ledger;
pub mod backtest;
pub mod metrics;
pub mod universe;
pub mod config_validation;
pub mod error;
