//! Trade ledger output port trait.

use crate::domain::error::DipshopError;
use crate::domain::ledger::TradeLedger;
use std::path::Path;

/// Port for persisting a finished trade ledger.
pub trait LedgerPort {
    fn write(&self, ledger: &TradeLedger, output_path: &Path) -> Result<(), DipshopError>;
}
