//! CSV trade ledger writer implementing LedgerPort.

use crate::domain::error::DipshopError;
use crate::domain::ledger::TradeLedger;
use crate::ports::ledger_port::LedgerPort;
use std::io::Write;
use std::path::Path;

/// Writes `date,symbol,action,price,shares,annotation` rows.
pub struct CsvLedgerAdapter;

impl CsvLedgerAdapter {
    pub fn write_to<W: Write>(ledger: &TradeLedger, out: W) -> Result<(), DipshopError> {
        let mut wtr = csv::Writer::from_writer(out);
        if ledger.is_empty() {
            wtr.write_record(["date", "symbol", "action", "price", "shares", "annotation"])?;
        }
        for record in ledger {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl LedgerPort for CsvLedgerAdapter {
    fn write(&self, ledger: &TradeLedger, output_path: &Path) -> Result<(), DipshopError> {
        let file = std::fs::File::create(output_path)?;
        Self::write_to(ledger, file)?;
        log::info!(
            "Wrote {} trades to {}",
            ledger.len(),
            output_path.display()
        );
        Ok(())
    }
}
