//! Price table access port trait.

use crate::domain::error::DipshopError;
use crate::domain::price_table::PriceTable;

/// Source of a fully materialised daily closing-price table.
pub trait PricePort {
    fn load_prices(&self) -> Result<PriceTable, DipshopError>;

    /// Human-readable origin, for log lines.
    fn source(&self) -> String;
}
