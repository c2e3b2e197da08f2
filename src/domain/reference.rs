//! Year-scoped reference prices and trigger usage.
//!
//! The first row processed in a calendar year fixes each symbol's reference price for the
//! whole year and re-arms every trigger. A symbol without a price on that row has no
//! reference until the next year begins.

use crate::domain::price_table::PriceRow;
use crate::domain::trigger::LEVELS;
use std::collections::BTreeMap;

/// Per-symbol "already bought at this level this year" flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerUsage {
    flags: BTreeMap<String, [bool; LEVELS]>,
}

impl TriggerUsage {
    /// All-false flags for every symbol of the universe.
    pub fn fresh(symbols: &[String]) -> Self {
        Self {
            flags: symbols.iter().map(|s| (s.clone(), [false; LEVELS])).collect(),
        }
    }

    pub fn flags(&self, symbol: &str) -> [bool; LEVELS] {
        self.flags.get(symbol).copied().unwrap_or([false; LEVELS])
    }

    pub fn is_used(&self, symbol: &str, level: usize) -> bool {
        self.flags(symbol)[level]
    }

    pub fn mark_used(&mut self, symbol: &str, level: usize) {
        self.flags.entry(symbol.to_string()).or_insert([false; LEVELS])[level] = true;
    }

    pub fn any_used(&self) -> bool {
        self.flags.values().any(|f| f.iter().any(|&used| used))
    }
}

/// Reference price per symbol for the active year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    prices: BTreeMap<String, f64>,
}

impl ReferenceTable {
    /// Reference prices taken from the present prices of `row`.
    pub fn from_row(row: &PriceRow) -> Self {
        Self {
            prices: row
                .present()
                .map(|(symbol, price)| (symbol.to_string(), price))
                .collect(),
        }
    }

    /// Usable reference for `symbol`: absent or non-positive references yield `None`.
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied().filter(|p| *p > 0.0)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct YearlyReferenceTracker {
    year: Option<i32>,
    references: ReferenceTable,
    usage: TriggerUsage,
}

impl YearlyReferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rolls the year-scoped state over when `row` starts a new calendar year (or is the
    /// first row ever seen). Returns `true` on rollover.
    pub fn observe(&mut self, row: &PriceRow, symbols: &[String]) -> bool {
        let year = row.year();
        if self.year == Some(year) {
            return false;
        }
        self.usage = TriggerUsage::fresh(symbols);
        self.references = ReferenceTable::from_row(row);
        self.year = Some(year);
        log::debug!(
            "{}: new year {}, {} of {} symbols have a reference price",
            row.date,
            year,
            self.references.len(),
            symbols.len()
        );
        true
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    pub fn usage(&self) -> &TriggerUsage {
        &self.usage
    }

    pub fn usage_mut(&mut self) -> &mut TriggerUsage {
        &mut self.usage
    }
}
