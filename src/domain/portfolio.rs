//! Position book: open lots per symbol in FIFO order.

use std::collections::BTreeMap;

use super::position::{Lot, LotFill};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionBook {
    lots: BTreeMap<String, Vec<Lot>>,
}

impl PositionBook {
    /// Empty book with an (empty) lot list for every symbol of the universe.
    pub fn new(symbols: &[String]) -> Self {
        PositionBook {
            lots: symbols.iter().map(|s| (s.clone(), Vec::new())).collect(),
        }
    }

    pub fn open_lot(&mut self, lot: Lot) {
        self.lots.entry(lot.symbol.clone()).or_default().push(lot);
    }

    /// Open lots of `symbol`, oldest first.
    pub fn lots(&self, symbol: &str) -> &[Lot] {
        self.lots.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        !self.lots(symbol).is_empty()
    }

    /// Symbols that currently hold at least one lot, in symbol order.
    pub fn holdings(&self) -> impl Iterator<Item = (&str, &[Lot])> {
        self.lots
            .iter()
            .filter(|(_, lots)| !lots.is_empty())
            .map(|(symbol, lots)| (symbol.as_str(), lots.as_slice()))
    }

    pub fn total_shares(&self, symbol: &str) -> u64 {
        self.lots(symbol).iter().map(|l| l.shares).sum()
    }

    /// Share-weighted mean entry price of the open lots. Computed on every call.
    pub fn average_cost(&self, symbol: &str) -> Option<f64> {
        let lots = self.lots(symbol);
        let shares: u64 = lots.iter().map(|l| l.shares).sum();
        if shares == 0 {
            return None;
        }
        let cost: f64 = lots.iter().map(Lot::cost).sum();
        Some(cost / shares as f64)
    }

    /// Share count of the smallest open lot.
    pub fn smallest_lot(&self, symbol: &str) -> Option<u64> {
        self.lots(symbol).iter().map(|l| l.shares).min()
    }

    /// Removes `shares` from the oldest lots first. Lots emptied by the sell are dropped.
    /// Returns what was taken from each lot; never takes more than is open.
    pub fn sell_fifo(&mut self, symbol: &str, shares: u64) -> Vec<LotFill> {
        let Some(lots) = self.lots.get_mut(symbol) else {
            return Vec::new();
        };

        let mut remaining = shares;
        let mut fills = Vec::new();
        for lot in lots.iter_mut() {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(lot.shares);
            if take == 0 {
                continue;
            }
            lot.shares -= take;
            remaining -= take;
            fills.push(LotFill {
                entry_price: lot.entry_price,
                entry_date: lot.entry_date,
                shares: take,
            });
        }
        lots.retain(|l| l.shares > 0);
        fills
    }
}
