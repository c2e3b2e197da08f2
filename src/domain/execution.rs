//! Buy and sell decisions.
//!
//! Buys are evaluated per symbol and are independent of one another within a day, so the
//! decision step is pure and the commit step mutates the book. Sells are a single reduction
//! across the whole universe after every buy of the day has been committed.

use chrono::NaiveDate;

use super::ledger::{Action, TradeLedger, TradeRecord};
use super::portfolio::PositionBook;
use super::position::{Lot, RealizedSale};
use super::price_table::PriceRow;
use super::reference::TriggerUsage;
use super::strategy::StrategyParams;
use super::trigger::{level_label, triggers, LEVELS};

/// A trigger hit that produced a non-zero share count.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyDecision {
    pub symbol: String,
    pub level: usize,
    pub price: f64,
    pub shares: u64,
}

/// Scans the trigger levels shallowest first and returns the first unused level the price
/// has crossed with a non-zero share count.
///
/// A crossed level that cannot afford a single share is left unused (it can fire on a later
/// day) and the scan moves on to the deeper levels.
pub fn evaluate_buy(
    symbol: &str,
    price: f64,
    reference: Option<f64>,
    used: &[bool; LEVELS],
    params: &StrategyParams,
) -> Option<BuyDecision> {
    let reference = reference.filter(|r| *r > 0.0)?;
    let levels = triggers(reference, &params.offsets);

    for (level, trigger) in levels.iter().enumerate() {
        if used[level] || price > *trigger {
            continue;
        }
        let shares = (params.lot_size_cash / price).floor() as u64;
        if shares == 0 {
            continue;
        }
        return Some(BuyDecision {
            symbol: symbol.to_string(),
            level,
            price,
            shares,
        });
    }
    None
}

/// Opens the lot, records the trade and consumes the trigger.
pub fn commit_buy(
    decision: BuyDecision,
    date: NaiveDate,
    params: &StrategyParams,
    book: &mut PositionBook,
    usage: &mut TriggerUsage,
    ledger: &mut TradeLedger,
) {
    let annotation = level_label(&params.offsets, decision.level);
    log::debug!(
        "{date}: BUY {} {} @ {:.2} ({annotation})",
        decision.symbol,
        decision.shares,
        decision.price
    );
    usage.mark_used(&decision.symbol, decision.level);
    book.open_lot(Lot {
        symbol: decision.symbol.clone(),
        entry_price: decision.price,
        entry_date: date,
        shares: decision.shares,
    });
    ledger.push(TradeRecord {
        date,
        symbol: decision.symbol,
        action: Action::Buy,
        price: decision.price,
        shares: decision.shares,
        annotation,
    });
}

/// A holding trading above its profit target.
#[derive(Debug, Clone, PartialEq)]
pub struct SellCandidate {
    pub symbol: String,
    pub price: f64,
    pub average_cost: f64,
}

impl SellCandidate {
    pub fn gain(&self) -> f64 {
        self.price / self.average_cost - 1.0
    }
}

/// Every open position whose current price exceeds `average_cost * (1 + profit_target)`,
/// in symbol order. Symbols without a price on `row` are skipped.
pub fn sell_candidates(
    book: &PositionBook,
    row: &PriceRow,
    params: &StrategyParams,
) -> Vec<SellCandidate> {
    book.holdings()
        .filter_map(|(symbol, _)| {
            let price = row.price(symbol)?;
            let average_cost = book.average_cost(symbol)?;
            (price / average_cost > 1.0 + params.profit_target).then(|| SellCandidate {
                symbol: symbol.to_string(),
                price,
                average_cost,
            })
        })
        .collect()
}

/// Largest gain wins; equal gains go to the lexicographically smallest symbol.
pub fn select_sell(candidates: &[SellCandidate]) -> Option<&SellCandidate> {
    let mut best: Option<&SellCandidate> = None;
    for candidate in candidates {
        best = match best {
            Some(b) if candidate.gain() > b.gain() => Some(candidate),
            Some(b) if candidate.gain() == b.gain() && candidate.symbol < b.symbol => {
                Some(candidate)
            }
            Some(b) => Some(b),
            None => Some(candidate),
        };
    }
    best
}

#[derive(Debug, Clone, PartialEq)]
pub struct SellDecision {
    pub symbol: String,
    pub price: f64,
    pub average_cost: f64,
    /// Size of the smallest open lot.
    pub shares: u64,
}

impl SellDecision {
    pub fn gain(&self) -> f64 {
        self.price / self.average_cost - 1.0
    }
}

/// Picks at most one holding to trim today, sized to its smallest open lot.
pub fn evaluate_sell(
    book: &PositionBook,
    row: &PriceRow,
    params: &StrategyParams,
) -> Option<SellDecision> {
    let candidates = sell_candidates(book, row, params);
    let winner = select_sell(&candidates)?;
    let shares = book.smallest_lot(&winner.symbol)?;
    Some(SellDecision {
        symbol: winner.symbol.clone(),
        price: winner.price,
        average_cost: winner.average_cost,
        shares,
    })
}

/// Consumes the shares FIFO, records the trade and returns the realized sale.
pub fn commit_sell(
    decision: SellDecision,
    date: NaiveDate,
    params: &StrategyParams,
    book: &mut PositionBook,
    ledger: &mut TradeLedger,
) -> RealizedSale {
    let fills = book.sell_fifo(&decision.symbol, decision.shares);
    let annotation = sell_reason(params, decision.gain());
    log::debug!(
        "{date}: SELL {} {} @ {:.2} ({annotation})",
        decision.symbol,
        decision.shares,
        decision.price
    );
    let sale = RealizedSale::from_fills(date, &decision.symbol, decision.price, &fills);
    ledger.push(TradeRecord {
        date,
        symbol: decision.symbol,
        action: Action::Sell,
        price: decision.price,
        shares: decision.shares,
        annotation,
    });
    sale
}

/// `">5% above avg buy (9.3%)"`.
pub fn sell_reason(params: &StrategyParams, gain: f64) -> String {
    format!(
        ">{}% above avg buy ({:.1}%)",
        params.profit_target_pct(),
        gain * 100.0
    )
}
