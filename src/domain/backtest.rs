//! Backtest engine and day loop.
//!
//! Each row runs through the same fixed pipeline: yearly reference maintenance, buy
//! evaluation for every symbol, then a single sell evaluation for the whole universe.

use chrono::NaiveDate;
use std::path::PathBuf;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::error::DipshopError;
use super::execution::{commit_buy, commit_sell, evaluate_buy, evaluate_sell, BuyDecision};
use super::ledger::TradeLedger;
use super::portfolio::PositionBook;
use super::position::RealizedSale;
use super::price_table::{PriceRow, PriceTable};
use super::reference::YearlyReferenceTracker;
use super::strategy::StrategyParams;

/// Everything a run needs besides the prices themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub prices: PathBuf,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Universe subset; `None` trades every column of the price table.
    pub codes: Option<Vec<String>>,
    pub ledger_path: PathBuf,
    pub print_trades: bool,
    pub params: StrategyParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    AwaitingRow,
    ProcessingRow,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub ledger: TradeLedger,
    pub book: PositionBook,
    pub sales: Vec<RealizedSale>,
    pub rows_processed: usize,
}

/// Incremental engine. Feed rows with [`Backtest::step`] in date order; stopping early leaves
/// a valid ledger prefix.
#[derive(Debug, Clone)]
pub struct Backtest {
    params: StrategyParams,
    symbols: Vec<String>,
    tracker: YearlyReferenceTracker,
    book: PositionBook,
    ledger: TradeLedger,
    sales: Vec<RealizedSale>,
    last_date: Option<NaiveDate>,
    rows_processed: usize,
    state: EngineState,
}

impl Backtest {
    pub fn new(params: StrategyParams, symbols: &[String]) -> Result<Self, DipshopError> {
        params.validate()?;
        if symbols.is_empty() {
            return Err(DipshopError::EmptyUniverse);
        }
        let mut symbols = symbols.to_vec();
        symbols.sort();
        symbols.dedup();
        Ok(Backtest {
            book: PositionBook::new(&symbols),
            params,
            symbols,
            tracker: YearlyReferenceTracker::new(),
            ledger: TradeLedger::new(),
            sales: Vec::new(),
            last_date: None,
            rows_processed: 0,
            state: EngineState::AwaitingRow,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    pub fn book(&self) -> &PositionBook {
        &self.book
    }

    pub fn tracker(&self) -> &YearlyReferenceTracker {
        &self.tracker
    }

    /// Processes one trading day. Rows must arrive in strictly ascending date order and hold
    /// only universe symbols with positive finite prices; a rejected row changes nothing.
    pub fn step(&mut self, row: &PriceRow) -> Result<(), DipshopError> {
        if let Some(prev) = self.last_date {
            if row.date == prev {
                return Err(DipshopError::DuplicateDate(row.date));
            }
            if row.date < prev {
                return Err(DipshopError::NonMonotonicDates {
                    previous: prev,
                    current: row.date,
                });
            }
        }
        row.validate(&self.symbols)?;
        self.state = EngineState::ProcessingRow;

        self.tracker.observe(row, &self.symbols);

        for decision in self.buy_decisions(row) {
            commit_buy(
                decision,
                row.date,
                &self.params,
                &mut self.book,
                self.tracker.usage_mut(),
                &mut self.ledger,
            );
        }

        if let Some(decision) = evaluate_sell(&self.book, row, &self.params) {
            let sale = commit_sell(
                decision,
                row.date,
                &self.params,
                &mut self.book,
                &mut self.ledger,
            );
            self.sales.push(sale);
        }

        self.last_date = Some(row.date);
        self.rows_processed += 1;
        self.state = EngineState::AwaitingRow;
        Ok(())
    }

    /// Buy decisions for every symbol, in symbol order. Evaluated against the state left by
    /// the previous day; nothing is committed here.
    fn buy_decisions(&self, row: &PriceRow) -> Vec<BuyDecision> {
        let evaluate = |symbol: &String| self.buy_decision(row, symbol);

        #[cfg(feature = "parallel")]
        {
            self.symbols.par_iter().filter_map(evaluate).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            self.symbols.iter().filter_map(evaluate).collect()
        }
    }

    fn buy_decision(&self, row: &PriceRow, symbol: &str) -> Option<BuyDecision> {
        let price = row.price(symbol)?;
        evaluate_buy(
            symbol,
            price,
            self.tracker.references().get(symbol),
            &self.tracker.usage().flags(symbol),
            &self.params,
        )
    }

    pub fn finish(mut self) -> BacktestResult {
        self.state = EngineState::Done;
        BacktestResult {
            ledger: self.ledger,
            book: self.book,
            sales: self.sales,
            rows_processed: self.rows_processed,
        }
    }
}

/// Runs the whole table and returns the completed ledger and final book.
pub fn run_backtest(
    table: &PriceTable,
    params: &StrategyParams,
) -> Result<BacktestResult, DipshopError> {
    let mut engine = Backtest::new(params.clone(), table.symbols())?;
    for row in table.rows() {
        engine.step(row)?;
    }
    let result = engine.finish();
    log::info!(
        "Processed {} rows: {} trades ({} open lots)",
        result.rows_processed,
        result.ledger.len(),
        result.book.holdings().map(|(_, lots)| lots.len()).sum::<usize>()
    );
    Ok(result)
}
