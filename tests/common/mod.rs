#![allow(dead_code)]

use chrono::NaiveDate;
use dipshop::domain::backtest::BacktestConfig;
use dipshop::domain::error::DipshopError;
use dipshop::domain::ledger::TradeLedger;
use dipshop::domain::price_table::{PriceRow, PriceTable};
use dipshop::domain::strategy::StrategyParams;
use dipshop::ports::ledger_port::LedgerPort;
use dipshop::ports::price_port::PricePort;
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct MockPricePort {
    pub table: Option<PriceTable>,
    pub error: Option<String>,
}

impl MockPricePort {
    pub fn new(table: PriceTable) -> Self {
        Self {
            table: Some(table),
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            table: None,
            error: Some(reason.to_string()),
        }
    }
}

impl PricePort for MockPricePort {
    fn load_prices(&self) -> Result<PriceTable, DipshopError> {
        if let Some(reason) = &self.error {
            return Err(DipshopError::PriceData {
                reason: reason.clone(),
            });
        }
        self.table.clone().ok_or_else(|| DipshopError::PriceData {
            reason: "no table".into(),
        })
    }

    fn source(&self) -> String {
        "mock".into()
    }
}

/// Captures written ledgers instead of touching the filesystem.
#[derive(Default)]
pub struct MockLedgerPort {
    pub written: RefCell<Vec<(TradeLedger, PathBuf)>>,
}

impl LedgerPort for MockLedgerPort {
    fn write(&self, ledger: &TradeLedger, output_path: &Path) -> Result<(), DipshopError> {
        self.written
            .borrow_mut()
            .push((ledger.clone(), output_path.to_path_buf()));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Row from `(symbol, price)` pairs; `None` marks a missing price.
pub fn row(d: &str, prices: &[(&str, Option<f64>)]) -> PriceRow {
    prices
        .iter()
        .fold(PriceRow::new(parse_date(d)), |row, (symbol, price)| {
            row.with_price(symbol, *price)
        })
}

/// Single-symbol table from `(date, price)` pairs.
pub fn series(symbol: &str, points: &[(&str, f64)]) -> PriceTable {
    let rows = points
        .iter()
        .map(|(d, p)| row(d, &[(symbol, Some(*p))]))
        .collect();
    PriceTable::new(vec![symbol.to_string()], rows).unwrap()
}

pub fn table(symbols: &[&str], rows: Vec<PriceRow>) -> PriceTable {
    PriceTable::new(symbols.iter().map(|s| s.to_string()).collect(), rows).unwrap()
}

/// Round-number parameters: offsets 5/10/15, 1000 cash per lot, 5% target.
pub fn simple_params() -> StrategyParams {
    StrategyParams {
        lot_size_cash: 1000.0,
        profit_target: 0.05,
        offsets: [5.0, 10.0, 15.0],
    }
}

pub fn sample_config(ledger_path: PathBuf) -> BacktestConfig {
    BacktestConfig {
        prices: PathBuf::from("prices.csv"),
        start_date: None,
        end_date: None,
        codes: None,
        ledger_path,
        print_trades: false,
        params: simple_params(),
    }
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
