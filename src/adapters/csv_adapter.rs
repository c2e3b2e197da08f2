//! CSV closing-price table adapter.
//!
//! Reads the wide layout produced by the price download job: a date column followed by one
//! column per symbol. Column names are kept as written (trimmed) and become the symbols in
//! the ledger; two columns that differ only in ASCII case are rejected.
//!
//! ```text
//! Date,INFY,TCS
//! 2024-01-01,1620.5,3790.0
//! 2024-01-02,,3801.25
//! ```

use crate::domain::error::DipshopError;
use crate::domain::price_table::{PriceRow, PriceTable};
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

pub struct CsvPriceAdapter {
    path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Parses CSV text; used by `load_prices` and directly by tests.
    pub fn parse(content: &str) -> Result<PriceTable, DipshopError> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());

        let headers = rdr.headers()?.clone();
        if headers.len() < 2 {
            return Err(DipshopError::EmptyUniverse);
        }
        let symbols: Vec<String> = headers
            .iter()
            .skip(1)
            .map(|h| h.trim().to_string())
            .collect();

        let mut seen = HashSet::new();
        for symbol in &symbols {
            if symbol.is_empty() {
                return Err(DipshopError::PriceData {
                    reason: "blank symbol column header".into(),
                });
            }
            if !seen.insert(symbol.to_ascii_uppercase()) {
                return Err(DipshopError::PriceData {
                    reason: format!("duplicate symbol column {}", symbol),
                });
            }
        }

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;

            let date_str = record.get(0).ok_or_else(|| DipshopError::PriceData {
                reason: "missing date column".into(),
            })?;
            let date = parse_date(date_str)?;

            let mut row = PriceRow::new(date);
            for (i, symbol) in symbols.iter().enumerate() {
                let cell = record.get(i + 1).unwrap_or("");
                let price = parse_price(cell).map_err(|reason| DipshopError::PriceData {
                    reason: format!("{} on {}: {}", symbol, date, reason),
                })?;
                row.prices.insert(symbol.clone(), price);
            }
            rows.push(row);
        }

        PriceTable::new(symbols, rows)
    }
}

impl PricePort for CsvPriceAdapter {
    fn load_prices(&self) -> Result<PriceTable, DipshopError> {
        let content = fs::read_to_string(&self.path).map_err(|e| DipshopError::PriceData {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let table = Self::parse(&content)?;
        log::info!(
            "Loaded {} rows x {} symbols from {}",
            table.row_count(),
            table.symbols().len(),
            self.path.display()
        );
        Ok(table)
    }

    fn source(&self) -> String {
        self.path.display().to_string()
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time and offset
/// (`2024-01-01 00:00:00+05:30`); only the calendar date is kept.
fn parse_date(value: &str) -> Result<NaiveDate, DipshopError> {
    let value = value.trim();
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| DipshopError::PriceData {
        reason: format!("invalid date {:?}: {}", value, e),
    })
}

/// Blank cells and the usual dataframe null spellings are missing prices.
fn parse_price(value: &str) -> Result<Option<f64>, String> {
    let value = value.trim();
    if value.is_empty()
        || ["nan", "null", "na", "none"]
            .iter()
            .any(|m| value.eq_ignore_ascii_case(m))
    {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|e| format!("invalid price {:?}: {}", value, e))
}
