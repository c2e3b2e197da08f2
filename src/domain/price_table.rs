//! Daily closing-price table: one row per trading day, one column per symbol.

use crate::domain::error::DipshopError;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// One trading day of closing prices. A symbol that is absent from `prices`, or mapped to
/// `None`, has no price that day.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub prices: BTreeMap<String, Option<f64>>,
}

impl PriceRow {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            prices: BTreeMap::new(),
        }
    }

    /// Builder helper used by adapters and tests.
    pub fn with_price(mut self, symbol: &str, price: Option<f64>) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied().flatten()
    }

    /// Checks every entry against the sorted `universe`: the symbol must belong to it and a
    /// present price must be positive and finite.
    pub fn validate(&self, universe: &[String]) -> Result<(), DipshopError> {
        for (symbol, price) in &self.prices {
            if universe.binary_search(symbol).is_err() {
                return Err(DipshopError::UnknownCode(symbol.clone()));
            }
            if let Some(p) = price {
                if !p.is_finite() || *p <= 0.0 {
                    return Err(DipshopError::InvalidPrice {
                        symbol: symbol.clone(),
                        date: self.date,
                        price: *p,
                    });
                }
            }
        }
        Ok(())
    }

    /// Symbols with a present price on this row, in symbol order.
    pub fn present(&self) -> impl Iterator<Item = (&str, f64)> {
        self.prices
            .iter()
            .filter_map(|(symbol, price)| price.map(|p| (symbol.as_str(), p)))
    }
}

/// Validated, date-ordered price table over a fixed symbol universe.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    symbols: Vec<String>,
    rows: Vec<PriceRow>,
}

impl PriceTable {
    /// Validates the preconditions of a simulation run: a non-empty universe, strictly
    /// ascending dates, and positive finite prices for every present observation.
    pub fn new(symbols: Vec<String>, rows: Vec<PriceRow>) -> Result<Self, DipshopError> {
        let universe: Vec<String> = symbols
            .into_iter()
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        if universe.is_empty() {
            return Err(DipshopError::EmptyUniverse);
        }

        let mut previous: Option<NaiveDate> = None;
        for row in &rows {
            if let Some(prev) = previous {
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
            previous = Some(row.date);
            row.validate(&universe)?;
        }

        Ok(Self {
            symbols: universe,
            rows,
        })
    }

    /// Sorted symbol universe.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Most recent present price for `symbol`, scanning backwards from the last row.
    pub fn last_price(&self, symbol: &str) -> Option<f64> {
        self.rows.iter().rev().find_map(|r| r.price(symbol))
    }

    /// Number of rows on which `symbol` has a price.
    pub fn present_count(&self, symbol: &str) -> usize {
        self.rows.iter().filter(|r| r.price(symbol).is_some()).count()
    }

    /// Keeps only rows within `[start, end]` (either bound optional).
    pub fn between(self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let rows = self
            .rows
            .into_iter()
            .filter(|r| start.is_none_or(|s| r.date >= s) && end.is_none_or(|e| r.date <= e))
            .collect();
        Self {
            symbols: self.symbols,
            rows,
        }
    }

    /// Narrows the universe to `codes`, matched against column names ignoring ASCII case.
    /// The kept symbols retain the column spelling. Every code must name a column.
    pub fn restrict(self, codes: &[String]) -> Result<Self, DipshopError> {
        let mut kept = Vec::with_capacity(codes.len());
        for code in codes {
            let symbol = self
                .symbols
                .iter()
                .find(|s| s.eq_ignore_ascii_case(code))
                .ok_or_else(|| DipshopError::UnknownCode(code.clone()))?;
            kept.push(symbol.clone());
        }
        let keep: BTreeSet<&String> = kept.iter().collect();
        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                row.prices.retain(|symbol, _| keep.contains(symbol));
                row
            })
            .collect();
        PriceTable::new(kept, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn symbols() -> Vec<String> {
        vec!["TCS".into(), "INFY".into()]
    }

    #[test]
    fn new_sorts_universe() {
        let table = PriceTable::new(symbols(), vec![]).unwrap();
        assert_eq!(table.symbols(), &["INFY".to_string(), "TCS".to_string()]);
        assert!(table.is_empty());
    }

    #[test]
    fn new_rejects_empty_universe() {
        let result = PriceTable::new(vec![], vec![PriceRow::new(d(2024, 1, 1))]);
        assert!(matches!(result, Err(DipshopError::EmptyUniverse)));
    }

    #[test]
    fn new_rejects_duplicate_dates() {
        let rows = vec![PriceRow::new(d(2024, 1, 2)), PriceRow::new(d(2024, 1, 2))];
        let result = PriceTable::new(symbols(), rows);
        assert!(matches!(result, Err(DipshopError::DuplicateDate(date)) if date == d(2024, 1, 2)));
    }

    #[test]
    fn new_rejects_descending_dates() {
        let rows = vec![PriceRow::new(d(2024, 1, 3)), PriceRow::new(d(2024, 1, 2))];
        let result = PriceTable::new(symbols(), rows);
        assert!(matches!(result, Err(DipshopError::NonMonotonicDates { .. })));
    }

    #[test]
    fn new_rejects_non_positive_price() {
        let rows = vec![PriceRow::new(d(2024, 1, 2)).with_price("TCS", Some(0.0))];
        let result = PriceTable::new(symbols(), rows);
        assert!(matches!(result, Err(DipshopError::InvalidPrice { symbol, .. }) if symbol == "TCS"));
    }

    #[test]
    fn new_rejects_nan_price() {
        let rows = vec![PriceRow::new(d(2024, 1, 2)).with_price("TCS", Some(f64::NAN))];
        assert!(PriceTable::new(symbols(), rows).is_err());
    }

    #[test]
    fn new_rejects_symbol_outside_universe() {
        let rows = vec![PriceRow::new(d(2024, 1, 2)).with_price("WIPRO", Some(10.0))];
        let result = PriceTable::new(symbols(), rows);
        assert!(matches!(result, Err(DipshopError::UnknownCode(s)) if s == "WIPRO"));
    }

    #[test]
    fn row_validate_checks_universe_and_price() {
        let universe = vec!["INFY".to_string(), "TCS".to_string()];
        let ok = PriceRow::new(d(2024, 1, 2))
            .with_price("TCS", Some(10.0))
            .with_price("INFY", None);
        assert!(ok.validate(&universe).is_ok());

        let negative = PriceRow::new(d(2024, 1, 2)).with_price("TCS", Some(-1.0));
        assert!(matches!(
            negative.validate(&universe),
            Err(DipshopError::InvalidPrice { .. })
        ));

        let unknown = PriceRow::new(d(2024, 1, 2)).with_price("WIPRO", Some(10.0));
        assert!(matches!(
            unknown.validate(&universe),
            Err(DipshopError::UnknownCode(s)) if s == "WIPRO"
        ));
    }

    #[test]
    fn row_price_treats_absent_and_none_as_missing() {
        let row = PriceRow::new(d(2024, 1, 2))
            .with_price("TCS", Some(3500.0))
            .with_price("INFY", None);
        assert_eq!(row.price("TCS"), Some(3500.0));
        assert_eq!(row.price("INFY"), None);
        assert_eq!(row.price("WIPRO"), None);
        assert_eq!(row.present().collect::<Vec<_>>(), vec![("TCS", 3500.0)]);
    }

    #[test]
    fn last_price_skips_trailing_gaps() {
        let rows = vec![
            PriceRow::new(d(2024, 1, 2)).with_price("TCS", Some(100.0)),
            PriceRow::new(d(2024, 1, 3)).with_price("TCS", Some(101.0)),
            PriceRow::new(d(2024, 1, 4)).with_price("TCS", None),
        ];
        let table = PriceTable::new(symbols(), rows).unwrap();
        assert_eq!(table.last_price("TCS"), Some(101.0));
        assert_eq!(table.last_price("INFY"), None);
        assert_eq!(table.present_count("TCS"), 2);
    }

    #[test]
    fn between_filters_inclusive() {
        let rows = vec![
            PriceRow::new(d(2024, 1, 2)),
            PriceRow::new(d(2024, 1, 3)),
            PriceRow::new(d(2024, 1, 4)),
        ];
        let table = PriceTable::new(symbols(), rows).unwrap();
        let table = table.between(Some(d(2024, 1, 3)), Some(d(2024, 1, 4)));
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.first_date(), Some(d(2024, 1, 3)));
        assert_eq!(table.last_date(), Some(d(2024, 1, 4)));
    }

    #[test]
    fn restrict_drops_other_columns() {
        let rows = vec![
            PriceRow::new(d(2024, 1, 2))
                .with_price("TCS", Some(100.0))
                .with_price("INFY", Some(50.0)),
        ];
        let table = PriceTable::new(symbols(), rows).unwrap();
        let table = table.restrict(&["INFY".to_string()]).unwrap();
        assert_eq!(table.symbols(), &["INFY".to_string()]);
        assert_eq!(table.rows()[0].price("TCS"), None);
        assert_eq!(table.rows()[0].price("INFY"), Some(50.0));
    }

    #[test]
    fn restrict_matches_codes_ignoring_case() {
        let rows = vec![
            PriceRow::new(d(2024, 1, 2))
                .with_price("Reliance", Some(2900.0))
                .with_price("TCS", Some(3800.0)),
        ];
        let table = PriceTable::new(vec!["Reliance".into(), "TCS".into()], rows).unwrap();
        let table = table.restrict(&["RELIANCE".to_string()]).unwrap();
        assert_eq!(table.symbols(), &["Reliance".to_string()]);
        assert_eq!(table.rows()[0].price("Reliance"), Some(2900.0));
    }

    #[test]
    fn restrict_rejects_unknown_code() {
        let table = PriceTable::new(symbols(), vec![]).unwrap();
        let result = table.restrict(&["WIPRO".to_string()]);
        assert!(matches!(result, Err(DipshopError::UnknownCode(s)) if s == "WIPRO"));
    }
}
