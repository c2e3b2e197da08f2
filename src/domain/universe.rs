//! Symbol universe selection and coverage checks.
//!
//! Parses code lists from configuration and reports symbols that cannot trade in a given
//! year because they had no price on that year's first row.

use crate::domain::price_table::PriceTable;
use std::collections::HashSet;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if seen.contains(&code) {
            return Err(UniverseError::DuplicateCode(code));
        }
        seen.insert(code.clone());
        codes.push(code);
    }

    Ok(codes)
}

/// A symbol with no reference price for `year`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingReference {
    pub year: i32,
    pub symbol: String,
}

/// Lists every (year, symbol) pair where the symbol has no price on the first row of the
/// year, in date then symbol order. Such symbols cannot buy for the rest of that year.
pub fn missing_references(table: &PriceTable) -> Vec<MissingReference> {
    let mut missing = Vec::new();
    let mut previous_year = None;
    for row in table.rows() {
        let year = row.year();
        if previous_year == Some(year) {
            continue;
        }
        previous_year = Some(year);
        for symbol in table.symbols() {
            if row.price(symbol).is_none() {
                missing.push(MissingReference {
                    year,
                    symbol: symbol.clone(),
                });
            }
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_table::PriceRow;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_codes_basic() {
        let result = parse_codes("RELIANCE,TCS,INFY").unwrap();
        assert_eq!(result, vec!["RELIANCE", "TCS", "INFY"]);
    }

    #[test]
    fn test_parse_codes_with_whitespace_and_case() {
        let result = parse_codes("  reliance , TCS ,infy").unwrap();
        assert_eq!(result, vec!["RELIANCE", "TCS", "INFY"]);
    }

    #[test]
    fn test_parse_codes_keeps_punctuation() {
        let result = parse_codes("M&M,BAJAJ-AUTO").unwrap();
        assert_eq!(result, vec!["M&M", "BAJAJ-AUTO"]);
    }

    #[test]
    fn test_parse_codes_empty_token() {
        let result = parse_codes("TCS,,INFY");
        assert!(matches!(result, Err(UniverseError::EmptyToken)));
    }

    #[test]
    fn test_parse_codes_duplicate() {
        let result = parse_codes("TCS,INFY,tcs");
        assert!(matches!(result, Err(UniverseError::DuplicateCode(s)) if s == "TCS"));
    }

    #[test]
    fn missing_references_checks_first_row_of_each_year() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let rows = vec![
            PriceRow::new(d(2023, 12, 28))
                .with_price("TCS", Some(3700.0))
                .with_price("JIOFIN", None),
            PriceRow::new(d(2023, 12, 29))
                .with_price("TCS", Some(3710.0))
                .with_price("JIOFIN", Some(250.0)),
            PriceRow::new(d(2024, 1, 1))
                .with_price("TCS", None)
                .with_price("JIOFIN", Some(252.0)),
        ];
        let table = PriceTable::new(vec!["TCS".into(), "JIOFIN".into()], rows).unwrap();

        let missing = missing_references(&table);
        assert_eq!(
            missing,
            vec![
                MissingReference {
                    year: 2023,
                    symbol: "JIOFIN".into()
                },
                MissingReference {
                    year: 2024,
                    symbol: "TCS".into()
                },
            ]
        );
    }
}
