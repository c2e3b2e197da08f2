//! Run summary: trade counts, realized and unrealized profit.

use super::backtest::BacktestResult;
use super::ledger::Action;
use super::price_table::PriceTable;

/// Per-symbol figures for a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolResult {
    pub symbol: String,
    pub buys: usize,
    pub sells: usize,
    pub shares_bought: u64,
    pub shares_sold: u64,
    /// Sum of buy notionals.
    pub capital_deployed: f64,
    pub realized_pnl: f64,
    pub open_lots: usize,
    pub open_shares: u64,
    pub average_cost: Option<f64>,
    pub last_price: Option<f64>,
    /// Open shares marked at `last_price`; zero without a price.
    pub unrealized_pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_buys: usize,
    pub total_sells: usize,
    pub capital_deployed: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub sales_won: usize,
    pub sales_lost: usize,
    pub win_rate: f64,
    pub open_lots: usize,
    /// Symbols that traded at least once, in symbol order.
    pub symbols: Vec<SymbolResult>,
}

impl Metrics {
    pub fn compute(result: &BacktestResult, table: &PriceTable) -> Self {
        let symbols: Vec<SymbolResult> = table
            .symbols()
            .iter()
            .map(|symbol| SymbolResult::compute(symbol, result, table))
            .filter(|s| s.buys > 0)
            .collect();

        let sales_won = result.sales.iter().filter(|s| s.pnl() > 0.0).count();
        let sales_lost = result.sales.iter().filter(|s| s.pnl() < 0.0).count();
        let win_rate = if result.sales.is_empty() {
            0.0
        } else {
            sales_won as f64 / result.sales.len() as f64
        };

        Metrics {
            total_buys: result.ledger.count(Action::Buy),
            total_sells: result.ledger.count(Action::Sell),
            capital_deployed: symbols.iter().map(|s| s.capital_deployed).sum(),
            realized_pnl: result.sales.iter().map(|s| s.pnl()).sum(),
            unrealized_pnl: symbols.iter().map(|s| s.unrealized_pnl).sum(),
            sales_won,
            sales_lost,
            win_rate,
            open_lots: symbols.iter().map(|s| s.open_lots).sum(),
            symbols,
        }
    }
}

impl SymbolResult {
    fn compute(symbol: &str, result: &BacktestResult, table: &PriceTable) -> Self {
        let mut buys = 0;
        let mut sells = 0;
        let mut shares_bought = 0;
        let mut shares_sold = 0;
        let mut capital_deployed = 0.0;
        for record in result.ledger.for_symbol(symbol) {
            match record.action {
                Action::Buy => {
                    buys += 1;
                    shares_bought += record.shares;
                    capital_deployed += record.price * record.shares as f64;
                }
                Action::Sell => {
                    sells += 1;
                    shares_sold += record.shares;
                }
            }
        }

        let realized_pnl = result
            .sales
            .iter()
            .filter(|s| s.symbol == symbol)
            .map(|s| s.pnl())
            .sum();

        let lots = result.book.lots(symbol);
        let last_price = table.last_price(symbol);
        let unrealized_pnl = last_price
            .map(|p| lots.iter().map(|l| l.market_value(p) - l.cost()).sum())
            .unwrap_or(0.0);

        SymbolResult {
            symbol: symbol.to_string(),
            buys,
            sells,
            shares_bought,
            shares_sold,
            capital_deployed,
            realized_pnl,
            open_lots: lots.len(),
            open_shares: result.book.total_shares(symbol),
            average_cost: result.book.average_cost(symbol),
            last_price,
            unrealized_pnl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::run_backtest;
    use crate::domain::price_table::PriceRow;
    use crate::domain::strategy::StrategyParams;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn table() -> PriceTable {
        let rows = vec![
            PriceRow::new(d(1))
                .with_price("X", Some(100.0))
                .with_price("Y", Some(50.0)),
            PriceRow::new(d(2))
                .with_price("X", Some(94.0))
                .with_price("Y", Some(50.0)),
            PriceRow::new(d(3))
                .with_price("X", Some(89.0))
                .with_price("Y", Some(51.0)),
            PriceRow::new(d(4))
                .with_price("X", Some(100.0))
                .with_price("Y", None),
        ];
        PriceTable::new(vec!["X".into(), "Y".into()], rows).unwrap()
    }

    fn params() -> StrategyParams {
        StrategyParams {
            lot_size_cash: 1000.0,
            profit_target: 0.05,
            offsets: [5.0, 10.0, 15.0],
        }
    }

    #[test]
    fn compute_summarises_run() {
        let table = table();
        let result = run_backtest(&table, &params()).unwrap();
        let metrics = Metrics::compute(&result, &table);

        // Buys: X 10 @ 94, X 11 @ 89. Sell on day 4: 10 shares @ 100 from the 94 lot.
        assert_eq!(metrics.total_buys, 2);
        assert_eq!(metrics.total_sells, 1);
        assert_eq!(metrics.symbols.len(), 1);
        assert_eq!(metrics.sales_won, 1);
        assert_relative_eq!(metrics.win_rate, 1.0);
        assert_relative_eq!(metrics.capital_deployed, 940.0 + 979.0);
        assert_relative_eq!(metrics.realized_pnl, 60.0);

        let x = &metrics.symbols[0];
        assert_eq!(x.symbol, "X");
        assert_eq!(x.shares_bought, 21);
        assert_eq!(x.shares_sold, 10);
        assert_eq!(x.open_lots, 1);
        assert_eq!(x.open_shares, 11);
        assert_relative_eq!(x.average_cost.unwrap(), 89.0);
        assert_relative_eq!(x.unrealized_pnl, 11.0 * (100.0 - 89.0));
        assert_relative_eq!(metrics.unrealized_pnl, x.unrealized_pnl);
    }

    #[test]
    fn compute_with_no_trades() {
        let table = PriceTable::new(
            vec!["X".into()],
            vec![PriceRow::new(d(1)).with_price("X", Some(10.0))],
        )
        .unwrap();
        let result = run_backtest(&table, &params()).unwrap();
        let metrics = Metrics::compute(&result, &table);
        assert_eq!(metrics.total_buys, 0);
        assert!(metrics.symbols.is_empty());
        assert_relative_eq!(metrics.win_rate, 0.0);
    }
}
