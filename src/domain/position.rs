//! Open lots and realized sales.

use chrono::NaiveDate;

/// Remaining shares of one buy.
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    pub symbol: String,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub shares: u64,
}

impl Lot {
    pub fn cost(&self) -> f64 {
        self.entry_price * self.shares as f64
    }

    pub fn market_value(&self, price: f64) -> f64 {
        price * self.shares as f64
    }
}

/// Shares taken out of a single lot by a sell.
#[derive(Debug, Clone, PartialEq)]
pub struct LotFill {
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub shares: u64,
}

/// A sell together with the FIFO cost basis of the shares it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct RealizedSale {
    pub date: NaiveDate,
    pub symbol: String,
    pub shares: u64,
    pub exit_price: f64,
    pub cost_basis: f64,
}

impl RealizedSale {
    pub fn from_fills(
        date: NaiveDate,
        symbol: &str,
        exit_price: f64,
        fills: &[LotFill],
    ) -> Self {
        RealizedSale {
            date,
            symbol: symbol.to_string(),
            shares: fills.iter().map(|f| f.shares).sum(),
            exit_price,
            cost_basis: fills.iter().map(|f| f.entry_price * f.shares as f64).sum(),
        }
    }

    pub fn proceeds(&self) -> f64 {
        self.exit_price * self.shares as f64
    }

    pub fn pnl(&self) -> f64 {
        self.proceeds() - self.cost_basis
    }
}
