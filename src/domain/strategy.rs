//! Strategy parameters: lot sizing, profit target and the three trigger depths.

use crate::domain::error::DipshopError;

pub const DEFAULT_LOT_SIZE_CASH: f64 = 5000.0;
pub const DEFAULT_PROFIT_TARGET: f64 = 0.05;
pub const DEFAULT_OFFSETS: [f64; 3] = [4.13, 8.26, 12.39];

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    /// Cash committed per trigger hit.
    pub lot_size_cash: f64,
    /// Fraction above average cost that makes a holding sellable (0.05 = 5%).
    pub profit_target: f64,
    /// Trigger depths in percent below the yearly reference, shallowest first.
    pub offsets: [f64; 3],
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            lot_size_cash: DEFAULT_LOT_SIZE_CASH,
            profit_target: DEFAULT_PROFIT_TARGET,
            offsets: DEFAULT_OFFSETS,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), DipshopError> {
        if !self.lot_size_cash.is_finite() || self.lot_size_cash <= 0.0 {
            return Err(invalid("lot_size_cash", "lot_size_cash must be positive"));
        }
        if !self.profit_target.is_finite() || self.profit_target <= 0.0 {
            return Err(invalid("profit_target", "profit_target must be positive"));
        }
        for (i, offset) in self.offsets.iter().enumerate() {
            if !offset.is_finite() || *offset <= 0.0 || *offset >= 100.0 {
                return Err(invalid(
                    &offset_key(i),
                    "offset must be a percentage between 0 and 100",
                ));
            }
        }
        for i in 1..self.offsets.len() {
            if self.offsets[i] <= self.offsets[i - 1] {
                return Err(invalid(
                    &offset_key(i),
                    "offsets must be strictly ascending",
                ));
            }
        }
        Ok(())
    }

    /// Profit target expressed in percent for display, e.g. `5` or `7.5`.
    pub fn profit_target_pct(&self) -> String {
        format_pct(self.profit_target * 100.0)
    }
}

/// Config key of the offset at `index` (`offset_1` .. `offset_3`).
pub fn offset_key(index: usize) -> String {
    format!("offset_{}", index + 1)
}

/// Rounds to two decimals and drops a trailing `.0`.
pub fn format_pct(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

fn invalid(key: &str, reason: &str) -> DipshopError {
    DipshopError::ConfigInvalid {
        section: "strategy".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
