//! Configuration validation.
//!
//! Validates all config fields before a backtest runs. Absent strategy keys fall back to
//! defaults; present keys must parse.

use crate::domain::error::DipshopError;
use crate::domain::strategy::{offset_key, StrategyParams};
use crate::domain::universe::parse_codes;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), DipshopError> {
    validate_dates(config)?;
    validate_codes(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), DipshopError> {
    strategy_params(config)?.validate()
}

/// Strategy parameters from the `[strategy]` section, defaulting absent keys.
pub fn strategy_params(config: &dyn ConfigPort) -> Result<StrategyParams, DipshopError> {
    let defaults = StrategyParams::default();
    let mut offsets = defaults.offsets;
    for (i, offset) in offsets.iter_mut().enumerate() {
        if let Some(value) = read_f64(config, "strategy", &offset_key(i))? {
            *offset = value;
        }
    }
    Ok(StrategyParams {
        lot_size_cash: read_f64(config, "strategy", "lot_size_cash")?
            .unwrap_or(defaults.lot_size_cash),
        profit_target: read_f64(config, "strategy", "profit_target")?
            .unwrap_or(defaults.profit_target),
        offsets,
    })
}

/// Numeric value of `[section] key`; `None` when absent, an error when not a number.
pub fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, DipshopError> {
    match config.get_nonempty(section, key) {
        None => Ok(None),
        Some(s) => s.parse::<f64>().map(Some).map_err(|_| DipshopError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{:?} is not a number", s),
        }),
    }
}

/// `YYYY-MM-DD` date of `[section] key`; `None` when absent.
pub fn read_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, DipshopError> {
    match config.get_nonempty(section, key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| DipshopError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", key),
            }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), DipshopError> {
    let start_date = read_date(config, "data", "start_date")?;
    let end_date = read_date(config, "data", "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(DipshopError::ConfigInvalid {
                section: "data".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_codes(config: &dyn ConfigPort) -> Result<(), DipshopError> {
    if let Some(codes) = config.get_nonempty("data", "codes") {
        parse_codes(&codes).map_err(|e| DipshopError::ConfigInvalid {
            section: "data".to_string(),
            key: "codes".to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}
