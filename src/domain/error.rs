//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for dipshop.
#[derive(Debug, thiserror::Error)]
pub enum DipshopError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("price data error: {reason}")]
    PriceData { reason: String },

    #[error("dates out of order: {current} follows {previous}")]
    NonMonotonicDates {
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("duplicate date {0}")]
    DuplicateDate(NaiveDate),

    #[error("invalid price {price} for {symbol} on {date}")]
    InvalidPrice {
        symbol: String,
        date: NaiveDate,
        price: f64,
    },

    #[error("price table has no symbols")]
    EmptyUniverse,

    #[error("unknown code {0} (not a column of the price table)")]
    UnknownCode(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DipshopError {
    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            DipshopError::Io(_) | DipshopError::Csv(_) => 1,
            DipshopError::ConfigParse { .. }
            | DipshopError::ConfigMissing { .. }
            | DipshopError::ConfigInvalid { .. } => 2,
            DipshopError::PriceData { .. }
            | DipshopError::NonMonotonicDates { .. }
            | DipshopError::DuplicateDate(_)
            | DipshopError::InvalidPrice { .. } => 3,
            DipshopError::EmptyUniverse | DipshopError::UnknownCode(_) => 5,
        }
    }
}

impl From<&DipshopError> for std::process::ExitCode {
    fn from(err: &DipshopError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
