//! Error types for snapshot construction.
//!
//! Only two failure kinds exist. A [`ConfigurationError`] is a caller mistake
//! and surfaces immediately. A [`RetrievalError`] comes from the upstream
//! provider and is absorbed by the snapshot builder, which turns it into an
//! empty snapshot with a failure message.

use thiserror::Error;

/// Bad market, period, or roster input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("unknown market `{0}`")]
    UnknownMarket(String),

    #[error("unsupported period `{0}`; expected one of 1 Day, 5 Days, 1 Month, 3 Months, 6 Months, 1 Year, YTD")]
    UnsupportedPeriod(String),

    #[error("market `{0}` has no instruments")]
    EmptyMarket(String),

    #[error("market `{market}` has {count} instruments; one request carries at most {max}")]
    TooManyInstruments { market: String, count: usize, max: usize },

    #[error("duplicate symbol `{symbol}` in market `{market}`")]
    DuplicateSymbol { market: String, symbol: String },

    #[error("instrument `{symbol}` has non-positive weight {weight}")]
    InvalidWeight { symbol: String, weight: f64 },
}

/// Upstream data provider failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalError {
    /// Transport failure or timeout
    #[error("request failed: {0}")]
    Transport(String),

    /// Provider answered with a non-success status
    #[error("provider returned HTTP {0}")]
    Status(u16),

    /// Body could not be decoded
    #[error("malformed provider response: {0}")]
    Decode(String),

    /// Provider reported an error object
    #[error("provider error: {0}")]
    Provider(String),

    #[error("provider returned no price data")]
    Empty,
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RetrievalError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            RetrievalError::Status(status.as_u16())
        } else {
            RetrievalError::Transport(err.to_string())
        }
    }
}
