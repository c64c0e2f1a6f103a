//! Common data structures and error types shared by all ports

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Common result type for port operations
pub type PortResult<T> = Result<T, PortError>;

/// Error hierarchy for port operations
///
/// Collaborator failures are surfaced to the caller unmodified; the core
/// never retries on its own (the next scheduled tick retries naturally).
#[derive(Error, Debug)]
pub enum PortError {
    /// History source failure (fetch, decode, coverage)
    #[error("History source error: {0}")]
    History(String),

    /// Live price feed failure
    #[error("Price feed error: {0}")]
    Feed(String),

    /// Exchange calendar lookup failure
    #[error("Calendar error: {0}")]
    Calendar(String),

    /// Brokerage failure (holdings lookup, order submission, cancellation)
    #[error("Brokerage error: {0}")]
    Brokerage(String),

    /// Instrument unknown to the collaborator
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),
}

/// Identifier for a tracked instrument (ticker symbol, e.g. "EWA")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(String);

impl InstrumentId {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentId {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

/// Single historical price observation for one instrument
///
/// Produced once per bar by the history source. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Timestamp of the bar (bucket boundary, UTC)
    pub timestamp: DateTime<Utc>,

    /// Closing price, non-negative
    pub close: Decimal,
}

impl Bar {
    pub fn new(timestamp: DateTime<Utc>, close: Decimal) -> Self {
        Self { timestamp, close }
    }
}

/// Bar resolution supported by the history source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Daily,
    Minute,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Daily => f.write_str("daily"),
            Resolution::Minute => f.write_str("minute"),
        }
    }
}

// Decimal is used for all monetary values (prices, weights, quantities) so
// long backtests do not accumulate binary floating-point drift. Timestamps
// are UTC throughout; serialization uses ISO 8601 strings.
