//! Market data ports: historical bars, live closes, exchange calendar
//!
//! All three are consumed by the rebalance cycle once per tick. History
//! retrieval is treated as a blocking call that completes within the tick;
//! there are no streaming subscriptions in this core.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::ports::models::{Bar, InstrumentId, PortResult, Resolution};

/// Historical price source
///
/// Every tracked instrument is queried with the identical lookback so that
/// non-alignment is detectable by the caller rather than silently tolerated.
/// The source never fills gaps or interpolates; a short series shows up as a
/// bar-count mismatch in the cycle's precondition checks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Fetch the most recent bars covering `lookback` at the given
    /// resolution, in chronological order.
    async fn history(
        &self,
        instrument: &InstrumentId,
        lookback: Duration,
        resolution: Resolution,
    ) -> PortResult<Vec<Bar>>;

    /// Readiness indicator: true once the source has enough history
    /// populated for the instrument to serve a full lookback.
    async fn is_ready(&self, instrument: &InstrumentId) -> PortResult<bool>;
}

/// Live price snapshot, queried once per cycle per instrument
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LivePriceFeed: Send + Sync {
    async fn current_close(&self, instrument: &InstrumentId) -> PortResult<Decimal>;
}

/// Exchange trading-hours calendar
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeCalendar: Send + Sync {
    async fn is_open(&self, instrument: &InstrumentId, at: DateTime<Utc>) -> PortResult<bool>;
}
