//! Rebalance Cycle
//!
//! One pass of the pipeline per scheduling tick: precondition checks,
//! spread over the aligned window, z-score signal, sizing, and order
//! emission. Any failed precondition skips the cycle entirely; nothing is
//! emitted and the next tick retries naturally.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::signal::{compute_signal, SignalError, SignalState};
use crate::domain::sizing::{size, OrderDelta, SizingError};
use crate::domain::spread::{combine, combined_series, SpreadError};
use crate::domain::weights::WeightSet;
use crate::domain::window::{AlignError, AlignedWindow};
use crate::ports::execution::{HoldingsAccessor, OrderGateway};
use crate::ports::market_data::{ExchangeCalendar, HistorySource, LivePriceFeed};
use crate::ports::models::{InstrumentId, PortError, Resolution};

/// Expected, non-fatal reasons to take no action this tick
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Exchange closed for a tracked instrument
    MarketClosed(InstrumentId),
    /// History not yet sufficiently populated
    HistoryNotReady(InstrumentId),
    /// Historical bar counts differ across instruments
    BarCountMismatch {
        instrument: InstrumentId,
        expected: usize,
        actual: usize,
    },
    /// Fewer than 2 aligned bars; variance degenerate
    WindowTooShort(usize),
    /// Bucket timestamps diverge across instruments
    TimestampMisalignment {
        bucket: usize,
        instrument: InstrumentId,
    },
    /// Observation set does not match the weight set (data integrity)
    MissingInstrument(InstrumentId),
    /// Flat combined-price series; z-score undefined
    DegenerateStdDev,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MarketClosed(id) => write!(f, "market closed for {id}"),
            SkipReason::HistoryNotReady(id) => write!(f, "history not ready for {id}"),
            SkipReason::BarCountMismatch {
                instrument,
                expected,
                actual,
            } => write!(
                f,
                "bar count mismatch for {instrument}: expected {expected}, got {actual}"
            ),
            SkipReason::WindowTooShort(n) => write!(f, "window too short: {n} aligned bars"),
            SkipReason::TimestampMisalignment { bucket, instrument } => {
                write!(f, "timestamp misalignment at bucket {bucket} for {instrument}")
            }
            SkipReason::MissingInstrument(id) => write!(f, "missing observation for {id}"),
            SkipReason::DegenerateStdDev => write!(f, "degenerate standard deviation"),
        }
    }
}

impl From<AlignError> for SkipReason {
    fn from(err: AlignError) -> Self {
        match err {
            AlignError::NoInstruments => SkipReason::WindowTooShort(0),
            AlignError::BarCountMismatch {
                instrument,
                expected,
                actual,
            } => SkipReason::BarCountMismatch {
                instrument,
                expected,
                actual,
            },
            AlignError::WindowTooShort(n) => SkipReason::WindowTooShort(n),
            AlignError::TimestampMismatch {
                bucket, instrument, ..
            } => SkipReason::TimestampMisalignment { bucket, instrument },
        }
    }
}

impl From<SpreadError> for SkipReason {
    fn from(err: SpreadError) -> Self {
        match err {
            SpreadError::MissingInstrument(id) | SpreadError::UnexpectedInstrument(id) => {
                SkipReason::MissingInstrument(id)
            }
        }
    }
}

impl From<SignalError> for SkipReason {
    fn from(err: SignalError) -> Self {
        match err {
            SignalError::WindowTooShort(n) => SkipReason::WindowTooShort(n),
            SignalError::DegenerateStdDev => SkipReason::DegenerateStdDev,
        }
    }
}

impl From<SizingError> for SkipReason {
    fn from(err: SizingError) -> Self {
        match err {
            SizingError::MissingHolding(id) => SkipReason::MissingInstrument(id),
        }
    }
}

/// Outcome of one cycle invocation
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Signal computed and non-zero deltas forwarded to the gateway
    Rebalanced {
        signal: SignalState,
        orders: Vec<OrderDelta>,
    },
    /// Precondition failed; nothing was emitted
    Skipped(SkipReason),
}

/// Collaborator failures surface unmodified; no retry in the core
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Port(#[from] PortError),
}

/// External collaborators consumed by the cycle
#[derive(Clone)]
pub struct CyclePorts {
    pub history: Arc<dyn HistorySource>,
    pub feed: Arc<dyn LivePriceFeed>,
    pub calendar: Arc<dyn ExchangeCalendar>,
    pub holdings: Arc<dyn HoldingsAccessor>,
    pub gateway: Arc<dyn OrderGateway>,
}

/// The orchestration unit: holds immutable configuration plus the port
/// handles; every mutable input (time, holdings, prices) is read fresh
/// per invocation.
pub struct RebalanceCycle {
    weights: WeightSet,
    lookback: Duration,
    resolution: Resolution,
    unit_size: Decimal,
    ports: CyclePorts,
}

impl RebalanceCycle {
    pub fn new(
        weights: WeightSet,
        lookback: Duration,
        resolution: Resolution,
        unit_size: Decimal,
        ports: CyclePorts,
    ) -> Self {
        Self {
            weights,
            lookback,
            resolution,
            unit_size,
            ports,
        }
    }

    pub fn weights(&self) -> &WeightSet {
        &self.weights
    }

    /// Run one rebalance pass at the given time.
    ///
    /// Precondition order: calendar, readiness, open-order cancellation
    /// (a side effect, not a check), bar counts, window length, bucket
    /// alignment. The first failure skips the cycle.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<CycleOutcome, CycleError> {
        if let Some(reason) = self.check_preconditions(now).await? {
            tracing::debug!(%reason, "Cycle skipped");
            return Ok(CycleOutcome::Skipped(reason));
        }

        for instrument in self.weights.instruments() {
            self.ports.gateway.cancel_open_orders(instrument).await?;
        }

        let mut series = Vec::with_capacity(self.weights.len());
        for instrument in self.weights.instruments() {
            let bars = self
                .ports
                .history
                .history(instrument, self.lookback, self.resolution)
                .await?;
            series.push((instrument.clone(), bars));
        }

        let window = match AlignedWindow::align(&series) {
            Ok(window) => window,
            Err(err) => return Ok(self.skip(err.into())),
        };

        let combined = match combined_series(&window, &self.weights) {
            Ok(combined) => combined,
            Err(err) => return Ok(self.skip(err.into())),
        };

        let mut live_closes = HashMap::with_capacity(self.weights.len());
        for instrument in self.weights.instruments() {
            let close = self.ports.feed.current_close(instrument).await?;
            live_closes.insert(instrument.clone(), close);
        }
        let current_combined = match combine(&live_closes, &self.weights) {
            Ok(price) => price,
            Err(err) => return Ok(self.skip(err.into())),
        };

        let signal = match compute_signal(&combined, current_combined) {
            Ok(signal) => signal,
            Err(err) => return Ok(self.skip(err.into())),
        };
        tracing::info!(
            spread = %current_combined,
            mean = %signal.mean,
            std_dev = %signal.std_dev,
            z_score = %signal.z_score,
            "Signal computed"
        );

        let mut holdings = HashMap::with_capacity(self.weights.len());
        for instrument in self.weights.instruments() {
            let held = self.ports.holdings.quantity(instrument).await?;
            holdings.insert(instrument.clone(), held);
        }

        let deltas = match size(signal.z_score, &self.weights, self.unit_size, &holdings) {
            Ok(deltas) => deltas,
            Err(err) => return Ok(self.skip(err.into())),
        };

        let mut orders = Vec::with_capacity(deltas.len());
        for delta in deltas {
            if delta.is_zero() {
                continue;
            }
            self.ports
                .gateway
                .submit_market_order(&delta.instrument, delta.quantity)
                .await?;
            tracing::info!(
                instrument = %delta.instrument,
                quantity = %delta.quantity,
                "Market order submitted"
            );
            orders.push(delta);
        }

        Ok(CycleOutcome::Rebalanced { signal, orders })
    }

    /// Calendar first, then per-instrument readiness
    async fn check_preconditions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<SkipReason>, CycleError> {
        for instrument in self.weights.instruments() {
            if !self.ports.calendar.is_open(instrument, now).await? {
                return Ok(Some(SkipReason::MarketClosed(instrument.clone())));
            }
        }
        for instrument in self.weights.instruments() {
            if !self.ports.history.is_ready(instrument).await? {
                return Ok(Some(SkipReason::HistoryNotReady(instrument.clone())));
            }
        }
        Ok(None)
    }

    fn skip(&self, reason: SkipReason) -> CycleOutcome {
        tracing::debug!(%reason, "Cycle skipped");
        CycleOutcome::Skipped(reason)
    }
}
