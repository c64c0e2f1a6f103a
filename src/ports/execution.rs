//! Brokerage ports: holdings snapshot and order gateway
//!
//! Holdings are owned by the external brokerage and read-only here; they
//! mutate asynchronously via fills, outside the lifetime of a cycle. Any
//! clamping, lot rounding, or risk limiting is gateway policy, not ours.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::ports::models::{InstrumentId, PortResult};

/// Read-only view of current signed holdings per instrument
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HoldingsAccessor: Send + Sync {
    async fn quantity(&self, instrument: &InstrumentId) -> PortResult<Decimal>;
}

/// Order submission and open-order cancellation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit a market order for a signed quantity delta. Callers skip
    /// zero deltas; a zero here is a caller bug, not gateway policy.
    async fn submit_market_order(
        &self,
        instrument: &InstrumentId,
        delta: Decimal,
    ) -> PortResult<()>;

    /// Cancel any open orders for the instrument. Invoked at the start of
    /// every cycle, before any computation.
    async fn cancel_open_orders(&self, instrument: &InstrumentId) -> PortResult<()>;
}
