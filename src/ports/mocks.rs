//! Scripted port implementations that record calls
//!
//! Test doubles for the rebalance cycle: a market-data script with
//! configurable bars, closes, calendar state and readiness, plus a
//! brokerage that records every submission and cancellation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::ports::execution::{HoldingsAccessor, OrderGateway};
use crate::ports::market_data::{ExchangeCalendar, HistorySource, LivePriceFeed};
use crate::ports::models::{Bar, InstrumentId, PortError, PortResult, Resolution};

/// Scripted market data source covering history, live feed and calendar
#[derive(Debug, Default)]
pub struct ScriptedMarketData {
    bars: HashMap<InstrumentId, Vec<Bar>>,
    closes: HashMap<InstrumentId, Decimal>,
    not_ready: Vec<InstrumentId>,
    market_closed: bool,
    history_calls: Arc<Mutex<Vec<InstrumentId>>>,
}

impl ScriptedMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the historical bars served for an instrument
    pub fn with_bars(mut self, instrument: impl Into<InstrumentId>, bars: Vec<Bar>) -> Self {
        self.bars.insert(instrument.into(), bars);
        self
    }

    /// Script the live close served for an instrument
    pub fn with_close(mut self, instrument: impl Into<InstrumentId>, close: Decimal) -> Self {
        self.closes.insert(instrument.into(), close);
        self
    }

    /// Mark one instrument's history as not yet populated
    pub fn with_not_ready(mut self, instrument: impl Into<InstrumentId>) -> Self {
        self.not_ready.push(instrument.into());
        self
    }

    /// Script the exchange as closed for every instrument
    pub fn with_market_closed(mut self) -> Self {
        self.market_closed = true;
        self
    }

    /// Instruments whose history was fetched, in call order
    pub fn history_calls(&self) -> Vec<InstrumentId> {
        self.history_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistorySource for ScriptedMarketData {
    async fn history(
        &self,
        instrument: &InstrumentId,
        _lookback: Duration,
        _resolution: Resolution,
    ) -> PortResult<Vec<Bar>> {
        self.history_calls.lock().unwrap().push(instrument.clone());
        self.bars
            .get(instrument)
            .cloned()
            .ok_or_else(|| PortError::UnknownInstrument(instrument.to_string()))
    }

    async fn is_ready(&self, instrument: &InstrumentId) -> PortResult<bool> {
        if self.not_ready.contains(instrument) {
            return Ok(false);
        }
        Ok(self.bars.contains_key(instrument))
    }
}

#[async_trait]
impl LivePriceFeed for ScriptedMarketData {
    async fn current_close(&self, instrument: &InstrumentId) -> PortResult<Decimal> {
        self.closes
            .get(instrument)
            .copied()
            .ok_or_else(|| PortError::UnknownInstrument(instrument.to_string()))
    }
}

#[async_trait]
impl ExchangeCalendar for ScriptedMarketData {
    async fn is_open(&self, _instrument: &InstrumentId, _at: DateTime<Utc>) -> PortResult<bool> {
        Ok(!self.market_closed)
    }
}

/// Brokerage double: fixed holdings snapshot, records every order call
#[derive(Debug, Default)]
pub struct RecordingBroker {
    holdings: HashMap<InstrumentId, Decimal>,
    submitted: Arc<Mutex<Vec<(InstrumentId, Decimal)>>>,
    cancelled: Arc<Mutex<Vec<InstrumentId>>>,
}

impl RecordingBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the holdings snapshot for an instrument
    pub fn with_holding(mut self, instrument: impl Into<InstrumentId>, qty: Decimal) -> Self {
        self.holdings.insert(instrument.into(), qty);
        self
    }

    /// Market orders submitted, in call order
    pub fn submitted(&self) -> Vec<(InstrumentId, Decimal)> {
        self.submitted.lock().unwrap().clone()
    }

    /// Instruments whose open orders were cancelled, in call order
    pub fn cancelled(&self) -> Vec<InstrumentId> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl HoldingsAccessor for RecordingBroker {
    async fn quantity(&self, instrument: &InstrumentId) -> PortResult<Decimal> {
        // Flat instruments simply hold zero
        Ok(self.holdings.get(instrument).copied().unwrap_or(Decimal::ZERO))
    }
}

#[async_trait]
impl OrderGateway for RecordingBroker {
    async fn submit_market_order(
        &self,
        instrument: &InstrumentId,
        delta: Decimal,
    ) -> PortResult<()> {
        self.submitted.lock().unwrap().push((instrument.clone(), delta));
        Ok(())
    }

    async fn cancel_open_orders(&self, instrument: &InstrumentId) -> PortResult<()> {
        self.cancelled.lock().unwrap().push(instrument.clone());
        Ok(())
    }
}
