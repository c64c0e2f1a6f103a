//! Paper Trading Adapter
//!
//! In-process collaborators so the bot runs end-to-end without a live
//! broker or data vendor. The market generates a deterministic, seeded
//! price history whose weighted combination follows a discrete
//! Ornstein-Uhlenbeck process, dX = theta*(mu - X) + sigma*eps, so the
//! spread genuinely mean-reverts. The brokerage fills market orders
//! instantly at the current close.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::domain::weights::WeightSet;
use crate::ports::execution::{HoldingsAccessor, OrderGateway};
use crate::ports::market_data::{ExchangeCalendar, HistorySource, LivePriceFeed};
use crate::ports::models::{Bar, InstrumentId, PortError, PortResult, Resolution};

/// Mean-reversion speed of the generated spread
const OU_THETA: f64 = 0.3;
/// Noise scale of the generated spread
const OU_SIGMA: f64 = 0.25;
/// Step scale of the non-pivot legs' random walks
const WALK_STEP: f64 = 0.15;

/// Deterministic scripted market for the tracked instruments
#[derive(Debug)]
pub struct PaperMarket {
    bars: HashMap<InstrumentId, Vec<Bar>>,
    live: HashMap<InstrumentId, Decimal>,
}

impl PaperMarket {
    /// Generate `days` daily bars per instrument plus a live close, seeded
    /// for reproducibility.
    ///
    /// Legs after the first follow independent random walks; the first leg
    /// is solved from the OU spread so that the weighted combination of
    /// every bucket equals the spread exactly.
    pub fn generate(weights: &WeightSet, days: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let legs: Vec<(InstrumentId, f64)> = weights
            .iter()
            .map(|(id, w)| (id.clone(), decimal_to_f64(w)))
            .collect();

        // Long-run spread level: the combination of round base prices
        let bases: Vec<f64> = (0..legs.len()).map(|i| 40.0 + 15.0 * i as f64).collect();
        let mu: f64 = legs.iter().zip(&bases).map(|((_, w), b)| w * b).sum();

        let mut spread = mu;
        let mut walks = bases.clone();
        let mut closes: Vec<Vec<f64>> = vec![Vec::with_capacity(days + 1); legs.len()];

        for _ in 0..=days {
            spread += OU_THETA * (mu - spread) + OU_SIGMA * rng.gen_range(-1.0..1.0);
            let mut tail_sum = 0.0;
            for (leg, walk) in walks.iter_mut().enumerate().skip(1) {
                *walk += WALK_STEP * rng.gen_range(-1.0..1.0);
                tail_sum += legs[leg].1 * *walk;
                closes[leg].push(*walk);
            }
            // Pivot leg absorbs the spread; floored to keep prices positive
            let pivot = ((spread - tail_sum) / legs[0].1).max(0.01);
            closes[0].push(pivot);
        }

        let today = Utc::now().date_naive();
        let timestamp = |offset: usize| -> DateTime<Utc> {
            let date = today - Duration::days((days - offset) as i64);
            Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
        };

        let mut bars = HashMap::new();
        let mut live = HashMap::new();
        for (leg, (id, _)) in legs.iter().enumerate() {
            let series: Vec<Bar> = closes[leg][..days]
                .iter()
                .enumerate()
                .map(|(i, &close)| Bar::new(timestamp(i), to_price(close)))
                .collect();
            bars.insert(id.clone(), series);
            live.insert(id.clone(), to_price(closes[leg][days]));
        }

        Self { bars, live }
    }

    /// Current close without going through the async port (used by the
    /// paper brokerage to price fills)
    pub fn live_close(&self, instrument: &InstrumentId) -> Option<Decimal> {
        self.live.get(instrument).copied()
    }
}

fn to_price(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO).round_dp(4)
}

fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[async_trait]
impl HistorySource for PaperMarket {
    async fn history(
        &self,
        instrument: &InstrumentId,
        lookback: Duration,
        resolution: Resolution,
    ) -> PortResult<Vec<Bar>> {
        // Paper data is daily; a minute lookback still serves daily bars
        let requested = match resolution {
            Resolution::Daily | Resolution::Minute => lookback.num_days().max(0) as usize,
        };
        let bars = self
            .bars
            .get(instrument)
            .ok_or_else(|| PortError::UnknownInstrument(instrument.to_string()))?;
        let start = bars.len().saturating_sub(requested);
        Ok(bars[start..].to_vec())
    }

    async fn is_ready(&self, instrument: &InstrumentId) -> PortResult<bool> {
        Ok(self.bars.get(instrument).is_some_and(|b| b.len() >= 2))
    }
}

#[async_trait]
impl LivePriceFeed for PaperMarket {
    async fn current_close(&self, instrument: &InstrumentId) -> PortResult<Decimal> {
        self.live_close(instrument)
            .ok_or_else(|| PortError::UnknownInstrument(instrument.to_string()))
    }
}

#[async_trait]
impl ExchangeCalendar for PaperMarket {
    async fn is_open(&self, _instrument: &InstrumentId, _at: DateTime<Utc>) -> PortResult<bool> {
        Ok(true)
    }
}

/// In-memory brokerage: instant fills at the paper market's current close
pub struct PaperBroker {
    market: Arc<PaperMarket>,
    state: Mutex<BrokerState>,
}

#[derive(Debug)]
struct BrokerState {
    cash: Decimal,
    holdings: HashMap<InstrumentId, Decimal>,
    fills: Vec<(InstrumentId, Decimal, Decimal)>,
}

impl PaperBroker {
    pub fn new(initial_cash: Decimal, market: Arc<PaperMarket>) -> Self {
        Self {
            market,
            state: Mutex::new(BrokerState {
                cash: initial_cash,
                holdings: HashMap::new(),
                fills: Vec::new(),
            }),
        }
    }

    pub fn cash(&self) -> Decimal {
        self.state.lock().unwrap().cash
    }

    pub fn holding(&self, instrument: &InstrumentId) -> Decimal {
        self.state
            .lock()
            .unwrap()
            .holdings
            .get(instrument)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// (instrument, quantity, fill price) per executed order, in order
    pub fn fills(&self) -> Vec<(InstrumentId, Decimal, Decimal)> {
        self.state.lock().unwrap().fills.clone()
    }
}

#[async_trait]
impl HoldingsAccessor for PaperBroker {
    async fn quantity(&self, instrument: &InstrumentId) -> PortResult<Decimal> {
        Ok(self.holding(instrument))
    }
}

#[async_trait]
impl OrderGateway for PaperBroker {
    async fn submit_market_order(
        &self,
        instrument: &InstrumentId,
        delta: Decimal,
    ) -> PortResult<()> {
        let price = self
            .market
            .live_close(instrument)
            .ok_or_else(|| PortError::UnknownInstrument(instrument.to_string()))?;

        let mut state = self.state.lock().unwrap();
        state.cash -= delta * price;
        *state.holdings.entry(instrument.clone()).or_default() += delta;
        state.fills.push((instrument.clone(), delta, price));
        Ok(())
    }

    async fn cancel_open_orders(&self, _instrument: &InstrumentId) -> PortResult<()> {
        // Market orders fill instantly; there is never anything open
        Ok(())
    }
}
