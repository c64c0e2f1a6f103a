//! Ports Layer - Trait definitions for external collaborators
//!
//! Following hexagonal architecture, these traits abstract everything the
//! core consumes or emits:
//! - Historical bars, live closes and the exchange calendar (market data)
//! - Holdings snapshots and order submission/cancellation (brokerage)
//!
//! The core owns none of the state behind these ports; each rebalance cycle
//! reads fresh snapshots through them.

pub mod execution;
pub mod market_data;
pub mod mocks;
pub mod models;

pub use execution::{HoldingsAccessor, OrderGateway};
pub use market_data::{ExchangeCalendar, HistorySource, LivePriceFeed};
pub use models::{Bar, InstrumentId, PortError, PortResult, Resolution};
