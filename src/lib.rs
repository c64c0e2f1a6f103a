//! Cointrader - Mean-Reversion Rebalancer for a Cointegrated Pair
//!
//! Trades the spread of a cointegrated basket (EWA/EWC being the canonical
//! pair): a fixed, externally derived weight vector combines instrument
//! prices into a semi-stationary spread; the spread's z-score against its
//! rolling history sets target holdings of `unit_size * -z * weight` per
//! instrument, and each scheduled cycle emits the minimal order deltas to
//! get there.
//!
//! # Modules
//!
//! - `domain`: weight set, aligned window, spread, signal, sizing
//! - `ports`: trait abstractions over market data and the brokerage
//! - `adapters`: paper market/brokerage and the CLI surface
//! - `engine`: the rebalance cycle and its tick driver
//! - `config`: TOML configuration loading and validation

pub mod adapters;
pub mod config;
pub mod domain;
pub mod engine;
pub mod ports;
