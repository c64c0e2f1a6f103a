//! Adapters Layer - In-process implementations of the ports
//!
//! - `paper`: generated market data and an instant-fill brokerage
//! - `cli`: clap command definitions for the binary

pub mod cli;
pub mod paper;

pub use paper::{PaperBroker, PaperMarket};
