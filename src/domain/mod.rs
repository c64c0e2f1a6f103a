//! Domain Layer - Pure signal-generation and sizing logic
//!
//! No I/O in this layer; everything operates on values handed in by the
//! rebalance cycle:
//! - `weights`: the fixed cointegration weight vector
//! - `window`: time-aligned multi-instrument price window
//! - `spread`: weighted combined-price calculation
//! - `signal`: rolling mean / population std-dev / z-score
//! - `sizing`: z-score to target holdings and order deltas

pub mod signal;
pub mod sizing;
pub mod spread;
pub mod weights;
pub mod window;

pub use signal::{compute_signal, SignalError, SignalState};
pub use sizing::{size, OrderDelta, SizingError};
pub use spread::{combine, combined_series, SpreadError};
pub use weights::{WeightError, WeightSet};
pub use window::{AlignError, AlignedWindow, Bucket};
