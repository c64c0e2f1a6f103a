//! Engine Layer - Rebalance orchestration and scheduling
//!
//! `cycle` runs one precondition-gated pass of the spread/signal/sizing
//! pipeline; `driver` fires it on a fixed interval until the end date.

pub mod cycle;
pub mod driver;

pub use cycle::{CycleError, CycleOutcome, CyclePorts, RebalanceCycle, SkipReason};
pub use driver::{DriverHandle, TickDriver};
