//! Spread Calculator
//!
//! Combines aligned per-instrument closes into a scalar "combined price"
//! via the fixed weight vector. With weights from a valid cointegration
//! relationship the combined series is expected to be stationary.

use std::collections::HashMap;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::weights::WeightSet;
use crate::domain::window::AlignedWindow;
use crate::ports::models::InstrumentId;

/// Observation-set mismatches against the weight set
///
/// A partial set is never computed with defaulted prices; both directions
/// of mismatch are hard errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpreadError {
    #[error("Missing price observation for weighted instrument {0}")]
    MissingInstrument(InstrumentId),

    #[error("Price observation for untracked instrument {0}")]
    UnexpectedInstrument(InstrumentId),
}

/// Weighted sum of one aligned observation set: sum(weight_i * close_i).
///
/// Requires the observations to contain exactly the instruments in the
/// weight set. Pure and deterministic.
pub fn combine(
    closes: &HashMap<InstrumentId, Decimal>,
    weights: &WeightSet,
) -> Result<Decimal, SpreadError> {
    if let Some(extra) = closes.keys().find(|id| !weights.contains(id)) {
        return Err(SpreadError::UnexpectedInstrument(extra.clone()));
    }

    let mut combined = Decimal::ZERO;
    for (instrument, weight) in weights.iter() {
        let close = closes
            .get(instrument)
            .ok_or_else(|| SpreadError::MissingInstrument(instrument.clone()))?;
        combined += weight * close;
    }
    Ok(combined)
}

/// Combined price per window bucket, in chronological order
pub fn combined_series(
    window: &AlignedWindow,
    weights: &WeightSet,
) -> Result<Vec<Decimal>, SpreadError> {
    window
        .buckets()
        .iter()
        .map(|bucket| combine(bucket.closes(), weights))
        .collect()
}
