//! Instrument Weight Set
//!
//! The fixed cointegration weight vector, injected at startup. The weights
//! come from an offline statistical step (eigenvectors of a Johansen test);
//! this crate only consumes them. Immutable for the lifetime of a run.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::ports::models::InstrumentId;

/// Errors raised while constructing a weight set
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightError {
    /// A spread needs at least two legs
    #[error("Weight set needs at least 2 instruments, got {0}")]
    TooFewInstruments(usize),

    /// A zero weight would silently drop a leg from the spread
    #[error("Zero weight for instrument {0}")]
    ZeroWeight(InstrumentId),

    /// Duplicate identifiers are rejected outright rather than letting a
    /// later entry overwrite an earlier one
    #[error("Duplicate instrument in weight set: {0}")]
    DuplicateInstrument(InstrumentId),
}

/// Fixed mapping of instrument to signed weight coefficient
///
/// Entries keep their insertion order so that downstream iteration (history
/// fetches, order emission) is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightSet {
    entries: Vec<(InstrumentId, Decimal)>,
}

impl WeightSet {
    /// Validate and build a weight set from (instrument, weight) pairs
    pub fn new(entries: Vec<(InstrumentId, Decimal)>) -> Result<Self, WeightError> {
        if entries.len() < 2 {
            return Err(WeightError::TooFewInstruments(entries.len()));
        }
        for (i, (id, weight)) in entries.iter().enumerate() {
            if weight.is_zero() {
                return Err(WeightError::ZeroWeight(id.clone()));
            }
            if entries[..i].iter().any(|(seen, _)| seen == id) {
                return Err(WeightError::DuplicateInstrument(id.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Signed weight for an instrument, if tracked
    pub fn weight(&self, instrument: &InstrumentId) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|(id, _)| id == instrument)
            .map(|(_, w)| *w)
    }

    pub fn contains(&self, instrument: &InstrumentId) -> bool {
        self.weight(instrument).is_some()
    }

    /// Tracked instruments in insertion order
    pub fn instruments(&self) -> impl Iterator<Item = &InstrumentId> {
        self.entries.iter().map(|(id, _)| id)
    }

    /// (instrument, weight) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&InstrumentId, Decimal)> {
        self.entries.iter().map(|(id, w)| (id, *w))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
