//! Position Sizer
//!
//! Maps the z-score to target holdings and emits the minimal order deltas:
//!
//!   target_i = unit_size * -z * weight_i
//!   delta_i  = target_i - holding_i
//!
//! The mean-reversion rule: a spread above its historical mean (positive z)
//! sells the weighted combination, a spread below buys it, scaled linearly
//! by the deviation and a fixed unit size. No clamping, lot rounding or
//! risk limits here; that is order-gateway policy.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::domain::weights::WeightSet;
use crate::ports::models::InstrumentId;

/// Sizing failures (data-integrity class: abort, never default)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    #[error("Missing holdings snapshot for weighted instrument {0}")]
    MissingHolding(InstrumentId),
}

/// Signed adjustment required to reach the new target holding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDelta {
    pub instrument: InstrumentId,
    pub quantity: Decimal,
}

impl OrderDelta {
    pub fn is_zero(&self) -> bool {
        self.quantity.is_zero()
    }
}

/// Size targets from the z-score and emit one delta per weighted
/// instrument, in weight-set order. Zero deltas are included; the caller
/// decides whether to forward them.
pub fn size(
    z_score: Decimal,
    weights: &WeightSet,
    unit_size: Decimal,
    holdings: &HashMap<InstrumentId, Decimal>,
) -> Result<Vec<OrderDelta>, SizingError> {
    let mut deltas = Vec::with_capacity(weights.len());
    for (instrument, weight) in weights.iter() {
        let held = holdings
            .get(instrument)
            .ok_or_else(|| SizingError::MissingHolding(instrument.clone()))?;
        let target = unit_size * -z_score * weight;
        deltas.push(OrderDelta {
            instrument: instrument.clone(),
            quantity: target - held,
        });
    }
    Ok(deltas)
}
