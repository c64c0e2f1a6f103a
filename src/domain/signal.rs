//! Signal Engine
//!
//! Rolling statistics over the combined-price series and the z-score of
//! the latest combined price:
//!
//!   z = (current - mean) / std
//!
//! The standard deviation is the population form, sqrt((1/n) * sum((x -
//! mean)^2)) with n = series length. No Bessel correction: the divisor is
//! n, not n - 1, matching the trading behavior this engine reproduces.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Conditions under which no signal can be computed
///
/// Both are expected, non-fatal skip conditions for the caller, never
/// NaN or a panic escaping the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    /// Fewer than 2 samples make the variance degenerate
    #[error("Window too short for signal: {0} samples (minimum 2)")]
    WindowTooShort(usize),

    /// Zero (or rounded-to-zero) standard deviation; division undefined
    #[error("Degenerate standard deviation (flat combined-price series)")]
    DegenerateStdDev,
}

/// Signal computed once per cycle from the window and the live snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalState {
    /// Rolling mean of the combined-price series
    pub mean: Decimal,
    /// Population standard deviation of the series
    pub std_dev: Decimal,
    /// Standard deviations the current combined price sits from the mean
    pub z_score: Decimal,
}

/// Compute mean, population standard deviation and z-score.
///
/// Sums and the variance stay in `Decimal`; only the square root passes
/// through `f64` before converting back.
pub fn compute_signal(
    series: &[Decimal],
    current_combined: Decimal,
) -> Result<SignalState, SignalError> {
    let n = series.len();
    if n < 2 {
        return Err(SignalError::WindowTooShort(n));
    }
    let count = Decimal::from(n);

    let mean = series.iter().sum::<Decimal>() / count;

    let variance = series
        .iter()
        .map(|x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<Decimal>()
        / count;

    let std_dev = variance
        .to_f64()
        .map(f64::sqrt)
        .and_then(Decimal::from_f64)
        .ok_or(SignalError::DegenerateStdDev)?;

    if std_dev.is_zero() {
        return Err(SignalError::DegenerateStdDev);
    }

    let z_score = (current_combined - mean) / std_dev;

    Ok(SignalState {
        mean,
        std_dev,
        z_score,
    })
}
