//! Aligned Price History Window
//!
//! Time-aligned rolling window across all tracked instruments: an ordered
//! sequence of buckets, each holding exactly one close per instrument at an
//! identical timestamp. Rebuilt fresh from the history source at the start
//! of every rebalance cycle and discarded at cycle end.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::ports::models::{Bar, InstrumentId};

/// Alignment failures, checked in the cycle's precondition order:
/// bar counts, then window length, then per-bucket timestamps.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlignError {
    #[error("No instrument series supplied")]
    NoInstruments,

    /// The history source returned differing bar counts
    #[error("Bar count mismatch for {instrument}: expected {expected}, got {actual}")]
    BarCountMismatch {
        instrument: InstrumentId,
        expected: usize,
        actual: usize,
    },

    /// Fewer than 2 aligned buckets makes the variance degenerate
    #[error("Window too short: {0} aligned bars (minimum 2)")]
    WindowTooShort(usize),

    /// Any per-bucket timestamp divergence invalidates the whole window
    #[error("Timestamp mismatch at bucket {bucket} for {instrument}: expected {expected}, got {actual}")]
    TimestampMismatch {
        bucket: usize,
        instrument: InstrumentId,
        expected: DateTime<Utc>,
        actual: DateTime<Utc>,
    },
}

/// One time bucket: a shared timestamp and one close per instrument
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    timestamp: DateTime<Utc>,
    closes: HashMap<InstrumentId, Decimal>,
}

impl Bucket {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Per-instrument closes at this bucket's timestamp
    pub fn closes(&self) -> &HashMap<InstrumentId, Decimal> {
        &self.closes
    }
}

/// Fully aligned multi-instrument window
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedWindow {
    buckets: Vec<Bucket>,
}

impl AlignedWindow {
    /// Align per-instrument bar series into shared time buckets.
    ///
    /// The first instrument's series is the reference; every other series
    /// must match it bar-for-bar in count and timestamps. The first
    /// mismatch invalidates the entire window, including any buckets that
    /// happened to align before it.
    pub fn align(series: &[(InstrumentId, Vec<Bar>)]) -> Result<Self, AlignError> {
        let (_, reference) = series.first().ok_or(AlignError::NoInstruments)?;

        for (instrument, bars) in &series[1..] {
            if bars.len() != reference.len() {
                return Err(AlignError::BarCountMismatch {
                    instrument: instrument.clone(),
                    expected: reference.len(),
                    actual: bars.len(),
                });
            }
        }

        if reference.len() < 2 {
            return Err(AlignError::WindowTooShort(reference.len()));
        }

        let mut buckets = Vec::with_capacity(reference.len());
        for (idx, reference_bar) in reference.iter().enumerate() {
            let mut closes = HashMap::with_capacity(series.len());
            for (instrument, bars) in series {
                let bar = &bars[idx];
                if bar.timestamp != reference_bar.timestamp {
                    return Err(AlignError::TimestampMismatch {
                        bucket: idx,
                        instrument: instrument.clone(),
                        expected: reference_bar.timestamp,
                        actual: bar.timestamp,
                    });
                }
                closes.insert(instrument.clone(), bar.close);
            }
            buckets.push(Bucket {
                timestamp: reference_bar.timestamp,
                closes,
            });
        }

        Ok(Self { buckets })
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
