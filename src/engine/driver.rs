//! Tick Driver
//!
//! Owns the scheduling loop: fires the rebalance cycle once per interval
//! and never overlaps invocations (the cycle runs to completion before the
//! next sleep). Stops at the configured end date or on a stop signal.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::engine::cycle::{CycleError, CycleOutcome, RebalanceCycle};

/// Drives a `RebalanceCycle` on a fixed interval
pub struct TickDriver {
    cycle: Arc<RebalanceCycle>,
    tick_interval: StdDuration,
    start_date: NaiveDate,
    end_date: NaiveDate,
    is_running: Arc<RwLock<bool>>,
}

impl TickDriver {
    pub fn new(
        cycle: RebalanceCycle,
        tick_interval: StdDuration,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            cycle: Arc::new(cycle),
            tick_interval,
            start_date,
            end_date,
            is_running: Arc::new(RwLock::new(false)),
        }
    }

    /// Run until the end date passes or `stop` is called.
    ///
    /// Collaborator failures stop the loop; a skipped cycle does not (the
    /// next tick retries naturally).
    pub async fn run(&self) -> Result<(), CycleError> {
        *self.is_running.write().await = true;
        tracing::info!(
            interval_secs = self.tick_interval.as_secs(),
            end_date = %self.end_date,
            "Tick driver started"
        );

        while *self.is_running.read().await {
            let now = Utc::now();
            if now.date_naive() > self.end_date {
                tracing::info!("End date reached, stopping");
                break;
            }
            if now.date_naive() < self.start_date {
                tracing::debug!(start_date = %self.start_date, "Before start date, idling");
                tokio::time::sleep(self.tick_interval).await;
                continue;
            }

            match self.cycle.run(now).await? {
                CycleOutcome::Rebalanced { signal, orders } => {
                    tracing::info!(
                        z_score = %signal.z_score,
                        orders = orders.len(),
                        "Cycle rebalanced"
                    );
                }
                CycleOutcome::Skipped(reason) => {
                    tracing::debug!(%reason, "Cycle deferred to next tick");
                }
            }

            tokio::time::sleep(self.tick_interval).await;
        }

        *self.is_running.write().await = false;
        tracing::info!("Tick driver stopped");
        Ok(())
    }

    /// Signal the loop to stop after the current tick
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Handle for sharing across tasks (Ctrl-C handler)
    pub fn handle(&self) -> DriverHandle {
        DriverHandle {
            is_running: Arc::clone(&self.is_running),
        }
    }
}

/// Cloneable stop handle for the driver loop
#[derive(Clone)]
pub struct DriverHandle {
    is_running: Arc<RwLock<bool>>,
}

impl DriverHandle {
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::weights::WeightSet;
    use crate::engine::cycle::CyclePorts;
    use crate::ports::mocks::{RecordingBroker, ScriptedMarketData};
    use crate::ports::models::Resolution;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn idle_driver(start_date: NaiveDate, end_date: NaiveDate) -> TickDriver {
        let market = Arc::new(ScriptedMarketData::new());
        let broker = Arc::new(RecordingBroker::new());
        let weights = WeightSet::new(vec![
            ("EWA".into(), dec!(1.198)),
            ("EWC".into(), dec!(-0.911)),
        ])
        .unwrap();
        let cycle = RebalanceCycle::new(
            weights,
            Duration::days(28),
            Resolution::Daily,
            dec!(1000),
            CyclePorts {
                history: market.clone(),
                feed: market.clone(),
                calendar: market,
                holdings: broker.clone(),
                gateway: broker,
            },
        );
        TickDriver::new(cycle, StdDuration::from_millis(5), start_date, end_date)
    }

    #[tokio::test]
    async fn test_stops_when_end_date_passed() {
        let yesterday = (Utc::now() - Duration::days(1)).date_naive();
        let driver = idle_driver(yesterday - Duration::days(30), yesterday);
        driver.run().await.unwrap();
        assert!(!driver.is_running().await);
    }

    #[tokio::test]
    async fn test_stop_handle_halts_loop() {
        let today = Utc::now().date_naive();
        let far_future = NaiveDate::from_ymd_opt(2999, 1, 1).unwrap();
        let driver = idle_driver(today, far_future);
        let handle = driver.handle();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(StdDuration::from_millis(20)).await;
            handle.stop().await;
        });

        driver.run().await.unwrap();
        stopper.await.unwrap();
        assert!(!driver.is_running().await);
    }

    #[tokio::test]
    async fn test_idles_before_start_date() {
        let market = Arc::new(
            ScriptedMarketData::new()
                .with_bars("EWA", Vec::new())
                .with_bars("EWC", Vec::new()),
        );
        let broker = Arc::new(RecordingBroker::new());
        let weights = WeightSet::new(vec![
            ("EWA".into(), dec!(1.198)),
            ("EWC".into(), dec!(-0.911)),
        ])
        .unwrap();
        let cycle = RebalanceCycle::new(
            weights,
            Duration::days(28),
            Resolution::Daily,
            dec!(1000),
            CyclePorts {
                history: market.clone(),
                feed: market.clone(),
                calendar: market.clone(),
                holdings: broker.clone(),
                gateway: broker.clone(),
            },
        );

        let tomorrow = (Utc::now() + Duration::days(1)).date_naive();
        let driver = TickDriver::new(
            cycle,
            StdDuration::from_millis(5),
            tomorrow,
            tomorrow + Duration::days(30),
        );
        let handle = driver.handle();
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(StdDuration::from_millis(20)).await;
            handle.stop().await;
        });

        driver.run().await.unwrap();
        stopper.await.unwrap();
        // The cycle never fired: no history fetches, nothing cancelled
        assert!(market.history_calls().is_empty());
        assert!(broker.cancelled().is_empty());
    }
}
