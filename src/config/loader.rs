//! Configuration Loader
//!
//! Loads and validates the run configuration from a TOML file. Weights are
//! written as an array of tables so a duplicated symbol is representable in
//! the file and rejected here, instead of one entry silently overwriting
//! the other.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::domain::weights::{WeightError, WeightSet};
use crate::ports::models::Resolution;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub schedule: ScheduleSection,
    pub strategy: StrategySection,
    pub weights: Vec<WeightEntry>,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Backtest/run window and tick schedule
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSection {
    /// First trading day of the run
    pub start_date: NaiveDate,
    /// Last trading day; the driver stops once it passes
    pub end_date: NaiveDate,
    /// Starting cash for the paper brokerage
    pub initial_cash: Decimal,
    /// Daily rebalance time, "HH:MM" (24h)
    pub rebalance_time: String,
    /// Driver tick interval in seconds
    pub tick_interval_secs: u64,
}

impl ScheduleSection {
    /// Parsed rebalance time; validated during `Config::validate`
    pub fn rebalance_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.rebalance_time, "%H:%M").map_err(|_| {
            ConfigError::Validation(format!(
                "rebalance_time must be HH:MM, got {:?}",
                self.rebalance_time
            ))
        })
    }
}

/// Signal parameters
#[derive(Debug, Clone, Deserialize)]
pub struct StrategySection {
    /// Lookback window length in calendar days
    pub lookback_days: u32,
    /// Scale factor from z-score to share quantity
    pub unit_size: Decimal,
    /// Bar resolution for the history source
    pub resolution: Resolution,
}

/// One leg of the cointegration weight vector
#[derive(Debug, Clone, Deserialize)]
pub struct WeightEntry {
    pub symbol: String,
    pub weight: Decimal,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid weight set: {0}")]
    Weights(#[from] WeightError),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.end_date < self.schedule.start_date {
            return Err(ConfigError::Validation(format!(
                "end_date {} precedes start_date {}",
                self.schedule.end_date, self.schedule.start_date
            )));
        }

        if self.schedule.initial_cash <= Decimal::ZERO {
            return Err(ConfigError::Validation(format!(
                "initial_cash must be > 0, got {}",
                self.schedule.initial_cash
            )));
        }

        if self.schedule.tick_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "tick_interval_secs must be > 0".to_string(),
            ));
        }

        self.schedule.rebalance_time()?;

        if self.strategy.lookback_days == 0 {
            return Err(ConfigError::Validation(
                "lookback_days must be > 0".to_string(),
            ));
        }

        if self.strategy.unit_size <= Decimal::ZERO {
            return Err(ConfigError::Validation(format!(
                "unit_size must be > 0, got {}",
                self.strategy.unit_size
            )));
        }

        // Weight-set invariants (>= 2 legs, non-zero, no duplicates)
        self.weight_set()?;

        Ok(())
    }

    /// Build the domain weight set from the `[[weights]]` entries
    pub fn weight_set(&self) -> Result<WeightSet, ConfigError> {
        let entries = self
            .weights
            .iter()
            .map(|e| (e.symbol.as_str().into(), e.weight))
            .collect();
        Ok(WeightSet::new(entries)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn valid_config() -> String {
        r#"
[schedule]
start_date = "2013-10-07"
end_date = "2013-10-11"
initial_cash = "10000"
rebalance_time = "15:30"
tick_interval_secs = 60

[strategy]
lookback_days = 28
unit_size = "1000"
resolution = "daily"

[[weights]]
symbol = "EWA"
weight = "1.198"

[[weights]]
symbol = "EWC"
weight = "-0.911"

[logging]
level = "info"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.strategy.lookback_days, 28);
        assert_eq!(config.strategy.unit_size, dec!(1000));
        assert_eq!(config.strategy.resolution, Resolution::Daily);
        assert_eq!(config.schedule.initial_cash, dec!(10000));
        assert_eq!(
            config.schedule.rebalance_time().unwrap(),
            NaiveTime::from_hms_opt(15, 30, 0).unwrap()
        );

        let weights = config.weight_set().unwrap();
        assert_eq!(weights.weight(&"EWA".into()), Some(dec!(1.198)));
        assert_eq!(weights.weight(&"EWC".into()), Some(dec!(-0.911)));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::Io(_)));
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let config = valid_config().replace("symbol = \"EWC\"", "symbol = \"EWA\"");
        let file = write_config(&config);
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Weights(WeightError::DuplicateInstrument(_))
        ));
    }

    #[test]
    fn test_zero_weight_rejected() {
        let config = valid_config().replace("weight = \"-0.911\"", "weight = \"0\"");
        let file = write_config(&config);
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Weights(WeightError::ZeroWeight(_))
        ));
    }

    #[test]
    fn test_single_leg_rejected() {
        let config = valid_config()
            .replace("[[weights]]\nsymbol = \"EWC\"\nweight = \"-0.911\"\n", "");
        let file = write_config(&config);
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Weights(WeightError::TooFewInstruments(1))
        ));
    }

    #[test]
    fn test_zero_lookback_rejected() {
        let config = valid_config().replace("lookback_days = 28", "lookback_days = 0");
        let file = write_config(&config);
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_negative_unit_size_rejected() {
        let config = valid_config().replace("unit_size = \"1000\"", "unit_size = \"-5\"");
        let file = write_config(&config);
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_inverted_date_range_rejected() {
        let config = valid_config().replace("end_date = \"2013-10-11\"", "end_date = \"2013-10-01\"");
        let file = write_config(&config);
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_bad_rebalance_time_rejected() {
        let config = valid_config().replace("rebalance_time = \"15:30\"", "rebalance_time = \"quarter past\"");
        let file = write_config(&config);
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_logging_section_optional() {
        let config = valid_config().replace("[logging]\nlevel = \"info\"\n", "");
        let file = write_config(&config);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.logging.level, "info");
    }
}
