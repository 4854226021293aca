//! Configuration types for the ipwatch system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main ipwatch configuration
///
/// One instance covers a whole tick: where the history lives, where the
/// report goes, which endpoints to ask, and the two gap thresholds.
///
/// The two thresholds are deliberately independent (see [`WatchConfig::gap_threshold_secs`]
/// and [`WatchConfig::report_gap_threshold_secs`]); do not collapse them into one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Path to the SQLite history database
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Path the rendered HTML report is written to
    #[serde(default = "default_report_path")]
    pub report_path: String,

    /// IP-echo endpoints, tried in random order each tick.
    /// Empty means "use the resolver's built-in defaults".
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Per-endpoint HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Interval between consecutive successful samples above which a Gap
    /// Event is persisted (durable record)
    #[serde(default = "default_gap_threshold_secs")]
    pub gap_threshold_secs: f64,

    /// Interval between consecutive periods above which the report flags a
    /// row as STRANGE (display-only heuristic, independent of the persisted
    /// threshold)
    #[serde(default = "default_report_gap_threshold_secs")]
    pub report_gap_threshold_secs: f64,
}

impl WatchConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            db_path: default_db_path(),
            report_path: default_report_path(),
            endpoints: Vec::new(),
            timeout_secs: default_timeout_secs(),
            gap_threshold_secs: default_gap_threshold_secs(),
            report_gap_threshold_secs: default_report_gap_threshold_secs(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.db_path.is_empty() {
            return Err(crate::Error::config("database path cannot be empty"));
        }
        if self.report_path.is_empty() {
            return Err(crate::Error::config("report path cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("endpoint timeout must be > 0"));
        }
        if self.gap_threshold_secs <= 0.0 {
            return Err(crate::Error::config("gap threshold must be > 0"));
        }
        if self.report_gap_threshold_secs <= 0.0 {
            return Err(crate::Error::config("report gap threshold must be > 0"));
        }
        for url in &self.endpoints {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(crate::Error::config(format!(
                    "endpoint must be an http(s) URL: {}",
                    url
                )));
            }
        }
        Ok(())
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_db_path() -> String {
    "public_ip.db".to_string()
}

fn default_report_path() -> String {
    "index.html".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_gap_threshold_secs() -> f64 {
    180.0
}

fn default_report_gap_threshold_secs() -> f64 {
    90.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = WatchConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.gap_threshold_secs, 180.0);
        assert_eq!(config.report_gap_threshold_secs, 90.0);
    }

    #[test]
    fn rejects_bad_endpoint_scheme() {
        let config = WatchConfig {
            endpoints: vec!["ftp://example.com".to_string()],
            ..WatchConfig::new()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = WatchConfig {
            timeout_secs: 0,
            ..WatchConfig::new()
        };
        assert!(config.validate().is_err());
    }
}
