//! Run configuration, built once at startup and passed into components.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paper::YearRange;

pub const DEFAULT_DB_PATH: &str = "data/citegraph.db";
pub const DEFAULT_SOURCE_BASE_URL: &str = "https://api.semanticscholar.org/graph/v1";
pub const DEFAULT_MAX_FAN_OUT: usize = 100;
/// Upper bound on any configured pacing delay, in seconds.
pub const MAX_DELAY_SECS: f64 = 3600.0;

/// Graph store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
}

/// Bibliographic API access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
}

/// Delays between calls to external services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Spacing between bibliographic API calls, in seconds.
    pub rate_limit_delay_secs: f64,
    /// Spacing between classification calls, in seconds.
    pub classify_delay_secs: f64,
}

impl PacingConfig {
    pub fn rate_limit_delay(&self) -> Duration {
        delay_from_secs(self.rate_limit_delay_secs)
    }

    pub fn classify_delay(&self) -> Duration {
        delay_from_secs(self.classify_delay_secs)
    }
}

/// Clamp `secs` into `[0, MAX_DELAY_SECS]`; NaN means no delay.
pub fn delay_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs.min(MAX_DELAY_SECS)).unwrap_or(Duration::ZERO)
}

/// Ceilings that bound the work done by one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_papers: Option<usize>,
    pub max_fan_out_per_paper: usize,
    pub year: Option<YearRange>,
}

/// Top-level CiteGraph configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitegraphConfig {
    pub store: StoreConfig,
    pub source: SourceConfig,
    pub pacing: PacingConfig,
    pub limits: LimitsConfig,
}

impl Default for CitegraphConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                db_path: PathBuf::from(DEFAULT_DB_PATH),
            },
            source: SourceConfig {
                api_key: None,
                base_url: DEFAULT_SOURCE_BASE_URL.into(),
            },
            pacing: PacingConfig {
                rate_limit_delay_secs: 1.0,
                classify_delay_secs: 1.0,
            },
            limits: LimitsConfig {
                max_papers: None,
                max_fan_out_per_paper: DEFAULT_MAX_FAN_OUT,
                year: None,
            },
        }
    }
}

impl CitegraphConfig {
    /// Create configuration from environment variables and defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get("CITEGRAPH_DB_PATH") {
            config.store.db_path = PathBuf::from(path);
        }
        config.source.api_key = get("SS_API_KEY");
        if let Some(url) = get("SS_BASE_URL") {
            config.source.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("CITEGRAPH_RATE_LIMIT_SECS") {
            config.pacing.rate_limit_delay_secs = parse_secs("CITEGRAPH_RATE_LIMIT_SECS", &v)?;
        }
        if let Some(v) = get("CITEGRAPH_CLASSIFY_DELAY_SECS") {
            config.pacing.classify_delay_secs = parse_secs("CITEGRAPH_CLASSIFY_DELAY_SECS", &v)?;
        }
        if let Some(v) = get("CITEGRAPH_MAX_PAPERS") {
            config.limits.max_papers = Some(parse_count("CITEGRAPH_MAX_PAPERS", &v)?);
        }
        if let Some(v) = get("CITEGRAPH_MAX_FAN_OUT") {
            config.limits.max_fan_out_per_paper = parse_count("CITEGRAPH_MAX_FAN_OUT", &v)?;
        }
        if let Some(v) = get("CITEGRAPH_YEAR_FILTER") {
            config.limits.year = Some(v.parse()?);
        }

        Ok(config)
    }
}

/// Parse a delay in seconds between 0 and `MAX_DELAY_SECS`.
pub fn parse_secs(key: &str, value: &str) -> Result<f64> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number of seconds, got '{}'", key, value)))?;
    if !secs.is_finite() || !(0.0..=MAX_DELAY_SECS).contains(&secs) {
        return Err(Error::Config(format!(
            "{} must be between 0 and {} seconds, got '{}'",
            key, MAX_DELAY_SECS, value
        )));
    }
    Ok(secs)
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a non-negative integer, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CitegraphConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.store.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.limits.max_fan_out_per_paper, DEFAULT_MAX_FAN_OUT);
        assert!(config.limits.max_papers.is_none());
        assert!(config.source.api_key.is_none());
        assert_eq!(config.pacing.rate_limit_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_overrides() {
        let config = CitegraphConfig::from_lookup(lookup(&[
            ("CITEGRAPH_DB_PATH", "/tmp/graph.db"),
            ("SS_API_KEY", "secret"),
            ("SS_BASE_URL", "http://localhost:9000/"),
            ("CITEGRAPH_RATE_LIMIT_SECS", "0.5"),
            ("CITEGRAPH_MAX_PAPERS", "25"),
            ("CITEGRAPH_MAX_FAN_OUT", "10"),
            ("CITEGRAPH_YEAR_FILTER", "2022:2023"),
        ]))
        .unwrap();
        assert_eq!(config.store.db_path, PathBuf::from("/tmp/graph.db"));
        assert_eq!(config.source.api_key.as_deref(), Some("secret"));
        assert_eq!(config.source.base_url, "http://localhost:9000");
        assert_eq!(config.pacing.rate_limit_delay(), Duration::from_millis(500));
        assert_eq!(config.limits.max_papers, Some(25));
        assert_eq!(config.limits.max_fan_out_per_paper, 10);
        assert_eq!(config.limits.year.unwrap().to_string(), "2022:2023");
    }

    #[test]
    fn test_malformed_values_are_config_errors() {
        let err = CitegraphConfig::from_lookup(lookup(&[("CITEGRAPH_MAX_PAPERS", "lots")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = CitegraphConfig::from_lookup(lookup(&[("CITEGRAPH_RATE_LIMIT_SECS", "-2")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = CitegraphConfig::from_lookup(lookup(&[("CITEGRAPH_YEAR_FILTER", "soon")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_oversized_delays_rejected() {
        for value in ["1e300", "inf", "NaN", "3600.5"] {
            let err = CitegraphConfig::from_lookup(lookup(&[("CITEGRAPH_RATE_LIMIT_SECS", value)])).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "accepted {}", value);
            let err = CitegraphConfig::from_lookup(lookup(&[("CITEGRAPH_CLASSIFY_DELAY_SECS", value)])).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "accepted {}", value);
        }
        assert_eq!(parse_secs("k", "3600").unwrap(), MAX_DELAY_SECS);
    }

    #[test]
    fn test_delay_conversion_saturates() {
        let mut pacing = CitegraphConfig::default().pacing;
        pacing.rate_limit_delay_secs = 1e300;
        pacing.classify_delay_secs = f64::INFINITY;
        assert_eq!(pacing.rate_limit_delay(), Duration::from_secs(3600));
        assert_eq!(pacing.classify_delay(), Duration::from_secs(3600));

        assert_eq!(delay_from_secs(f64::NAN), Duration::ZERO);
        assert_eq!(delay_from_secs(f64::NEG_INFINITY), Duration::ZERO);
        assert_eq!(delay_from_secs(0.25), Duration::from_millis(250));
    }
}
