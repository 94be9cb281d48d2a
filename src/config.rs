// Scanner configuration, loaded once at startup and passed to every component

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::itinerary::PruningPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub log_dir: PathBuf,
    pub requests_path: PathBuf,
    pub passenger_count: u32,
    pub scan_interval_minutes: u64,
    // Cap on in-budget trips sent by SMS during one scan pass
    pub max_sms_per_run: usize,
    pub pruning_policy: PruningPolicy,
    pub fares: FareSourceConfig,
    pub twilio: Option<TwilioConfig>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            requests_path: PathBuf::from("flights.txt"),
            passenger_count: 1,
            scan_interval_minutes: 30,
            max_sms_per_run: 10,
            pruning_policy: PruningPolicy::default(),
            fares: FareSourceConfig::default(),
            twilio: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FareSourceConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for FareSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 30000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub to_number: String,
    #[serde(default = "default_twilio_api")]
    pub api_base_url: String,
}

fn default_twilio_api() -> String {
    "https://api.twilio.com".to_string()
}

impl ScanConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.passenger_count == 0 {
            return Err(ConfigError::Invalid(
                "passenger_count must be at least 1".to_string(),
            ));
        }
        if self.scan_interval_minutes == 0 {
            return Err(ConfigError::Invalid(
                "scan_interval_minutes must be at least 1".to_string(),
            ));
        }
        if self.fares.base_url.is_empty() {
            return Err(ConfigError::Invalid("fares.base_url is empty".to_string()));
        }
        if let Some(twilio) = &self.twilio {
            if twilio.account_sid.is_empty() || twilio.auth_token.is_empty() {
                return Err(ConfigError::Invalid(
                    "twilio credentials are incomplete".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_minutes.saturating_mul(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = ScanConfig::from_json(r#"{ "passenger_count": 2 }"#).unwrap();

        assert_eq!(config.passenger_count, 2);
        assert_eq!(config.scan_interval_minutes, 30);
        assert_eq!(config.scan_interval(), Duration::from_secs(1800));
        assert_eq!(config.pruning_policy, PruningPolicy::StopAtFirstOverBudget);
        assert!(config.twilio.is_none());
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "log_dir": "/var/log/fares",
            "requests_path": "requests.txt",
            "passenger_count": 3,
            "scan_interval_minutes": 15,
            "max_sms_per_run": 4,
            "pruning_policy": "exhaustive",
            "fares": { "base_url": "https://fares.example.com", "timeout_ms": 5000 },
            "twilio": {
                "account_sid": "AC123",
                "auth_token": "secret",
                "from_number": "+15550001111",
                "to_number": "+15552223333"
            }
        }"#;

        let config = ScanConfig::from_json(json).unwrap();
        assert_eq!(config.log_dir, PathBuf::from("/var/log/fares"));
        assert_eq!(config.max_sms_per_run, 4);
        assert_eq!(config.pruning_policy, PruningPolicy::Exhaustive);
        assert_eq!(config.fares.timeout_ms, 5000);

        let twilio = config.twilio.unwrap();
        assert_eq!(twilio.account_sid, "AC123");
        assert_eq!(twilio.api_base_url, "https://api.twilio.com");
    }

    #[test]
    fn test_load_sample_config() {
        let config = ScanConfig::load(Path::new("samples/config.json")).unwrap();
        assert_eq!(config.requests_path, PathBuf::from("samples/flights.txt"));
        assert!(config.twilio.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let result = ScanConfig::from_json(r#"{ "passenger_count": 0 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = ScanConfig::from_json(r#"{ "scan_interval_minutes": 0 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = ScanConfig::from_json(r#"{ "pruning_policy": "sometimes" }"#);
        assert!(matches!(result, Err(ConfigError::JsonParseError(_))));
    }

    #[test]
    fn test_huge_interval_saturates() {
        let config = ScanConfig {
            scan_interval_minutes: u64::MAX,
            ..Default::default()
        };
        assert_eq!(config.scan_interval(), Duration::from_secs(u64::MAX));
    }
}
