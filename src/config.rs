use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

use crate::auth::PinCode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// Latency and outcome behavior of the simulated backend
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Transfer authorization (biometric / PIN)
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SimulationConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Probability a simulated call reaches the "server" at all
    pub network_success_rate: f64,
    /// Probability a submitted transfer settles as COMPLETED
    pub settlement_success_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 500,
            max_delay_ms: 2000,
            network_success_rate: 1.0,
            settlement_success_rate: 1.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    /// 6-digit fallback code
    pub pin_code: String,
    pub require_authentication: bool,
    pub biometric_prompt: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pin_code: "123456".to_string(),
            require_authentication: true,
            biometric_prompt: "Authenticate to confirm transfer".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "peer_transfer.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            simulation: SimulationConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: config_path,
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.min_delay_ms > sim.max_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "simulation.min_delay_ms ({}) > simulation.max_delay_ms ({})",
                sim.min_delay_ms, sim.max_delay_ms
            )));
        }
        for (name, rate) in [
            ("network_success_rate", sim.network_success_rate),
            ("settlement_success_rate", sim.settlement_success_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Invalid(format!(
                    "simulation.{} must be within [0, 1], got {}",
                    name, rate
                )));
            }
        }
        PinCode::parse(&self.auth.pin_code)
            .map_err(|e| ConfigError::Invalid(format!("auth.pin_code: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
log_level: debug
log_dir: ./logs
log_file: test.log
use_json: false
rotation: never
"#;

    #[test]
    fn test_sections_default_when_absent() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.simulation.min_delay_ms, 500);
        assert_eq!(config.simulation.max_delay_ms, 2000);
        assert_eq!(config.auth.pin_code, "123456");
        assert!(config.auth.require_authentication);
    }

    #[test]
    fn test_rejects_inverted_delay() {
        let yaml = format!(
            "{}{}",
            MINIMAL,
            r#"
simulation:
  min_delay_ms: 900
  max_delay_ms: 100
  network_success_rate: 1.0
  settlement_success_rate: 1.0
"#
        );
        assert!(matches!(
            AppConfig::from_yaml(&yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_bad_rate() {
        let mut config = AppConfig::default();
        config.simulation.settlement_success_rate = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_pin() {
        let mut config = AppConfig::default();
        config.auth.pin_code = "12345".into();
        assert!(config.validate().is_err());
        config.auth.pin_code = "12345a".into();
        assert!(config.validate().is_err());
        config.auth.pin_code = "000000".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_error_surfaces() {
        assert!(matches!(
            AppConfig::from_yaml("log_level: [unterminated"),
            Err(ConfigError::Parse { .. })
        ));
    }
}
