use serde::Deserialize;
use std::fs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// General configuration for the exporter
#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    pub network: String,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    pub address: String,
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

/// Top-level config struct for the exporter
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub general: GeneralConfig,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        serde_yaml::from_str(&config_str).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
general:
  network: mainnet
  metrics:
    address: 0.0.0.0
    port: 9464
    path: /metrics
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.general.network, "mainnet");
        assert_eq!(config.general.metrics.address, "0.0.0.0");
        assert_eq!(config.general.metrics.port, 9464);
        assert_eq!(config.general.metrics.path, "/metrics");
    }

    #[test]
    fn test_metrics_path_defaults() {
        let yaml = r#"
general:
  network: testnet
  metrics:
    address: 127.0.0.1
    port: 9464
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.general.metrics.path, "/metrics");
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let err = AppConfig::load("/nonexistent/config.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_malformed_yaml_is_a_parse_error() {
        assert!(serde_yaml::from_str::<AppConfig>("general: [not, a, map]").is_err());
    }
}
