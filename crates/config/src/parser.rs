use crate::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MasterConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());

    parse_config(&content)
}

/// Parse a YAML document after environment substitution.
pub fn parse_config(content: &str) -> Result<MasterConfig> {
    let substituted = substitution::substitute_env_vars(content)?;
    debug!("Environment variable substitution completed");

    let config: MasterConfig = serde_yaml::from_str(&substituted)
        .with_context(|| "Failed to parse YAML configuration")?;

    info!("Configuration loaded successfully");
    Ok(config)
}

#[instrument]
pub fn generate_default_config() -> MasterConfig {
    MasterConfig {
        service: ServiceConfig::default(),
        database: DatabaseConfig {
            password: Some("${BUSWATCH_DB_PASSWORD}".to_string()),
            ..DatabaseConfig::default()
        },
        api: ApiConfig::default(),
        map: MapConfig {
            api_key: Some("${MAPBOX_API_KEY}".to_string()),
        },
        logging: LoggingConfig::default(),
        monitoring: MonitoringConfig {
            metrics_port: Some(9100),
        },
    }
}

#[instrument]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &MasterConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config)
        .with_context(|| "Failed to serialize configuration to YAML")?;

    fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    info!("Configuration saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_default_config() {
        let config = generate_default_config();

        assert_eq!(config.service.name, "buswatch");
        assert_eq!(config.database.table, "buses");
        assert_eq!(config.map.api_key.as_deref(), Some("${MAPBOX_API_KEY}"));
        assert_eq!(config.monitoring.metrics_port, Some(9100));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buswatch.yaml");

        let mut config = generate_default_config();
        config.api.live_window_seconds = 120;
        save_config(&config, &path).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.api.live_window_seconds, 120);
        assert_eq!(loaded.service.http_port, config.service.http_port);
    }

    #[test]
    fn test_parse_config_substitutes_env() {
        std::env::set_var("BUSWATCH_PARSER_TEST_TABLE", "vehicle_positions");
        let config = parse_config("database:\n  table: ${BUSWATCH_PARSER_TEST_TABLE}\n").unwrap();
        assert_eq!(config.database.table, "vehicle_positions");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config("/nonexistent/buswatch.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        assert!(parse_config("service: [unclosed").is_err());
    }
}
