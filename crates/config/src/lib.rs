use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

/// Identity and HTTP listener of the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            host: default_host(),
            http_port: default_http_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl ServiceConfig {
    /// Get the full HTTP address (host:http_port)
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

/// Connection to the observations database.
///
/// `url`, when set, overrides the individual connection fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_postgres_port")]
    pub port: u16,
    #[serde(default = "default_database_name")]
    pub database: String,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub min_connections: u32,
    #[serde(rename = "connection_timeout_seconds")]
    #[serde(default = "default_connection_timeout")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_seconds: u64,
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_db_host(),
            port: default_postgres_port(),
            database: default_database_name(),
            user: default_db_user(),
            password: None,
            ssl_mode: default_ssl_mode(),
            max_connections: default_max_connections(),
            min_connections: 0,
            connect_timeout_seconds: default_connection_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
            statement_timeout_seconds: default_statement_timeout(),
            table: default_table(),
        }
    }
}

/// Endpoint layout and snapshot location.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    #[serde(default = "default_live_window")]
    pub live_window_seconds: u64,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url_prefix: default_url_prefix(),
            live_window_seconds: default_live_window(),
            static_dir: default_static_dir(),
            snapshot_file: default_snapshot_file(),
        }
    }
}

/// Map provider settings handed to the frontend.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MapConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MonitoringConfig {
    /// Port of the Prometheus exporter. No exporter when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MasterConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}
