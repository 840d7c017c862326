pub fn default_service_name() -> String {
    "buswatch".to_string()
}

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_http_port() -> u16 {
    5000
}

pub fn default_request_timeout() -> u64 {
    30
}

pub fn default_db_host() -> String {
    "localhost".to_string()
}

pub fn default_postgres_port() -> u16 {
    5432
}

pub fn default_database_name() -> String {
    "buswatch".to_string()
}

pub fn default_db_user() -> String {
    "buswatch".to_string()
}

pub fn default_ssl_mode() -> String {
    "prefer".to_string()
}

pub fn default_max_connections() -> u32 {
    10
}

pub fn default_connection_timeout() -> u64 {
    5
}

pub fn default_idle_timeout() -> u64 {
    600
}

pub fn default_statement_timeout() -> u64 {
    30
}

pub fn default_table() -> String {
    "buses".to_string()
}

pub fn default_url_prefix() -> String {
    "/api/v1/nyc".to_string()
}

pub fn default_live_window() -> u64 {
    60
}

pub fn default_static_dir() -> String {
    "static".to_string()
}

pub fn default_snapshot_file() -> String {
    "lastknownpositions.geojson".to_string()
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}
