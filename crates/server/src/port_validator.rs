//! Early port checks before the server binds
//!
//! Checking then binding races with other processes; these checks only give
//! the operator a clear message up front. The real bind stays authoritative.

use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

/// Reject port 0 and warn on privileged ports.
pub fn validate_port_range(port: u16) -> Result<()> {
    if port == 0 {
        Err(ServerError::ConfigError(
            "Port cannot be 0 (ephemeral port assignment not supported for explicit binding)"
                .to_string(),
        ))
    } else {
        if port < 1024 {
            warn!(
                "Port {} is a privileged port (requires root/admin privileges)",
                port
            );
        }
        Ok(())
    }
}

/// Check that the configured HTTP port is in range and currently free.
pub async fn validate_http_port(config: &ServerConfig) -> Result<()> {
    validate_port_range(config.http_port)?;

    let addr = config.http_addr()?;
    debug!(%addr, "Checking HTTP port");

    match TcpListener::bind(addr).await {
        Ok(listener) => {
            drop(listener);
            info!("HTTP port {} is available", config.http_port);
            Ok(())
        }
        Err(e) => {
            error!("HTTP port {} is NOT available: {}", config.http_port, e);
            Err(ServerError::port_in_use(config.http_port, e.to_string()))
        }
    }
}

/// `true` when binding `host:port` currently fails.
pub async fn is_port_in_use(host: &str, port: u16) -> bool {
    TcpListener::bind(format!("{}:{}", host, port)).await.is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_validate_port_range() {
        assert!(validate_port_range(0).is_err());
        assert!(validate_port_range(80).is_ok());
        assert!(validate_port_range(5000).is_ok());
        assert!(validate_port_range(65535).is_ok());
    }

    #[tokio::test]
    async fn test_is_port_in_use() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(is_port_in_use("127.0.0.1", port).await);

        drop(listener);
        assert!(!is_port_in_use("127.0.0.1", port).await);
    }

    #[tokio::test]
    async fn test_validate_http_port_detects_conflict() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = validate_http_port(&ServerConfig::new("127.0.0.1", port)).await;
        assert_matches!(result, Err(ServerError::PortInUse { port: p, .. }) if p == port);
    }

    #[tokio::test]
    async fn test_validate_http_port_rejects_zero() {
        let result = validate_http_port(&ServerConfig::new("127.0.0.1", 0)).await;
        assert_matches!(result, Err(ServerError::ConfigError(_)));
    }
}
