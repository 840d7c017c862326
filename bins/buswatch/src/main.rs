//! buswatch CLI and server binary
//!
//! Commands for writing a default configuration, validating one, and
//! starting the observation API.

mod readiness;

use anyhow::{Context, Result};
use cli::{Cli, Commands, LogFormatArg};
use config::{generate_default_config, load_config, save_config, validate_config, MasterConfig};
use observability::{init_logging, init_metrics, LogFormat};
use observations::{
    observation_routes, ObservationApiState, ObservationStore, PostgresObservationStore,
    SnapshotSource,
};
use readiness::StoreReadiness;
use server::{health_routes, port_validator, HealthState, HttpServer, ServerConfig, ServerExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Start { config, host, http } => {
            start_command(cli.log_format, config, host, http).await
        }
        Commands::Validate { config } => {
            init_logging("buswatch", resolve_log_format(cli.log_format, None))?;
            info!("Executing 'validate' command");
            validate_command(config).await
        }
        Commands::Init { output } => {
            init_logging("buswatch", resolve_log_format(cli.log_format, None))?;
            info!("Executing 'init' command");
            init_command(output).await
        }
    }
}

/// The command-line flag wins over the configured format; unknown values fall back to pretty.
fn resolve_log_format(flag: Option<LogFormatArg>, configured: Option<&str>) -> LogFormat {
    flag.map(|f| f.as_str())
        .or(configured)
        .and_then(LogFormat::parse)
        .unwrap_or_default()
}

async fn start_command(
    log_format: Option<LogFormatArg>,
    config_path: PathBuf,
    host_override: Option<String>,
    http_override: Option<u16>,
) -> Result<()> {
    let mut config = load_config(&config_path)?;
    init_logging(
        &config.service.name,
        resolve_log_format(log_format, Some(&config.logging.format)),
    )?;

    info!(path = ?config_path, "buswatch starting...");

    let report = validate_config(&config);

    if !report.warnings.is_empty() {
        warn!("Configuration warnings:");
        for warning in &report.warnings {
            warn!(field = %warning.field, message = %warning.message);
        }
    }

    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot start buswatch due to configuration errors");
    }

    apply_overrides(&mut config, host_override, http_override);

    if let Some(port) = config.monitoring.metrics_port {
        init_metrics(port).context("Failed to start metrics exporter")?;
    }

    let store = PostgresObservationStore::connect(&config.database)
        .await
        .context("Failed to connect to the observations database")?;
    info!(table = store.table(), "Connected to observations database");

    let store: Arc<dyn ObservationStore> = Arc::new(store);
    let router = build_router(&config, store)?;

    let server_config = ServerConfig::new(config.service.host.clone(), config.service.http_port)
        .with_request_timeout(Duration::from_secs(config.service.request_timeout_seconds));
    port_validator::validate_http_port(&server_config).await?;

    info!(
        address = %config.service.http_address(),
        prefix = %config.api.url_prefix,
        "Serving observation API"
    );

    HttpServer::new(server_config, router)
        .run_with_ctrl_c()
        .await?;

    info!("buswatch stopped");
    Ok(())
}

fn apply_overrides(config: &mut MasterConfig, host: Option<String>, http: Option<u16>) {
    if let Some(host) = host {
        debug!(%host, "Overriding bind host");
        config.service.host = host;
    }
    if let Some(port) = http {
        debug!(port, "Overriding HTTP port");
        config.service.http_port = port;
    }
}

/// Observation endpoints under the configured prefix plus the health routes.
fn build_router(config: &MasterConfig, store: Arc<dyn ObservationStore>) -> Result<axum::Router> {
    let snapshot = SnapshotSource::in_dir(&config.api.static_dir, &config.api.snapshot_file);
    let live_window =
        chrono::Duration::from_std(Duration::from_secs(config.api.live_window_seconds))
            .context("api.live_window_seconds is out of range")?;

    let api_state = Arc::new(ObservationApiState::new(
        Arc::clone(&store),
        snapshot,
        live_window,
    ));
    let health = HealthState::new(config.service.name.clone())
        .with_check(Arc::new(StoreReadiness::new(store)));

    Ok(observation_routes(api_state, &config.api.url_prefix).merge(health_routes(health)))
}

async fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "Failed to load configuration");
            anyhow::bail!(e);
        }
    };

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Service: {}", config.service.name);
    println!("Listen: {}", config.service.http_address());
    println!(
        "Database: {}:{}/{} (table {})",
        config.database.host, config.database.port, config.database.database, config.database.table
    );
    println!("API prefix: {}", config.api.url_prefix);
    println!(
        "Snapshot: {}",
        Path::new(&config.api.static_dir)
            .join(&config.api.snapshot_file)
            .display()
    );

    Ok(())
}

async fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Point the database section at the observations table");
    println!("  2. Set BUSWATCH_DB_PASSWORD and MAPBOX_API_KEY");
    println!(
        "  3. Run 'buswatch validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  4. Run 'buswatch start --config {:?}' to start the API",
        output_path
    );

    Ok(())
}
