//! Tidemark consumer binary.
//!
//! Boots the observation query service against a configured LDES-backed
//! SPARQL endpoint and probes the event stream once, so a deployment
//! surfaces a broken endpoint or dataset before anything downstream
//! starts asking for windows.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (`tidemark-config.yaml`, environment overrides)
//! 2. Initialize structured logging
//! 3. Validate the stream identity
//! 4. Build the endpoint handle and query service
//! 5. Wire Ctrl-C to the shared cancellation token
//! 6. Probe the event stream and report

use std::path::Path;
use std::time::Duration;

use tidemark_client::{CancellationToken, SparqlEndpoint};
use tidemark_core::config::{ConfigError, ConsumerConfig};
use tidemark_core::service::ObservationService;
use tidemark_types::{DatasetId, MetricId};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "tidemark-config.yaml";

/// Consumer entry point.
///
/// # Errors
///
/// Returns an error when configuration is invalid or the startup probe
/// cannot reach the stream.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration first so the configured level can seed the
    //    log filter. Nothing is logged until step 2.
    let (config, config_file_found) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("Starting tidemark-consumer");
    if config_file_found {
        info!(path = CONFIG_FILE, "Configuration loaded from file");
    } else {
        info!("Config file not found, using defaults");
    }
    info!(
        dataset_id = config.source.dataset_id,
        endpoint_url = config.source.endpoint_url,
        event_metric_id = config.source.event_metric_id,
        request_timeout_ms = config.transport.request_timeout_ms,
        "Consumer configuration"
    );

    // 3. Validate the stream identity.
    config.validate()?;

    // 4. Build the endpoint handle and query service.
    let endpoint = SparqlEndpoint::new(
        config.source.endpoint_url.clone(),
        Duration::from_millis(config.transport.request_timeout_ms),
    )?;
    let cancel = CancellationToken::new();
    let service = ObservationService::new(
        endpoint,
        DatasetId::new(config.source.dataset_id.clone()),
        MetricId::new(config.source.event_metric_id.clone()),
    )
    .with_cancellation(cancel.clone());
    info!("Observation service initialized");

    // 5. Wire Ctrl-C to the cancellation token so an in-flight query
    //    stops at its next page boundary.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, cancelling in-flight queries");
            cancel.cancel();
        }
    });

    // 6. Probe the event stream: fetch the latest event so connectivity
    //    problems show up now rather than on the first real query.
    let events = service.historical_events(None, None).await?;
    info!(event_count = events.len(), "Event stream probe complete");

    info!("tidemark-consumer finished");
    Ok(())
}

/// Load the consumer configuration, falling back to defaults when no
/// config file is present in the working directory. Returns whether the
/// file was found so the caller can report it once logging is up.
fn load_config() -> Result<(ConsumerConfig, bool), ConfigError> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        Ok((ConsumerConfig::from_file(config_path)?, true))
    } else {
        let mut config = ConsumerConfig::default();
        config.source.apply_env_overrides();
        Ok((config, false))
    }
}
