mod config;
mod diagnostics;
mod error;
mod history;
mod ingest;
mod models;
mod risk;
mod session;
mod smoothing;
mod utils;

use log::{error, info, warn};

use config::StreamConfig;
use ingest::HttpSource;
use session::{SessionSnapshot, TelemetrySession};
use utils::{format_datetime, format_metric};

/// Render boundary: the only place display jitter is applied
fn report(snapshot: &SessionSnapshot, rng: &mut impl rand::Rng) {
    let (reading, assessment) = match (&snapshot.latest, &snapshot.assessment) {
        (Some(reading), Some(assessment)) => (reading, assessment),
        _ => return,
    };

    info!(
        "[{}] {} | temp {} | humidity {} | gas {} | motion {} | history {}",
        format_datetime(&reading.timestamp),
        snapshot.status.label(),
        format_metric(reading.temperature, 1, "°C"),
        format_metric(reading.humidity, 1, "%"),
        format_metric(reading.gas_level, 0, " ppm"),
        match reading.motion {
            Some(true) => "yes",
            Some(false) => "no",
            None => "--",
        },
        snapshot.history.len()
    );
    info!(
        "  {}: risk {:.0}%, confidence {:.1}%, trust {}",
        assessment.level.label(),
        assessment.score,
        risk::jittered_confidence(assessment.confidence, rng),
        format_metric(snapshot.trust_score, 0, "%")
    );
    for factor in &assessment.factors {
        warn!("  - {}", factor);
    }
    info!(
        "  Trend: temperature {}, gas {}",
        snapshot.trends.temperature.label(),
        snapshot.trends.gas_level.label()
    );
    for (metric, condition) in snapshot.health.faults() {
        warn!("  Sensor {}: {}", metric, condition.label());
    }

    if !snapshot.status.is_connected() {
        warn!(
            "Showing last known reading; stream is {}",
            snapshot.status.label()
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match StreamConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let source = HttpSource::new(config.endpoint.clone(), config.request_timeout)?;
    info!(
        "Polling {} with a {} ms request timeout",
        source.endpoint(),
        config.request_timeout.as_millis()
    );
    let mut session = TelemetrySession::new(&config, source);

    // Handle Ctrl+C gracefully
    let (tx, rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        let _ = tx.send(());
    });

    info!("Starting telemetry stream");
    let mut rng = rand::thread_rng();
    session.run(rx, |snapshot| report(snapshot, &mut rng)).await;

    if let Some(assessment) = session.assessment() {
        info!(
            "Last assessment: {} at {:.0}% over {} buffered readings (stream {})",
            assessment.level.label(),
            assessment.score,
            session.history().len(),
            session.status().label()
        );
    }
    info!("Program terminated by user. Exiting gracefully.");

    Ok(())
}
