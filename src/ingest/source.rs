use log::{error, info, warn};
use std::future::Future;
use time::OffsetDateTime;

use crate::error::IngestError;
use crate::models::{Reading, StreamStatus};

/// Anything that can deliver the next raw reading
pub trait ReadingSource {
    fn fetch(&mut self) -> impl Future<Output = Result<Reading, IngestError>> + Send;
}

/// Result of one poll; never an error
#[derive(Debug, Clone)]
pub struct Delivery {
    pub reading: Reading,
    /// False when `reading` is a carried-over or placeholder value
    pub fresh: bool,
    pub status: StreamStatus,
}

/// Wraps a source so transport failures degrade instead of propagating
pub struct Ingest<S> {
    source: S,
    disconnect_after: u32,
    consecutive_failures: u32,
    status: StreamStatus,
    last_valid: Option<Reading>,
}

impl<S: ReadingSource> Ingest<S> {
    pub fn new(source: S, disconnect_after: u32) -> Self {
        Ingest {
            source,
            disconnect_after: disconnect_after.max(1),
            consecutive_failures: 0,
            status: StreamStatus::Connecting,
            last_valid: None,
        }
    }

    /// Poll the source once
    ///
    /// On failure the last valid reading is returned again, or a placeholder
    /// if nothing has arrived yet. With the default `disconnect_after` of 1
    /// every failure marks the stream `Disconnected`; a larger value opens a
    /// grace window reported as `Degraded`.
    pub async fn next_reading(&mut self) -> Delivery {
        match self.source.fetch().await {
            Ok(reading) => {
                if self.status != StreamStatus::Online {
                    info!("Telemetry stream online");
                }
                self.consecutive_failures = 0;
                self.status = StreamStatus::Online;
                self.last_valid = Some(reading.clone());
                Delivery {
                    reading,
                    fresh: true,
                    status: self.status,
                }
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                error!(
                    "Poll failed ({} in a row): {}",
                    self.consecutive_failures, e
                );

                let next_status = if self.consecutive_failures >= self.disconnect_after {
                    StreamStatus::Disconnected
                } else {
                    StreamStatus::Degraded
                };
                if next_status == StreamStatus::Disconnected && self.status != next_status {
                    warn!(
                        "Telemetry stream disconnected after {} failed polls",
                        self.consecutive_failures
                    );
                }
                self.status = next_status;

                let reading = self
                    .last_valid
                    .clone()
                    .unwrap_or_else(|| Reading::placeholder(OffsetDateTime::now_utc()));
                Delivery {
                    reading,
                    fresh: false,
                    status: self.status,
                }
            }
        }
    }
}
