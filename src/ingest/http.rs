/// Polling client for the sensor proxy endpoint
use log::debug;
use std::time::Duration;
use time::OffsetDateTime;
use url::Url;

use crate::error::IngestError;
use crate::ingest::source::ReadingSource;
use crate::models::{Reading, TelemetryPayload};

/// Fetches one reading per call with a plain HTTP GET
///
/// The endpoint answers with a JSON object such as
/// `{"temperature": 24.1, "humidity": 48.0, "gasLevel": 130, "rain": false}`.
/// A body carrying an `error` field is treated as a failed poll even when the
/// status code is 200, which is how the proxy reports an unreachable device.
pub struct HttpSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSource {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpSource { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl ReadingSource for HttpSource {
    async fn fetch(&mut self) -> Result<Reading, IngestError> {
        let response = self.client.get(self.endpoint.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Status(status));
        }

        let payload: TelemetryPayload = response.json().await?;
        payload_to_reading(payload, OffsetDateTime::now_utc())
    }
}

pub(crate) fn payload_to_reading(
    payload: TelemetryPayload,
    timestamp: OffsetDateTime,
) -> Result<Reading, IngestError> {
    if let Some(message) = payload.error.clone() {
        return Err(IngestError::Upstream(message));
    }

    let reading = payload.into_reading(timestamp);
    debug!(
        "Received reading: temp={:?}, humidity={:?}, gas={:?}, rain={:?}",
        reading.temperature, reading.humidity, reading.gas_level, reading.rain
    );
    Ok(reading)
}
