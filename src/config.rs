use log::info;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::models::Calibration;
use crate::smoothing::DEFAULT_WEIGHT;

const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2500;
/// Any failed poll disconnects; larger values allow a grace window
const DEFAULT_DISCONNECT_AFTER: u32 = 1;

/// Dashboard tier; decides how much history is kept by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Lite,
    Pro,
}

impl Tier {
    pub fn default_history(&self) -> usize {
        match self {
            Tier::Lite => 20,
            Tier::Pro => 50,
        }
    }
}

impl FromStr for Tier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lite" | "light" => Ok(Tier::Lite),
            "pro" => Ok(Tier::Pro),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub endpoint: Url,
    pub tier: Tier,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub smoothing_weight: f64,
    pub history_capacity: usize,
    pub disconnect_after: u32,
    pub calibration: Calibration,
}

impl StreamConfig {
    pub fn new() -> Result<Self, ConfigError> {
        // Load environment variables
        dotenv::dotenv().ok();

        let config = Self::from_lookup(|key| env::var(key).ok())?;

        info!("Telemetry endpoint: {}", config.endpoint);
        info!(
            "Tier: {:?}, poll interval: {} ms, history: {} readings",
            config.tier,
            config.poll_interval.as_millis(),
            config.history_capacity
        );
        if !config.calibration.is_identity() {
            info!("Calibration offsets: {:?}", config.calibration);
        }

        Ok(config)
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_endpoint = lookup("TELEMETRY_ENDPOINT")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("TELEMETRY_ENDPOINT"))?;
        let endpoint =
            Url::parse(&raw_endpoint).map_err(|_| ConfigError::InvalidUrl(raw_endpoint.clone()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(raw_endpoint));
        }

        let tier = match lookup("TELEMETRY_TIER") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "TELEMETRY_TIER",
                value,
            })?,
            None => Tier::Lite,
        };

        let poll_interval_ms: u64 =
            parse_or(&lookup, "POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?;
        let request_timeout_ms: u64 =
            parse_or(&lookup, "REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;
        let smoothing_weight: f64 = parse_or(&lookup, "SMOOTHING_WEIGHT", DEFAULT_WEIGHT)?;
        let history_capacity: usize =
            parse_or(&lookup, "HISTORY_CAPACITY", tier.default_history())?;
        let disconnect_after: u32 =
            parse_or(&lookup, "DISCONNECT_AFTER", DEFAULT_DISCONNECT_AFTER)?;

        if poll_interval_ms == 0 {
            return Err(invalid("POLL_INTERVAL_MS", poll_interval_ms));
        }
        if request_timeout_ms == 0 {
            return Err(invalid("REQUEST_TIMEOUT_MS", request_timeout_ms));
        }
        if !(smoothing_weight > 0.0 && smoothing_weight <= 1.0) {
            return Err(invalid("SMOOTHING_WEIGHT", smoothing_weight));
        }
        if history_capacity == 0 {
            return Err(invalid("HISTORY_CAPACITY", history_capacity));
        }
        if disconnect_after == 0 {
            return Err(invalid("DISCONNECT_AFTER", disconnect_after));
        }

        let calibration = Calibration {
            temperature_bias: parse_bias(&lookup, "TEMPERATURE_BIAS")?,
            humidity_bias: parse_bias(&lookup, "HUMIDITY_BIAS")?,
            gas_bias: parse_bias(&lookup, "GAS_BIAS")?,
        };

        Ok(StreamConfig {
            endpoint,
            tier,
            poll_interval: Duration::from_millis(poll_interval_ms),
            request_timeout: Duration::from_millis(request_timeout_ms),
            smoothing_weight,
            history_capacity,
            disconnect_after,
            calibration,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn parse_bias<F>(lookup: &F, key: &'static str) -> Result<f64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let bias: f64 = parse_or(lookup, key, 0.0)?;
    if bias.is_finite() {
        Ok(bias)
    } else {
        Err(invalid(key, bias))
    }
}

fn invalid<T: ToString>(key: &'static str, value: T) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}
