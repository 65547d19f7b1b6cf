use serde::de::IgnoredAny;
use serde::Deserialize;
use time::OffsetDateTime;

/// One timestamped sensor sample.
///
/// Numeric metrics are optional: `None` means the sensor reported nothing for
/// that metric, which scores as no added risk.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub timestamp: OffsetDateTime,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub gas_level: Option<f64>,
    pub rain: Option<bool>,
    pub motion: Option<bool>,
    pub anomaly: bool,
}

impl Reading {
    /// Static stand-in used when the stream has never produced a valid reading
    pub fn placeholder(timestamp: OffsetDateTime) -> Self {
        Reading {
            timestamp,
            temperature: Some(25.0),
            humidity: Some(50.0),
            gas_level: Some(10.0),
            rain: Some(false),
            motion: None,
            anomaly: false,
        }
    }
}

/// Payload shape returned by the sensor proxy endpoint
///
/// Firmware revisions disagree on field names and types: the gas reading
/// appears under several keys, and flags arrive as booleans, numbers or
/// strings. A field that cannot be understood decodes as `None` instead of
/// failing the whole poll.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryPayload {
    temperature: Option<Measure>,
    humidity: Option<Measure>,
    #[serde(rename = "gasLevel")]
    gas_level_camel: Option<Measure>,
    gas_level: Option<Measure>,
    gas: Option<Measure>,
    mq_ppm: Option<Measure>,
    aqi: Option<Measure>,
    rain: Option<Flag>,
    motion: Option<Flag>,
    anomaly: Option<Flag>,
    pub error: Option<String>,
}

impl TelemetryPayload {
    /// First gas key present wins: `gasLevel`, `gas_level`, `gas`, `mq_ppm`, `aqi`
    fn gas_reading(&self) -> Option<f64> {
        [
            &self.gas_level_camel,
            &self.gas_level,
            &self.gas,
            &self.mq_ppm,
            &self.aqi,
        ]
        .into_iter()
        .find_map(|field| field.as_ref().and_then(Measure::value))
    }

    pub fn into_reading(self, timestamp: OffsetDateTime) -> Reading {
        Reading {
            timestamp,
            temperature: self.temperature.as_ref().and_then(Measure::value),
            humidity: self.humidity.as_ref().and_then(Measure::value),
            gas_level: self.gas_reading(),
            rain: self.rain.as_ref().and_then(Flag::value),
            motion: self.motion.as_ref().and_then(Flag::value),
            anomaly: self.anomaly.as_ref().and_then(Flag::value).unwrap_or(false),
        }
    }
}

/// Numeric field sent either as a JSON number or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Measure {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl Measure {
    fn value(&self) -> Option<f64> {
        let value = match self {
            Measure::Number(n) => *n,
            Measure::Text(s) => s.trim().parse().ok()?,
            Measure::Other(_) => return None,
        };
        Some(value).filter(|v| v.is_finite())
    }
}

/// On/off field; any nonzero number counts as on
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl Flag {
    fn value(&self) -> Option<bool> {
        match self {
            Flag::Bool(b) => Some(*b),
            Flag::Number(n) if n.is_finite() => Some(*n != 0.0),
            Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Safe,
    Moderate,
    Critical,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Moderate => "MODERATE RISK",
            RiskLevel::Critical => "CRITICAL RISK",
        }
    }
}

/// Score, confidence and contributing factors derived from one reading
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub score: f64,
    /// Deterministic confidence, before any display jitter
    pub confidence: f64,
    pub factors: Vec<String>,
    pub level: RiskLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Connecting,
    Online,
    Degraded,
    Disconnected,
}

impl StreamStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, StreamStatus::Online)
    }

    pub fn label(&self) -> &'static str {
        match self {
            StreamStatus::Connecting => "CONNECTING",
            StreamStatus::Online => "ONLINE",
            StreamStatus::Degraded => "DEGRADED",
            StreamStatus::Disconnected => "DISCONNECTED",
        }
    }
}

/// Per-metric offsets subtracted from raw values before smoothing
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Calibration {
    pub temperature_bias: f64,
    pub humidity_bias: f64,
    pub gas_bias: f64,
}

impl Calibration {
    pub fn is_identity(&self) -> bool {
        self.temperature_bias == 0.0 && self.humidity_bias == 0.0 && self.gas_bias == 0.0
    }

    pub fn apply(&self, reading: &Reading) -> Reading {
        Reading {
            temperature: reading.temperature.map(|t| t - self.temperature_bias),
            humidity: reading.humidity.map(|h| h - self.humidity_bias),
            gas_level: reading.gas_level.map(|g| g - self.gas_bias),
            ..reading.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Reading {
        let payload: TelemetryPayload = serde_json::from_str(json).unwrap();
        payload.into_reading(OffsetDateTime::UNIX_EPOCH)
    }

    #[test]
    fn payload_accepts_gas_aliases() {
        assert_eq!(decode(r#"{"gasLevel": 120.0}"#).gas_level, Some(120.0));
        assert_eq!(decode(r#"{"gas_level": 95}"#).gas_level, Some(95.0));
        assert_eq!(decode(r#"{"aqi": 12.0}"#).gas_level, Some(12.0));
        assert_eq!(decode(r#"{"mq_ppm": 430}"#).gas_level, Some(430.0));
    }

    #[test]
    fn several_gas_keys_use_first_by_precedence() {
        let reading = decode(r#"{"temperature": 24.0, "gasLevel": 100, "aqi": 12}"#);
        assert_eq!(reading.gas_level, Some(100.0));

        let reading = decode(r#"{"aqi": 12, "mq_ppm": 410, "gas": "n/a"}"#);
        assert_eq!(reading.gas_level, Some(410.0));
    }

    #[test]
    fn numeric_flags_decode_as_booleans() {
        let reading = decode(
            r#"{"temperature": 24.0, "humidity": 50, "gasLevel": 100, "rain": 1, "motion": 0}"#,
        );
        assert_eq!(reading.rain, Some(true));
        assert_eq!(reading.motion, Some(false));
        assert_eq!(reading.temperature, Some(24.0));

        assert_eq!(decode(r#"{"rain": 0.0}"#).rain, Some(false));
        assert_eq!(decode(r#"{"rain": 0.4, "anomaly": "true"}"#).rain, Some(true));
        assert!(decode(r#"{"anomaly": "true"}"#).anomaly);
    }

    #[test]
    fn malformed_fields_decode_as_none() {
        let reading = decode(concat!(
            r#"{"temperature": "23.5", "humidity": {"value": 40},"#,
            r#" "rain": "drizzle", "motion": [1]}"#,
        ));

        assert_eq!(reading.temperature, Some(23.5));
        assert_eq!(reading.humidity, None);
        assert_eq!(reading.rain, None);
        assert_eq!(reading.motion, None);
    }

    #[test]
    fn payload_missing_fields_become_none() {
        let reading = decode(r#"{"temperature": 21.5, "rain": true, "motion": null}"#);

        assert_eq!(reading.temperature, Some(21.5));
        assert_eq!(reading.humidity, None);
        assert_eq!(reading.gas_level, None);
        assert_eq!(reading.rain, Some(true));
        assert_eq!(reading.motion, None);
        assert!(!reading.anomaly);
    }

    #[test]
    fn calibration_subtracts_bias_from_present_metrics() {
        let calibration = Calibration {
            temperature_bias: 2.0,
            humidity_bias: -4.5,
            gas_bias: 15.0,
        };
        let reading = Reading {
            humidity: None,
            ..Reading::placeholder(OffsetDateTime::UNIX_EPOCH)
        };
        let calibrated = calibration.apply(&reading);

        assert_eq!(calibrated.temperature, Some(23.0));
        assert_eq!(calibrated.humidity, None);
        assert_eq!(calibrated.gas_level, Some(-5.0));
    }
}
