/// Sensor health, short-term trends and trust derived from recent history
use crate::history::History;
use crate::models::Reading;

/// Readings inspected for stuck or noisy sensors
const HEALTH_WINDOW: usize = 10;
/// Population standard deviation above which a sensor counts as noisy
const NOISE_STD_DEV: f64 = 20.0;

/// Readings spanned by a trend; the slope is last minus first
const TREND_WINDOW: usize = 5;
const TEMPERATURE_TREND_THRESHOLD: f64 = 0.5;
const GAS_TREND_THRESHOLD: f64 = 10.0;

const TRUST_LIVE: f64 = 90.0;
const TRUST_FALLBACK: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCondition {
    Ok,
    /// Every value in the window is identical
    Stuck,
    /// Values swing more than a healthy sensor would
    Noisy,
}

impl SensorCondition {
    pub fn label(&self) -> &'static str {
        match self {
            SensorCondition::Ok => "OK",
            SensorCondition::Stuck => "Stuck/Frozen",
            SensorCondition::Noisy => "Unstable/Noisy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorHealthReport {
    pub temperature: SensorCondition,
    pub humidity: SensorCondition,
    pub gas_level: SensorCondition,
}

impl SensorHealthReport {
    /// Metrics whose condition is not `Ok`, as `(metric, condition)` pairs
    pub fn faults(&self) -> Vec<(&'static str, SensorCondition)> {
        [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("gas", self.gas_level),
        ]
        .into_iter()
        .filter(|(_, condition)| *condition != SensorCondition::Ok)
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub fn label(&self) -> &'static str {
        match self {
            Trend::Rising => "Rising",
            Trend::Falling => "Falling",
            Trend::Stable => "Stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendForecast {
    pub temperature: Trend,
    pub gas_level: Trend,
}

/// Classify each metric over the last ten buffered readings
///
/// A metric is only judged once ten readings carry a value for it; until then
/// it reports `Ok`.
pub fn check_health(history: &History) -> SensorHealthReport {
    SensorHealthReport {
        temperature: condition(&window(history, HEALTH_WINDOW, |r| r.temperature)),
        humidity: condition(&window(history, HEALTH_WINDOW, |r| r.humidity)),
        gas_level: condition(&window(history, HEALTH_WINDOW, |r| r.gas_level)),
    }
}

/// Short-term direction of temperature and gas over the last five readings
pub fn predict_trends(history: &History) -> TrendForecast {
    TrendForecast {
        temperature: trend(
            &window(history, TREND_WINDOW, |r| r.temperature),
            TEMPERATURE_TREND_THRESHOLD,
        ),
        gas_level: trend(
            &window(history, TREND_WINDOW, |r| r.gas_level),
            GAS_TREND_THRESHOLD,
        ),
    }
}

/// How much the displayed reading can be trusted: live data beats fallback
pub fn trust_score(fresh: bool) -> f64 {
    if fresh {
        TRUST_LIVE
    } else {
        TRUST_FALLBACK
    }
}

/// Finite values of one metric from the newest `size` readings, oldest first
fn window<F>(history: &History, size: usize, metric: F) -> Vec<f64>
where
    F: Fn(&Reading) -> Option<f64>,
{
    history
        .iter()
        .skip(history.len().saturating_sub(size))
        .filter_map(metric)
        .filter(|v| v.is_finite())
        .collect()
}

fn condition(values: &[f64]) -> SensorCondition {
    if values.len() < HEALTH_WINDOW {
        return SensorCondition::Ok;
    }

    let first = values[0];
    if values.iter().all(|v| *v == first) {
        return SensorCondition::Stuck;
    }

    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    if variance.sqrt() > NOISE_STD_DEV {
        SensorCondition::Noisy
    } else {
        SensorCondition::Ok
    }
}

fn trend(values: &[f64], threshold: f64) -> Trend {
    if values.len() < TREND_WINDOW {
        return Trend::Stable;
    }

    let slope = values[values.len() - 1] - values[0];
    if slope > threshold {
        Trend::Rising
    } else if slope < -threshold {
        Trend::Falling
    } else {
        Trend::Stable
    }
}
