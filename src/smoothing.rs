/// Exponential smoothing of streamed sensor metrics
use log::warn;

use crate::error::SmoothError;
use crate::models::Reading;

/// Weight given to each new sample; the previous value retains `1 - weight`
pub const DEFAULT_WEIGHT: f64 = 0.15;

/// Blend a new raw value into the previous smoothed value
///
/// Returns `raw` unchanged on a cold start (`previous` is `None`). Otherwise
/// the result is `previous * (1 - weight) + raw * weight`, which always lies
/// between `previous` and `raw`.
///
/// # Errors
/// `SmoothError::InvalidInput` if `raw` is NaN or infinite, or if `weight`
/// is outside `(0, 1]`.
pub fn smooth(previous: Option<f64>, raw: f64, weight: f64) -> Result<f64, SmoothError> {
    if !raw.is_finite() {
        return Err(SmoothError::InvalidInput {
            field: "raw",
            value: raw,
        });
    }
    if !(weight > 0.0 && weight <= 1.0) {
        return Err(SmoothError::InvalidInput {
            field: "weight",
            value: weight,
        });
    }

    let previous = match previous {
        Some(previous) => previous,
        None => return Ok(raw),
    };

    let blended = previous * (1.0 - weight) + raw * weight;
    // Rounding can land one ulp outside the pair
    Ok(blended.clamp(previous.min(raw), previous.max(raw)))
}

/// Last smoothed value of every tracked metric
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmoothedState {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub gas_level: Option<f64>,
}

/// Stateful smoother applying `smooth` to each metric of a reading stream
#[derive(Debug, Clone)]
pub struct Smoother {
    weight: f64,
    state: SmoothedState,
}

impl Smoother {
    pub fn new(weight: f64) -> Self {
        Smoother {
            weight,
            state: SmoothedState::default(),
        }
    }

    /// Smooth every metric of `raw` and return the smoothed reading
    ///
    /// A metric that fails validation is dropped and the previous smoothed
    /// value carried forward; so is a metric missing from `raw`.
    pub fn apply(&mut self, raw: &Reading) -> Reading {
        let weight = self.weight;
        let state = &mut self.state;

        state.temperature = step("temperature", state.temperature, raw.temperature, weight);
        state.humidity = step("humidity", state.humidity, raw.humidity, weight);
        state.gas_level = step("gas_level", state.gas_level, raw.gas_level, weight);

        Reading {
            temperature: state.temperature,
            humidity: state.humidity,
            gas_level: state.gas_level,
            ..raw.clone()
        }
    }
}

fn step(metric: &str, previous: Option<f64>, raw: Option<f64>, weight: f64) -> Option<f64> {
    let raw = match raw {
        Some(raw) => raw,
        None => return previous,
    };

    match smooth(previous, raw, weight) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Rejected {} sample: {}", metric, e);
            previous
        }
    }
}
