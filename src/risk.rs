/// Rule-based hazard scoring for the latest smoothed reading
use rand::Rng;

use crate::models::{Reading, RiskAssessment, RiskLevel};

const BASE_SCORE: f64 = 5.0;
const MAX_SCORE: f64 = 99.0;
const MAX_CONFIDENCE: f64 = 99.9;
const CONFIDENCE_JITTER: f64 = 0.5;

const TEMP_CRITICAL: f64 = 35.0;
const TEMP_ELEVATED: f64 = 30.0;
const TEMP_CRITICAL_PENALTY: f64 = 40.0;
const TEMP_ELEVATED_PENALTY_PER_DEGREE: f64 = 4.0; // 20 across the 30..35 band

const GAS_CRITICAL: f64 = 500.0;
const GAS_ELEVATED: f64 = 200.0;
const GAS_CRITICAL_PENALTY: f64 = 30.0;
const GAS_PPM_PER_PENALTY_POINT: f64 = 10.0; // 30 across the 200..500 band

const HUMIDITY_MIN: f64 = 30.0;
const HUMIDITY_MAX: f64 = 70.0;
const HUMIDITY_PENALTY: f64 = 10.0;

const RAIN_PENALTY: f64 = 20.0;
const ANOMALY_PENALTY: f64 = 50.0;

const CRITICAL_LEVEL: f64 = 60.0;
const MODERATE_LEVEL: f64 = 30.0;

/// Score a reading into a bounded risk percentage
///
/// Starts from a base score and adds a penalty for every metric past its
/// threshold, recording a factor string for each. Metrics that are absent or
/// not finite add nothing.
pub fn score(reading: &Reading) -> RiskAssessment {
    let mut total = BASE_SCORE;
    let mut factors = Vec::new();

    if let Some(temp) = finite(reading.temperature) {
        if temp > TEMP_CRITICAL {
            total += TEMP_CRITICAL_PENALTY;
            factors.push(format!("Critical temperature ({:.1}°C)", temp));
        } else if temp > TEMP_ELEVATED {
            total += (temp - TEMP_ELEVATED) * TEMP_ELEVATED_PENALTY_PER_DEGREE;
            factors.push(format!("Elevated temperature ({:.1}°C)", temp));
        }
    }

    if let Some(gas) = finite(reading.gas_level) {
        if gas > GAS_CRITICAL {
            total += GAS_CRITICAL_PENALTY;
            factors.push(format!("Hazardous gas level ({:.0} ppm)", gas));
        } else if gas > GAS_ELEVATED {
            total += (gas - GAS_ELEVATED) / GAS_PPM_PER_PENALTY_POINT;
            factors.push(format!("Elevated gas level ({:.0} ppm)", gas));
        }
    }

    if let Some(humidity) = finite(reading.humidity) {
        if !(HUMIDITY_MIN..=HUMIDITY_MAX).contains(&humidity) {
            total += HUMIDITY_PENALTY;
            factors.push(format!("Humidity out of range ({:.1}%)", humidity));
        }
    }

    if reading.rain == Some(true) {
        total += RAIN_PENALTY;
        factors.push("Rain detected".to_string());
    }

    if reading.anomaly {
        total += ANOMALY_PENALTY;
        factors.push("Anomaly flagged upstream".to_string());
    }

    let score = total.clamp(0.0, MAX_SCORE);

    RiskAssessment {
        score,
        confidence: confidence_for(score),
        factors,
        level: level_for(score),
    }
}

/// Deterministic confidence for a score: `100 - score`, clamped to `[0, 99.9]`
pub fn confidence_for(score: f64) -> f64 {
    (100.0 - score).clamp(0.0, MAX_CONFIDENCE)
}

pub fn level_for(score: f64) -> RiskLevel {
    if score >= CRITICAL_LEVEL {
        RiskLevel::Critical
    } else if score >= MODERATE_LEVEL {
        RiskLevel::Moderate
    } else {
        RiskLevel::Safe
    }
}

/// Display-only confidence with a small random wobble
///
/// Never feed the result back into scoring or tests.
pub fn jittered_confidence<R: Rng>(confidence: f64, rng: &mut R) -> f64 {
    let jitter = rng.gen_range(-CONFIDENCE_JITTER..=CONFIDENCE_JITTER);
    (confidence + jitter).clamp(0.0, MAX_CONFIDENCE)
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use time::OffsetDateTime;

    fn reading(
        temperature: f64,
        gas_level: f64,
        humidity: f64,
        rain: bool,
        anomaly: bool,
    ) -> Reading {
        Reading {
            timestamp: OffsetDateTime::UNIX_EPOCH,
            temperature: Some(temperature),
            humidity: Some(humidity),
            gas_level: Some(gas_level),
            rain: Some(rain),
            motion: None,
            anomaly,
        }
    }

    #[test]
    fn nominal_reading_scores_base() {
        let assessment = score(&reading(25.0, 0.0, 50.0, false, false));

        assert_eq!(assessment.score, 5.0);
        assert_eq!(assessment.confidence, 95.0);
        assert!(assessment.factors.is_empty());
        assert_eq!(assessment.level, RiskLevel::Safe);
    }

    #[test]
    fn critical_temperature_adds_forty() {
        let assessment = score(&reading(36.0, 0.0, 50.0, false, false));

        assert_eq!(assessment.score, 45.0);
        assert_eq!(assessment.confidence, 55.0);
        assert_eq!(assessment.factors.len(), 1);
        assert_eq!(assessment.level, RiskLevel::Moderate);
    }

    #[test]
    fn hazardous_gas_adds_thirty() {
        let assessment = score(&reading(25.0, 600.0, 50.0, false, false));

        assert_eq!(assessment.score, 35.0);
        assert_eq!(assessment.confidence, 65.0);
    }

    #[test]
    fn anomaly_adds_fifty() {
        let assessment = score(&reading(25.0, 0.0, 50.0, false, true));

        assert_eq!(assessment.score, 55.0);
        assert_eq!(assessment.confidence, 45.0);
        assert_eq!(assessment.factors, vec!["Anomaly flagged upstream".to_string()]);
    }

    #[test]
    fn elevated_bands_scale_linearly() {
        assert_eq!(score(&reading(32.0, 0.0, 50.0, false, false)).score, 13.0);
        assert_eq!(score(&reading(35.0, 0.0, 50.0, false, false)).score, 25.0);
        assert_eq!(score(&reading(25.0, 300.0, 50.0, false, false)).score, 15.0);
        assert_eq!(score(&reading(25.0, 500.0, 50.0, false, false)).score, 35.0);
    }

    #[test]
    fn humidity_and_rain_penalties() {
        assert_eq!(score(&reading(25.0, 0.0, 80.0, false, false)).score, 15.0);
        assert_eq!(score(&reading(25.0, 0.0, 20.0, false, false)).score, 15.0);
        assert_eq!(score(&reading(25.0, 0.0, 70.0, false, false)).score, 5.0);
        assert_eq!(score(&reading(25.0, 0.0, 50.0, true, false)).score, 25.0);
    }

    #[test]
    fn worst_case_is_clamped() {
        let assessment = score(&reading(40.0, 900.0, 90.0, true, true));

        assert_eq!(assessment.score, 99.0);
        assert_eq!(assessment.confidence, 1.0);
        assert_eq!(assessment.factors.len(), 5);
        assert_eq!(assessment.level, RiskLevel::Critical);
    }

    #[test]
    fn missing_metrics_add_no_risk() {
        let empty = Reading {
            timestamp: OffsetDateTime::UNIX_EPOCH,
            temperature: None,
            humidity: None,
            gas_level: Some(f64::NAN),
            rain: None,
            motion: Some(true),
            anomaly: false,
        };
        let assessment = score(&empty);

        assert_eq!(assessment.score, 5.0);
        assert!(assessment.factors.is_empty());
    }

    #[test]
    fn level_cut_offs_are_inclusive() {
        assert_eq!(level_for(29.9), RiskLevel::Safe);
        assert_eq!(level_for(30.0), RiskLevel::Moderate);
        assert_eq!(level_for(59.9), RiskLevel::Moderate);
        assert_eq!(level_for(60.0), RiskLevel::Critical);
        assert_eq!(level_for(99.0), RiskLevel::Critical);
    }

    #[test]
    fn jitter_stays_within_half_a_point() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let value = jittered_confidence(55.0, &mut rng);
            assert!((54.5..=55.5).contains(&value));
        }
        for _ in 0..100 {
            assert!(jittered_confidence(99.9, &mut rng) <= 99.9);
        }
    }

    proptest! {
        #[test]
        fn score_and_confidence_are_bounded(
            temperature in -50.0f64..120.0,
            gas_level in 0.0f64..2000.0,
            humidity in 0.0f64..100.0,
            rain in any::<bool>(),
            anomaly in any::<bool>(),
        ) {
            let assessment = score(&reading(temperature, gas_level, humidity, rain, anomaly));
            prop_assert!((0.0..=99.0).contains(&assessment.score));
            prop_assert_eq!(assessment.confidence, (100.0 - assessment.score).clamp(0.0, 99.9));
        }
    }
}
