/// Formatting helpers for log output
use time::macros::format_description;
use time::OffsetDateTime;

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    let format = format_description!("[day].[month].[year] - [hour]:[minute]:[second]");
    dt.format(format).unwrap_or_else(|_| dt.to_string())
}

/// Render an optional metric with fixed precision, or `--` when absent
pub fn format_metric(value: Option<f64>, precision: usize, unit: &str) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}{}", precision, v, unit),
        _ => format!("--{}", unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn formats_day_first() {
        let dt = datetime!(2024-03-07 09:05:02 UTC);
        assert_eq!(format_datetime(&dt), "07.03.2024 - 09:05:02");
    }

    #[test]
    fn metric_placeholder_when_missing() {
        assert_eq!(format_metric(Some(24.456), 1, "°C"), "24.5°C");
        assert_eq!(format_metric(None, 1, "%"), "--%");
        assert_eq!(format_metric(Some(f64::NAN), 0, " ppm"), "-- ppm");
    }
}
