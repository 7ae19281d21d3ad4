use chrono::{DateTime, Utc};

/// Median of `samples`, averaging the two middle values for an even count.
/// Returns `None` for an empty sample.
pub fn median(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let middle = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        Some((sorted[middle - 1] + sorted[middle]) / 2.0)
    } else {
        Some(sorted[middle])
    }
}

/// Minutes between two instants, truncated to whole seconds first.
pub fn elapsed_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds().div_euclid(1000) as f64 / 60.0
}

/// `numerator / denominator` to two decimals, ties rounded up.
/// `denominator` must be positive.
pub fn ratio_two_places(numerator: i64, denominator: i64) -> String {
    let hundredths = (numerator * 200 + denominator) / (2 * denominator);
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

/// Renders a duration in minutes the way the dashboard shows it, e.g. `15 min`.
pub fn format_minutes(minutes: f64) -> String {
    format!("{} min", minutes.round() as i64)
}
