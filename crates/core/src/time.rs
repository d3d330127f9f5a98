//! Locale-independent time rendering and parsing for ffmpeg command lines.

use std::time::Duration;

/// Renders a duration the way ffmpeg expects on its command line:
/// `H:MM:SS.mmm` with unpadded hours.
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// Renders a floating point value with a fixed number of decimals using `.`
/// as the separator regardless of locale.
pub fn format_decimal(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// Parses a timestamp as ffmpeg or ffprobe print it.
///
/// Accepts plain seconds (`12.5`) and clock notation (`1:02:03`,
/// `01:02:03.250`, `01:29:43.253000000`). Returns `None` for anything else,
/// including negative values.
pub fn parse_timestamp(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if !value.contains(':') {
        let seconds = value.parse::<f64>().ok()?;
        return Duration::try_from_secs_f64(seconds).ok();
    }

    let mut parts = value.split(':');
    let hours = parts.next()?.parse::<u64>().ok()?;
    let minutes = parts.next()?.parse::<u64>().ok()?;
    let seconds = parts.next()?;
    if parts.next().is_some() || minutes >= 60 {
        return None;
    }

    let (whole, fraction) = match seconds.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (seconds, ""),
    };
    let whole = whole.parse::<u64>().ok()?;
    if whole >= 60 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    // Keep nanosecond precision; ffprobe prints up to nine fractional digits.
    let nanos = if fraction.is_empty() {
        0
    } else {
        let digits: String = fraction.chars().take(9).collect();
        let scale = 10u32.pow(9 - digits.len() as u32);
        digits.parse::<u32>().ok()? * scale
    };

    let total = hours.checked_mul(3600)?.checked_add(minutes * 60 + whole)?;
    Some(Duration::new(total, nanos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0:00:00.000");
        assert_eq!(format_duration(Duration::from_millis(90_500)), "0:01:30.500");
        assert_eq!(
            format_duration(Duration::from_secs(26 * 3600 + 5 * 60 + 7)),
            "26:05:07.000"
        );
    }

    #[test]
    fn test_format_decimal_is_invariant() {
        assert_eq!(format_decimal(29.97, 3), "29.970");
        assert_eq!(format_decimal(0.76, 1), "0.8");
        assert_eq!(format_decimal(2.0, 1), "2.0");
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_timestamp("12.5"), Some(Duration::from_millis(12_500)));
        assert_eq!(parse_timestamp("  7 "), Some(Duration::from_secs(7)));
        assert_eq!(parse_timestamp("-1"), None);
        assert_eq!(parse_timestamp("abc"), None);
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_timestamp("00:00:05"), Some(Duration::from_secs(5)));
        assert_eq!(
            parse_timestamp("0:01:30.500"),
            Some(Duration::from_millis(90_500))
        );
        assert_eq!(
            parse_timestamp("01:29:43.253000000"),
            Some(Duration::from_millis(5_383_253))
        );
        assert_eq!(parse_timestamp("00:61:00"), None);
        assert_eq!(parse_timestamp("1:2:3:4"), None);
    }

    #[test]
    fn test_parse_out_of_range() {
        assert_eq!(parse_timestamp("1e300"), None);
        assert_eq!(parse_timestamp("-1"), None);
        assert_eq!(parse_timestamp("NaN"), None);
        assert_eq!(parse_timestamp("18446744073709551615:00:00"), None);
    }

    #[test]
    fn test_format_then_parse() {
        let d = Duration::from_millis(3_723_456);
        assert_eq!(parse_timestamp(&format_duration(d)), Some(d));
    }
}
