//! Deserializers that accept the several literal shapes ffprobe uses for
//! the same field across versions and builds.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;

use crate::time::parse_timestamp;

/// `true`, `1`, `"true"`, `"1"`.
pub fn bool_from_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n == 1),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Seconds as a number, seconds as a string, or `HH:MM:SS.fffffffff`.
pub fn duration_from_value(value: &Value) -> Option<Duration> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(|s| Duration::try_from_secs_f64(s).ok()),
        Value::String(s) => parse_timestamp(s),
        _ => None,
    }
}

pub fn i64_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn string_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(bool_from_value(&Value::deserialize(deserializer)?))
}

pub fn opt_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(duration_from_value(&Value::deserialize(deserializer)?))
}

pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(i64_from_value(&Value::deserialize(deserializer)?))
}

pub fn opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(i64_from_value(&Value::deserialize(deserializer)?).and_then(|v| u64::try_from(v).ok()))
}

pub fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(i64_from_value(&Value::deserialize(deserializer)?).and_then(|v| u32::try_from(v).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duration_out_of_range_is_dropped() {
        assert_eq!(duration_from_value(&json!(1e300)), None);
        assert_eq!(duration_from_value(&json!("1e300")), None);
        assert_eq!(duration_from_value(&json!(-3.5)), None);
        assert_eq!(duration_from_value(&json!(2.5)), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_bool_shapes() {
        assert_eq!(bool_from_value(&json!(true)), Some(true));
        assert_eq!(bool_from_value(&json!(0)), Some(false));
        assert_eq!(bool_from_value(&json!(1)), Some(true));
        assert_eq!(bool_from_value(&json!("True")), Some(true));
        assert_eq!(bool_from_value(&json!("0")), Some(false));
        assert_eq!(bool_from_value(&json!("maybe")), None);
        assert_eq!(bool_from_value(&Value::Null), None);
    }

    #[test]
    fn test_duration_shapes() {
        assert_eq!(
            duration_from_value(&json!(12.5)),
            Some(Duration::from_millis(12_500))
        );
        assert_eq!(
            duration_from_value(&json!("12.500000")),
            Some(Duration::from_millis(12_500))
        );
        assert_eq!(
            duration_from_value(&json!("01:29:43.253000000")),
            Some(Duration::from_millis(5_383_253))
        );
        assert_eq!(duration_from_value(&json!("N/A")), None);
    }

    #[test]
    fn test_numbers_from_strings() {
        assert_eq!(i64_from_value(&json!("128000")), Some(128_000));
        assert_eq!(i64_from_value(&json!(44100)), Some(44_100));
        assert_eq!(i64_from_value(&json!("n/a")), None);
    }
}
