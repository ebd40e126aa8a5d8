//! Observation input parsing for the publisher
//!
//! The input contract is plaintext, one `key:value` pair per line, keys
//! matching the wire field names. A record without a station id never
//! leaves the publisher.

use atmo_core::WeatherRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("observation file has no station id")]
    MissingId,

    #[error("invalid numeric value for {field}: {value:?}")]
    InvalidNumber { field: String, value: String },
}

pub type PublishResult<T> = Result<T, PublishError>;

/// Parse the text observation format into a record.
///
/// Lines are trimmed; blank lines and lines without a `:` are skipped;
/// values keep any further colons (`local_date_time` contains one).
/// Unknown keys are ignored.
pub fn parse_observation(content: &str) -> PublishResult<WeatherRecord> {
    let mut record = WeatherRecord::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "id" => record.id = value.to_string(),
            "name" => record.name = Some(value.to_string()),
            "state" => record.state = Some(value.to_string()),
            "time_zone" => record.time_zone = Some(value.to_string()),
            "local_date_time" => record.local_date_time = Some(value.to_string()),
            "local_date_time_full" => record.local_date_time_full = Some(value.to_string()),
            "cloud" => record.cloud = Some(value.to_string()),
            "wind_dir" => record.wind_dir = Some(value.to_string()),
            "lat" => record.lat = parse_f64(key, value)?,
            "lon" => record.lon = parse_f64(key, value)?,
            "air_temp" => record.air_temp = parse_f64(key, value)?,
            "apparent_t" => record.apparent_t = parse_f64(key, value)?,
            "dewpt" => record.dewpt = parse_f64(key, value)?,
            "press" => record.press = parse_f64(key, value)?,
            "rel_hum" => record.rel_hum = parse_i32(key, value)?,
            "wind_spd_kmh" => record.wind_spd_kmh = parse_i32(key, value)?,
            "wind_spd_kt" => record.wind_spd_kt = parse_i32(key, value)?,
            _ => {}
        }
    }

    if !record.has_id() {
        return Err(PublishError::MissingId);
    }
    Ok(record)
}

fn parse_f64(field: &str, value: &str) -> PublishResult<f64> {
    value.parse().map_err(|_| PublishError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_i32(field: &str, value: &str) -> PublishResult<i32> {
    value.parse().map_err(|_| PublishError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
id:IDS60901
name:Adelaide (West Terrace /  ngayirdapira)
state: SA
time_zone:CST
lat:-34.9
lon:138.6
local_date_time:15/04:00pm
local_date_time_full:20230715160000
air_temp:13.3
apparent_t:9.5
cloud:Partly cloudy
dewpt:5.7
press:1023.9
rel_hum:60
wind_dir:S
wind_spd_kmh:15
wind_spd_kt:8
";

    #[test]
    fn test_parse_full_observation() {
        let record = parse_observation(SAMPLE).unwrap();
        assert_eq!(record.id, "IDS60901");
        assert_eq!(record.state.as_deref(), Some("SA"));
        assert_eq!(record.lat, -34.9);
        assert_eq!(record.air_temp, 13.3);
        assert_eq!(record.rel_hum, 60);
        assert_eq!(record.wind_spd_kt, 8);
        // value keeps the colon inside the time
        assert_eq!(record.local_date_time.as_deref(), Some("15/04:00pm"));
    }

    #[test]
    fn test_blank_lines_and_unknown_keys_skipped() {
        let record = parse_observation("id:SA01\n\nnot a pair\nmystery:42\n").unwrap();
        assert_eq!(record.id, "SA01");
    }

    #[test]
    fn test_missing_id_is_invalid() {
        assert!(matches!(
            parse_observation("air_temp:20.1\n"),
            Err(PublishError::MissingId)
        ));
        assert!(matches!(
            parse_observation("id:\nair_temp:20.1\n"),
            Err(PublishError::MissingId)
        ));
    }

    #[test]
    fn test_bad_number_is_invalid() {
        let err = parse_observation("id:SA01\nair_temp:warm\n").unwrap_err();
        assert!(matches!(err, PublishError::InvalidNumber { .. }));
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let record = parse_observation("  id : SA01  \n  air_temp : 20.1 \n").unwrap();
        assert_eq!(record.id, "SA01");
        assert_eq!(record.air_temp, 20.1);
    }
}
