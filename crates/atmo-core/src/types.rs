//! Core data types for station observations

use serde::{Deserialize, Serialize};

/// Timestamp type (Unix epoch seconds)
pub type Timestamp = i64;

/// Lamport clock value attached to every request
pub type LamportClock = u64;

/// One observation from one weather station.
///
/// Field names on the wire follow the Bureau feed conventions; the struct
/// keeps idiomatic Rust names and maps with serde renames. `last_updated`
/// is assigned by the aggregator on accept, never trusted from the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WeatherRecord {
    /// Station identifier (primary key, required)
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(rename = "time_zone", default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,

    #[serde(default)]
    pub lat: f64,

    #[serde(default)]
    pub lon: f64,

    #[serde(
        rename = "local_date_time",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub local_date_time: Option<String>,

    #[serde(
        rename = "local_date_time_full",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub local_date_time_full: Option<String>,

    #[serde(rename = "air_temp", default)]
    pub air_temp: f64,

    #[serde(rename = "apparent_t", default)]
    pub apparent_t: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,

    #[serde(default)]
    pub dewpt: f64,

    #[serde(default)]
    pub press: f64,

    #[serde(rename = "rel_hum", default)]
    pub rel_hum: i32,

    #[serde(rename = "wind_dir", default, skip_serializing_if = "Option::is_none")]
    pub wind_dir: Option<String>,

    #[serde(rename = "wind_spd_kmh", default)]
    pub wind_spd_kmh: i32,

    #[serde(rename = "wind_spd_kt", default)]
    pub wind_spd_kt: i32,

    /// Epoch seconds at the moment the aggregator accepted this record
    #[serde(rename = "_last_updated", default)]
    pub last_updated: Timestamp,
}

impl WeatherRecord {
    /// A record is storable only when it carries a station id.
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// True when the record is older than `ttl_seconds` at time `now`.
    pub fn is_expired(&self, now: Timestamp, ttl_seconds: i64) -> bool {
        now - self.last_updated > ttl_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        let json = r#"{
            "id": "IDS60901",
            "name": "Adelaide (West Terrace / ngayirdapira)",
            "state": "SA",
            "time_zone": "CST",
            "lat": -34.9,
            "lon": 138.6,
            "air_temp": 13.3,
            "apparent_t": 9.5,
            "rel_hum": 60,
            "wind_dir": "S",
            "wind_spd_kmh": 15,
            "wind_spd_kt": 8,
            "_last_updated": 1700000000
        }"#;
        let record: WeatherRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, "IDS60901");
        assert_eq!(record.state.as_deref(), Some("SA"));
        assert_eq!(record.time_zone.as_deref(), Some("CST"));
        assert_eq!(record.air_temp, 13.3);
        assert_eq!(record.rel_hum, 60);
        assert_eq!(record.wind_spd_kt, 8);
        assert_eq!(record.last_updated, 1700000000);

        let out = serde_json::to_string(&record).unwrap();
        assert!(out.contains("\"air_temp\""));
        assert!(out.contains("\"apparent_t\""));
        assert!(out.contains("\"wind_spd_kmh\""));
        assert!(out.contains("\"_last_updated\""));
    }

    #[test]
    fn test_missing_fields_default() {
        let record: WeatherRecord = serde_json::from_str(r#"{"id":"VIC01"}"#).unwrap();
        assert!(record.has_id());
        assert_eq!(record.air_temp, 0.0);
        assert_eq!(record.rel_hum, 0);
        assert_eq!(record.name, None);
        assert_eq!(record.last_updated, 0);
    }

    #[test]
    fn test_absent_strings_not_serialized() {
        let record = WeatherRecord {
            id: "VIC01".into(),
            ..Default::default()
        };
        let out = serde_json::to_string(&record).unwrap();
        assert!(!out.contains("\"name\""));
        assert!(!out.contains("\"wind_dir\""));
    }

    #[test]
    fn test_missing_id_decodes_empty() {
        let record: WeatherRecord = serde_json::from_str(r#"{"air_temp":20.1}"#).unwrap();
        assert!(!record.has_id());
    }

    #[test]
    fn test_expiry_boundary() {
        let record = WeatherRecord {
            id: "WA02".into(),
            last_updated: 100,
            ..Default::default()
        };
        assert!(!record.is_expired(130, 30)); // exactly TTL old is still live
        assert!(record.is_expired(131, 30));
    }
}
