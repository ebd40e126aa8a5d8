//! Publisher input contract driven end to end: text file → record → PUT

use std::time::Duration;

use atmo_core::WeatherRecord;
use atmo_proto::{get_records, put_record, ServerTarget};
use atmo_publisher::parse_observation;
use atmo_server::{Aggregator, Settings};

const OBSERVATION_FILE: &str = "\
id:IDS60901
name:Adelaide (West Terrace / ngayirdapira)
state:SA
time_zone:CST
lat:-34.9
lon:138.6
air_temp:13.3
apparent_t:9.5
rel_hum:60
wind_dir:S
wind_spd_kmh:15
wind_spd_kt:8
";

#[tokio::test]
async fn observation_file_reaches_the_aggregate() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        port: 0,
        data_path: dir.path().join("weather_data.json"),
        expiry_seconds: 30,
        sweep_period: Duration::from_secs(10),
        pool_size: 10,
        queue_capacity: 128,
    };
    let server = Aggregator::bind(settings).await.unwrap();
    let mut handle = server.spawn();
    handle.ready().await;
    let target = ServerTarget {
        host: "127.0.0.1".to_string(),
        port: handle.local_addr().port(),
    };

    let record = parse_observation(OBSERVATION_FILE).unwrap();
    let body = atmo_core::codec::encode_record(&record).unwrap();

    let response = put_record(&target, 1, &body).await.unwrap();
    assert_eq!(response.status, 201);

    let response = get_records(&target, 1, Some("IDS60901")).await.unwrap();
    assert_eq!(response.status, 200);
    let records: Vec<WeatherRecord> = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "IDS60901");
    assert_eq!(records[0].air_temp, 13.3);
    assert_eq!(records[0].wind_dir.as_deref(), Some("S"));
    // the server stamped acceptance time, whatever the publisher sent
    assert!(records[0].last_updated > 0);

    handle.shutdown().await;
}
