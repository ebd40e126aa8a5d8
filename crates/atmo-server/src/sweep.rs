//! Periodic expiry sweeping
//!
//! A timer task offers an internal `Sweep` item onto the request FIFO so
//! the eviction runs on the pipeline worker, serialized with PUTs and
//! GETs. A tick that finds the FIFO full is skipped; GET drop-on-read
//! keeps responses correct until the next tick lands.

use std::time::Duration;

use atmo_core::WeatherRecord;
use tokio::time::{interval, MissedTickBehavior};
use tracing::warn;

use crate::pipeline::{PipelineHandle, WorkItem};

/// Split `records` into the live ones and the ids of the expired ones.
pub fn partition_expired(
    records: Vec<WeatherRecord>,
    now: i64,
    ttl_seconds: i64,
) -> (Vec<WeatherRecord>, Vec<String>) {
    let mut live = Vec::with_capacity(records.len());
    let mut expired = Vec::new();
    for record in records {
        if record.is_expired(now, ttl_seconds) {
            expired.push(record.id);
        } else {
            live.push(record);
        }
    }
    (live, expired)
}

/// Drive the sweeper until the pipeline goes away. The first tick fires
/// immediately.
pub async fn run_sweeper(handle: PipelineHandle, period: Duration) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        timer.tick().await;
        if handle.try_submit(WorkItem::Sweep).is_err() {
            warn!("request queue full, skipping sweep tick");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_at(id: &str, last_updated: i64) -> WeatherRecord {
        WeatherRecord {
            id: id.into(),
            last_updated,
            ..Default::default()
        }
    }

    #[test]
    fn test_partition_keeps_fresh_records() {
        let records = vec![record_at("SA01", 100), record_at("WA02", 50)];
        let (live, expired) = partition_expired(records, 90, 30);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, "SA01");
        assert_eq!(expired, vec!["WA02".to_string()]);
    }

    #[test]
    fn test_partition_ttl_boundary_is_exclusive() {
        // exactly TTL old stays; one second older goes
        let records = vec![record_at("SA01", 70), record_at("WA02", 69)];
        let (live, expired) = partition_expired(records, 100, 30);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, "SA01");
        assert_eq!(expired, vec!["WA02".to_string()]);
    }

    #[test]
    fn test_partition_nothing_expired() {
        let records = vec![record_at("SA01", 100)];
        let (live, expired) = partition_expired(records, 110, 30);
        assert_eq!(live.len(), 1);
        assert!(expired.is_empty());
    }

    #[test]
    fn test_partition_empty_input() {
        let (live, expired) = partition_expired(Vec::new(), 100, 30);
        assert!(live.is_empty());
        assert!(expired.is_empty());
    }
}
