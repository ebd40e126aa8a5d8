//! JSON encode/decode for station records
//!
//! The persisted file and GET bodies carry a pretty-printed array; single
//! records on the PUT path are compact. Wire names are fixed by the serde
//! mapping on [`WeatherRecord`] and must not drift.

use thiserror::Error;

use crate::WeatherRecord;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Encode a single record (compact).
pub fn encode_record(record: &WeatherRecord) -> CodecResult<Vec<u8>> {
    Ok(serde_json::to_vec(record)?)
}

/// Encode a list of records as a pretty-printed JSON array.
pub fn encode_records(records: &[WeatherRecord]) -> CodecResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(records)?)
}

/// Decode a single record from raw bytes.
pub fn decode_record(bytes: &[u8]) -> CodecResult<WeatherRecord> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decode a list of records from raw bytes.
pub fn decode_records(bytes: &[u8]) -> CodecResult<Vec<WeatherRecord>> {
    Ok(serde_json::from_slice(bytes)?)
}
