//! Snapshot persistence for the current aggregate
//!
//! The working set is one record per live station, so every mutation
//! rewrites the whole file. Writes go to a sibling temp file followed by an
//! atomic rename, so readers of the canonical path only ever observe a
//! complete snapshot and a crash recovers to the prior one.

pub mod snapshot;

pub use snapshot::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] atmo_core::CodecError),
}

pub type StoreResult<T> = Result<T, StoreError>;
