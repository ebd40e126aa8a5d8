//! Core data types, codec, and clock ledgers for the atmo aggregation service
//!
//! This crate provides the station observation model with its exact wire-name
//! mapping, the JSON encode/decode functions used on the wire and on disk,
//! and the per-peer Lamport clock registry the request pipeline enforces
//! causal ordering with.

pub mod clock;
pub mod codec;
pub mod types;

pub use clock::*;
pub use codec::*;
pub use types::*;
