//! The aggregation server
//!
//! Publishers PUT station observations, readers GET the current aggregate.
//! Connections are parsed by the hand-rolled framer, turned into work items
//! on a bounded FIFO, and applied by a single pipeline worker that owns the
//! Lamport clock ledgers and the snapshot store mutex. A periodic sweeper
//! evicts records older than the TTL.

pub mod pipeline;
pub mod server;
pub mod settings;
pub mod sweep;

pub use pipeline::*;
pub use server::*;
pub use settings::*;
