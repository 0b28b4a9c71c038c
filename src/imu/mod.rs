//! IMU acquisition: line protocol, shared latest-sample slot, ingestor thread.

pub mod protocol;
pub mod reader;
pub mod slot;

pub use reader::{IngestStats, SampleIngestor};
pub use slot::SampleSlot;
