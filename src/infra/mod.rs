//! Runtime bootstrap shared by the binary.

pub mod error;
pub mod telemetry;
