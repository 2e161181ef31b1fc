//! Glue between parsed arguments and the render pipeline.

pub mod convert;
pub mod error;
