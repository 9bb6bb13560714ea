//! Core types for the verbatim transcription cache.
//!
//! This crate holds what the other verbatim crates share:
//! - The transcription domain model (requests, responses, segments) with a
//!   canonical, order-stable JSON serialization
//! - Configuration loaded from the environment
//! - The pipeline registry that owns loaded inference pipelines
//!
//! The inference engine itself is external; verbatim treats it as an opaque
//! function from request to response.

mod config;
mod error;
mod model;
mod registry;

pub use config::Settings;
pub use error::{Error, Result};
pub use model::{
    ModelInfo, Task, TranscriptionRequest, TranscriptionResponse, TranscriptionSegment,
    available_models,
};
pub use registry::PipelineRegistry;
