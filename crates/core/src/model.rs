//! Transcription domain model
//!
//! Serde emits struct fields in declaration order, so serializing a response,
//! caching it, and re-serializing the decoded value yields byte-identical
//! JSON. The cache relies on that: cached and fresh results must be
//! indistinguishable to callers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What the inference engine should do with the audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// Transcribe in the source language
    Transcribe,
    /// Translate to English
    Translate,
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transcribe => f.write_str("transcribe"),
            Self::Translate => f.write_str("translate"),
        }
    }
}

/// Parameters of a transcription run.
///
/// Every field except `filepath` participates directly in cache-key
/// derivation; `filepath` contributes through the hash of its content, never
/// through the path string itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionRequest {
    /// Identifier of the model to run (e.g. `small`)
    pub model_id: String,
    /// Transcribe or translate
    pub task: Task,
    /// Source language, or `auto` for automatic detection
    #[serde(default = "default_language")]
    pub language: String,
    /// Audio chunk length in seconds
    #[serde(default = "default_chunk_length")]
    pub chunk_length: u32,
    /// Inference batch size
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Path to the audio content on local disk
    pub filepath: PathBuf,
}

fn default_language() -> String {
    "auto".to_string()
}

const fn default_chunk_length() -> u32 {
    30
}

const fn default_batch_size() -> u32 {
    24
}

/// One timestamped span of transcribed speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSegment {
    /// Segment index as reported by the engine
    pub id: Option<u32>,
    /// Transcribed text of the span
    pub text: String,
    /// Start and (if known) end offset in seconds
    pub timestamp: (f64, Option<f64>),
}

/// Full result of a transcription run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    /// Concatenated text of all segments
    pub text: String,
    /// Individual timestamped segments
    pub segments: Vec<TranscriptionSegment>,
}

/// A model offered by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Model identifier accepted in requests
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
}

/// The models this deployment offers.
#[must_use]
pub fn available_models() -> &'static [ModelInfo] {
    &[
        ModelInfo {
            id: "tiny",
            name: "Tiny",
        },
        ModelInfo {
            id: "small",
            name: "Small",
        },
    ]
}
