// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the frame pipeline
//!
//! Errors are frame-local by design: a malformed or inconsistent frame is
//! dropped and the next frame proceeds normally. GPU failures are confined to
//! the render context and surfaced to the host as a one-shot notification.

use std::fmt;

/// Result type alias using PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Main pipeline error type
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// Plane sizes or subsampling inconsistent with the declared dimensions.
    /// The frame is dropped; the pipeline continues.
    MalformedFrame(String),
    /// Packed buffer byte length disagrees with its declared dimensions.
    /// Processing of that frame is aborted; the buffer is left untouched.
    InvalidBuffer(String),
    /// GPU adapter, device, shader, or texture allocation failure.
    /// Confined to the render context; capture and conversion keep running.
    GpuResourceFailure(String),
    /// Configuration load/save errors
    Config(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::MalformedFrame(msg) => write!(f, "Malformed frame: {}", msg),
            PipelineError::InvalidBuffer(msg) => write!(f, "Invalid buffer: {}", msg),
            PipelineError::GpuResourceFailure(msg) => write!(f, "GPU resource failure: {}", msg),
            PipelineError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Config(err.to_string())
    }
}
