//! Error types for PoseMirror
//!
//! Decode failures and resolution misses are never errors: they are dropped
//! or reported as diagnostics. Only configuration and transport problems
//! surface here.

use thiserror::Error;

/// Core PoseMirror errors
#[derive(Error, Debug)]
pub enum MirrorError {
    // Configuration errors
    #[error("Skeleton not assigned: {0}")]
    MissingSkeleton(&'static str),

    #[error("Live and reference skeletons are the same skeleton")]
    SameSkeleton,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Transport errors
    #[error("Transport error: {0}")]
    TransportError(String),
}

/// Result type for PoseMirror operations
pub type MirrorResult<T> = Result<T, MirrorError>;
