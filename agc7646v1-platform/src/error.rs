//! Common error types for agc7646v1-platform.
//!
//! This module provides a centralized Error enum using thiserror,
//! with conversions from underlying error types used throughout the crate.

use thiserror::Error;

/// Main error type for platform bring-up operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors from tokio or std (sysfs writes, device nodes)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from ioctl and other raw syscalls
    #[error("System call error: {0}")]
    Nix(#[from] nix::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Hardware communication errors
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// Kernel module load failures
    #[error("Module {module}: {reason}")]
    Module { module: String, reason: String },

    /// Operation not available on this platform
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Convenience type alias for Results using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
