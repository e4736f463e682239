//! Error types for Daywall.
//!
//! This module provides the top-level error type returned by CLI commands.
//! Each subsystem keeps its own error enum and converts into this one at the
//! command boundary.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::config::env::CredentialError;
use crate::scheduler::SchedulerError;
use crate::wallpaper::store::StoreError;

/// Errors that can occur during application execution.
///
/// Serializes as `{ "kind": ..., "message": ... }` so it can be emitted as
/// JSON by commands that support machine-readable output.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum DaywallError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Credential could not be read or written.
    #[error("Credential error: {0}")]
    CredentialError(String),
    /// A generation run ended in a failed outcome.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    /// Job registration or dispatch failed.
    #[error("Scheduler error: {0}")]
    SchedulerError(String),
    /// Image storage failed.
    #[error("Storage error: {0}")]
    StorageError(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
    /// Generic command error.
    #[error("{0}")]
    CommandError(String),
}

impl From<std::io::Error> for DaywallError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for DaywallError {
    fn from(err: serde_json::Error) -> Self { Self::CommandError(err.to_string()) }
}

impl From<String> for DaywallError {
    fn from(msg: String) -> Self { Self::CommandError(msg) }
}

impl From<&str> for DaywallError {
    fn from(msg: &str) -> Self { Self::CommandError(msg.to_string()) }
}

impl From<ConfigError> for DaywallError {
    fn from(err: ConfigError) -> Self { Self::ConfigError(err.to_string()) }
}

impl From<CredentialError> for DaywallError {
    fn from(err: CredentialError) -> Self { Self::CredentialError(err.to_string()) }
}

impl From<SchedulerError> for DaywallError {
    fn from(err: SchedulerError) -> Self { Self::SchedulerError(err.to_string()) }
}

impl From<StoreError> for DaywallError {
    fn from(err: StoreError) -> Self { Self::StorageError(err.to_string()) }
}
