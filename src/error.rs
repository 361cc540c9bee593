//! Error types for harvessh.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Main error type for harvessh operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Device session errors (connection, authentication, prompt handling)
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Inventory loading errors
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Session layer errors (SSH connection, authentication, prompt handling).
#[derive(Error, Debug)]
pub enum SessionError {
    /// SSH protocol or transport error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Connection attempt timed out
    #[error("Connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// No prompt appeared in the output within the deadline
    #[error("Prompt not found within {0:?}")]
    PromptTimeout(Duration),

    /// The device refused or never confirmed privilege escalation
    #[error("Privilege escalation failed on platform '{platform}'")]
    ElevationFailed { platform: String },

    /// Device type has no registered platform definition
    #[error("Unknown platform '{name}' (known: {known})")]
    UnknownPlatform { name: String, known: String },

    /// Platform registry lock was poisoned
    #[error("Platform registry lock poisoned")]
    RegistryPoisoned,

    /// Remote side closed the channel before a prompt was seen
    #[error("Channel closed")]
    Closed,
}

/// Inventory loading errors.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// The inventory file could not be read at all
    #[error("Cannot read inventory '{path}': {source}")]
    Unreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The inventory parsed but yielded no devices
    #[error("Inventory '{path}' contains no usable device entries")]
    Empty { path: String },
}

/// Result type alias using harvessh's Error.
pub type Result<T> = std::result::Result<T, Error>;
