//! Device session layer.
//!
//! The pipeline talks to devices through the [`DeviceSession`] and
//! [`SessionFactory`] traits, so workers never know whether they are driving
//! a real SSH connection or a scripted stand-in. The production
//! implementation is [`SshSession`], an interactive PTY session with
//! pattern-based prompt detection and per-platform privilege escalation.

pub mod buffer;
pub mod config;
pub mod platform;
pub mod ssh;

pub use buffer::PatternBuffer;
pub use config::SessionConfig;
pub use platform::{Platform, PlatformRegistry};
pub use ssh::{SshSession, SshSessionFactory};

use std::future::Future;

use crate::error::Result;

/// Trait for interactive device sessions.
pub trait DeviceSession: Send {
    /// Escalate to the platform's privileged mode, if it has one.
    fn elevate(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Return the device's current prompt line.
    fn prompt(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Run a command and return its textual output.
    fn run(&mut self, command: &str) -> impl Future<Output = Result<String>> + Send;

    /// Close the session.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Trait for opening sessions from per-device parameters.
pub trait SessionFactory: Send + Sync {
    /// Session type this factory produces.
    type Session: DeviceSession + 'static;

    /// Open and authenticate a session to one device.
    fn open(
        &self,
        config: SessionConfig,
    ) -> impl Future<Output = Result<Self::Session>> + Send;
}
