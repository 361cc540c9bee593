//! Session connection configuration.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::inventory::DeviceDescriptor;

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Default connect/read deadline for one session operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters for opening a session to one device.
#[derive(Debug)]
pub struct SessionConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port.
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Login password.
    pub password: SecretString,

    /// Enable secret; the login password is used when absent.
    pub secret: Option<SecretString>,

    /// Platform name, e.g. `cisco_ios`.
    pub platform: String,

    /// Deadline for connecting and for each prompt read.
    pub timeout: Duration,
}

impl SessionConfig {
    /// Build the connection parameters for one inventory entry.
    pub fn from_descriptor(descriptor: DeviceDescriptor) -> Self {
        Self {
            host: descriptor.host,
            port: DEFAULT_PORT,
            username: descriptor.username,
            password: descriptor.password,
            // An empty secret column means "no secret", not a blank secret.
            secret: descriptor
                .secret
                .filter(|secret| !secret.expose_secret().is_empty()),
            platform: descriptor.device_type,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(secret: Option<&str>) -> DeviceDescriptor {
        DeviceDescriptor {
            host: "r1".to_string(),
            username: "admin".to_string(),
            password: SecretString::from("pw".to_string()),
            secret: secret.map(|s| SecretString::from(s.to_string())),
            device_type: "cisco_ios".to_string(),
        }
    }

    #[test]
    fn test_from_descriptor() {
        let config = SessionConfig::from_descriptor(descriptor(Some("enable1")));
        assert_eq!(config.host, "r1");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.platform, "cisco_ios");
        assert_eq!(config.secret.unwrap().expose_secret(), "enable1");
    }

    #[test]
    fn test_blank_secret_becomes_none() {
        let config = SessionConfig::from_descriptor(descriptor(Some("")));
        assert!(config.secret.is_none());
    }
}
