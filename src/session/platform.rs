//! Platform definitions for prompt parsing and privilege escalation.
//!
//! A [`Platform`] captures the vendor-specific pieces a session needs: what
//! a prompt looks like, what the privileged prompt looks like, how to ask for
//! escalation, and which characters end the hostname portion of the prompt.
//! Hostname derivation is a per-platform strategy rather than a hardcoded
//! delimiter, since a Cisco-style `#` split does not hold for every vendor.

use std::sync::{LazyLock, RwLock};

use indexmap::IndexMap;
use regex::bytes::Regex;

use crate::error::{Result, SessionError};

/// Transition into the privileged prompt.
#[derive(Debug, Clone)]
pub struct EnableTransition {
    /// Command that requests escalation, e.g. `enable`.
    pub command: String,

    /// Pattern for the secret prompt the device may answer with.
    pub auth_prompt: Regex,
}

/// Vendor-specific prompt handling for one device type.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Platform name (e.g. `cisco_ios`, `arista_eos`, `linux`).
    pub name: String,

    /// Matches any prompt this platform can present.
    pub prompt_pattern: Regex,

    /// Matches the privileged prompt.
    pub privileged_pattern: Regex,

    /// Escalation transition, if the platform has one.
    pub enable: Option<EnableTransition>,

    /// Characters that end the hostname portion of the prompt.
    pub hostname_delimiters: Vec<char>,
}

impl Platform {
    /// Derive the canonical hostname from a prompt line.
    ///
    /// Takes the text before the first delimiter character; a prompt with no
    /// delimiter is used as-is.
    pub fn hostname_from_prompt(&self, prompt: &str) -> String {
        let trimmed = prompt.trim();
        match trimmed.find(|c: char| self.hostname_delimiters.contains(&c)) {
            Some(index) => trimmed[..index].to_string(),
            None => trimmed.to_string(),
        }
    }
}

/// Global platform registry.
static REGISTRY: LazyLock<RwLock<PlatformRegistry>> = LazyLock::new(|| {
    let mut registry = PlatformRegistry::new();
    registry.register_builtin_platforms();
    RwLock::new(registry)
});

/// Registry of platform definitions, keyed by device type.
#[derive(Debug, Default)]
pub struct PlatformRegistry {
    platforms: IndexMap<String, Platform>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: IndexMap::new(),
        }
    }

    /// Get the global registry.
    pub fn global() -> &'static RwLock<PlatformRegistry> {
        &REGISTRY
    }

    /// Register built-in platforms.
    fn register_builtin_platforms(&mut self) {
        self.register(cisco_style("cisco_ios"));
        self.register(cisco_style("cisco_xe"));
        self.register(cisco_style("arista_eos"));
        self.register(linux());
    }

    /// Register or replace a platform definition.
    pub fn register(&mut self, platform: Platform) {
        self.platforms.insert(platform.name.clone(), platform);
    }

    /// Get a platform by name.
    pub fn get(&self, name: &str) -> Option<&Platform> {
        self.platforms.get(name)
    }

    /// List all registered platform names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.platforms.keys().cloned().collect()
    }
}

/// Look up a platform by device type in the global registry.
pub fn lookup(name: &str) -> Result<Platform> {
    let registry = PlatformRegistry::global()
        .read()
        .map_err(|_| SessionError::RegistryPoisoned)?;
    registry
        .get(name)
        .cloned()
        .ok_or_else(|| {
            SessionError::UnknownPlatform {
                name: name.to_string(),
                known: registry.names().join(", "),
            }
            .into()
        })
}

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("builtin prompt pattern")
}

/// IOS-style CLI: `>` user prompt, `#` enable prompt, `enable` + secret.
fn cisco_style(name: &str) -> Platform {
    Platform {
        name: name.to_string(),
        prompt_pattern: pattern(r"[\w.\-@/:]+[>#]\s*$"),
        privileged_pattern: pattern(r"[\w.\-@/:]+#\s*$"),
        enable: Some(EnableTransition {
            command: "enable".to_string(),
            auth_prompt: pattern(r"(?i)password[^\n]*:\s*$"),
        }),
        hostname_delimiters: vec!['#', '>'],
    }
}

fn linux() -> Platform {
    Platform {
        name: "linux".to_string(),
        prompt_pattern: pattern(r"[$#]\s*$"),
        privileged_pattern: pattern(r"[$#]\s*$"),
        enable: None,
        hostname_delimiters: vec![':', '$', '#'],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cisco_hostname_from_enable_prompt() {
        let platform = lookup("cisco_ios").unwrap();
        assert_eq!(platform.hostname_from_prompt("r1#"), "r1");
        assert_eq!(platform.hostname_from_prompt("edge-sw01# "), "edge-sw01");
    }

    #[test]
    fn test_cisco_hostname_from_user_prompt() {
        let platform = lookup("cisco_ios").unwrap();
        assert_eq!(platform.hostname_from_prompt("r1>"), "r1");
    }

    #[test]
    fn test_hostname_without_delimiter_is_kept() {
        let platform = lookup("cisco_ios").unwrap();
        assert_eq!(platform.hostname_from_prompt("r1"), "r1");
    }

    #[test]
    fn test_linux_hostname() {
        let platform = lookup("linux").unwrap();
        assert_eq!(platform.hostname_from_prompt("ops@jump01:~$"), "ops@jump01");
    }

    #[test]
    fn test_prompt_patterns() {
        let platform = lookup("cisco_ios").unwrap();
        assert!(platform.prompt_pattern.is_match(b"r1>"));
        assert!(platform.prompt_pattern.is_match(b"r1# "));
        assert!(platform.privileged_pattern.is_match(b"r1#"));
        assert!(!platform.privileged_pattern.is_match(b"r1>"));
    }

    #[test]
    fn test_enable_auth_prompt() {
        let platform = lookup("cisco_ios").unwrap();
        let enable = platform.enable.unwrap();
        assert!(enable.auth_prompt.is_match(b"Password: "));
        assert!(enable.auth_prompt.is_match(b"password:"));
        assert!(!enable.auth_prompt.is_match(b"r1#"));
    }

    #[test]
    fn test_unknown_platform_names_known_ones() {
        let err = lookup("frobozz_os").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("frobozz_os"));
        assert!(message.contains("cisco_ios"));
    }
}
