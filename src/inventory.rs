//! Device inventory loading.
//!
//! The inventory is a small header-mapped table of devices and credentials.
//! The delimiter is sniffed from the header line, so comma-, tab-,
//! semicolon-, and space-separated files all load. Lines starting with `#`
//! are comments; malformed rows are logged and skipped rather than aborting
//! the whole load.

use std::fs;
use std::path::Path;

use log::{debug, warn};
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{InventoryError, Result};

/// One device to harvest: address, credentials, and platform.
///
/// Supplied externally, immutable, consumed exactly once by a worker.
/// Credentials are wrapped in [`SecretString`] so they stay out of `Debug`
/// output and log lines.
#[derive(Debug, Deserialize)]
pub struct DeviceDescriptor {
    /// Address to connect to (hostname or IP).
    pub host: String,

    /// Login username.
    pub username: String,

    /// Login password.
    #[serde(alias = "pass")]
    pub password: SecretString,

    /// Enable secret, where the platform needs one. Falls back to the login
    /// password when absent.
    #[serde(default)]
    pub secret: Option<SecretString>,

    /// Platform name, e.g. `cisco_ios`.
    pub device_type: String,
}

/// Load all device descriptors from an inventory file.
///
/// An unreadable file or an inventory with no usable rows is a startup
/// error; a single bad row is only a warning.
pub fn load(path: &Path) -> Result<Vec<DeviceDescriptor>> {
    let raw = fs::read_to_string(path).map_err(|source| InventoryError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;

    let delimiter = sniff_delimiter(&raw);
    debug!(
        "inventory {}: delimiter {:?}",
        path.display(),
        delimiter as char
    );

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(raw.as_bytes());

    let mut devices = Vec::new();
    for (index, row) in reader.deserialize::<DeviceDescriptor>().enumerate() {
        match row {
            Ok(descriptor) => devices.push(descriptor),
            // Header is line 1, so data rows start at line 2.
            Err(err) => warn!(
                "{}: skipping entry on line {}: {err}",
                path.display(),
                index + 2
            ),
        }
    }

    if devices.is_empty() {
        return Err(InventoryError::Empty {
            path: path.display().to_string(),
        }
        .into());
    }

    debug!("inventory {}: {} devices", path.display(), devices.len());
    Ok(devices)
}

/// Pick the candidate delimiter that appears most in the header line.
fn sniff_delimiter(raw: &str) -> u8 {
    let header = raw
        .lines()
        .find(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .unwrap_or("");

    let mut best = b',';
    let mut best_count = 0usize;
    for candidate in [b',', b'\t', b';', b' '] {
        let count = header.bytes().filter(|&b| b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    fn write_inventory(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_comma_separated() {
        let file = write_inventory(
            "host,username,pass,secret,device_type\n\
             r1,admin,pw1,sec1,cisco_ios\n\
             r2,admin,pw2,sec2,arista_eos\n",
        );
        let devices = load(file.path()).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].host, "r1");
        assert_eq!(devices[0].password.expose_secret(), "pw1");
        assert_eq!(devices[1].device_type, "arista_eos");
    }

    #[test]
    fn test_space_separated_with_comments() {
        let file = write_inventory(
            "# lab fleet\n\
             host username pass secret device_type\n\
             sw1 ops hunter2 enable1 cisco_ios\n",
        );
        let devices = load(file.path()).unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].username, "ops");
        assert_eq!(
            devices[0].secret.as_ref().unwrap().expose_secret(),
            "enable1"
        );
    }

    #[test]
    fn test_password_header_alias() {
        let file = write_inventory(
            "host,username,password,device_type\n\
             r1,admin,pw1,cisco_ios\n",
        );
        let devices = load(file.path()).unwrap();
        assert_eq!(devices[0].password.expose_secret(), "pw1");
        assert!(devices[0].secret.is_none());
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let file = write_inventory(
            "host,username,pass,device_type\n\
             r1,admin\n\
             r2,admin,pw2,cisco_ios\n",
        );
        let devices = load(file.path()).unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].host, "r2");
    }

    #[test]
    fn test_empty_inventory_is_an_error() {
        let file = write_inventory("host,username,pass,device_type\n");
        assert!(load(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load(Path::new("/nonexistent/fleet.csv")).is_err());
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a,b,c\n"), b',');
        assert_eq!(sniff_delimiter("a b c\n"), b' ');
        assert_eq!(sniff_delimiter("a\tb\tc\n"), b'\t');
        assert_eq!(sniff_delimiter("# note\na;b;c\n"), b';');
    }
}
