//! Command-list loading.
//!
//! Each device type reads its inspection commands from
//! `shows_<device_type>.txt` in the shows directory, one command per line.
//! Lists are preloaded once per distinct device type and shared across
//! workers.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

/// Path of the command list for one device type.
pub fn shows_file(shows_dir: &Path, device_type: &str) -> PathBuf {
    shows_dir.join(format!("shows_{device_type}.txt"))
}

/// Load the command list for one device type: trimmed, non-empty,
/// non-comment lines in file order.
pub fn load_commands(shows_dir: &Path, device_type: &str) -> io::Result<Vec<String>> {
    let path = shows_file(shows_dir, device_type);
    let raw = fs::read_to_string(&path)?;
    let commands: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    debug!("loaded {} commands from {}", commands.len(), path.display());
    Ok(commands)
}

/// Preload the command list for every distinct device type in the fleet.
///
/// A type whose list cannot be read is logged and omitted from the cache;
/// its devices are skipped at submission time.
pub fn preload<'a>(
    shows_dir: &Path,
    device_types: impl IntoIterator<Item = &'a str>,
) -> HashMap<String, Arc<Vec<String>>> {
    let mut cache = HashMap::new();
    for device_type in device_types {
        if cache.contains_key(device_type) {
            continue;
        }
        match load_commands(shows_dir, device_type) {
            Ok(commands) => {
                cache.insert(device_type.to_string(), Arc::new(commands));
            }
            Err(err) => warn!(
                "no command list for {device_type} ({}): {err}",
                shows_file(shows_dir, device_type).display()
            ),
        }
    }
    cache
}
