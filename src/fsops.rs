//! Filename and directory helpers for harvested output.

use std::path::{Path, PathBuf};

use log::{debug, warn};

/// Characters never allowed in result filenames.
const ILLEGAL_CHARS: &[char] = &[' ', '<', '>', ':', '\\', '/', '|', '?', '*', '\0', '$'];

/// Reserved device names, replaced wherever they appear.
const RESERVED_TOKENS: &[&str] = &["CON", "PRN", "AUX", "NUL", "COM", "LPT"];

/// Build the result filename for one command on one host.
///
/// Produces `"<hostname>_<command>.txt"` with every illegal character and
/// every reserved token replaced by `_`. Pure and deterministic.
pub fn sanitize_filename(hostname: &str, command: &str) -> String {
    let mut result = format!("{hostname}_{command}.txt");
    for ch in ILLEGAL_CHARS {
        result = result.replace(*ch, "_");
    }
    for token in RESERVED_TOKENS {
        result = result.replace(token, "_");
    }
    result
}

/// Create `path` if absent, tolerating an existing directory.
///
/// Failure is logged as a warning and the path is still returned, so the
/// caller degrades gracefully: the next file operation against the missing
/// directory surfaces the real error where it can be handled per item.
pub fn ensure_dir(path: &Path) -> PathBuf {
    match std::fs::create_dir_all(path) {
        Ok(()) => debug!("ensured directory {}", path.display()),
        Err(err) => warn!("could not create {}: {err}", path.display()),
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_command() {
        assert_eq!(
            sanitize_filename("r1", "show ip int brief"),
            "r1_show_ip_int_brief.txt"
        );
    }

    #[test]
    fn test_illegal_characters_removed() {
        let name = sanitize_filename("r1", "show run | include <foo>:*?$");
        for ch in ILLEGAL_CHARS {
            assert!(!name.contains(*ch), "{ch:?} left in {name:?}");
        }
    }

    #[test]
    fn test_reserved_tokens_removed() {
        let name = sanitize_filename("r1", "show CON AUX NUL");
        for token in RESERVED_TOKENS {
            assert!(!name.contains(token), "{token} left in {name:?}");
        }
    }

    #[test]
    fn test_deterministic() {
        let first = sanitize_filename("edge-sw01", "show vlan brief");
        let second = sanitize_filename("edge-sw01", "show vlan brief");
        assert_eq!(first, second);
    }

    #[test]
    fn test_round_trip_recovers_command_name() {
        let name = sanitize_filename("r1", "show ip int brief");
        let recovered = name
            .strip_prefix("r1_")
            .and_then(|rest| rest.strip_suffix(".txt"))
            .unwrap();
        assert_eq!(recovered, "show_ip_int_brief");
    }

    #[test]
    fn test_ensure_dir_creates_and_tolerates_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("a").join("b");

        let first = ensure_dir(&target);
        assert!(first.is_dir());

        // Second call must be a no-op, not an error.
        let second = ensure_dir(&target);
        assert_eq!(first, second);
        assert!(second.is_dir());
    }
}
