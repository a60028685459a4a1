//! Additional methods for libstd and external crates.

use std::ffi::OsString;
use std::path::PathBuf;

/// Adds the `into_string_lossy` method to `OsString` and `PathBuf`.
pub trait IntoStringLossy {
    /// Consumes the ownership and converts the string-like object into a real string. Unconvertible characters are
    /// replaced by U+FFFD.
    fn into_string_lossy(self) -> String;
}

impl IntoStringLossy for OsString {
    fn into_string_lossy(self) -> String {
        self.into_string().unwrap_or_else(|s| s.to_string_lossy().into_owned())
    }
}

impl IntoStringLossy for PathBuf {
    fn into_string_lossy(self) -> String {
        self.into_os_string().into_string_lossy()
    }
}

/// Strips an inline `#` comment and surrounding whitespace from a line.
///
/// Returns `None` if nothing remains, or if the line itself is a comment.
pub fn strip_comment(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let line = match line.find('#') {
        Some(index) => line[..index].trim_end(),
        None => line,
    };
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

#[test]
fn test_strip_comment() {
    assert_eq!(strip_comment("  # whole line"), None);
    assert_eq!(strip_comment(""), None);
    assert_eq!(strip_comment("   \t"), None);
    assert_eq!(strip_comment("*/gen/*.v"), Some("*/gen/*.v"));
    assert_eq!(strip_comment("rtl/alu.v:3-5   # dead code "), Some("rtl/alu.v:3-5"));
    assert_eq!(strip_comment("  a.v  "), Some("a.v"));
}
