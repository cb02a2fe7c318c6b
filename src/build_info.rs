//! Build metadata
//!
//! `build.rs` embeds a local build counter and a compile timestamp; both are
//! reported by the status tool and the startup banner.

use serde::Serialize;

/// Serializable build metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub description: &'static str,
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The running binary's metadata, fixed at compile time
pub const CURRENT: BuildInfo = BuildInfo {
    name: env!("CARGO_PKG_NAME"),
    version: VERSION,
    build_number: digits_or_zero(option_env!("GROCY_UNITS_BUILD_NUMBER")),
    build_timestamp: match option_env!("GROCY_UNITS_BUILD_TIMESTAMP") {
        Some(s) => s,
        None => "unknown",
    },
    description: env!("CARGO_PKG_DESCRIPTION"),
};

/// `str::parse` is not const. Anything but plain ASCII digits reads as 0.
const fn digits_or_zero(value: Option<&str>) -> u64 {
    let bytes = match value {
        Some(s) => s.as_bytes(),
        None => return 0,
    };
    let mut n: u64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            return 0;
        }
        n = n.saturating_mul(10).saturating_add((bytes[i] - b'0') as u64);
        i += 1;
    }
    n
}

impl BuildInfo {
    pub fn current() -> Self {
        CURRENT
    }

    /// Startup banner lines
    pub fn banner(&self) -> String {
        let rule = "=".repeat(47);
        format!(
            "{rule}\n  Grocy Units ({})\n  Version: {} | Build: {}\n  Compiled: {}\n{rule}",
            self.name, self.version, self.build_number, self.build_timestamp
        )
    }
}

/// Print the banner to stderr (stdout belongs to the MCP transport)
pub fn print_startup_banner() {
    eprintln!("{}", CURRENT.banner());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_or_zero() {
        assert_eq!(digits_or_zero(Some("42")), 42);
        assert_eq!(digits_or_zero(Some("12a")), 0);
        assert_eq!(digits_or_zero(Some("")), 0);
        assert_eq!(digits_or_zero(None), 0);
    }

    #[test]
    fn test_banner() {
        let info = BuildInfo {
            build_number: 7,
            build_timestamp: "2024-05-01T10:00:00Z",
            ..BuildInfo::current()
        };
        let banner = info.banner();
        let lines: Vec<&str> = banner.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "  Grocy Units (grocy-units)");
        assert_eq!(lines[2], format!("  Version: {} | Build: 7", VERSION));
        assert_eq!(lines[3], "  Compiled: 2024-05-01T10:00:00Z");
        assert_eq!(lines[0], lines[4]);
    }
}
