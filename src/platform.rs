//! Host platform information.

use serde::Serialize;

/// Operating system name, version, and CPU architecture of the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    /// `linux`, `macos`, `windows`, ...
    pub name: String,
    pub version: String,
    /// `x86_64`, `aarch64`, ...
    pub arch: String,
}

impl PlatformInfo {
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.name.eq_ignore_ascii_case("windows")
    }

    #[must_use]
    pub fn is_linux(&self) -> bool {
        self.name.eq_ignore_ascii_case("linux")
    }

    #[must_use]
    pub fn is_macos(&self) -> bool {
        self.name.eq_ignore_ascii_case("macos") || self.name.eq_ignore_ascii_case("darwin")
    }
}

/// Describe the current host.
#[must_use]
pub fn get_platform() -> PlatformInfo {
    PlatformInfo {
        name: std::env::consts::OS.to_string(),
        version: sysinfo::System::os_version().unwrap_or_else(|| "unknown".to_string()),
        arch: std::env::consts::ARCH.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_platform_matches_cfg() {
        let p = get_platform();
        assert_eq!(p.is_linux(), cfg!(target_os = "linux"));
        assert_eq!(p.is_windows(), cfg!(windows));
        assert_eq!(p.is_macos(), cfg!(target_os = "macos"));
        assert!(!p.arch.is_empty());
        assert!(!p.version.is_empty());
    }

    #[test]
    fn darwin_counts_as_macos() {
        let p = PlatformInfo {
            name: "Darwin".into(),
            version: "23.0".into(),
            arch: "aarch64".into(),
        };
        assert!(p.is_macos());
        assert!(!p.is_linux());
    }
}
