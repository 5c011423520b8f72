//! Platform detection and normalization.
//!
//! The platform tag (`{os}-{arch}`) keys both the platform-qualified bundled
//! binaries (`gum-linux-amd64`) and the per-platform URL templates in
//! `tools.yaml`. Upstream release assets name targets the Go way, so the tag
//! uses that vocabulary:
//!
//! | Rust `consts` | Tag component |
//! |---------------|---------------|
//! | `macos`       | `darwin`      |
//! | `x86_64`      | `amd64`       |
//! | `aarch64`     | `arm64`       |

use std::fmt;

/// A normalized platform specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    /// Operating system (darwin, linux, windows).
    pub os: String,
    /// Architecture (amd64, arm64).
    pub arch: String,
}

impl Platform {
    /// Create a new platform, normalizing both components.
    #[must_use]
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: normalize_os(&os.into()),
            arch: normalize_arch(&arch.into()),
        }
    }

    /// Get the platform of the running process.
    #[must_use]
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Parse a platform tag (e.g., "darwin-arm64").
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (os, arch) = s.split_once('-')?;
        if os.is_empty() || arch.is_empty() || arch.contains('-') {
            return None;
        }
        Some(Self::new(os, arch))
    }

    /// The `{os}-{arch}` tag.
    #[must_use]
    pub fn tag(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

fn normalize_os(os: &str) -> String {
    match os.to_lowercase().as_str() {
        "macos" | "osx" => "darwin".to_string(),
        other => other.to_string(),
    }
}

fn normalize_arch(arch: &str) -> String {
    match arch.to_lowercase().as_str() {
        "x86_64" | "x64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        "x86" | "i686" => "386".to_string(),
        other => other.to_string(),
    }
}
