//! Host platform detection and platform-dependent behaviour.

use std::fmt;

use regex::Regex;

use crate::naming::NamingProfile;

/// Operating systems that may appear as a platform infix in source file
/// names (`foo_linux.c`, `foo_windows.cpp`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// IBM AIX.
    Aix,
    /// macOS.
    Darwin,
    /// DragonFly BSD.
    Dragonfly,
    /// FreeBSD.
    Freebsd,
    /// illumos.
    Illumos,
    /// iOS.
    Ios,
    /// Linux, and the fallback for unknown Unix systems.
    Linux,
    /// NetBSD.
    Netbsd,
    /// OpenBSD.
    Openbsd,
    /// Oracle Solaris.
    Solaris,
    /// Microsoft Windows.
    Windows,
}

impl Os {
    /// Every platform name recognised in file names.
    pub const ALL: [Self; 11] = [
        Self::Aix,
        Self::Darwin,
        Self::Dragonfly,
        Self::Freebsd,
        Self::Illumos,
        Self::Ios,
        Self::Linux,
        Self::Netbsd,
        Self::Openbsd,
        Self::Solaris,
        Self::Windows,
    ];

    /// Lower-case name used in file names and as the `OS` variable.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Aix => "aix",
            Self::Darwin => "darwin",
            Self::Dragonfly => "dragonfly",
            Self::Freebsd => "freebsd",
            Self::Illumos => "illumos",
            Self::Ios => "ios",
            Self::Linux => "linux",
            Self::Netbsd => "netbsd",
            Self::Openbsd => "openbsd",
            Self::Solaris => "solaris",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a built module is copied into its installation directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMethod {
    /// Delegate to the system `install` program.
    InstallProgram,
    /// Copy the file ourselves and set its mode.
    Copy,
}

/// Platform information for the build host.
///
/// Constructed once at start-up and passed by reference; the
/// other-platform file name filter is compiled here so it is built once.
#[derive(Debug, Clone)]
pub struct Platform {
    pub os: Os,
    /// Architecture name, exposed to `.dmake` files as `ARCH`.
    pub arch: String,
    pub naming: NamingProfile,
    pub install: InstallMethod,
    other_platforms: Regex,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub fn detect() -> Self {
        Self::new(Self::detect_os(), std::env::consts::ARCH)
    }

    /// Create a platform with explicit values.
    ///
    /// Used by [`detect`](Self::detect) and by tests that need a specific
    /// naming profile regardless of the host.
    #[must_use]
    pub fn new(os: Os, arch: &str) -> Self {
        let (naming, install) = match os {
            Os::Windows => (NamingProfile::WINDOWS, InstallMethod::Copy),
            Os::Darwin | Os::Ios => (NamingProfile::DARWIN, InstallMethod::InstallProgram),
            _ => (NamingProfile::ELF, InstallMethod::InstallProgram),
        };
        Self {
            os,
            arch: arch.to_string(),
            naming,
            install,
            other_platforms: other_platforms_regex(os),
        }
    }

    /// Returns `true` if `name` carries a `_<platform>.` infix naming a
    /// platform other than this one.
    #[must_use]
    pub fn is_other_platform_name(&self, name: &str) -> bool {
        self.other_platforms.is_match(name)
    }

    fn detect_os() -> Os {
        if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(target_os = "macos") {
            Os::Darwin
        } else if cfg!(target_os = "ios") {
            Os::Ios
        } else if cfg!(target_os = "freebsd") {
            Os::Freebsd
        } else if cfg!(target_os = "netbsd") {
            Os::Netbsd
        } else if cfg!(target_os = "openbsd") {
            Os::Openbsd
        } else if cfg!(target_os = "dragonfly") {
            Os::Dragonfly
        } else if cfg!(target_os = "illumos") {
            Os::Illumos
        } else if cfg!(target_os = "solaris") {
            Os::Solaris
        } else if cfg!(target_os = "aix") {
            Os::Aix
        } else {
            // Default to Linux for other Unix-like systems
            Os::Linux
        }
    }
}

/// Build the `_(a|b|...)\.` regex matching every platform except `host`.
#[allow(clippy::expect_used)]
fn other_platforms_regex(host: Os) -> Regex {
    let names: Vec<&str> = Os::ALL
        .iter()
        .filter(|&&os| os != host)
        .map(|os| os.name())
        .collect();
    Regex::new(&format!(r"_({})\.", names.join("|")))
        .expect("platform names always form a valid regex")
}
