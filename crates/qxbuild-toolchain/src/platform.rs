//! Host platform detection.
//!
//! Only the OS family and pointer width matter: together they pick an entry
//! from the archive table.

use std::fmt;

/// Operating-system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Os {
    /// Map an OS name as reported by `std::env::consts::OS`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "linux" => Os::Linux,
            "macos" | "darwin" | "mac os x" => Os::MacOs,
            "windows" => Os::Windows,
            _ => Os::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bitness {
    Bits32,
    Bits64,
}

/// OS family plus bitness of the machine running the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostPlatform {
    pub os: Os,
    pub bitness: Bitness,
}

impl HostPlatform {
    pub const fn new(os: Os, bitness: Bitness) -> Self {
        Self { os, bitness }
    }

    /// Probe the running host.
    pub fn detect() -> Self {
        Self::from_probe(
            std::env::consts::OS,
            std::env::consts::ARCH,
            std::env::var_os("ProgramFiles(x86)").is_some(),
        )
    }

    /// Build from raw probe values.
    ///
    /// On Windows a 64-bit OS is recognised by the `ProgramFiles(x86)`
    /// variable (it exists even for 32-bit processes on a 64-bit system).
    /// Everywhere else the architecture string is checked for `64`.
    pub fn from_probe(os_name: &str, arch: &str, program_files_x86: bool) -> Self {
        let os = Os::from_name(os_name);
        let is_64 = match os {
            Os::Windows => program_files_x86,
            _ => arch.contains("64"),
        };
        Self {
            os,
            bitness: if is_64 { Bitness::Bits64 } else { Bitness::Bits32 },
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = match self.bitness {
            Bitness::Bits32 => 32,
            Bitness::Bits64 => 64,
        };
        write!(f, "{:?}/{}-bit", self.os, bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_uses_env_probe_not_arch() {
        let p = HostPlatform::from_probe("windows", "x86", true);
        assert_eq!(p, HostPlatform::new(Os::Windows, Bitness::Bits64));
        let p = HostPlatform::from_probe("windows", "x86_64", false);
        assert_eq!(p, HostPlatform::new(Os::Windows, Bitness::Bits32));
    }

    #[test]
    fn test_unix_uses_arch_substring() {
        assert_eq!(
            HostPlatform::from_probe("linux", "x86_64", false),
            HostPlatform::new(Os::Linux, Bitness::Bits64)
        );
        assert_eq!(
            HostPlatform::from_probe("linux", "x86", true),
            HostPlatform::new(Os::Linux, Bitness::Bits32)
        );
        assert_eq!(
            HostPlatform::from_probe("macos", "aarch64", false),
            HostPlatform::new(Os::MacOs, Bitness::Bits64)
        );
    }

    #[test]
    fn test_unknown_os() {
        assert_eq!(HostPlatform::from_probe("freebsd", "x86_64", false).os, Os::Other);
    }
}
