//! Compiled-in interpreter archives, one per (OS, bitness).

use std::path::{Path, PathBuf};

use qxbuild_core::{BuildError, BuildResult};

use crate::platform::{Bitness, HostPlatform, Os};

/// Archive container formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarBz2,
}

impl ArchiveKind {
    /// Pick the format from a file name or URL suffix.
    pub fn sniff(name: &str) -> BuildResult<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Ok(ArchiveKind::Zip)
        } else if lower.ends_with(".tar.bz2") || lower.ends_with(".tbz2") {
            Ok(ArchiveKind::TarBz2)
        } else {
            Err(BuildError::archive(name, "unknown archive suffix"))
        }
    }
}

/// Where to fetch an interpreter and where its executable lands once unpacked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSpec {
    pub download_url: &'static str,
    /// Top-level directory the archive unpacks into, relative to the cache root.
    pub cache_subpath: &'static str,
    /// `/`-separated path of the executable inside `cache_subpath`.
    pub executable_rel_path: &'static str,
}

impl ArchiveSpec {
    pub fn archive_kind(&self) -> BuildResult<ArchiveKind> {
        ArchiveKind::sniff(self.download_url)
    }

    /// Expected executable location under `cache_root`.
    pub fn executable_path(&self, cache_root: &Path) -> PathBuf {
        let mut path = cache_root.join(self.cache_subpath);
        for part in self.executable_rel_path.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        path
    }
}

const PYPY_LINUX64: ArchiveSpec = ArchiveSpec {
    download_url: "https://downloads.python.org/pypy/pypy2-v5.6.0-linux64.tar.bz2",
    cache_subpath: "pypy2-v5.6.0-linux64",
    executable_rel_path: "bin/pypy",
};

const PYPY_LINUX32: ArchiveSpec = ArchiveSpec {
    download_url: "https://downloads.python.org/pypy/pypy2-v5.6.0-linux32.tar.bz2",
    cache_subpath: "pypy2-v5.6.0-linux32",
    executable_rel_path: "bin/pypy",
};

const PYPY_OSX64: ArchiveSpec = ArchiveSpec {
    download_url: "https://downloads.python.org/pypy/pypy2-v5.6.0-osx64.tar.bz2",
    cache_subpath: "pypy2-v5.6.0-osx64",
    executable_rel_path: "bin/pypy",
};

// Only a 32-bit build is published for Windows; it runs on both.
const PYPY_WIN32: ArchiveSpec = ArchiveSpec {
    download_url: "https://downloads.python.org/pypy/pypy2-v5.6.0-win32.zip",
    cache_subpath: "pypy2-v5.6.0-win32",
    executable_rel_path: "pypy.exe",
};

static ARCHIVES: &[(HostPlatform, ArchiveSpec)] = &[
    (HostPlatform::new(Os::Linux, Bitness::Bits64), PYPY_LINUX64),
    (HostPlatform::new(Os::Linux, Bitness::Bits32), PYPY_LINUX32),
    (HostPlatform::new(Os::MacOs, Bitness::Bits64), PYPY_OSX64),
    (HostPlatform::new(Os::Windows, Bitness::Bits64), PYPY_WIN32),
    (HostPlatform::new(Os::Windows, Bitness::Bits32), PYPY_WIN32),
];

/// Archive for `platform`, or `None` when the combination is not published.
pub fn lookup(platform: HostPlatform) -> Option<&'static ArchiveSpec> {
    ARCHIVES
        .iter()
        .find(|(p, _)| *p == platform)
        .map(|(_, spec)| spec)
}

/// Every entry of the table, for listing.
pub fn entries() -> &'static [(HostPlatform, ArchiveSpec)] {
    ARCHIVES
}
