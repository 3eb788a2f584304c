//! Interpreter resolution with on-demand provisioning.
//!
//! `Unresolved → ResolvingPlatform → CacheHit | Downloading → Extracting → Ready`,
//! with `Fallback` when the host has no published archive and `Failed` when
//! provisioning errors out.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use qxbuild_core::{BuildError, BuildResult};
use tracing::{debug, warn};

use crate::extract::extract;
use crate::fetch::{HttpFetch, UreqFetch};
use crate::info_log;
use crate::platform::HostPlatform;
use crate::progress::{DownloadProgress, ProgressReader};
use crate::table::{self, ArchiveSpec};

/// Interpreter name that requests the downloaded PyPy build.
pub const BUNDLED_SENTINEL: &str = "use-bundled";

/// Older spelling of [`BUNDLED_SENTINEL`], still accepted.
const LEGACY_SENTINEL: &str = "internal";

/// Command used when no archive exists for the host.
pub const FALLBACK_INTERPRETER: &str = "python";

pub fn is_bundled_sentinel(requested: &str) -> bool {
    requested == BUNDLED_SENTINEL || requested == LEGACY_SENTINEL
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Unresolved,
    ResolvingPlatform,
    CacheHit,
    Downloading,
    Extracting,
    Ready,
    Fallback,
    Failed,
}

pub struct Bootstrapper<F: HttpFetch = UreqFetch> {
    cache_root: PathBuf,
    platform: HostPlatform,
    fetcher: F,
    temp_dir: Option<PathBuf>,
    resolved: Option<String>,
    state: BootstrapState,
}

impl Bootstrapper<UreqFetch> {
    /// Bootstrapper for the current host, downloading over HTTP.
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self::with_fetcher(cache_root, UreqFetch::new())
    }
}

impl<F: HttpFetch> Bootstrapper<F> {
    pub fn with_fetcher(cache_root: impl Into<PathBuf>, fetcher: F) -> Self {
        Self {
            cache_root: cache_root.into(),
            platform: HostPlatform::detect(),
            fetcher,
            temp_dir: None,
            resolved: None,
            state: BootstrapState::Unresolved,
        }
    }

    /// Resolve for `platform` instead of the detected host.
    pub fn with_platform(mut self, platform: HostPlatform) -> Self {
        self.platform = platform;
        self
    }

    /// Directory for the in-flight download (system temp dir otherwise).
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn platform(&self) -> HostPlatform {
        self.platform
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Interpreter resolved from the sentinel so far, if any.
    pub fn resolved(&self) -> Option<&str> {
        self.resolved.as_deref()
    }

    /// Map a configured interpreter to the command to run.
    ///
    /// Anything other than the bundled sentinel is returned unchanged without
    /// touching the filesystem or network. The sentinel is resolved once per
    /// instance; later calls reuse the result.
    pub fn resolve(&mut self, requested: &str) -> BuildResult<String> {
        if !is_bundled_sentinel(requested) {
            return Ok(requested.to_string());
        }
        if let Some(done) = &self.resolved {
            return Ok(done.clone());
        }

        self.state = BootstrapState::ResolvingPlatform;
        let spec = match table::lookup(self.platform) {
            Some(spec) => spec,
            None => {
                warn!(
                    platform = %self.platform,
                    fallback = FALLBACK_INTERPRETER,
                    "no bundled interpreter for this platform, using the system one"
                );
                self.state = BootstrapState::Fallback;
                self.resolved = Some(FALLBACK_INTERPRETER.to_string());
                return Ok(FALLBACK_INTERPRETER.to_string());
            }
        };

        let exe = spec.executable_path(&self.cache_root);
        if exe.is_file() {
            debug!(path = %exe.display(), "bundled interpreter already cached");
            self.state = BootstrapState::CacheHit;
        } else {
            match self.provision(spec, &exe) {
                Ok(()) => self.state = BootstrapState::Ready,
                Err(e) => {
                    self.state = BootstrapState::Failed;
                    return Err(e);
                }
            }
        }

        let resolved = exe.to_string_lossy().into_owned();
        self.resolved = Some(resolved.clone());
        Ok(resolved)
    }

    fn provision(&mut self, spec: &ArchiveSpec, exe: &Path) -> BuildResult<()> {
        let kind = spec.archive_kind()?;
        let url = spec.download_url;

        self.state = BootstrapState::Downloading;
        info_log!("Downloading {} into {}", url, self.cache_root.display());
        let resp = self.fetcher.get(url)?;
        if resp.status != 200 {
            return Err(BuildError::network(
                url,
                format!("unexpected HTTP status {}", resp.status),
            ));
        }

        // Removed on drop, so every early return below cleans it up.
        let mut download = self.temp_file()?;
        let mut progress = DownloadProgress::new(spec.cache_subpath);
        let mut reader = ProgressReader::new(resp.body, resp.content_length, &mut progress);
        io::copy(&mut reader, download.as_file_mut()).map_err(|e| BuildError::network(url, e))?;
        download
            .as_file_mut()
            .flush()
            .map_err(|e| BuildError::io(download.path(), e))?;

        self.state = BootstrapState::Extracting;
        extract(kind, download.path(), &self.cache_root)?;
        let temp_path = download.path().to_path_buf();
        download
            .close()
            .map_err(|e| BuildError::io(temp_path, e))?;

        if !exe.is_file() {
            return Err(BuildError::archive(
                url,
                format!("'{}' not found after extraction", exe.display()),
            ));
        }
        info_log!("Bundled interpreter ready at {}", exe.display());
        Ok(())
    }

    fn temp_file(&self) -> BuildResult<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pypy-").suffix(".download");
        match &self.temp_dir {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
                builder.tempfile_in(dir).map_err(|e| BuildError::io(dir, e))
            }
            None => builder
                .tempfile()
                .map_err(|e| BuildError::io(std::env::temp_dir(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tests::{tar_bz2_bytes, zip_bytes};
    use crate::fetch::FetchResponse;
    use crate::platform::{Bitness, Os};
    use std::cell::Cell;

    struct FakeFetch {
        status: u16,
        body: Vec<u8>,
        calls: Cell<usize>,
    }

    impl FakeFetch {
        fn ok(body: Vec<u8>) -> Self {
            Self {
                status: 200,
                body,
                calls: Cell::new(0),
            }
        }

        fn status(status: u16) -> Self {
            Self {
                status,
                body: b"not found".to_vec(),
                calls: Cell::new(0),
            }
        }
    }

    impl HttpFetch for FakeFetch {
        fn get(&self, _url: &str) -> BuildResult<FetchResponse> {
            self.calls.set(self.calls.get() + 1);
            Ok(FetchResponse {
                status: self.status,
                content_length: Some(self.body.len() as u64),
                body: Box::new(io::Cursor::new(self.body.clone())),
            })
        }
    }

    const LINUX64: HostPlatform = HostPlatform::new(Os::Linux, Bitness::Bits64);

    fn dir_is_empty(dir: &Path) -> bool {
        fs::read_dir(dir).map(|mut it| it.next().is_none()).unwrap_or(true)
    }

    #[test]
    fn test_non_sentinel_passes_through_without_io() {
        let tmp = tempfile::tempdir().unwrap();
        let fetch = FakeFetch::ok(Vec::new());
        let mut boot = Bootstrapper::with_fetcher(tmp.path().join("cache"), &fetch);

        assert_eq!(boot.resolve("/usr/bin/python2").unwrap(), "/usr/bin/python2");
        assert_eq!(boot.resolve("python").unwrap(), "python");
        assert_eq!(fetch.calls.get(), 0);
        assert_eq!(boot.state(), BootstrapState::Unresolved);
        assert!(!tmp.path().join("cache").exists());
    }

    #[test]
    fn test_unknown_platform_falls_back_to_python() {
        let tmp = tempfile::tempdir().unwrap();
        let fetch = FakeFetch::ok(Vec::new());
        let mut boot = Bootstrapper::with_fetcher(tmp.path(), &fetch)
            .with_platform(HostPlatform::new(Os::Other, Bitness::Bits64));

        assert_eq!(boot.resolve(BUNDLED_SENTINEL).unwrap(), FALLBACK_INTERPRETER);
        assert_eq!(boot.state(), BootstrapState::Fallback);
        assert_eq!(fetch.calls.get(), 0);
    }

    #[test]
    fn test_cached_executable_is_a_hit() {
        let tmp = tempfile::tempdir().unwrap();
        let exe = tmp.path().join("pypy2-v5.6.0-linux64/bin/pypy");
        fs::create_dir_all(exe.parent().unwrap()).unwrap();
        fs::write(&exe, b"").unwrap();

        let fetch = FakeFetch::ok(Vec::new());
        let mut boot = Bootstrapper::with_fetcher(tmp.path(), &fetch).with_platform(LINUX64);
        let resolved = boot.resolve(BUNDLED_SENTINEL).unwrap();

        assert_eq!(Path::new(&resolved), exe);
        assert_eq!(boot.state(), BootstrapState::CacheHit);
        assert_eq!(fetch.calls.get(), 0);
    }

    #[test]
    fn test_downloads_and_extracts_tar_bz2_once() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = tmp.path().join("cache");
        let downloads = tmp.path().join("dl");
        let archive = tar_bz2_bytes(&[
            ("pypy2-v5.6.0-linux64/bin/pypy", 0o755, b"#!/bin/sh\necho pypy\n"),
            ("pypy2-v5.6.0-linux64/lib-python/2.7/os.py", 0o644, b"# os"),
        ]);
        let fetch = FakeFetch::ok(archive);
        let mut boot = Bootstrapper::with_fetcher(&cache, &fetch)
            .with_platform(LINUX64)
            .with_temp_dir(&downloads);

        let resolved = boot.resolve(BUNDLED_SENTINEL).unwrap();
        let exe = cache.join("pypy2-v5.6.0-linux64/bin/pypy");
        assert_eq!(Path::new(&resolved), exe);
        assert_eq!(boot.state(), BootstrapState::Ready);
        assert_eq!(boot.resolved(), Some(resolved.as_str()));
        assert!(dir_is_empty(&downloads));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&exe).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }

        // memoized on this instance
        assert_eq!(boot.resolve("internal").unwrap(), resolved);
        assert_eq!(fetch.calls.get(), 1);

        // a fresh instance finds the cache
        let mut again = Bootstrapper::with_fetcher(&cache, &fetch).with_platform(LINUX64);
        assert_eq!(again.resolve(BUNDLED_SENTINEL).unwrap(), resolved);
        assert_eq!(again.state(), BootstrapState::CacheHit);
        assert_eq!(fetch.calls.get(), 1);
    }

    #[test]
    fn test_windows_uses_zip_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = zip_bytes(&[("pypy2-v5.6.0-win32/pypy.exe", b"MZ")]);
        let fetch = FakeFetch::ok(archive);
        let mut boot = Bootstrapper::with_fetcher(tmp.path(), &fetch)
            .with_platform(HostPlatform::new(Os::Windows, Bitness::Bits32));

        let resolved = boot.resolve(BUNDLED_SENTINEL).unwrap();
        assert!(resolved.ends_with("pypy.exe"));
        assert_eq!(fs::read(&resolved).unwrap(), b"MZ");
    }

    #[test]
    fn test_bad_status_is_network_error() {
        let tmp = tempfile::tempdir().unwrap();
        let fetch = FakeFetch::status(404);
        let mut boot = Bootstrapper::with_fetcher(tmp.path().join("cache"), &fetch)
            .with_platform(LINUX64);

        let err = boot.resolve(BUNDLED_SENTINEL).unwrap_err();
        assert!(matches!(err, BuildError::Network { .. }), "{err}");
        assert!(err.to_string().contains("404"));
        assert_eq!(boot.state(), BootstrapState::Failed);
        assert_eq!(boot.resolved(), None);
    }

    #[test]
    fn test_missing_executable_after_extraction() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tar_bz2_bytes(&[("pypy2-v5.6.0-linux64/README.rst", 0o644, b"hi")]);
        let fetch = FakeFetch::ok(archive);
        let mut boot = Bootstrapper::with_fetcher(tmp.path().join("cache"), &fetch)
            .with_platform(LINUX64);

        let err = boot.resolve(BUNDLED_SENTINEL).unwrap_err();
        assert!(matches!(err, BuildError::Archive { .. }), "{err}");
        assert_eq!(boot.state(), BootstrapState::Failed);
    }

    #[test]
    fn test_corrupt_download_cleans_up_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let downloads = tmp.path().join("dl");
        let fetch = FakeFetch::ok(b"this is not bzip2".to_vec());
        let mut boot = Bootstrapper::with_fetcher(tmp.path().join("cache"), &fetch)
            .with_platform(LINUX64)
            .with_temp_dir(&downloads);

        let err = boot.resolve(BUNDLED_SENTINEL).unwrap_err();
        assert!(matches!(err, BuildError::Archive { .. }), "{err}");
        assert!(dir_is_empty(&downloads));
    }

    #[test]
    fn test_sentinel_spellings() {
        assert!(is_bundled_sentinel("use-bundled"));
        assert!(is_bundled_sentinel("internal"));
        assert!(!is_bundled_sentinel("python"));
        assert!(!is_bundled_sentinel("Internal"));
    }
}
