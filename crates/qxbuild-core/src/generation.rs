//! Generation marker and staleness tracking.
//!
//! After every successful generator run a `.generation` file is written into
//! the application target. Its timestamp is the time the run *started*, so a
//! source edited while the generator was busy still counts as newer on the
//! next invocation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use walkdir::WalkDir;

use crate::error::{BuildError, BuildResult};

/// File name of the marker inside the application target.
pub const MARKER_FILE: &str = ".generation";

const KEY_TS: &str = "ts";
const KEY_JOB: &str = "job";

/// Persisted record of the last successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationMarker {
    /// Generation start time, epoch milliseconds.
    pub timestamp: i64,
    pub job: String,
}

impl GenerationMarker {
    pub fn new(timestamp: i64, job: impl Into<String>) -> Self {
        Self {
            timestamp,
            job: job.into(),
        }
    }

    /// Marker stamped with the current wall-clock time.
    pub fn started_now(job: impl Into<String>) -> Self {
        Self::new(chrono::Utc::now().timestamp_millis(), job)
    }

    pub fn path_in(app_target: &Path) -> PathBuf {
        app_target.join(MARKER_FILE)
    }

    /// Read the marker from `app_target`.
    ///
    /// A missing file is `None`. An unreadable or malformed file is logged
    /// and also treated as `None`, which forces a rebuild.
    pub fn load(app_target: &Path) -> Option<Self> {
        let path = Self::path_in(app_target);
        if !path.exists() {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(content) => match Self::parse(&content) {
                Some(marker) => Some(marker),
                None => {
                    tracing::warn!("Ignoring malformed generation marker {}", path.display());
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Cannot read generation marker {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write the marker into `app_target`, creating the directory if needed.
    pub fn store(&self, app_target: &Path) -> BuildResult<()> {
        fs::create_dir_all(app_target).map_err(|e| BuildError::io(app_target, e))?;
        let path = Self::path_in(app_target);
        fs::write(&path, self.render()).map_err(|e| BuildError::io(&path, e))
    }

    /// Parse flat `key=value` lines; `#`/`!` comments and blank lines are skipped.
    pub fn parse(content: &str) -> Option<Self> {
        let mut ts = None;
        let mut job = None;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some((key, value)) = line.split_once(['=', ':']) else {
                continue;
            };
            match key.trim() {
                KEY_TS => ts = value.trim().parse::<i64>().ok(),
                KEY_JOB => job = Some(value.trim().to_string()),
                _ => {}
            }
        }
        Some(Self {
            timestamp: ts?,
            job: job?,
        })
    }

    pub fn render(&self) -> String {
        format!("{}={}\n{}={}\n", KEY_TS, self.timestamp, KEY_JOB, self.job)
    }
}

/// Ordered set of directories whose contents feed the generator.
#[derive(Debug, Clone, Default)]
pub struct SourceRootSet {
    roots: Vec<PathBuf>,
}

impl SourceRootSet {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }

    pub fn push(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// First regular file under any root modified strictly after `threshold`
    /// (epoch millis). Roots are scanned in order; missing roots are skipped.
    pub fn first_newer_than(&self, threshold: i64) -> Option<PathBuf> {
        self.roots
            .iter()
            .find_map(|root| first_newer_file(root, threshold))
    }
}

/// Why a regeneration is (or is not) needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// No prior successful generation recorded.
    NoMarker,
    /// The last generation ran a different job.
    JobChanged { previous: String, current: String },
    /// A source file is newer than the marker.
    SourceChanged { path: PathBuf },
    /// Caller requested a rebuild regardless of timestamps.
    Forced,
    UpToDate,
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        !matches!(self, Staleness::UpToDate)
    }

    pub fn describe(&self) -> String {
        match self {
            Staleness::NoMarker => "no previous generation recorded".to_string(),
            Staleness::JobChanged { previous, current } => {
                format!("job changed from '{}' to '{}'", previous, current)
            }
            Staleness::SourceChanged { path } => {
                format!("'{}' changed since last generation", path.display())
            }
            Staleness::Forced => "rebuild forced".to_string(),
            Staleness::UpToDate => "sources and job unchanged".to_string(),
        }
    }
}

/// Diagnose staleness. See [`is_stale`] for the decision rules.
pub fn check_staleness(
    marker: Option<&GenerationMarker>,
    roots: &SourceRootSet,
    current_job: &str,
    force: bool,
) -> Staleness {
    if force {
        return Staleness::Forced;
    }
    let Some(marker) = marker else {
        return Staleness::NoMarker;
    };
    if marker.job != current_job {
        return Staleness::JobChanged {
            previous: marker.job.clone(),
            current: current_job.to_string(),
        };
    }
    match roots.first_newer_than(marker.timestamp) {
        Some(path) => Staleness::SourceChanged { path },
        None => Staleness::UpToDate,
    }
}

/// True when there is no marker, the job differs, or any regular file under
/// any root has an mtime strictly greater than the marker timestamp.
pub fn is_stale(marker: Option<&GenerationMarker>, roots: &SourceRootSet, current_job: &str) -> bool {
    check_staleness(marker, roots, current_job, false).is_stale()
}

fn first_newer_file(root: &Path, threshold: i64) -> Option<PathBuf> {
    if !root.exists() {
        return None;
    }
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if let Some(mtime) = meta.modified().ok().map(system_time_millis) {
            if mtime > threshold {
                return Some(entry.into_path());
            }
        }
    }
    None
}

/// Milliseconds since the Unix epoch; negative for times before it.
pub fn system_time_millis(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    }
}
