//! Unpack interpreter archives into the cache.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};

use qxbuild_core::{BuildError, BuildResult};
use tracing::{debug, warn};

use crate::permissions::{apply_permissions, int_mode_to_posix};
use crate::table::ArchiveKind;

/// Extract `archive` into `dest`, returning the number of entries written.
///
/// Entries with absolute paths or `..` components are skipped.
pub fn extract(kind: ArchiveKind, archive: &Path, dest: &Path) -> BuildResult<usize> {
    fs::create_dir_all(dest).map_err(|e| BuildError::io(dest, e))?;
    let file = File::open(archive).map_err(|e| BuildError::io(archive, e))?;
    let written = match kind {
        ArchiveKind::Zip => extract_zip(file, archive, dest)?,
        ArchiveKind::TarBz2 => extract_tar_bz2(file, archive, dest)?,
    };
    debug!(
        archive = %archive.display(),
        dest = %dest.display(),
        entries = written,
        "archive extracted"
    );
    Ok(written)
}

fn extract_zip(file: File, archive: &Path, dest: &Path) -> BuildResult<usize> {
    let label = archive.display().to_string();
    let mut zip = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| BuildError::archive(&label, e))?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| BuildError::archive(&label, e))?;
        let rel = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                warn!(entry = entry.name(), "skipping zip entry with unsafe path");
                continue;
            }
        };
        let out_path = dest.join(&rel);
        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| BuildError::io(&out_path, e))?;
        } else {
            create_parent(&out_path)?;
            let mut out = File::create(&out_path).map_err(|e| BuildError::io(&out_path, e))?;
            io::copy(&mut entry, &mut out)
                .map_err(|e| BuildError::archive(&label, format!("{}: {}", rel.display(), e)))?;
        }
        written += 1;
    }
    Ok(written)
}

fn extract_tar_bz2(file: File, archive: &Path, dest: &Path) -> BuildResult<usize> {
    let label = archive.display().to_string();
    let decoder = bzip2::read::MultiBzDecoder::new(BufReader::new(file));
    let mut tar = tar::Archive::new(decoder);

    let mut written = 0;
    let entries = tar.entries().map_err(|e| BuildError::archive(&label, e))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| BuildError::archive(&label, e))?;
        let rel: PathBuf = entry
            .path()
            .map_err(|e| BuildError::archive(&label, e))?
            .into_owned();
        if !is_safe_relative(&rel) {
            warn!(entry = %rel.display(), "skipping tar entry with unsafe path");
            continue;
        }
        let entry_type = entry.header().entry_type();

        if entry_type.is_symlink() {
            let target = entry
                .link_name()
                .map_err(|e| BuildError::archive(&label, e))?
                .map(|t| t.into_owned());
            match target {
                Some(target) if link_stays_inside(&rel, &target) => {
                    if !cfg!(unix) {
                        warn!(
                            link = %rel.display(),
                            target = %target.display(),
                            "symlinks are not recreated on this platform"
                        );
                        continue;
                    }
                }
                Some(target) => {
                    warn!(
                        entry = %rel.display(),
                        target = %target.display(),
                        "skipping symlink pointing outside the archive root"
                    );
                    continue;
                }
                None => {
                    warn!(entry = %rel.display(), "symlink entry without a target");
                    continue;
                }
            }
        } else if !(entry_type.is_dir() || entry_type.is_file() || entry_type.is_hard_link()) {
            warn!(entry = %rel.display(), kind = ?entry_type, "skipping special tar entry");
            continue;
        }

        // unpack_in refuses to write through a link that resolves outside `dest`
        let unpacked = entry
            .unpack_in(dest)
            .map_err(|e| BuildError::archive(&label, format!("{}: {}", rel.display(), e)))?;
        if !unpacked {
            warn!(entry = %rel.display(), "tar entry was not unpacked");
            continue;
        }
        if entry_type.is_file() {
            let mode = entry.header().mode().map_err(|e| BuildError::archive(&label, e))?;
            let perms = int_mode_to_posix(mode & 0o777)?;
            apply_permissions(&dest.join(&rel), &perms)?;
        }
        written += 1;
    }
    Ok(written)
}

fn is_safe_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Whether a symlink at `link` (relative to the archive root) pointing to
/// `target` resolves inside the root, judged lexically.
fn link_stays_inside(link: &Path, target: &Path) -> bool {
    let parent = link.parent().unwrap_or(Path::new(""));
    let mut depth: usize = 0;
    for component in parent.components().chain(target.components()) {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

fn create_parent(path: &Path) -> BuildResult<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e)),
        None => Ok(()),
    }
}
