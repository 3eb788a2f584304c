//! Unix mode bits for extracted files.

use std::collections::BTreeSet;
use std::path::Path;

use qxbuild_core::{BuildError, BuildResult};

/// The nine owner/group/others × read/write/execute flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PosixPermission {
    OwnerRead = 0,
    OwnerWrite = 1,
    OwnerExecute = 2,
    GroupRead = 3,
    GroupWrite = 4,
    GroupExecute = 5,
    OthersRead = 6,
    OthersWrite = 7,
    OthersExecute = 8,
}

impl PosixPermission {
    /// Most significant bit first: `OwnerRead` is 0o400, `OthersExecute` 0o001.
    pub const ALL: [PosixPermission; 9] = [
        PosixPermission::OwnerRead,
        PosixPermission::OwnerWrite,
        PosixPermission::OwnerExecute,
        PosixPermission::GroupRead,
        PosixPermission::GroupWrite,
        PosixPermission::GroupExecute,
        PosixPermission::OthersRead,
        PosixPermission::OthersWrite,
        PosixPermission::OthersExecute,
    ];

    pub fn bit(self) -> u32 {
        0o400 >> (self as u32)
    }
}

/// Decode the low nine bits of `mode`. Any higher bit is rejected.
pub fn int_mode_to_posix(mode: u32) -> BuildResult<BTreeSet<PosixPermission>> {
    if mode & !0o777 != 0 {
        return Err(BuildError::archive(
            format!("mode {:o}", mode),
            "invalid mode bits, only the low nine are supported",
        ));
    }
    Ok(PosixPermission::ALL
        .iter()
        .copied()
        .filter(|p| mode & p.bit() != 0)
        .collect())
}

pub fn posix_to_mode(perms: &BTreeSet<PosixPermission>) -> u32 {
    perms.iter().fold(0, |acc, p| acc | p.bit())
}

/// `ls -l` style rendering, e.g. `rwxr-xr-x`.
pub fn symbolic(perms: &BTreeSet<PosixPermission>) -> String {
    PosixPermission::ALL
        .iter()
        .zip("rwxrwxrwx".chars())
        .map(|(p, c)| if perms.contains(p) { c } else { '-' })
        .collect()
}

#[cfg(unix)]
pub fn apply_permissions(path: &Path, perms: &BTreeSet<PosixPermission>) -> BuildResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = posix_to_mode(perms);
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(|e| BuildError::io(path, e))
}

/// Mode bits have no meaning on this host.
#[cfg(not(unix))]
pub fn apply_permissions(_path: &Path, _perms: &BTreeSet<PosixPermission>) -> BuildResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use PosixPermission::*;

    #[test]
    fn test_755() {
        let perms = int_mode_to_posix(0o755).unwrap();
        let expected: BTreeSet<_> = [
            OwnerRead,
            OwnerWrite,
            OwnerExecute,
            GroupRead,
            GroupExecute,
            OthersRead,
            OthersExecute,
        ]
        .into_iter()
        .collect();
        assert_eq!(perms, expected);
        assert_eq!(symbolic(&perms), "rwxr-xr-x");
        assert_eq!(posix_to_mode(&perms), 0o755);
    }

    #[test]
    fn test_bits_follow_declaration_order() {
        let bits: Vec<u32> = PosixPermission::ALL.iter().map(|p| p.bit()).collect();
        assert_eq!(bits, [0o400, 0o200, 0o100, 0o040, 0o020, 0o010, 0o004, 0o002, 0o001]);
    }

    #[test]
    fn test_edge_modes() {
        assert!(int_mode_to_posix(0).unwrap().is_empty());
        assert_eq!(int_mode_to_posix(0o777).unwrap().len(), 9);
        assert_eq!(symbolic(&int_mode_to_posix(0o640).unwrap()), "rw-r-----");
    }

    #[test]
    fn test_rejects_bits_above_low_nine() {
        for mode in [0o1000, 0o4755, 0o100644] {
            let err = int_mode_to_posix(mode).unwrap_err();
            assert!(matches!(err, BuildError::Archive { .. }), "mode {:o}", mode);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::NamedTempFile::new().unwrap();
        apply_permissions(tmp.path(), &int_mode_to_posix(0o750).unwrap()).unwrap();
        let mode = std::fs::metadata(tmp.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }
}
