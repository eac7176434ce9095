use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use filetime::FileTime;
use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{EnumPatternMode, SpecExclusionPolicy, SyncError};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypePatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl TypePatternSeq {
    fn is_matching(&self, value: &str) -> bool {
        match self {
            Self::Literal(v) => v.iter().any(|p| p == value),
            Self::Glob(v) => v.iter().any(|p| p.is_match(value)),
            Self::Regex(v) => v.iter().any(|p| p.is_match(value)),
        }
    }
}

/// Compiled form of [`SpecExclusionPolicy`].
#[derive(Debug, Clone, Default)]
pub(crate) struct SpecExclusionMatcher {
    patterns_dirs: Option<TypePatternSeq>,
    patterns_files: Option<TypePatternSeq>,
}

impl SpecExclusionMatcher {
    pub(crate) fn from_policy(
        spec_policy: &SpecExclusionPolicy,
        rule_pattern: EnumPatternMode,
    ) -> Result<Self, SyncError> {
        Ok(Self {
            patterns_dirs: _compile(&spec_policy.names_dirs, rule_pattern)?,
            patterns_files: _compile(&spec_policy.names_files, rule_pattern)?,
        })
    }

    pub(crate) fn is_dir_excluded(&self, name_dir: &str) -> bool {
        self.patterns_dirs
            .as_ref()
            .is_some_and(|p| p.is_matching(name_dir))
    }

    pub(crate) fn is_file_excluded(&self, name_file: &str) -> bool {
        self.patterns_files
            .as_ref()
            .is_some_and(|p| p.is_matching(name_file))
    }
}

fn _compile(
    patterns: &[String],
    rule_pattern: EnumPatternMode,
) -> Result<Option<TypePatternSeq>, SyncError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    match rule_pattern {
        EnumPatternMode::Literal => Ok(Some(TypePatternSeq::Literal(patterns.to_vec()))),
        EnumPatternMode::Glob => {
            let mut l_glob = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let matcher = Glob::new(pattern)
                    .map_err(|e| SyncError::InvalidPattern {
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    })?
                    .compile_matcher();
                l_glob.push(matcher);
            }
            Ok(Some(TypePatternSeq::Glob(l_glob)))
        }
        EnumPatternMode::Regex => {
            let mut l_regex = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let regex = Regex::new(pattern).map_err(|e| SyncError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                l_regex.push(regex);
            }
            Ok(Some(TypePatternSeq::Regex(l_regex)))
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Staleness

/// Cheap "file changed" proxy: size plus modification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SpecFileSignature {
    pub(crate) n_size: u64,
    pub(crate) time_modify: FileTime,
}

impl SpecFileSignature {
    pub(crate) fn from_metadata(meta: &fs::Metadata) -> Self {
        Self {
            n_size: meta.len(),
            time_modify: FileTime::from_last_modification_time(meta),
        }
    }

    /// Signature of the file at `path`, following symlinks.
    pub(crate) fn read(path: &Path) -> Option<Self> {
        fs::metadata(path).ok().map(|m| Self::from_metadata(&m))
    }
}

/// Decide whether `path_file_dst` must be refreshed from `path_file_src`.
///
/// A destination symlink only counts as current in link mode; in copy mode it
/// has to be replaced by real bytes.
pub(crate) fn is_destination_stale(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_use_symlinks: bool,
) -> bool {
    let Ok(meta_dst) = fs::symlink_metadata(path_file_dst) else {
        return true;
    };
    if meta_dst.file_type().is_symlink() && !if_use_symlinks {
        return true;
    }
    if meta_dst.is_dir() {
        return true;
    }

    match (
        SpecFileSignature::read(path_file_src),
        SpecFileSignature::read(path_file_dst),
    ) {
        (Some(sig_src), Some(sig_dst)) => {
            sig_src.n_size != sig_dst.n_size || sig_src.time_modify != sig_dst.time_modify
        }
        _ => true,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Relative location of the destination root inside the source tree, if any.
pub(crate) fn derive_nested_destination(
    path_dir_src: &Path,
    path_dir_dst: &Path,
) -> Option<PathBuf> {
    let path_src_resolved = normalize_path(path_dir_src);
    let path_dst_resolved = normalize_path(path_dir_dst);
    path_dst_resolved
        .strip_prefix(&path_src_resolved)
        .ok()
        .map(Path::to_path_buf)
}

/// Path that leads from directory `path_base` to `path_target`.
///
/// Both inputs are expected to be absolute. When they share no root (e.g.
/// different Windows drives) the target is returned unchanged.
pub(crate) fn derive_relative_path(path_target: &Path, path_base: &Path) -> PathBuf {
    let l_target: Vec<Component<'_>> = path_target.components().collect();
    let l_base: Vec<Component<'_>> = path_base.components().collect();
    let n_common = l_target
        .iter()
        .zip(&l_base)
        .take_while(|(a, b)| a == b)
        .count();
    if n_common == 0 {
        return path_target.to_path_buf();
    }

    let mut path_rel = PathBuf::new();
    for _ in n_common..l_base.len() {
        path_rel.push("..");
    }
    for part in &l_target[n_common..] {
        path_rel.push(part.as_os_str());
    }
    path_rel
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileActions

/// Clear the read-only bit (regular files only) and unlink `path`.
///
/// A missing path is not an error. Directories are refused.
pub(crate) fn remove_destination_entry(path: &Path) -> Result<(), io::Error> {
    let meta = match fs::symlink_metadata(path) {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if meta.is_dir() {
        return Err(io::Error::other(format!(
            "Destination is a directory: {}",
            path.display()
        )));
    }

    if meta.file_type().is_file() && meta.permissions().readonly() {
        fs::set_permissions(path, writable_permissions(meta.permissions()))?;
    }
    fs::remove_file(path)
}

#[cfg(unix)]
fn writable_permissions(permissions: fs::Permissions) -> fs::Permissions {
    use std::os::unix::fs::PermissionsExt;
    fs::Permissions::from_mode(permissions.mode() | 0o200)
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn writable_permissions(mut permissions: fs::Permissions) -> fs::Permissions {
    permissions.set_readonly(false);
    permissions
}

/// Create `path_file_dst` as a symlink to `path_file_src`, expressed relative
/// to the destination's containing directory.
pub(crate) fn create_relative_symlink(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), io::Error> {
    let path_dir_dst = path_file_dst
        .parent()
        .ok_or_else(|| io::Error::other("Destination has no parent directory"))?;
    let path_dir_src = path_file_src
        .parent()
        .ok_or_else(|| io::Error::other("Source has no parent directory"))?;
    let name_file_src = path_file_src
        .file_name()
        .ok_or_else(|| io::Error::other("Source has no file name"))?;

    let path_target = derive_relative_path(
        &fs::canonicalize(path_dir_src)?.join(name_file_src),
        &fs::canonicalize(path_dir_dst)?,
    );

    symlink_file(&path_target, path_file_dst)
}

#[cfg(unix)]
fn symlink_file(path_target: &Path, path_link: &Path) -> Result<(), io::Error> {
    std::os::unix::fs::symlink(path_target, path_link)
}

#[cfg(windows)]
fn symlink_file(path_target: &Path, path_link: &Path) -> Result<(), io::Error> {
    std::os::windows::fs::symlink_file(path_target, path_link)
}

#[cfg(not(any(unix, windows)))]
fn symlink_file(_path_target: &Path, _path_link: &Path) -> Result<(), io::Error> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Symbolic links are unsupported on this platform",
    ))
}

/// Copy bytes, then carry over timestamps, permissions and (Linux) xattrs.
///
/// Refuses to write through an existing destination symlink.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), io::Error> {
    if fs::symlink_metadata(path_file_dst).is_ok_and(|m| m.file_type().is_symlink()) {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!(
                "Destination is a symbolic link that could not be removed: {}",
                path_file_dst.display()
            ),
        ));
    }

    fs::copy(path_file_src, path_file_dst)?;
    apply_metadata(path_file_src, path_file_dst)
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::set_file_times;

    let stat_src = fs::metadata(path_file_src)?;
    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let Ok(iter_xattr_names) = xattr::list(path_file_src) else {
        return;
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        let _ = xattr::set(path_file_dst, &name, &raw_value);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
