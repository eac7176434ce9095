//! Sync specification models and top-level error types.

use std::path::PathBuf;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// How a stale (or any, for mirror) destination file is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSyncStrategy {
    /// Copy only files whose staleness signature differs from the source.
    Incremental,
    /// Copy every included file, always overwriting.
    Mirror,
}

/// Pattern matching mode for exclusion lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumPatternMode {
    /// Exact basename match.
    Literal,
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
}

/// Named exclusion defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumExclusionPreset {
    /// VCS metadata, editor state, dependency caches and OS marker files.
    Standard,
    /// `Standard` plus sources, static assets and lockfiles of a web app.
    Package,
    /// Exclude nothing.
    None,
}

const L_DIRS_STANDARD: [&str; 6] = [
    "node_modules",
    ".git",
    ".vscode",
    ".idea",
    "__pycache__",
    ".pytest_cache",
];
const L_FILES_STANDARD: [&str; 4] = [".gitignore", ".gitattributes", ".DS_Store", "Thumbs.db"];
const L_DIRS_PACKAGE_EXTRA: [&str; 2] = ["src", "public"];
const L_FILES_PACKAGE_EXTRA: [&str; 3] = ["yarn.lock", "package-lock.json", "tsconfig.json"];

fn to_owned_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

impl EnumExclusionPreset {
    /// Materialize the preset into an editable policy.
    pub fn policy(self) -> SpecExclusionPolicy {
        match self {
            Self::Standard => SpecExclusionPolicy {
                names_dirs: to_owned_names(&L_DIRS_STANDARD),
                names_files: to_owned_names(&L_FILES_STANDARD),
            },
            Self::Package => {
                let mut spec_policy = Self::Standard.policy();
                spec_policy
                    .names_dirs
                    .extend(to_owned_names(&L_DIRS_PACKAGE_EXTRA));
                spec_policy
                    .names_files
                    .extend(to_owned_names(&L_FILES_PACKAGE_EXTRA));
                spec_policy
            }
            Self::None => SpecExclusionPolicy::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Directory and file names removed from a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecExclusionPolicy {
    /// Directory basenames never descended into.
    pub names_dirs: Vec<String>,
    /// File basenames never copied.
    pub names_files: Vec<String>,
}

impl SpecExclusionPolicy {
    /// Append extra names to both lists, skipping duplicates.
    pub fn extend(
        &mut self,
        names_dirs: impl IntoIterator<Item = String>,
        names_files: impl IntoIterator<Item = String>,
    ) {
        for name in names_dirs {
            if !self.names_dirs.contains(&name) {
                self.names_dirs.push(name);
            }
        }
        for name in names_files {
            if !self.names_files.contains(&name) {
                self.names_files.push(name);
            }
        }
    }
}

/// Input options for [`crate::sync_tree`].
#[derive(Debug, Clone)]
pub struct SpecSyncOptions {
    /// Names excluded from the run.
    pub spec_exclusion: SpecExclusionPolicy,
    /// Interpretation of the names in `spec_exclusion`.
    pub rule_pattern: EnumPatternMode,
    /// Incremental vs unconditional copy.
    pub rule_strategy: EnumSyncStrategy,
    /// Create relative symlinks instead of copying bytes.
    pub if_use_symlinks: bool,
    /// Do not mutate filesystem; record what would happen.
    pub if_dry_run: bool,
}

impl Default for SpecSyncOptions {
    fn default() -> Self {
        Self {
            spec_exclusion: EnumExclusionPreset::Standard.policy(),
            rule_pattern: EnumPatternMode::Literal,
            rule_strategy: EnumSyncStrategy::Incremental,
            if_use_symlinks: false,
            if_dry_run: false,
        }
    }
}

/// One recoverable failure with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSyncError {
    /// Failed source or destination path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// "Top-level call failed" errors (input validation / setup stage).
#[derive(Debug, Error)]
pub enum SyncError {
    /// Source path does not exist.
    #[error("Source directory does not exist: {}", .0.display())]
    SourceMissing(PathBuf),
    /// Source path exists but is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Source and destination resolve to the same directory.
    #[error("Source and destination are the same directory: {}", .0.display())]
    SourceIsDestination(PathBuf),
    /// Destination directory initialization failed.
    #[error("Could not create destination directory {}: {source}", path.display())]
    DestinationInitFailed {
        /// Destination path that failed initialization.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Invalid exclusion pattern.
    #[error("Invalid exclusion pattern `{pattern}`: {message}")]
    InvalidPattern {
        /// Offending pattern text.
        pattern: String,
        /// Parser error text.
        message: String,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{EnumExclusionPreset, SpecExclusionPolicy, SyncError};

    #[test]
    fn package_preset_is_superset_of_standard() {
        let spec_standard = EnumExclusionPreset::Standard.policy();
        let spec_package = EnumExclusionPreset::Package.policy();

        for name in &spec_standard.names_dirs {
            assert!(spec_package.names_dirs.contains(name));
        }
        for name in &spec_standard.names_files {
            assert!(spec_package.names_files.contains(name));
        }
        assert!(spec_package.names_dirs.contains(&"src".to_string()));
        assert!(spec_package.names_files.contains(&"yarn.lock".to_string()));
        assert!(!spec_standard.names_dirs.contains(&"src".to_string()));
    }

    #[test]
    fn none_preset_is_empty() {
        assert_eq!(EnumExclusionPreset::None.policy(), SpecExclusionPolicy::default());
    }

    #[test]
    fn extend_skips_duplicates() {
        let mut spec_policy = EnumExclusionPreset::Standard.policy();
        let n_dirs = spec_policy.names_dirs.len();
        spec_policy.extend(
            vec![".git".to_string(), "dist".to_string()],
            vec!["notes.md".to_string()],
        );
        assert_eq!(spec_policy.names_dirs.len(), n_dirs + 1);
        assert!(spec_policy.names_files.contains(&"notes.md".to_string()));
    }

    #[test]
    fn sync_error_messages_name_the_path() {
        let err = SyncError::SourceMissing("/no/such/dir".into());
        assert_eq!(err.to_string(), "Source directory does not exist: /no/such/dir");
    }
}
