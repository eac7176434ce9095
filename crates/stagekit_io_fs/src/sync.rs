//! Filesystem tree traversal and sync orchestration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::report::{ReportSync, ReportSyncBuilder};
use crate::spec::{EnumSyncStrategy, SpecSyncOptions, SyncError};
use crate::util::{
    SpecExclusionMatcher, copy_file_with_metadata, create_relative_symlink,
    derive_nested_destination, is_destination_stale, normalize_path, remove_destination_entry,
};

/// Name of the subdirectory synchronized by [`sync_build_output`].
pub const C_NAME_DIR_BUILD: &str = "build";

#[derive(Debug, Clone)]
struct SpecFileEntry {
    path_file_src: PathBuf,
    name_file: String,
    if_is_symlink: bool,
}

#[derive(Debug)]
struct SpecSyncContext {
    path_dir_dst: PathBuf,
    path_rel_dst_nested: Option<PathBuf>,
    spec_sync_options: SpecSyncOptions,
    spec_matcher: SpecExclusionMatcher,
    builder_sync_report: ReportSyncBuilder,
}

/// Synchronize the tree under `dir_source` into `dir_destination`.
///
/// This function performs:
/// 1. Source validation (no destination side effects on failure).
/// 2. Destination root creation.
/// 3. Top-down traversal, pruning excluded directories before descending.
/// 4. Per-file exclusion, staleness check and copy/link.
///
/// Per-file failures (locked or read-only files, permission errors) never
/// abort the run; they are logged, tallied and kept in the returned
/// [`ReportSync`]. Returns [`SyncError`] only for setup failures.
pub fn sync_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_sync_options: SpecSyncOptions,
) -> Result<ReportSync, SyncError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = dir_source.as_ref().to_path_buf();
    let path_dir_dst = dir_destination.as_ref().to_path_buf();

    if !path_dir_src.exists() {
        return Err(SyncError::SourceMissing(path_dir_src));
    }
    if !path_dir_src.is_dir() {
        return Err(SyncError::SourceNotDirectory(path_dir_src));
    }
    let spec_matcher = SpecExclusionMatcher::from_policy(
        &spec_sync_options.spec_exclusion,
        spec_sync_options.rule_pattern,
    )?;
    if normalize_path(&path_dir_src) == normalize_path(&path_dir_dst) {
        return Err(SyncError::SourceIsDestination(path_dir_src));
    }

    if !spec_sync_options.if_dry_run {
        fs::create_dir_all(&path_dir_dst).map_err(|e| SyncError::DestinationInitFailed {
            path: path_dir_dst.clone(),
            source: e,
        })?;
    }

    info!(
        source = %path_dir_src.display(),
        destination = %path_dir_dst.display(),
        strategy = ?spec_sync_options.rule_strategy,
        symlinks = spec_sync_options.if_use_symlinks,
        dry_run = spec_sync_options.if_dry_run,
        "Synchronizing directory"
    );

    let mut spec_sync_ctx = SpecSyncContext {
        path_rel_dst_nested: derive_nested_destination(&path_dir_src, &path_dir_dst),
        path_dir_dst,
        spec_sync_options,
        spec_matcher,
        builder_sync_report: ReportSyncBuilder::default(),
    };

    walk_directory(&path_dir_src, Path::new(""), &mut spec_sync_ctx);
    Ok(spec_sync_ctx.builder_sync_report.build())
}

/// Synchronize `<dir_app_source>/build` into `<dir_app_destination>/build`.
///
/// The app directory itself must exist. A missing build directory inside it
/// is a soft condition: it is logged and `Ok(None)` is returned so callers
/// can still exit successfully.
pub fn sync_build_output<P, Q>(
    dir_app_source: P,
    dir_app_destination: Q,
    spec_sync_options: SpecSyncOptions,
) -> Result<Option<ReportSync>, SyncError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_app_src = dir_app_source.as_ref();
    if !path_dir_app_src.exists() {
        return Err(SyncError::SourceMissing(path_dir_app_src.to_path_buf()));
    }
    if !path_dir_app_src.is_dir() {
        return Err(SyncError::SourceNotDirectory(path_dir_app_src.to_path_buf()));
    }

    let path_dir_build_src = path_dir_app_src.join(C_NAME_DIR_BUILD);
    let path_dir_build_dst = dir_app_destination.as_ref().join(C_NAME_DIR_BUILD);

    if !path_dir_build_src.is_dir() {
        warn!(
            "Build directory not found: {} (run the app's build step first)",
            path_dir_build_src.display()
        );
        return Ok(None);
    }

    sync_tree(path_dir_build_src, path_dir_build_dst, spec_sync_options).map(Some)
}

/// Copy one file if it exists at the source.
///
/// Returns `Ok(false)` without touching the destination when the source is
/// absent, `Ok(true)` after a successful copy.
pub fn copy_file_if_exists<P, Q>(file_source: P, file_destination: Q) -> Result<bool, io::Error>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_file_src = file_source.as_ref();
    let path_file_dst = file_destination.as_ref();

    if !path_file_src.exists() {
        debug!("Source file absent, nothing to copy: {}", path_file_src.display());
        return Ok(false);
    }

    if let Some(path_parent_dst) = path_file_dst.parent()
        && !path_parent_dst.as_os_str().is_empty()
    {
        fs::create_dir_all(path_parent_dst)?;
    }
    if let Err(e) = remove_destination_entry(path_file_dst) {
        debug!("Could not clear {} ({e})", path_file_dst.display());
    }
    copy_file_with_metadata(path_file_src, path_file_dst)?;
    Ok(true)
}

fn walk_directory(path_dir_src_cur: &Path, path_rel: &Path, spec_sync_ctx: &mut SpecSyncContext) {
    let path_dir_dst_cur = spec_sync_ctx.path_dir_dst.join(path_rel);
    if !spec_sync_ctx.spec_sync_options.if_dry_run
        && let Err(e) = fs::create_dir_all(&path_dir_dst_cur)
    {
        warn!("Could not create directory {} ({e})", path_dir_dst_cur.display());
        spec_sync_ctx.builder_sync_report.add_warning(format!(
            "Failed to create directory {} ({e})",
            path_dir_dst_cur.display()
        ));
    }

    let iter_entries = match fs::read_dir(path_dir_src_cur) {
        Ok(iter) => iter,
        Err(e) => {
            warn!("Could not read directory {} ({e})", path_dir_src_cur.display());
            spec_sync_ctx.builder_sync_report.add_warning(format!(
                "Failed to read directory {} ({e})",
                path_dir_src_cur.display()
            ));
            return;
        }
    };

    let mut l_dirs: Vec<(PathBuf, String)> = Vec::new();
    let mut l_files: Vec<SpecFileEntry> = Vec::new();

    for entry_res in iter_entries {
        let entry = match entry_res {
            Ok(v) => v,
            Err(e) => {
                spec_sync_ctx.builder_sync_report.add_warning(format!(
                    "Failed to read directory entry under {} ({e})",
                    path_dir_src_cur.display()
                ));
                continue;
            }
        };

        let path_entry = entry.path();
        let c_name = entry.file_name().to_string_lossy().to_string();
        let cfg_file_type = match entry.file_type() {
            Ok(v) => v,
            Err(e) => {
                spec_sync_ctx
                    .builder_sync_report
                    .add_warning(format!("Failed to inspect {} ({e})", path_entry.display()));
                continue;
            }
        };

        let b_is_symlink = cfg_file_type.is_symlink();
        if cfg_file_type.is_dir() {
            l_dirs.push((path_entry, c_name));
        } else if b_is_symlink && path_entry.is_dir() {
            debug!("Symlinked directory not followed: {}", path_entry.display());
            spec_sync_ctx.builder_sync_report.add_warning(format!(
                "Symlinked directory not followed: {}",
                path_entry.display()
            ));
        } else if cfg_file_type.is_file() || b_is_symlink {
            l_files.push(SpecFileEntry {
                path_file_src: path_entry,
                name_file: c_name,
                if_is_symlink: b_is_symlink,
            });
        } else {
            spec_sync_ctx
                .builder_sync_report
                .add_warning(format!("Special file skipped: {}", path_entry.display()));
        }
    }

    l_dirs.sort_by(|a, b| a.1.cmp(&b.1));
    l_files.sort_by(|a, b| a.name_file.cmp(&b.name_file));

    l_dirs.retain(|(_, name_dir)| {
        let b_is_excluded = spec_sync_ctx.spec_matcher.is_dir_excluded(name_dir);
        if b_is_excluded {
            debug!("Excluded directory: {}", path_rel.join(name_dir).display());
        }
        !b_is_excluded
    });

    for spec_file_entry in l_files {
        handle_file_entry(spec_file_entry, &path_dir_dst_cur, spec_sync_ctx);
    }

    for (path_dir_src_sub, name_dir) in l_dirs {
        let path_rel_sub = path_rel.join(&name_dir);
        if spec_sync_ctx.path_rel_dst_nested.as_deref() == Some(path_rel_sub.as_path()) {
            debug!("Skipping destination nested in source: {}", path_dir_src_sub.display());
            continue;
        }
        walk_directory(&path_dir_src_sub, &path_rel_sub, spec_sync_ctx);
    }
}

fn handle_file_entry(
    spec_file_entry: SpecFileEntry,
    path_dir_dst_cur: &Path,
    spec_sync_ctx: &mut SpecSyncContext,
) {
    spec_sync_ctx.builder_sync_report.add_scanned();

    if spec_sync_ctx
        .spec_matcher
        .is_file_excluded(&spec_file_entry.name_file)
    {
        debug!("Excluded file: {}", spec_file_entry.path_file_src.display());
        spec_sync_ctx.builder_sync_report.add_excluded();
        return;
    }

    if spec_file_entry.if_is_symlink && !spec_file_entry.path_file_src.exists() {
        warn!("Broken symlink: {}", spec_file_entry.path_file_src.display());
        spec_sync_ctx.builder_sync_report.add_failed(
            spec_file_entry.path_file_src.clone(),
            format!(
                "Broken symlink: {}",
                spec_file_entry.path_file_src.display()
            ),
        );
        return;
    }

    let path_file_src = spec_file_entry.path_file_src;
    let path_file_dst = path_dir_dst_cur.join(&spec_file_entry.name_file);
    let if_use_symlinks = spec_sync_ctx.spec_sync_options.if_use_symlinks;

    if spec_sync_ctx.spec_sync_options.rule_strategy == EnumSyncStrategy::Incremental
        && !is_destination_stale(&path_file_src, &path_file_dst, if_use_symlinks)
    {
        debug!("Unchanged: {}", path_file_dst.display());
        spec_sync_ctx.builder_sync_report.add_unchanged();
        return;
    }

    if spec_sync_ctx.spec_sync_options.if_dry_run {
        debug!(
            "Would {} {} -> {}",
            if if_use_symlinks { "link" } else { "copy" },
            path_file_src.display(),
            path_file_dst.display()
        );
        if if_use_symlinks {
            spec_sync_ctx.builder_sync_report.add_linked();
        } else {
            spec_sync_ctx.builder_sync_report.add_copied();
        }
        return;
    }

    if if_use_symlinks {
        match link_file(&path_file_src, &path_file_dst) {
            Ok(()) => {
                debug!("Linked: {}", path_file_dst.display());
                spec_sync_ctx.builder_sync_report.add_linked();
                return;
            }
            Err(e) => {
                debug!(
                    "Symlink failed for {} ({e}), falling back to copy",
                    path_file_dst.display()
                );
            }
        }
    }

    copy_file_entry(&path_file_src, &path_file_dst, &mut spec_sync_ctx.builder_sync_report);
}

fn link_file(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    remove_destination_entry(path_file_dst)?;
    create_relative_symlink(path_file_src, path_file_dst)
}

fn copy_file_entry(
    path_file_src: &Path,
    path_file_dst: &Path,
    builder_sync_report: &mut ReportSyncBuilder,
) {
    if let Some(path_parent_dst) = path_file_dst.parent()
        && let Err(e) = fs::create_dir_all(path_parent_dst)
    {
        warn!("Could not create directory {} ({e})", path_parent_dst.display());
        builder_sync_report.add_failed(path_file_dst.to_path_buf(), e.to_string());
        return;
    }

    if let Err(e) = remove_destination_entry(path_file_dst) {
        debug!("Could not clear {} ({e})", path_file_dst.display());
    }

    match copy_file_with_metadata(path_file_src, path_file_dst) {
        Ok(()) => {
            debug!("Copied: {}", path_file_dst.display());
            builder_sync_report.add_copied();
        }
        Err(e) => {
            let name_file = path_file_src
                .file_name()
                .map(|v| v.to_string_lossy().to_string())
                .unwrap_or_default();
            warn!("Skipping locked file: {name_file} ({e})");
            builder_sync_report.add_failed(path_file_dst.to_path_buf(), e.to_string());
        }
    }
}
