//! Command-line interface for stagekit.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use stagekit_io_fs::{
    EnumExclusionPreset, EnumPatternMode, EnumSyncStrategy, ReportSync, SpecSyncOptions,
    copy_file_if_exists, sync_build_output, sync_tree,
};
use tracing::{debug, warn};

// =============================================================================
// CLI Definition
// =============================================================================

/// stagekit - copy build outputs into packaging directories, tolerating
/// locked and already up-to-date files.
#[derive(Parser, Debug)]
#[command(name = "stagekit", version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy an entire tree unconditionally, overwriting every included file.
    Mirror {
        /// Source directory.
        source: PathBuf,
        /// Destination directory (created if absent).
        destination: PathBuf,
        #[command(flatten)]
        sync: SyncArgs,
    },

    /// Copy only files whose size or modification time changed.
    Smart {
        /// `full` syncs the whole tree, `build` only its `build/` output.
        #[arg(value_enum)]
        mode: SmartMode,
        /// Source directory.
        source: PathBuf,
        /// Destination directory (created if absent).
        destination: PathBuf,
        /// Create relative symlinks instead of copying (development only).
        #[arg(long)]
        symlink: bool,
        #[command(flatten)]
        sync: SyncArgs,
    },

    /// Copy a single file if it exists; succeed silently when it does not.
    File {
        /// Source file.
        source: PathBuf,
        /// Destination file path.
        destination: PathBuf,
    },
}

/// Scope of a `smart` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SmartMode {
    /// Whole directory, with exclusions.
    Full,
    /// Only the `build` subdirectory.
    Build,
}

/// Exclusion defaults selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    Standard,
    Package,
    None,
}

impl From<PresetArg> for EnumExclusionPreset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::Standard => Self::Standard,
            PresetArg::Package => Self::Package,
            PresetArg::None => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatternModeArg {
    Literal,
    Glob,
    Regex,
}

impl From<PatternModeArg> for EnumPatternMode {
    fn from(value: PatternModeArg) -> Self {
        match value {
            PatternModeArg::Literal => Self::Literal,
            PatternModeArg::Glob => Self::Glob,
            PatternModeArg::Regex => Self::Regex,
        }
    }
}

/// Options shared by the directory commands.
#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// Exclusion defaults (mirror: package, smart full: standard, smart build: none).
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Additional directory name never descended into.
    #[arg(long = "exclude-dir", value_name = "NAME")]
    pub exclude_dirs: Vec<String>,

    /// Additional file name never copied.
    #[arg(long = "exclude-file", value_name = "NAME")]
    pub exclude_files: Vec<String>,

    /// How exclusion names are matched against entry basenames.
    #[arg(long, value_enum, default_value_t = PatternModeArg::Literal)]
    pub pattern_mode: PatternModeArg,

    /// Report what would be copied without touching the filesystem.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    /// Build library options, falling back to `preset_default` when no
    /// `--preset` was given.
    pub fn to_options(
        &self,
        preset_default: EnumExclusionPreset,
        rule_strategy: EnumSyncStrategy,
        if_use_symlinks: bool,
    ) -> SpecSyncOptions {
        let preset = self.preset.map_or(preset_default, EnumExclusionPreset::from);
        let mut spec_exclusion = preset.policy();
        spec_exclusion.extend(self.exclude_dirs.clone(), self.exclude_files.clone());

        SpecSyncOptions {
            spec_exclusion,
            rule_pattern: self.pattern_mode.into(),
            rule_strategy,
            if_use_symlinks,
            if_dry_run: self.dry_run,
        }
    }
}

// =============================================================================
// Execution
// =============================================================================

/// Run the parsed command. Fatal setup failures surface as `Err`.
pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Mirror {
            source,
            destination,
            sync,
        } => {
            let spec_sync_options =
                sync.to_options(EnumExclusionPreset::Package, EnumSyncStrategy::Mirror, false);
            let report = sync_tree(&source, &destination, spec_sync_options)
                .context("mirror failed")?;
            print_summary(&report, &source, &destination);
        }
        Command::Smart {
            mode: SmartMode::Full,
            source,
            destination,
            symlink,
            sync,
        } => {
            let spec_sync_options = sync.to_options(
                EnumExclusionPreset::Standard,
                EnumSyncStrategy::Incremental,
                symlink,
            );
            let report = sync_tree(&source, &destination, spec_sync_options)
                .context("smart copy failed")?;
            print_summary(&report, &source, &destination);
        }
        Command::Smart {
            mode: SmartMode::Build,
            source,
            destination,
            symlink,
            sync,
        } => {
            let spec_sync_options = sync.to_options(
                EnumExclusionPreset::None,
                EnumSyncStrategy::Incremental,
                symlink,
            );
            let report = sync_build_output(&source, &destination, spec_sync_options)
                .context("build output copy failed")?;
            if let Some(report) = report {
                print_summary(&report, &source, &destination);
            }
        }
        Command::File {
            source,
            destination,
        } => match copy_file_if_exists(&source, &destination) {
            Ok(true) => println!("Copied {} to {}", source.display(), destination.display()),
            Ok(false) => debug!("Nothing to copy: {} does not exist", source.display()),
            Err(e) => {
                warn!(
                    "Could not copy {} to {}: {e}",
                    source.display(),
                    destination.display()
                );
                return Ok(ExitCode::FAILURE);
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}

fn print_summary(report: &ReportSync, path_src: &Path, path_dst: &Path) {
    for spec_error in &report.errors {
        debug!("{}: {}", spec_error.path.display(), spec_error.exception);
    }
    println!(
        "{} from {} to {}",
        report,
        path_src.display(),
        path_dst.display()
    );
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use stagekit_io_fs::{EnumExclusionPreset, EnumPatternMode, EnumSyncStrategy};

    use super::{Cli, Command, SmartMode};

    #[test]
    fn parses_smart_full_with_symlink() {
        let cli = Cli::try_parse_from(["stagekit", "smart", "full", "app", "out", "--symlink"])
            .expect("parse");
        let Command::Smart {
            mode,
            symlink,
            sync,
            ..
        } = cli.command
        else {
            panic!("expected smart command");
        };
        assert_eq!(mode, SmartMode::Full);
        assert!(symlink);

        let spec_sync_options =
            sync.to_options(EnumExclusionPreset::Standard, EnumSyncStrategy::Incremental, symlink);
        assert!(spec_sync_options.if_use_symlinks);
        assert!(
            spec_sync_options
                .spec_exclusion
                .names_dirs
                .contains(&".git".to_string())
        );
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["stagekit", "smart", "partial", "a", "b"]).is_err());
    }

    #[test]
    fn wrong_argument_count_is_rejected() {
        assert!(Cli::try_parse_from(["stagekit", "mirror", "only-source"]).is_err());
    }

    #[test]
    fn explicit_preset_and_extra_names_override_defaults() {
        let cli = Cli::try_parse_from([
            "stagekit",
            "mirror",
            "a",
            "b",
            "--preset",
            "none",
            "--exclude-dir",
            "dist",
            "--exclude-file",
            "*.map",
            "--pattern-mode",
            "glob",
        ])
        .expect("parse");
        let Command::Mirror { sync, .. } = cli.command else {
            panic!("expected mirror command");
        };

        let spec_sync_options =
            sync.to_options(EnumExclusionPreset::Package, EnumSyncStrategy::Mirror, false);
        assert_eq!(spec_sync_options.spec_exclusion.names_dirs, vec!["dist"]);
        assert_eq!(spec_sync_options.spec_exclusion.names_files, vec!["*.map"]);
        assert_eq!(spec_sync_options.rule_pattern, EnumPatternMode::Glob);
    }
}
