//! `stagekit_io_fs`:
//! incremental, exclusion-aware directory synchronization for build staging.
//!
//! Module layout:
//! - `sync`   : traversal and per-file copy/link orchestration
//! - `spec`   : enums/options/errors
//! - `report` : run-time report model
//! - `util`   : pattern matching, staleness signature, file actions

pub mod report;
pub mod spec;
pub mod sync;
mod util;

pub use report::{ReportSync, ReportSyncBuilder};
pub use spec::{
    EnumExclusionPreset, EnumPatternMode, EnumSyncStrategy, SpecExclusionPolicy, SpecSyncError,
    SpecSyncOptions, SyncError,
};
pub use sync::{C_NAME_DIR_BUILD, copy_file_if_exists, sync_build_output, sync_tree};
