use std::path::Path;

use storage_api::error::{InternalError, ReportError, StorageError};

pub mod cli;
pub mod config;
mod logging;
mod storage;

pub use logging::{file_log::FileLog, multilog::MultiLogger};
pub use storage::{Committer, Prober, Storage};

/// Storage-ng version as provided by cargo.
pub const STORAGE_NG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Outcome of a successfully executed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// The command completed and found nothing to report.
    Done,

    /// The command completed but the devicegraph has consistency issues.
    IssuesFound,
}

/// Writes a YAML report of the error to the given path.
pub fn write_error_report(path: &Path, error: &StorageError) -> Result<(), StorageError> {
    let report = serde_yaml::to_string(error).structured(InternalError::SerializeErrorReport)?;
    std::fs::write(path, report).structured(InternalError::WriteErrorReport {
        path: path.to_string_lossy().into(),
    })
}
