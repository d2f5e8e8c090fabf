//! Configuration types read by the storage session and the CLI.

mod environment;
mod layout;

pub use environment::{Environment, ProbeMode, TargetMode};
pub use layout::{DiskLayout, FilesystemLayout, Layout, PartitionLayout, PartitionTableLayout};
