pub mod config;
pub mod constants;
pub mod devicegraph;
pub mod error;
pub mod primitives;

pub use devicegraph::{
    check::CheckIssue,
    handles::{Device, DeviceHandle, Disk, Filesystem, Partition, PartitionTable},
    holders::Holder,
    types::{DeviceKind, DeviceKindFlag, Sid},
    Devicegraph,
};
pub use primitives::region::Region;

// Re-export the system definitions used throughout the public API so callers
// do not need a direct dependency on sysdefs.
pub use sysdefs::{
    disks::Transport,
    filesystems::FsType,
    partitions::{PartitionId, PartitionType, PtType},
};
