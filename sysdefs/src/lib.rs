//! Plain definitions of the storage concepts shared by every layer: disk
//! transports, filesystem types and partition table vocabulary.

pub mod disks;
pub mod filesystems;
pub mod partitions;
