//! Basic types for the devicegraph

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::constants::FIRST_SID;

use super::cardinality::ValidCardinality;

/// Storage id of a device.
///
/// Storage ids are handed out from a process-wide counter, so a sid is unique
/// within every devicegraph. Copies of a devicegraph keep the sids of the
/// devices they copy.
#[derive(
    Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(transparent)]
pub struct Sid(u64);

static NEXT_SID: AtomicU64 = AtomicU64::new(FIRST_SID);

impl Sid {
    /// Allocates a fresh storage id.
    pub(super) fn next() -> Self {
        Sid(NEXT_SID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value of the storage id.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for Sid {
    fn from(value: u64) -> Self {
        Sid(value)
    }
}

/// Enum for the supported device variants
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
pub enum DeviceKind {
    /// A disk
    Disk,

    /// A partition table on a disk
    PartitionTable,

    /// A partition in a partition table
    Partition,

    /// A filesystem on a block device
    Filesystem,
}

bitflags::bitflags! {
    /// Bitflags for supported device kinds
    ///
    /// MUST MATCH THE CONTENTS OF DeviceKind
    #[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub struct DeviceKindFlag: u32 {
        const Disk = 1;
        const PartitionTable = 1 << 1;
        const Partition = 1 << 2;
        const Filesystem = 1 << 3;

        // Groups:
        const BlkDevice = Self::Disk.bits() | Self::Partition.bits();
    }
}

impl DeviceKind {
    /// Returns the flag associated with the device kind
    pub fn as_flag(&self) -> DeviceKindFlag {
        match self {
            Self::Disk => DeviceKindFlag::Disk,
            Self::PartitionTable => DeviceKindFlag::PartitionTable,
            Self::Partition => DeviceKindFlag::Partition,
            Self::Filesystem => DeviceKindFlag::Filesystem,
        }
    }

    /// Returns whether devices of this kind are block devices, i.e. have a
    /// name and can hold a filesystem.
    pub fn is_blk_device(&self) -> bool {
        DeviceKindFlag::BlkDevice.contains(self.as_flag())
    }

    /// Returns the kinds of devices that can be children of this kind.
    pub fn compatible_children(&self) -> DeviceKindFlag {
        match self {
            Self::Disk => DeviceKindFlag::PartitionTable | DeviceKindFlag::Filesystem,
            Self::PartitionTable => DeviceKindFlag::Partition,
            Self::Partition => DeviceKindFlag::Filesystem,
            Self::Filesystem => DeviceKindFlag::empty(),
        }
    }

    /// Returns the valid number of children for this kind.
    pub fn valid_child_count(&self) -> ValidCardinality {
        match self {
            // Either one partition table or one filesystem.
            Self::Disk => ValidCardinality::new_at_most(1),
            Self::PartitionTable => ValidCardinality::new_unbounded(),
            Self::Partition => ValidCardinality::new_at_most(1),
            Self::Filesystem => ValidCardinality::new_zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_child_rules_match() {
        for kind in DeviceKind::iter() {
            assert_eq!(
                kind.compatible_children().is_empty(),
                !kind.valid_child_count().has_room_for_one_more(0),
                "Child rules of {:?} disagree",
                kind
            );
        }
    }

    #[test]
    fn test_blk_devices() {
        assert!(DeviceKind::Disk.is_blk_device());
        assert!(DeviceKind::Partition.is_blk_device());
        assert!(!DeviceKind::PartitionTable.is_blk_device());
        assert!(!DeviceKind::Filesystem.is_blk_device());
    }

    #[test]
    fn test_sids_are_unique() {
        let a = Sid::next();
        let b = Sid::next();
        assert!(b > a);
        assert!(a.value() >= FIRST_SID);
    }
}
