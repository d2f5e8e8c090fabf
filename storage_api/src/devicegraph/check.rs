//! Consistency checks over a devicegraph.
//!
//! Creation operations store what they are given, so a devicegraph may
//! describe a layout that cannot exist on real hardware. `Devicegraph::check`
//! reports these problems without failing or changing the graph.

use log::{trace, warn};
use sysdefs::partitions::{PartitionType, PtType};

use crate::{error::DevicegraphError, primitives::region::Region};

use super::{
    graph::Devicegraph,
    handles::{DeviceHandle, Filesystem, PartitionTable},
};

/// A problem found by `Devicegraph::check`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckIssue {
    #[error("Partition '{partition}' at {region} lies outside of disk '{disk}' ({size_k} KiB)")]
    PartitionOutsideDisk {
        partition: String,
        region: Region,
        disk: String,
        size_k: u64,
    },

    #[error("Partitions '{first}' and '{second}' overlap")]
    PartitionsOverlap { first: String, second: String },

    #[error("Logical partition '{partition}' lies outside of the extended partition '{extended}'")]
    LogicalOutsideExtended { partition: String, extended: String },

    #[error("Logical partition '{partition}' has no extended partition to live in")]
    LogicalWithoutExtended { partition: String },

    #[error("Partition '{partition}' uses a block size of {block_size} B, expected {expected} B like the rest of disk '{disk}'")]
    BlockSizeMismatch {
        partition: String,
        disk: String,
        block_size: u32,
        expected: u32,
    },

    #[error("Partition '{partition}' is of type '{partition_type}', which is not supported by partition table type '{pt_type}'")]
    UnsupportedPartitionType {
        partition: String,
        partition_type: PartitionType,
        pt_type: PtType,
    },

    #[error("Disk '{disk}' has {count} primary partitions, but its partition table supports at most {max}")]
    TooManyPrimaryPartitions { disk: String, count: usize, max: u32 },

    #[error("Disk '{disk}' has {count} extended partitions, but at most one is allowed")]
    MultipleExtendedPartitions { disk: String, count: usize },

    #[error("Label '{label}' of filesystem on '{device}' is longer than the {max} characters supported by {fs_type}")]
    LabelTooLong {
        device: String,
        label: String,
        fs_type: String,
        max: usize,
    },
}

/// Partition attributes collected for the checks.
struct PartitionInfo {
    name: String,
    region: Region,
    partition_type: PartitionType,
}

impl Devicegraph {
    /// Checks the devicegraph for layouts that cannot exist on real hardware
    /// and returns all problems found. The graph is not modified.
    pub fn check(&self) -> Vec<CheckIssue> {
        let mut issues = Vec::new();

        for pt in self.all_partition_tables() {
            trace!("Checking partition table {:?}", pt);
            if let Err(e) = self.check_partition_table(pt, &mut issues) {
                // Handles were taken from this graph, so this is never
                // expected to happen.
                warn!("Failed to check partition table: {e}");
            }
        }

        for fs in self.all_filesystems() {
            if let Err(e) = self.check_filesystem(fs, &mut issues) {
                warn!("Failed to check filesystem: {e}");
            }
        }

        for issue in &issues {
            warn!("Devicegraph check: {issue}");
        }

        issues
    }

    fn check_filesystem(
        &self,
        fs: Filesystem,
        issues: &mut Vec<CheckIssue>,
    ) -> Result<(), DevicegraphError> {
        let fs_type = fs.fs_type(self)?;
        let label = fs.label(self)?;
        let max = fs_type.max_label_length();

        // The limits are on-disk sizes, so they apply to the encoded label.
        if label.len() > max {
            let device = self.node(fs.blk_device(self)?.sid())?;
            issues.push(CheckIssue::LabelTooLong {
                device: device.name().unwrap_or_default().to_string(),
                label: label.to_string(),
                fs_type: fs_type.to_string(),
                max,
            });
        }
        Ok(())
    }

    fn check_partition_table(
        &self,
        pt: PartitionTable,
        issues: &mut Vec<CheckIssue>,
    ) -> Result<(), DevicegraphError> {
        let pt_type = pt.pt_type(self)?;
        let disk = pt.disk(self)?;
        let disk_name = disk.name(self)?.to_string();
        let size_k = disk.size_k(self)?;

        let partitions = pt
            .partitions(self)?
            .into_iter()
            .map(|partition| -> Result<PartitionInfo, DevicegraphError> {
                Ok(PartitionInfo {
                    name: partition.name(self)?.to_string(),
                    region: partition.region(self)?,
                    partition_type: partition.partition_type(self)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let Some(expected_block_size) = partitions.first().map(|p| p.region.block_size()) else {
            return Ok(());
        };

        for partition in &partitions {
            if partition.region.block_size() != expected_block_size {
                issues.push(CheckIssue::BlockSizeMismatch {
                    partition: partition.name.clone(),
                    disk: disk_name.clone(),
                    block_size: partition.region.block_size(),
                    expected: expected_block_size,
                });
            }

            if !pt_type.is_partition_type_supported(partition.partition_type) {
                issues.push(CheckIssue::UnsupportedPartitionType {
                    partition: partition.name.clone(),
                    partition_type: partition.partition_type,
                    pt_type,
                });
            }

            // A disk without a known size cannot be checked against.
            if size_k > 0 {
                let disk_region = Region::new(
                    0,
                    partition.region.to_blocks(size_k),
                    partition.region.block_size(),
                )?;
                if !partition.region.inside(&disk_region)? {
                    issues.push(CheckIssue::PartitionOutsideDisk {
                        partition: partition.name.clone(),
                        region: partition.region,
                        disk: disk_name.clone(),
                        size_k,
                    });
                }
            }
        }

        let primary_count = partitions
            .iter()
            .filter(|p| p.partition_type != PartitionType::Logical)
            .count();
        if primary_count > pt_type.max_primary() as usize {
            issues.push(CheckIssue::TooManyPrimaryPartitions {
                disk: disk_name.clone(),
                count: primary_count,
                max: pt_type.max_primary(),
            });
        }

        let extended: Vec<&PartitionInfo> = partitions
            .iter()
            .filter(|p| p.partition_type == PartitionType::Extended)
            .collect();
        if extended.len() > 1 {
            issues.push(CheckIssue::MultipleExtendedPartitions {
                disk: disk_name.clone(),
                count: extended.len(),
            });
        }

        let (logical, primary): (Vec<&PartitionInfo>, Vec<&PartitionInfo>) = partitions
            .iter()
            .partition(|p| p.partition_type == PartitionType::Logical);

        for partition in &logical {
            match extended.first() {
                Some(ext) => {
                    if !same_block_size_and(&partition.region, &ext.region, Region::inside) {
                        issues.push(CheckIssue::LogicalOutsideExtended {
                            partition: partition.name.clone(),
                            extended: ext.name.clone(),
                        });
                    }
                }
                None => issues.push(CheckIssue::LogicalWithoutExtended {
                    partition: partition.name.clone(),
                }),
            }
        }

        // Logical partitions live inside the extended partition, so they are
        // only compared among themselves.
        for group in [primary, logical] {
            for (i, first) in group.iter().enumerate() {
                for second in &group[i + 1..] {
                    if same_block_size_and(&first.region, &second.region, Region::intersect) {
                        issues.push(CheckIssue::PartitionsOverlap {
                            first: first.name.clone(),
                            second: second.name.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// Applies a region predicate, treating regions with different block sizes
/// as not satisfying it. Block size mismatches are reported separately.
fn same_block_size_and(
    lhs: &Region,
    rhs: &Region,
    predicate: fn(&Region, &Region) -> Result<bool, DevicegraphError>,
) -> bool {
    predicate(lhs, rhs).unwrap_or(false)
}
