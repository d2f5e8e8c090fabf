use lazy_static::lazy_static;
use regex::Regex;
use sysdefs::{
    filesystems::FsType,
    partitions::{PartitionId, PartitionType},
};

use crate::{
    devicegraph::{
        graph::Devicegraph,
        holders::Holder,
        node::{DeviceData, PartitionData},
        types::Sid,
    },
    error::DevicegraphError,
    primitives::region::Region,
};

use super::{Filesystem, PartitionTable};

lazy_static! {
    /// Trailing digits of a partition device name.
    static ref PARTITION_NUMBER: Regex = Regex::new(r"(\d+)$").unwrap();
}

/// Handle to a partition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Partition(pub(super) Sid);

impl Partition {
    fn data<'a>(&self, graph: &'a Devicegraph) -> Result<&'a PartitionData, DevicegraphError> {
        graph.node(self.0)?.as_partition()
    }

    fn data_mut<'a>(
        &self,
        graph: &'a mut Devicegraph,
    ) -> Result<&'a mut PartitionData, DevicegraphError> {
        graph.node_mut(self.0)?.as_partition_mut()
    }

    /// Returns the device name of the partition, e.g. `/dev/sda1`.
    pub fn name<'a>(&self, graph: &'a Devicegraph) -> Result<&'a str, DevicegraphError> {
        Ok(&self.data(graph)?.name)
    }

    /// Returns the partition number parsed from the trailing digits of the
    /// device name, e.g. 2 for `/dev/nvme0n1p2`.
    pub fn number(&self, graph: &Devicegraph) -> Result<Option<u32>, DevicegraphError> {
        Ok(PARTITION_NUMBER
            .captures(self.name(graph)?)
            .and_then(|caps| caps[1].parse().ok()))
    }

    pub fn region(&self, graph: &Devicegraph) -> Result<Region, DevicegraphError> {
        Ok(self.data(graph)?.region)
    }

    /// Replaces the region of the partition.
    ///
    /// The region is not checked against the partition table or the disk.
    pub fn set_region(&self, graph: &mut Devicegraph, region: Region) -> Result<(), DevicegraphError> {
        self.data_mut(graph)?.region = region;
        Ok(())
    }

    pub fn partition_type(&self, graph: &Devicegraph) -> Result<PartitionType, DevicegraphError> {
        Ok(self.data(graph)?.partition_type)
    }

    pub fn set_partition_type(
        &self,
        graph: &mut Devicegraph,
        partition_type: PartitionType,
    ) -> Result<(), DevicegraphError> {
        self.data_mut(graph)?.partition_type = partition_type;
        Ok(())
    }

    pub fn id(&self, graph: &Devicegraph) -> Result<PartitionId, DevicegraphError> {
        Ok(self.data(graph)?.id)
    }

    pub fn set_id(&self, graph: &mut Devicegraph, id: PartitionId) -> Result<(), DevicegraphError> {
        self.data_mut(graph)?.id = id;
        Ok(())
    }

    pub fn boot(&self, graph: &Devicegraph) -> Result<bool, DevicegraphError> {
        Ok(self.data(graph)?.boot)
    }

    pub fn set_boot(&self, graph: &mut Devicegraph, boot: bool) -> Result<(), DevicegraphError> {
        self.data_mut(graph)?.boot = boot;
        Ok(())
    }

    /// Returns the partition table holding the partition.
    pub fn partition_table(&self, graph: &Devicegraph) -> Result<PartitionTable, DevicegraphError> {
        self.data(graph)?;
        graph
            .parent(*self)?
            .ok_or_else(|| {
                DevicegraphError::NotFound(format!("partition table of sid {}", self.0))
            })?
            .to_partition_table(graph)
    }

    /// Formats the partition with a filesystem of the given type.
    ///
    /// A partition holds at most one filesystem.
    pub fn create_filesystem(
        &self,
        graph: &mut Devicegraph,
        fs_type: FsType,
    ) -> Result<Filesystem, DevicegraphError> {
        self.data(graph)?;
        let sid = graph.add_child(
            self.0,
            DeviceData::new_filesystem(fs_type),
            Holder::FilesystemUser,
        )?;
        Ok(Filesystem::new(sid))
    }

    /// Returns the filesystem on the partition, if any.
    pub fn filesystem(&self, graph: &Devicegraph) -> Result<Option<Filesystem>, DevicegraphError> {
        self.data(graph)?;
        match graph.children(*self)?.first() {
            Some(child) => Ok(Some(child.to_filesystem(graph)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use sysdefs::partitions::PtType;

    use super::*;

    fn partition(name: &str) -> (Devicegraph, PartitionTable, Partition) {
        let mut graph = Devicegraph::new();
        let disk = graph.create_disk("/dev/sda");
        let pt = disk.create_partition_table(&mut graph, PtType::Gpt).unwrap();
        let part = pt
            .create_partition(
                &mut graph,
                name,
                Region::new(2048, 2048, 512).unwrap(),
                PartitionType::Primary,
            )
            .unwrap();
        (graph, pt, part)
    }

    #[test]
    fn test_set_region() {
        let (mut graph, _, part) = partition("/dev/sda1");
        part.set_region(&mut graph, Region::new(1, 2, 512).unwrap())
            .unwrap();

        let region = part.region(&graph).unwrap();
        assert_eq!(region.start(), 1);
        assert_eq!(region.length(), 2);
        assert_eq!(region.block_size(), 512);
        assert_eq!(region, Region::new(1, 2, 512).unwrap());
    }

    #[test]
    fn test_number() {
        for (name, number) in [
            ("/dev/sda3", Some(3)),
            ("/dev/nvme0n1p2", Some(2)),
            ("/dev/mmcblk0p12", Some(12)),
            ("/dev/disk/by-label/root", None),
        ] {
            let (graph, _, part) = partition(name);
            assert_eq!(part.number(&graph).unwrap(), number, "name: {name}");
        }
    }

    #[test]
    fn test_attributes() {
        let (mut graph, pt, part) = partition("/dev/sda1");
        assert_eq!(part.name(&graph).unwrap(), "/dev/sda1");
        assert_eq!(part.partition_table(&graph).unwrap(), pt);
        assert_eq!(part.id(&graph).unwrap(), PartitionId::Linux);
        assert!(!part.boot(&graph).unwrap());

        part.set_id(&mut graph, PartitionId::Esp).unwrap();
        part.set_boot(&mut graph, true).unwrap();
        part.set_partition_type(&mut graph, PartitionType::Logical)
            .unwrap();
        assert_eq!(part.id(&graph).unwrap(), PartitionId::Esp);
        assert!(part.boot(&graph).unwrap());
        assert_eq!(
            part.partition_type(&graph).unwrap(),
            PartitionType::Logical
        );
    }

    #[test]
    fn test_create_filesystem() {
        let (mut graph, _, part) = partition("/dev/sda1");
        assert_eq!(part.filesystem(&graph).unwrap(), None);

        let fs = part.create_filesystem(&mut graph, FsType::Ext4).unwrap();
        assert_eq!(part.filesystem(&graph).unwrap(), Some(fs));
        assert_eq!(fs.fs_type(&graph).unwrap(), FsType::Ext4);

        assert_eq!(
            part.create_filesystem(&mut graph, FsType::Swap).unwrap_err(),
            DevicegraphError::DuplicateFilesystem {
                name: "/dev/sda1".into()
            }
        );
        assert_eq!(graph.num_devices(), 4);
    }
}
