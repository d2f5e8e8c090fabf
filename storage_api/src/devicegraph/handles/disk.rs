use log::debug;
use sysdefs::{disks::Transport, filesystems::FsType, partitions::PtType};

use crate::{
    devicegraph::{
        graph::Devicegraph,
        holders::Holder,
        node::{DeviceData, DiskData},
        types::{DeviceKind, Sid},
    },
    error::DevicegraphError,
};

use super::{DeviceHandle, Filesystem, PartitionTable};

/// Handle to a disk.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Disk(pub(super) Sid);

impl Disk {
    fn data<'a>(&self, graph: &'a Devicegraph) -> Result<&'a DiskData, DevicegraphError> {
        graph.node(self.0)?.as_disk()
    }

    fn data_mut<'a>(
        &self,
        graph: &'a mut Devicegraph,
    ) -> Result<&'a mut DiskData, DevicegraphError> {
        graph.node_mut(self.0)?.as_disk_mut()
    }

    /// Returns the device name of the disk, e.g. `/dev/sda`.
    pub fn name<'a>(&self, graph: &'a Devicegraph) -> Result<&'a str, DevicegraphError> {
        Ok(&self.data(graph)?.name)
    }

    /// Returns the size of the disk in KiB.
    pub fn size_k(&self, graph: &Devicegraph) -> Result<u64, DevicegraphError> {
        Ok(self.data(graph)?.size_k)
    }

    /// Sets the size of the disk in KiB.
    ///
    /// Partitions on the disk are neither resized nor validated.
    pub fn set_size_k(&self, graph: &mut Devicegraph, size_k: u64) -> Result<(), DevicegraphError> {
        self.data_mut(graph)?.size_k = size_k;
        Ok(())
    }

    pub fn rotational(&self, graph: &Devicegraph) -> Result<bool, DevicegraphError> {
        Ok(self.data(graph)?.rotational)
    }

    pub fn set_rotational(
        &self,
        graph: &mut Devicegraph,
        rotational: bool,
    ) -> Result<(), DevicegraphError> {
        self.data_mut(graph)?.rotational = rotational;
        Ok(())
    }

    pub fn transport(&self, graph: &Devicegraph) -> Result<Transport, DevicegraphError> {
        Ok(self.data(graph)?.transport)
    }

    pub fn set_transport(
        &self,
        graph: &mut Devicegraph,
        transport: Transport,
    ) -> Result<(), DevicegraphError> {
        self.data_mut(graph)?.transport = transport;
        Ok(())
    }

    /// Creates a partition table of the given type on the disk.
    ///
    /// A disk holds at most one partition table, and cannot hold one while it
    /// is directly formatted with a filesystem.
    pub fn create_partition_table(
        &self,
        graph: &mut Devicegraph,
        pt_type: PtType,
    ) -> Result<PartitionTable, DevicegraphError> {
        self.data(graph)?;
        let sid = graph.add_child(
            self.0,
            DeviceData::new_partition_table(pt_type),
            Holder::User,
        )?;
        Ok(PartitionTable::new(sid))
    }

    /// Returns the partition table on the disk, if any.
    pub fn partition_table(
        &self,
        graph: &Devicegraph,
    ) -> Result<Option<PartitionTable>, DevicegraphError> {
        self.data(graph)?;
        Ok(graph
            .children(*self)?
            .into_iter()
            .find(|child| graph.kind(*child).ok() == Some(DeviceKind::PartitionTable))
            .map(|child| PartitionTable::new(child.sid())))
    }

    /// Formats the whole disk with a filesystem of the given type.
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
        debug!("Formatted disk {} with {}", self.0, fs_type);
        Ok(Filesystem::new(sid))
    }

    /// Returns the filesystem directly on the disk, if any.
    pub fn filesystem(&self, graph: &Devicegraph) -> Result<Option<Filesystem>, DevicegraphError> {
        self.data(graph)?;
        Ok(graph
            .children(*self)?
            .into_iter()
            .find(|child| graph.kind(*child).ok() == Some(DeviceKind::Filesystem))
            .map(|child| Filesystem::new(child.sid())))
    }
}
