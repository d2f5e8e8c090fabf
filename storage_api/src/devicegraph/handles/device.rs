use crate::{
    devicegraph::{
        graph::Devicegraph,
        types::{DeviceKind, Sid},
    },
    error::DevicegraphError,
};

use super::{DeviceHandle, Disk, Filesystem, Partition, PartitionTable};

/// Handle to a device of any kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Device(Sid);

impl Device {
    pub(crate) fn new(sid: Sid) -> Self {
        Self(sid)
    }

    /// Returns the kind of the device.
    pub fn kind(&self, graph: &Devicegraph) -> Result<DeviceKind, DevicegraphError> {
        graph.kind(*self)
    }

    /// Returns an error unless the device is of the expected kind.
    fn ensure_kind(&self, graph: &Devicegraph, expected: DeviceKind) -> Result<(), DevicegraphError> {
        let actual = graph.kind(*self)?;
        if actual != expected {
            return Err(DevicegraphError::WrongDeviceType {
                sid: self.0,
                expected,
                actual,
            });
        }
        Ok(())
    }

    pub fn to_disk(&self, graph: &Devicegraph) -> Result<Disk, DevicegraphError> {
        self.ensure_kind(graph, DeviceKind::Disk)?;
        Ok(Disk::new(self.0))
    }

    pub fn to_partition_table(
        &self,
        graph: &Devicegraph,
    ) -> Result<PartitionTable, DevicegraphError> {
        self.ensure_kind(graph, DeviceKind::PartitionTable)?;
        Ok(PartitionTable::new(self.0))
    }

    pub fn to_partition(&self, graph: &Devicegraph) -> Result<Partition, DevicegraphError> {
        self.ensure_kind(graph, DeviceKind::Partition)?;
        Ok(Partition::new(self.0))
    }

    pub fn to_filesystem(&self, graph: &Devicegraph) -> Result<Filesystem, DevicegraphError> {
        self.ensure_kind(graph, DeviceKind::Filesystem)?;
        Ok(Filesystem::new(self.0))
    }
}

impl DeviceHandle for Device {
    fn sid(&self) -> Sid {
        self.0
    }
}
