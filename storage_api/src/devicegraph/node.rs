use std::{collections::BTreeMap, path::PathBuf};

use sysdefs::{
    disks::Transport,
    filesystems::FsType,
    partitions::{PartitionId, PartitionType, PtType},
};
use uuid::Uuid;

use crate::{error::DevicegraphError, primitives::region::Region};

use super::types::{DeviceKind, Sid};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskData {
    pub name: String,
    pub size_k: u64,
    pub rotational: bool,
    pub transport: Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTableData {
    pub pt_type: PtType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionData {
    pub name: String,
    pub region: Region,
    pub partition_type: PartitionType,
    pub id: PartitionId,
    pub boot: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemData {
    pub fs_type: FsType,
    pub label: String,
    pub userdata: BTreeMap<String, String>,
    pub uuid: Option<Uuid>,
    pub mount_point: Option<PathBuf>,
}

/// Variant specific attributes of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceData {
    Disk(DiskData),
    PartitionTable(PartitionTableData),
    Partition(PartitionData),
    Filesystem(FilesystemData),
}

impl DeviceData {
    pub fn new_disk(name: impl Into<String>) -> Self {
        Self::Disk(DiskData {
            name: name.into(),
            size_k: 0,
            rotational: false,
            transport: Transport::default(),
        })
    }

    pub fn new_partition_table(pt_type: PtType) -> Self {
        Self::PartitionTable(PartitionTableData { pt_type })
    }

    pub fn new_partition(
        name: impl Into<String>,
        region: Region,
        partition_type: PartitionType,
    ) -> Self {
        Self::Partition(PartitionData {
            name: name.into(),
            region,
            partition_type,
            id: PartitionId::default(),
            boot: false,
        })
    }

    pub fn new_filesystem(fs_type: FsType) -> Self {
        Self::Filesystem(FilesystemData {
            fs_type,
            label: String::new(),
            userdata: BTreeMap::new(),
            uuid: None,
            mount_point: None,
        })
    }

    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Disk(_) => DeviceKind::Disk,
            Self::PartitionTable(_) => DeviceKind::PartitionTable,
            Self::Partition(_) => DeviceKind::Partition,
            Self::Filesystem(_) => DeviceKind::Filesystem,
        }
    }
}

/// A device stored in the devicegraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNode {
    pub sid: Sid,
    pub data: DeviceData,
}

impl DeviceNode {
    /// Creates a new node with a freshly allocated storage id.
    pub fn new(data: DeviceData) -> Self {
        Self {
            sid: Sid::next(),
            data,
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.data.kind()
    }

    /// Returns the device name for block devices.
    pub fn name(&self) -> Option<&str> {
        match &self.data {
            DeviceData::Disk(disk) => Some(&disk.name),
            DeviceData::Partition(part) => Some(&part.name),
            DeviceData::PartitionTable(_) | DeviceData::Filesystem(_) => None,
        }
    }

    /// Returns a user friendly description of the node suitable for logging.
    ///
    /// Output examples:
    ///
    /// - `disk '/dev/sda'`
    /// - `gpt partition table`
    /// - `partition '/dev/sda1'`
    /// - `ext4 filesystem`
    pub fn describe(&self) -> String {
        match &self.data {
            DeviceData::Disk(disk) => format!("disk '{}'", disk.name),
            DeviceData::PartitionTable(pt) => format!("{} partition table", pt.pt_type),
            DeviceData::Partition(part) => format!("partition '{}'", part.name),
            DeviceData::Filesystem(fs) => format!("{} filesystem", fs.fs_type),
        }
    }

    fn wrong_type(&self, expected: DeviceKind) -> DevicegraphError {
        DevicegraphError::WrongDeviceType {
            sid: self.sid,
            expected,
            actual: self.kind(),
        }
    }

    pub fn as_disk(&self) -> Result<&DiskData, DevicegraphError> {
        match &self.data {
            DeviceData::Disk(disk) => Ok(disk),
            _ => Err(self.wrong_type(DeviceKind::Disk)),
        }
    }

    pub fn as_disk_mut(&mut self) -> Result<&mut DiskData, DevicegraphError> {
        match self.data {
            DeviceData::Disk(ref mut disk) => Ok(disk),
            _ => Err(self.wrong_type(DeviceKind::Disk)),
        }
    }

    pub fn as_partition_table(&self) -> Result<&PartitionTableData, DevicegraphError> {
        match &self.data {
            DeviceData::PartitionTable(pt) => Ok(pt),
            _ => Err(self.wrong_type(DeviceKind::PartitionTable)),
        }
    }

    pub fn as_partition(&self) -> Result<&PartitionData, DevicegraphError> {
        match &self.data {
            DeviceData::Partition(part) => Ok(part),
            _ => Err(self.wrong_type(DeviceKind::Partition)),
        }
    }

    pub fn as_partition_mut(&mut self) -> Result<&mut PartitionData, DevicegraphError> {
        match self.data {
            DeviceData::Partition(ref mut part) => Ok(part),
            _ => Err(self.wrong_type(DeviceKind::Partition)),
        }
    }

    pub fn as_filesystem(&self) -> Result<&FilesystemData, DevicegraphError> {
        match &self.data {
            DeviceData::Filesystem(fs) => Ok(fs),
            _ => Err(self.wrong_type(DeviceKind::Filesystem)),
        }
    }

    pub fn as_filesystem_mut(&mut self) -> Result<&mut FilesystemData, DevicegraphError> {
        match self.data {
            DeviceData::Filesystem(ref mut fs) => Ok(fs),
            _ => Err(self.wrong_type(DeviceKind::Filesystem)),
        }
    }
}
