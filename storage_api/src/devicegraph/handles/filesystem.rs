use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use sysdefs::filesystems::FsType;
use uuid::Uuid;

use crate::{
    devicegraph::{graph::Devicegraph, node::FilesystemData, types::Sid},
    error::DevicegraphError,
};

use super::Device;

/// Handle to a filesystem.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Filesystem(pub(super) Sid);

impl Filesystem {
    fn data<'a>(&self, graph: &'a Devicegraph) -> Result<&'a FilesystemData, DevicegraphError> {
        graph.node(self.0)?.as_filesystem()
    }

    fn data_mut<'a>(
        &self,
        graph: &'a mut Devicegraph,
    ) -> Result<&'a mut FilesystemData, DevicegraphError> {
        graph.node_mut(self.0)?.as_filesystem_mut()
    }

    /// Returns the type of the filesystem. The type is fixed at creation.
    pub fn fs_type(&self, graph: &Devicegraph) -> Result<FsType, DevicegraphError> {
        Ok(self.data(graph)?.fs_type)
    }

    pub fn label<'a>(&self, graph: &'a Devicegraph) -> Result<&'a str, DevicegraphError> {
        Ok(&self.data(graph)?.label)
    }

    /// Sets the label. Any string is accepted, including the empty string.
    pub fn set_label(
        &self,
        graph: &mut Devicegraph,
        label: impl Into<String>,
    ) -> Result<(), DevicegraphError> {
        self.data_mut(graph)?.label = label.into();
        Ok(())
    }

    /// Returns the consumer defined metadata of the filesystem.
    pub fn userdata<'a>(
        &self,
        graph: &'a Devicegraph,
    ) -> Result<&'a BTreeMap<String, String>, DevicegraphError> {
        Ok(&self.data(graph)?.userdata)
    }

    /// Replaces the whole userdata map. Keys are not merged with the
    /// previous map.
    pub fn set_userdata(
        &self,
        graph: &mut Devicegraph,
        userdata: BTreeMap<String, String>,
    ) -> Result<(), DevicegraphError> {
        self.data_mut(graph)?.userdata = userdata;
        Ok(())
    }

    pub fn uuid(&self, graph: &Devicegraph) -> Result<Option<Uuid>, DevicegraphError> {
        Ok(self.data(graph)?.uuid)
    }

    pub fn set_uuid(&self, graph: &mut Devicegraph, uuid: Option<Uuid>) -> Result<(), DevicegraphError> {
        self.data_mut(graph)?.uuid = uuid;
        Ok(())
    }

    pub fn mount_point<'a>(
        &self,
        graph: &'a Devicegraph,
    ) -> Result<Option<&'a Path>, DevicegraphError> {
        Ok(self.data(graph)?.mount_point.as_deref())
    }

    pub fn set_mount_point(
        &self,
        graph: &mut Devicegraph,
        mount_point: Option<PathBuf>,
    ) -> Result<(), DevicegraphError> {
        self.data_mut(graph)?.mount_point = mount_point;
        Ok(())
    }

    /// Returns the block device (disk or partition) the filesystem is on.
    pub fn blk_device(&self, graph: &Devicegraph) -> Result<Device, DevicegraphError> {
        self.data(graph)?;
        graph.parent(*self)?.ok_or_else(|| {
            DevicegraphError::NotFound(format!("block device of sid {}", self.0))
        })
    }
}
