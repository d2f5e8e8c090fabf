use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};
use petgraph::{
    csr::DefaultIx,
    stable_graph::{NodeIndex as PetgraphNodeIndex, StableGraph},
    visit::{Dfs, EdgeRef, IntoEdgeReferences, Walker},
    Directed, Direction,
};

use crate::error::DevicegraphError;

use super::{
    handles::{Device, DeviceHandle, Disk, Filesystem, Partition, PartitionTable},
    holders::Holder,
    node::{DeviceData, DeviceNode},
    types::{DeviceKind, Sid},
};

/// The type of the node index used in the Devicegraph.
pub(super) type NodeIndex = PetgraphNodeIndex<DefaultIx>;

/// The type of the graph used to store devices and their holders.
///
/// A stable graph keeps the indices of the remaining nodes valid when a node
/// is removed.
pub(super) type DevicePetgraph = StableGraph<DeviceNode, Holder, Directed, DefaultIx>;

/// An in-memory model of a storage configuration.
///
/// The devicegraph owns all devices. Devices are created through the factory
/// operations on the graph and the typed handles, and are addressed through
/// `Copy` handles that are validated against the graph on every access.
#[derive(Debug, Clone, Default)]
pub struct Devicegraph {
    pub(super) inner: DevicePetgraph,
    index: BTreeMap<Sid, NodeIndex>,
    removed: BTreeSet<Sid>,
}

impl Devicegraph {
    /// Creates an empty devicegraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node index of the device with the given sid.
    pub(super) fn lookup(&self, sid: Sid) -> Result<NodeIndex, DevicegraphError> {
        if let Some(idx) = self.index.get(&sid) {
            return Ok(*idx);
        }

        if self.removed.contains(&sid) {
            Err(DevicegraphError::StaleHandle { sid })
        } else {
            Err(DevicegraphError::NotFound(format!("sid {sid}")))
        }
    }

    pub(super) fn node(&self, sid: Sid) -> Result<&DeviceNode, DevicegraphError> {
        let idx = self.lookup(sid)?;
        Ok(&self.inner[idx])
    }

    pub(super) fn node_mut(&mut self, sid: Sid) -> Result<&mut DeviceNode, DevicegraphError> {
        let idx = self.lookup(sid)?;
        Ok(&mut self.inner[idx])
    }

    fn insert_node(&mut self, data: DeviceData) -> (Sid, NodeIndex) {
        let node = DeviceNode::new(data);
        let sid = node.sid;
        debug!("Creating {} with sid {}", node.describe(), sid);
        let idx = self.inner.add_node(node);
        self.index.insert(sid, idx);
        (sid, idx)
    }

    /// Returns an error when the device at `parent_idx` cannot hold one more
    /// child of kind `child`.
    fn check_room_for(
        &self,
        parent_idx: NodeIndex,
        child: DeviceKind,
    ) -> Result<(), DevicegraphError> {
        let parent = &self.inner[parent_idx];
        debug_assert!(parent.kind().compatible_children().contains(child.as_flag()));

        let children: Vec<NodeIndex> = self
            .inner
            .neighbors_directed(parent_idx, Direction::Outgoing)
            .collect();
        if parent
            .kind()
            .valid_child_count()
            .has_room_for_one_more(children.len())
        {
            return Ok(());
        }

        let name = parent.name().unwrap_or_default().to_string();
        let existing = children
            .first()
            .map(|idx| self.inner[*idx].kind())
            .unwrap_or(child);
        Err(match (existing, child) {
            (DeviceKind::PartitionTable, DeviceKind::PartitionTable) => {
                DevicegraphError::DuplicatePartitionTable { name }
            }
            (DeviceKind::Filesystem, DeviceKind::Filesystem) => {
                DevicegraphError::DuplicateFilesystem { name }
            }
            (user, _) => DevicegraphError::DeviceInUse { name, user },
        })
    }

    /// Creates a new device held by `parent`.
    ///
    /// Nothing is inserted unless both the node and its holder edge can be
    /// added.
    pub(super) fn add_child(
        &mut self,
        parent: Sid,
        data: DeviceData,
        holder: Holder,
    ) -> Result<Sid, DevicegraphError> {
        let parent_idx = self.lookup(parent)?;
        self.check_room_for(parent_idx, data.kind())?;

        let (sid, idx) = self.insert_node(data);
        trace!("Adding {holder} holder from {parent} to {sid}");
        self.inner.add_edge(parent_idx, idx, holder);
        Ok(sid)
    }

    /// Creates a new disk with the given device name and a size of zero.
    ///
    /// Disk names are not required to be unique.
    pub fn create_disk(&mut self, name: impl Into<String>) -> Disk {
        let (sid, _) = self.insert_node(DeviceData::new_disk(name));
        Disk::new(sid)
    }

    /// Returns the number of devices of every kind in the graph.
    pub fn num_devices(&self) -> usize {
        self.inner.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.num_devices() == 0
    }

    /// Removes the given nodes and marks their sids as removed.
    fn remove_nodes(&mut self, nodes: Vec<NodeIndex>) -> usize {
        let count = nodes.len();
        for idx in nodes {
            if let Some(node) = self.inner.remove_node(idx) {
                debug!("Removed {} with sid {}", node.describe(), node.sid);
                self.index.remove(&node.sid);
                self.removed.insert(node.sid);
            }
        }
        count
    }

    /// Returns the node indices of the device and all of its descendants,
    /// starting with the device itself.
    fn subtree(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        Dfs::new(&self.inner, idx).iter(&self.inner).collect()
    }

    /// Removes a device together with everything it holds, transitively.
    ///
    /// Returns the number of removed devices. Handles to any removed device
    /// fail with `StaleHandle` afterwards.
    pub fn remove_device(&mut self, device: impl DeviceHandle) -> Result<usize, DevicegraphError> {
        let idx = self.lookup(device.sid())?;
        let nodes = self.subtree(idx);
        Ok(self.remove_nodes(nodes))
    }

    /// Removes everything the device holds, transitively, but keeps the
    /// device itself.
    pub fn remove_descendants(
        &mut self,
        device: impl DeviceHandle,
    ) -> Result<usize, DevicegraphError> {
        let idx = self.lookup(device.sid())?;
        let nodes = self.subtree(idx).into_iter().skip(1).collect();
        Ok(self.remove_nodes(nodes))
    }

    /// Returns an untyped handle to the device with the given sid.
    pub fn find_device(&self, sid: Sid) -> Result<Device, DevicegraphError> {
        self.lookup(sid).map(|_| Device::new(sid))
    }

    /// Returns the block device (disk or partition) with the given device
    /// name. When several block devices share the name, the one with the
    /// lowest sid is returned.
    pub fn find_by_name(&self, name: &str) -> Result<Device, DevicegraphError> {
        self.index
            .iter()
            .map(|(sid, idx)| (*sid, &self.inner[*idx]))
            .find(|(_, node)| node.kind().is_blk_device() && node.name() == Some(name))
            .map(|(sid, _)| Device::new(sid))
            .ok_or_else(|| DevicegraphError::NotFound(format!("device name '{name}'")))
    }

    /// Returns handles to all devices, ordered by sid.
    pub fn devices(&self) -> Vec<Device> {
        self.index.keys().copied().map(Device::new).collect()
    }

    /// Returns all holders as `(parent, child, holder)` triples, ordered by
    /// parent and then child sid.
    pub fn holders(&self) -> Vec<(Device, Device, Holder)> {
        let mut holders: Vec<_> = self
            .inner
            .edge_references()
            .map(|edge| {
                (
                    Device::new(self.inner[edge.source()].sid),
                    Device::new(self.inner[edge.target()].sid),
                    *edge.weight(),
                )
            })
            .collect();
        holders.sort_by_key(|(parent, child, _)| (parent.sid(), child.sid()));
        holders
    }

    /// Returns the sids of all devices of the given kind, ordered by sid.
    fn sids_of_kind(&self, kind: DeviceKind) -> impl Iterator<Item = Sid> + '_ {
        self.index
            .iter()
            .filter(move |(_, idx)| self.inner[**idx].kind() == kind)
            .map(|(sid, _)| *sid)
    }

    pub fn all_disks(&self) -> Vec<Disk> {
        self.sids_of_kind(DeviceKind::Disk).map(Disk::new).collect()
    }

    pub fn all_partition_tables(&self) -> Vec<PartitionTable> {
        self.sids_of_kind(DeviceKind::PartitionTable)
            .map(PartitionTable::new)
            .collect()
    }

    pub fn all_partitions(&self) -> Vec<Partition> {
        self.sids_of_kind(DeviceKind::Partition)
            .map(Partition::new)
            .collect()
    }

    pub fn all_filesystems(&self) -> Vec<Filesystem> {
        self.sids_of_kind(DeviceKind::Filesystem)
            .map(Filesystem::new)
            .collect()
    }

    /// Returns the devices directly held by the given device, ordered by sid.
    pub fn children(&self, device: impl DeviceHandle) -> Result<Vec<Device>, DevicegraphError> {
        let idx = self.lookup(device.sid())?;
        let mut children: Vec<_> = self
            .inner
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|child| Device::new(self.inner[child].sid))
            .collect();
        children.sort_by_key(|child| child.sid());
        Ok(children)
    }

    /// Returns the device holding the given device, if any.
    pub fn parent(&self, device: impl DeviceHandle) -> Result<Option<Device>, DevicegraphError> {
        let idx = self.lookup(device.sid())?;
        Ok(self
            .inner
            .neighbors_directed(idx, Direction::Incoming)
            .next()
            .map(|parent| Device::new(self.inner[parent].sid)))
    }

    /// Returns all devices held by the given device, transitively, in
    /// depth-first order.
    pub fn descendants(&self, device: impl DeviceHandle) -> Result<Vec<Device>, DevicegraphError> {
        let idx = self.lookup(device.sid())?;
        Ok(self
            .subtree(idx)
            .into_iter()
            .skip(1)
            .map(|node| Device::new(self.inner[node].sid))
            .collect())
    }

    pub fn kind(&self, device: impl DeviceHandle) -> Result<DeviceKind, DevicegraphError> {
        Ok(self.node(device.sid())?.kind())
    }

    /// Returns a user friendly description of the device suitable for
    /// logging, including the device holding it.
    ///
    /// Output examples:
    ///
    /// - `disk '/dev/sda'`
    /// - `gpt partition table on disk '/dev/sda'`
    /// - `ext4 filesystem on partition '/dev/sda1'`
    pub fn describe(&self, device: impl DeviceHandle) -> Result<String, DevicegraphError> {
        let idx = self.lookup(device.sid())?;
        let node = &self.inner[idx];
        let description = match self.inner.neighbors_directed(idx, Direction::Incoming).next() {
            Some(parent) if node.name().is_none() => {
                format!("{} on {}", node.describe(), self.inner[parent].describe())
            }
            _ => node.describe(),
        };
        Ok(description)
    }
}
