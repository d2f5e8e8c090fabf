use log::debug;
use sysdefs::partitions::{PartitionType, PtType};

use crate::{
    devicegraph::{
        graph::Devicegraph,
        holders::Holder,
        node::{DeviceData, PartitionTableData},
        types::Sid,
    },
    error::DevicegraphError,
    primitives::region::Region,
};

use super::{DeviceHandle, Disk, Partition};

/// Handle to a partition table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionTable(pub(super) Sid);

impl PartitionTable {
    fn data<'a>(&self, graph: &'a Devicegraph) -> Result<&'a PartitionTableData, DevicegraphError> {
        graph.node(self.0)?.as_partition_table()
    }

    pub fn pt_type(&self, graph: &Devicegraph) -> Result<PtType, DevicegraphError> {
        Ok(self.data(graph)?.pt_type)
    }

    /// Returns the disk the partition table is on.
    pub fn disk(&self, graph: &Devicegraph) -> Result<Disk, DevicegraphError> {
        self.data(graph)?;
        graph
            .parent(*self)?
            .ok_or_else(|| DevicegraphError::NotFound(format!("disk of sid {}", self.0)))?
            .to_disk(graph)
    }

    /// Creates a partition in the partition table.
    ///
    /// The name, region and type are stored as given. Overlaps, capacity and
    /// partition type support are not checked here; see
    /// `Devicegraph::check()`.
    pub fn create_partition(
        &self,
        graph: &mut Devicegraph,
        name: impl Into<String>,
        region: Region,
        partition_type: PartitionType,
    ) -> Result<Partition, DevicegraphError> {
        self.data(graph)?;
        let sid = graph.add_child(
            self.0,
            DeviceData::new_partition(name, region, partition_type),
            Holder::Subdevice,
        )?;
        Ok(Partition::new(sid))
    }

    /// Returns the partitions of the table ordered by partition number.
    /// Partitions without a number come last.
    pub fn partitions(&self, graph: &Devicegraph) -> Result<Vec<Partition>, DevicegraphError> {
        self.data(graph)?;
        let mut keyed = Vec::new();
        for child in graph.children(*self)? {
            let partition = child.to_partition(graph)?;
            keyed.push((partition.number(graph)?.unwrap_or(u32::MAX), partition));
        }
        keyed.sort_by_key(|(number, partition)| (*number, partition.sid()));
        Ok(keyed.into_iter().map(|(_, partition)| partition).collect())
    }

    /// Returns the partition with the given device name.
    pub fn partition_by_name(
        &self,
        graph: &Devicegraph,
        name: &str,
    ) -> Result<Partition, DevicegraphError> {
        for partition in self.partitions(graph)? {
            if partition.name(graph)? == name {
                return Ok(partition);
            }
        }
        Err(DevicegraphError::NotFound(format!("partition name '{name}'")))
    }

    /// Deletes the partition with the given device name together with
    /// everything on it. Returns the number of removed devices.
    pub fn delete_partition(
        &self,
        graph: &mut Devicegraph,
        name: &str,
    ) -> Result<usize, DevicegraphError> {
        let partition = self.partition_by_name(graph, name)?;
        debug!("Deleting partition '{name}'");
        graph.remove_device(partition)
    }

    fn count_of_types(
        &self,
        graph: &Devicegraph,
        types: &[PartitionType],
    ) -> Result<usize, DevicegraphError> {
        let mut count = 0;
        for partition in self.partitions(graph)? {
            if types.contains(&partition.partition_type(graph)?) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Returns the number of primary partitions. The extended partition
    /// counts as a primary partition.
    pub fn num_primary(&self, graph: &Devicegraph) -> Result<usize, DevicegraphError> {
        self.count_of_types(graph, &[PartitionType::Primary, PartitionType::Extended])
    }

    pub fn num_logical(&self, graph: &Devicegraph) -> Result<usize, DevicegraphError> {
        self.count_of_types(graph, &[PartitionType::Logical])
    }

    pub fn has_extended(&self, graph: &Devicegraph) -> Result<bool, DevicegraphError> {
        Ok(self.extended(graph)?.is_some())
    }

    /// Returns the extended partition, if any.
    pub fn extended(&self, graph: &Devicegraph) -> Result<Option<Partition>, DevicegraphError> {
        for partition in self.partitions(graph)? {
            if partition.partition_type(graph)? == PartitionType::Extended {
                return Ok(Some(partition));
            }
        }
        Ok(None)
    }

    pub fn max_primary(&self, graph: &Devicegraph) -> Result<u32, DevicegraphError> {
        Ok(self.pt_type(graph)?.max_primary())
    }

    pub fn extended_possible(&self, graph: &Devicegraph) -> Result<bool, DevicegraphError> {
        Ok(self.pt_type(graph)?.extended_possible())
    }

    pub fn max_logical(&self, graph: &Devicegraph) -> Result<u32, DevicegraphError> {
        Ok(self.pt_type(graph)?.max_logical())
    }

    pub fn is_partition_type_supported(
        &self,
        graph: &Devicegraph,
        partition_type: PartitionType,
    ) -> Result<bool, DevicegraphError> {
        Ok(self
            .pt_type(graph)?
            .is_partition_type_supported(partition_type))
    }
}
