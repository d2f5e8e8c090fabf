//! Conversions from layout configuration into a devicegraph.

use log::{debug, trace};

use crate::{
    config::{DiskLayout, FilesystemLayout, Layout},
    error::DevicegraphError,
    primitives::region::Region,
};

use super::{
    graph::Devicegraph,
    handles::{Disk, Filesystem},
};

/// Build a Devicegraph from a Layout.
///
/// Either the whole layout is built or an error is returned; a partially
/// built graph is never handed out.
impl TryFrom<&Layout> for Devicegraph {
    type Error = DevicegraphError;

    fn try_from(layout: &Layout) -> Result<Self, Self::Error> {
        debug!("Building devicegraph from layout with {} disks", layout.disks.len());
        let mut graph = Devicegraph::new();
        for disk in &layout.disks {
            add_disk(&mut graph, disk)?;
        }
        trace!("Built devicegraph:\n{graph}");
        Ok(graph)
    }
}

fn add_disk(graph: &mut Devicegraph, layout: &DiskLayout) -> Result<Disk, DevicegraphError> {
    let disk = graph.create_disk(layout.name.clone());
    disk.set_size_k(graph, layout.size_k)?;
    disk.set_rotational(graph, layout.rotational)?;
    disk.set_transport(graph, layout.transport)?;

    if let Some(pt_layout) = &layout.partition_table {
        let pt = disk.create_partition_table(graph, pt_layout.pt_type)?;
        for part_layout in &pt_layout.partitions {
            let [start, length, block_size] = part_layout.region;
            let region = Region::from_signed(start, length, block_size)?;
            let partition = pt.create_partition(
                graph,
                part_layout.name.clone(),
                region,
                part_layout.partition_type,
            )?;
            partition.set_id(graph, part_layout.id)?;
            partition.set_boot(graph, part_layout.boot)?;

            if let Some(fs_layout) = &part_layout.filesystem {
                let fs = partition.create_filesystem(graph, fs_layout.fs_type)?;
                apply_filesystem(graph, fs, fs_layout)?;
            }
        }
    }

    if let Some(fs_layout) = &layout.filesystem {
        let fs = disk.create_filesystem(graph, fs_layout.fs_type)?;
        apply_filesystem(graph, fs, fs_layout)?;
    }

    Ok(disk)
}

fn apply_filesystem(
    graph: &mut Devicegraph,
    fs: Filesystem,
    layout: &FilesystemLayout,
) -> Result<(), DevicegraphError> {
    fs.set_label(graph, layout.label.clone())?;
    fs.set_uuid(graph, layout.uuid)?;
    fs.set_mount_point(graph, layout.mount_point.clone())?;
    fs.set_userdata(graph, layout.userdata.clone())
}
