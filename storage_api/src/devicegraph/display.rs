//! Display implementations for the types in the devicegraph module.

use std::fmt::{Display, Formatter, Result};

use petgraph::Direction;

use super::{
    graph::{Devicegraph, NodeIndex},
    holders::Holder,
    node::{DeviceData, DeviceNode},
    types::{DeviceKind, Sid},
};

impl Display for Sid {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.value())
    }
}

impl Display for DeviceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::Disk => write!(f, "disk"),
            Self::PartitionTable => write!(f, "partition-table"),
            Self::Partition => write!(f, "partition"),
            Self::Filesystem => write!(f, "filesystem"),
        }
    }
}

impl Display for Holder {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Subdevice => write!(f, "subdevice"),
            Self::FilesystemUser => write!(f, "filesystem-user"),
        }
    }
}

/// Returns the attributes of a node shown in the devicegraph tree.
fn details(node: &DeviceNode) -> String {
    let mut details = vec![format!("sid {}", node.sid)];
    match &node.data {
        DeviceData::Disk(disk) => {
            details.push(format!("{} KiB", disk.size_k));
            if disk.transport != Default::default() {
                details.push(disk.transport.to_string());
            }
        }
        DeviceData::PartitionTable(_) => {}
        DeviceData::Partition(part) => {
            details.push(part.partition_type.to_string());
            details.push(part.region.to_string());
            details.push(format!("id {}", part.id));
            if part.boot {
                details.push("boot".into());
            }
        }
        DeviceData::Filesystem(fs) => {
            if !fs.label.is_empty() {
                details.push(format!("label '{}'", fs.label));
            }
            if let Some(mount_point) = &fs.mount_point {
                details.push(format!("mounted at {}", mount_point.display()));
            }
            if !fs.userdata.is_empty() {
                details.push(format!("{} userdata entries", fs.userdata.len()));
            }
        }
    }
    details.join(", ")
}

impl Devicegraph {
    fn fmt_subtree(&self, f: &mut Formatter<'_>, idx: NodeIndex, depth: usize) -> Result {
        let node = &self.inner[idx];
        writeln!(
            f,
            "{:indent$}{} [{}]",
            "",
            node.describe(),
            details(node),
            indent = depth * 2
        )?;

        let mut children: Vec<NodeIndex> = self
            .inner
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort_by_key(|child| self.inner[*child].sid);
        for child in children {
            self.fmt_subtree(f, child, depth + 1)?;
        }
        Ok(())
    }
}

/// Prints one indented tree per disk.
impl Display for Devicegraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if self.is_empty() {
            return writeln!(f, "(empty devicegraph)");
        }

        let mut roots: Vec<NodeIndex> = self
            .inner
            .node_indices()
            .filter(|idx| {
                self.inner
                    .neighbors_directed(*idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();
        roots.sort_by_key(|root| self.inner[*root].sid);
        for root in roots {
            self.fmt_subtree(f, root, 0)?;
        }
        Ok(())
    }
}
