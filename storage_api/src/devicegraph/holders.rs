use serde::{Deserialize, Serialize};

/// Kind of relationship between a device and a device it holds.
///
/// Edges in the devicegraph always point from the holding (parent) device to
/// the held (child) device.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Holder {
    /// A disk used by its partition table.
    User,

    /// A partition contained in a partition table.
    Subdevice,

    /// A block device formatted with a filesystem.
    FilesystemUser,
}
