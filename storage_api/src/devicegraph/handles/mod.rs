//! Typed handles to the devices of a devicegraph.
//!
//! Handles are plain `Copy` values wrapping the storage id of a device. They
//! do not borrow the devicegraph; instead every operation takes the graph the
//! device lives in and validates the handle against it:
//!
//! - a device removed from the graph yields `StaleHandle`,
//! - an unknown storage id yields `NotFound`,
//! - a storage id of another kind of device yields `WrongDeviceType`.

mod device;
mod disk;
mod filesystem;
mod partition;
mod partition_table;

pub use device::Device;
pub use disk::Disk;
pub use filesystem::Filesystem;
pub use partition::Partition;
pub use partition_table::PartitionTable;

use super::types::Sid;

/// Common interface of all device handles.
pub trait DeviceHandle: Copy {
    /// Returns the storage id of the device.
    fn sid(&self) -> Sid;
}

/// Implements the boilerplate shared by the typed handles.
macro_rules! typed_handle {
    ($handle:ident) => {
        impl $handle {
            pub(crate) fn new(sid: Sid) -> Self {
                Self(sid)
            }
        }

        impl DeviceHandle for $handle {
            fn sid(&self) -> Sid {
                self.0
            }
        }

        impl From<$handle> for Device {
            fn from(handle: $handle) -> Self {
                Device::new(handle.0)
            }
        }
    };
}

typed_handle!(Disk);
typed_handle!(PartitionTable);
typed_handle!(Partition);
typed_handle!(Filesystem);
