use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};
use sysdefs::{
    disks::Transport,
    filesystems::FsType,
    partitions::{PartitionId, PartitionType, PtType},
};
use uuid::Uuid;

/// Description of a storage layout to build a devicegraph from.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Layout {
    #[serde(default)]
    pub disks: Vec<DiskLayout>,
}

/// Per disk layout.
///
/// A disk holds either a partition table or a filesystem.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DiskLayout {
    /// The device path of the disk.
    pub name: String,

    /// Size of the disk in KiB. Zero when unknown.
    #[serde(default)]
    pub size_k: u64,

    #[serde(default)]
    pub rotational: bool,

    #[serde(default)]
    pub transport: Transport,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_table: Option<PartitionTableLayout>,

    /// Filesystem created directly on the disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<FilesystemLayout>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartitionTableLayout {
    #[serde(rename = "type")]
    pub pt_type: PtType,

    #[serde(default)]
    pub partitions: Vec<PartitionLayout>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartitionLayout {
    /// The device path of the partition.
    pub name: String,

    /// Region of the partition as `[start, length, block-size]`.
    ///
    /// Kept signed so that negative values reach the region constructor and
    /// are reported as invalid regions instead of parse errors.
    pub region: [i64; 3],

    #[serde(rename = "type", default)]
    pub partition_type: PartitionType,

    #[serde(default)]
    pub id: PartitionId,

    #[serde(default)]
    pub boot: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<FilesystemLayout>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilesystemLayout {
    #[serde(rename = "type")]
    pub fs_type: FsType,

    #[serde(default)]
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_point: Option<PathBuf>,

    #[serde(default)]
    pub userdata: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use maplit::btreemap;

    use super::*;

    #[test]
    fn test_deserialize_layout() {
        let layout: Layout = serde_yaml::from_str(indoc! {"
            disks:
              - name: /dev/sda
                size-k: 1048576
                transport: sata
                partition-table:
                  type: gpt
                  partitions:
                    - name: /dev/sda1
                      region: [2048, 1048576, 512]
                      id: esp
                      boot: true
                      filesystem:
                        type: vfat
                        mount-point: /boot/efi
                    - name: /dev/sda2
                      region: [1050624, 1048576, 512]
                      filesystem:
                        type: ext4
                        label: root
                        userdata:
                          owner: test
              - name: /dev/sdb
                filesystem:
                  type: xfs
        "})
        .unwrap();

        assert_eq!(layout.disks.len(), 2);
        let sda = &layout.disks[0];
        assert_eq!(sda.size_k, 1048576);
        assert_eq!(sda.transport, Transport::Sata);

        let pt = sda.partition_table.as_ref().unwrap();
        assert_eq!(pt.pt_type, PtType::Gpt);
        assert_eq!(pt.partitions[0].id, PartitionId::Esp);
        assert!(pt.partitions[0].boot);
        assert_eq!(pt.partitions[1].partition_type, PartitionType::Primary);
        assert_eq!(pt.partitions[1].id, PartitionId::Linux);

        let root = pt.partitions[1].filesystem.as_ref().unwrap();
        assert_eq!(root.fs_type, FsType::Ext4);
        assert_eq!(root.label, "root");
        assert_eq!(
            root.userdata,
            btreemap! { "owner".to_string() => "test".to_string() }
        );

        let sdb = &layout.disks[1];
        assert_eq!(sdb.size_k, 0);
        assert!(sdb.partition_table.is_none());
        assert_eq!(sdb.filesystem.as_ref().unwrap().fs_type, FsType::Xfs);
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        serde_yaml::from_str::<Layout>(indoc! {"
            disks:
              - name: /dev/sda
                size: 10
        "})
        .unwrap_err();

        serde_yaml::from_str::<Layout>(indoc! {"
            disks:
              - name: /dev/sda
                partition-table:
                  type: mbr
        "})
        .unwrap_err();
    }
}
