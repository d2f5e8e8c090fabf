use std::str::FromStr;

use anyhow::{anyhow, Error};
use serde::{
    de::value::Error as ValueError, forward_to_deserialize_any, Deserialize, Deserializer,
    Serialize,
};
use strum_macros::{EnumIter, IntoStaticStr};

/// Filesystem types that can be placed on a block device.
///
/// Names follow what you would pass to `mkfs -t` or see in `/proc/filesystems`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FsType {
    Btrfs,
    Exfat,
    Ext2,
    Ext3,
    Ext4,
    F2fs,
    Iso9660,
    Jfs,
    Ntfs,
    Reiserfs,
    Swap,
    Udf,
    Vfat,
    Xfs,
}

impl FsType {
    /// Returns the name of the filesystem type.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Returns the maximum label length the on-disk format can store, in
    /// bytes.
    pub fn max_label_length(self) -> usize {
        match self {
            Self::Btrfs => 255,
            Self::Exfat => 15,
            Self::Ext2 | Self::Ext3 | Self::Ext4 => 16,
            Self::F2fs => 512,
            Self::Iso9660 => 32,
            Self::Jfs => 16,
            Self::Ntfs => 128,
            Self::Reiserfs => 16,
            Self::Swap => 15,
            Self::Udf => 126,
            Self::Vfat => 11,
            Self::Xfs => 12,
        }
    }

    /// Returns whether the filesystem can be mounted somewhere in the
    /// directory tree. Swap is activated, not mounted.
    pub fn is_mountable(self) -> bool {
        !matches!(self, Self::Swap)
    }
}

impl std::fmt::Display for FsType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FsType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::deserialize(&mut EnumDeserializer(s))
            .map_err(|_| anyhow!("Unknown filesystem type '{s}'"))
    }
}

/// Simple deserializer to convert a &str into an enum using serde.
struct EnumDeserializer<'de>(&'de str);
impl<'de> Deserializer<'de> for &mut EnumDeserializer<'de> {
    type Error = ValueError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        visitor.visit_str(self.0)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_fs_type_from_str() {
        assert_eq!("ext4".parse::<FsType>().unwrap(), FsType::Ext4);
        assert_eq!("swap".parse::<FsType>().unwrap(), FsType::Swap);
        assert_eq!("iso9660".parse::<FsType>().unwrap(), FsType::Iso9660);

        assert_eq!(
            "zfs".parse::<FsType>().unwrap_err().to_string(),
            "Unknown filesystem type 'zfs'"
        );
    }

    #[test]
    fn test_fs_type_names_are_consistent() {
        // The strum name and the serde name must agree for every variant.
        for fs_type in FsType::iter() {
            let json = serde_json::to_string(&fs_type).unwrap();
            assert_eq!(json, format!("\"{}\"", fs_type.as_str()));
            assert_eq!(fs_type.as_str().parse::<FsType>().unwrap(), fs_type);
        }
    }

    #[test]
    fn test_fs_type_properties() {
        assert_eq!(FsType::Ext4.max_label_length(), 16);
        assert_eq!(FsType::Vfat.max_label_length(), 11);
        assert!(FsType::Xfs.is_mountable());
        assert!(!FsType::Swap.is_mountable());
    }
}
