use std::str::FromStr;

use anyhow::{bail, Error};
use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, IntoStaticStr};

/// Partition table (disk label) types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PtType {
    /// GUID Partition Table
    Gpt,

    /// MS-DOS partition table, also known as MBR
    Msdos,

    /// S/390 DASD partition table
    Dasd,
}

impl PtType {
    /// Maximum number of primary partitions the table can describe.
    pub fn max_primary(self) -> u32 {
        match self {
            Self::Gpt => 128,
            Self::Msdos => 4,
            Self::Dasd => 3,
        }
    }

    /// Whether an extended partition (and therefore logical partitions) can
    /// be created.
    pub fn extended_possible(self) -> bool {
        matches!(self, Self::Msdos)
    }

    /// Highest partition number a logical partition can get. Zero when the
    /// table has no notion of logical partitions.
    pub fn max_logical(self) -> u32 {
        match self {
            Self::Msdos => 256,
            Self::Gpt | Self::Dasd => 0,
        }
    }

    /// Returns whether partitions of the given type can live in this table.
    pub fn is_partition_type_supported(self, partition_type: PartitionType) -> bool {
        match partition_type {
            PartitionType::Primary => true,
            PartitionType::Extended | PartitionType::Logical => self.extended_possible(),
        }
    }
}

impl std::fmt::Display for PtType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(<&str>::from(self))
    }
}

/// Role of a partition inside its partition table.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PartitionType {
    #[default]
    Primary,
    Extended,
    Logical,
}

impl std::fmt::Display for PartitionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(<&str>::from(self))
    }
}

/// Partition id, i.e. the MBR system id or the GPT type GUID family.
///
/// MBR ids use their standardized numeric values. Ids only meaningful on GPT
/// use values above 0xff so they never collide with an MBR id.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionId {
    Dos12,
    Dos16,
    Ntfs,
    Dos32,
    Extended,
    Prep,
    Swap,
    #[default]
    Linux,
    Lvm,
    Esp,
    Raid,
    Unknown,
    BiosBoot,
    WindowsBasicData,
    MicrosoftReserved,
}

impl PartitionId {
    /// Returns the numeric value of the id.
    pub fn value(self) -> u32 {
        match self {
            Self::Dos12 => 0x01,
            Self::Dos16 => 0x06,
            Self::Ntfs => 0x07,
            Self::Dos32 => 0x0c,
            Self::Extended => 0x0f,
            Self::Prep => 0x41,
            Self::Swap => 0x82,
            Self::Linux => 0x83,
            Self::Lvm => 0x8e,
            Self::Esp => 0xef,
            Self::Raid => 0xfd,
            Self::Unknown => 0x100,
            Self::BiosBoot => 0x101,
            Self::WindowsBasicData => 0x102,
            Self::MicrosoftReserved => 0x103,
        }
    }

    /// Returns whether the numeric value is a standardized MBR system id.
    pub fn is_standardized(self) -> bool {
        self.value() <= 0xff
    }

    pub fn to_str(self) -> &'static str {
        match self {
            Self::Dos12 => "dos12",
            Self::Dos16 => "dos16",
            Self::Ntfs => "ntfs",
            Self::Dos32 => "dos32",
            Self::Extended => "extended",
            Self::Prep => "prep",
            Self::Swap => "swap",
            Self::Linux => "linux",
            Self::Lvm => "lvm",
            Self::Esp => "esp",
            Self::Raid => "raid",
            Self::Unknown => "unknown",
            Self::BiosBoot => "bios-boot",
            Self::WindowsBasicData => "windows-basic-data",
            Self::MicrosoftReserved => "microsoft-reserved",
        }
    }
}

impl TryFrom<u32> for PartitionId {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0x01 => Self::Dos12,
            0x06 => Self::Dos16,
            0x07 => Self::Ntfs,
            0x0c => Self::Dos32,
            0x0f => Self::Extended,
            0x41 => Self::Prep,
            0x82 => Self::Swap,
            0x83 => Self::Linux,
            0x8e => Self::Lvm,
            0xef => Self::Esp,
            0xfd => Self::Raid,
            0x100 => Self::Unknown,
            0x101 => Self::BiosBoot,
            0x102 => Self::WindowsBasicData,
            0x103 => Self::MicrosoftReserved,
            _ => bail!("Unknown partition id {value:#x}"),
        })
    }
}

impl FromStr for PartitionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(hex) = s.strip_prefix("0x") {
            let value = u32::from_str_radix(hex, 16)
                .map_err(|e| anyhow::anyhow!("Invalid partition id '{s}': {e}"))?;
            return Self::try_from(value);
        }

        Ok(match s {
            "dos12" => Self::Dos12,
            "dos16" => Self::Dos16,
            "ntfs" => Self::Ntfs,
            "dos32" => Self::Dos32,
            "extended" => Self::Extended,
            "prep" => Self::Prep,
            "swap" => Self::Swap,
            "linux" => Self::Linux,
            "lvm" => Self::Lvm,
            "esp" => Self::Esp,
            "raid" => Self::Raid,
            "unknown" => Self::Unknown,
            "bios-boot" => Self::BiosBoot,
            "windows-basic-data" => Self::WindowsBasicData,
            "microsoft-reserved" => Self::MicrosoftReserved,
            _ => bail!("Unknown partition id '{s}'"),
        })
    }
}

impl std::fmt::Display for PartitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_standardized() {
            write!(f, "{} ({:#04x})", self.to_str(), self.value())
        } else {
            f.write_str(self.to_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_pt_type_capabilities() {
        assert_eq!(PtType::Gpt.max_primary(), 128);
        assert_eq!(PtType::Msdos.max_primary(), 4);
        assert_eq!(PtType::Dasd.max_primary(), 3);

        assert!(PtType::Msdos.extended_possible());
        assert!(!PtType::Gpt.extended_possible());

        assert!(PtType::Gpt.is_partition_type_supported(PartitionType::Primary));
        assert!(!PtType::Gpt.is_partition_type_supported(PartitionType::Logical));
        assert!(PtType::Msdos.is_partition_type_supported(PartitionType::Extended));
    }

    #[test]
    fn test_partition_id_round_trip() {
        for id in PartitionId::iter() {
            assert_eq!(PartitionId::try_from(id.value()).unwrap(), id);
            assert_eq!(id.to_str().parse::<PartitionId>().unwrap(), id);
        }

        assert_eq!("0x83".parse::<PartitionId>().unwrap(), PartitionId::Linux);
        assert_eq!(
            PartitionId::try_from(0x42).unwrap_err().to_string(),
            "Unknown partition id 0x42"
        );
    }

    #[test]
    fn test_partition_id_display() {
        assert_eq!(PartitionId::Esp.to_string(), "esp (0xef)");
        assert_eq!(PartitionId::BiosBoot.to_string(), "bios-boot");
    }
}
