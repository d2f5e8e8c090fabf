use serde::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;

/// Transport (bus) a disk is connected through.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Transport {
    #[default]
    Unknown,
    Sbp,
    Ata,
    Fc,
    Iscsi,
    Sas,
    Sata,
    Spi,
    Usb,
    Fcoe,
    Pcie,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(<&str>::from(self))
    }
}
