use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;

use crate::error::InvalidInputError;

/// Whether the system is probed when a storage session starts.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ProbeMode {
    /// Probe the hardware of the running system.
    Standard,

    /// Do not probe. The session starts with an empty devicegraph.
    #[default]
    None,
}

/// Which system storage operations target.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TargetMode {
    /// The running system.
    #[default]
    Direct,

    /// A system mounted below the root prefix.
    Chroot,

    /// An image assembled below the root prefix.
    Image,
}

fn default_read_only() -> bool {
    true
}

/// Process level configuration of a storage session.
///
/// The environment is immutable once constructed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Environment {
    /// If set, committing to the system is not permitted.
    #[serde(default = "default_read_only")]
    read_only: bool,

    #[serde(default)]
    probe_mode: ProbeMode,

    #[serde(default)]
    target_mode: TargetMode,

    /// Root of the target system for the chroot and image target modes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    root_prefix: Option<PathBuf>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(default_read_only(), ProbeMode::default(), TargetMode::default())
    }
}

impl Environment {
    pub fn new(read_only: bool, probe_mode: ProbeMode, target_mode: TargetMode) -> Self {
        Self {
            read_only,
            probe_mode,
            target_mode,
            root_prefix: None,
        }
    }

    /// Returns the environment with the given root prefix.
    pub fn with_root_prefix(self, root_prefix: impl Into<PathBuf>) -> Self {
        Self {
            root_prefix: Some(root_prefix.into()),
            ..self
        }
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn probe_mode(&self) -> ProbeMode {
        self.probe_mode
    }

    pub fn target_mode(&self) -> TargetMode {
        self.target_mode
    }

    pub fn root_prefix(&self) -> Option<&Path> {
        self.root_prefix.as_deref()
    }

    /// Checks that the root prefix matches the target mode.
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        match (self.target_mode, &self.root_prefix) {
            (TargetMode::Direct, Some(prefix)) => Err(InvalidInputError::InvalidEnvironment(
                format!(
                    "root prefix '{}' cannot be used with target mode 'direct'",
                    prefix.display()
                ),
            )),
            (TargetMode::Chroot | TargetMode::Image, None) => {
                Err(InvalidInputError::InvalidEnvironment(format!(
                    "target mode '{}' requires a root prefix",
                    <&str>::from(self.target_mode)
                )))
            }
            (_, Some(prefix)) if !prefix.is_absolute() => {
                Err(InvalidInputError::InvalidEnvironment(format!(
                    "root prefix '{}' must be an absolute path",
                    prefix.display()
                )))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_defaults() {
        let env = Environment::default();
        assert!(env.read_only());
        assert_eq!(env.probe_mode(), ProbeMode::None);
        assert_eq!(env.target_mode(), TargetMode::Direct);
        assert_eq!(env.root_prefix(), None);
        env.validate().unwrap();

        let env: Environment = serde_yaml::from_str("{}").unwrap();
        assert_eq!(env, Environment::default());
    }

    #[test]
    fn test_deserialize() {
        let env: Environment = serde_yaml::from_str(indoc! {"
            read-only: false
            probe-mode: standard
            target-mode: chroot
            root-prefix: /mnt
        "})
        .unwrap();
        assert_eq!(
            env,
            Environment::new(false, ProbeMode::Standard, TargetMode::Chroot).with_root_prefix("/mnt")
        );
        env.validate().unwrap();

        serde_yaml::from_str::<Environment>("probe-mode: always").unwrap_err();
        serde_yaml::from_str::<Environment>("read-write: true").unwrap_err();
    }

    #[test]
    fn test_validate() {
        let env = Environment::new(true, ProbeMode::None, TargetMode::Image);
        assert_eq!(
            env.validate().unwrap_err(),
            InvalidInputError::InvalidEnvironment(
                "target mode 'image' requires a root prefix".into()
            )
        );

        let env = Environment::default().with_root_prefix("/mnt");
        assert!(env.validate().is_err());

        let env = Environment::new(true, ProbeMode::None, TargetMode::Image)
            .with_root_prefix("relative/path");
        assert!(env.validate().is_err());

        Environment::new(true, ProbeMode::None, TargetMode::Image)
            .with_root_prefix("/var/lib/image")
            .validate()
            .unwrap();
    }
}
