//! Loading of the configuration files used by the CLI.

use std::path::Path;

use log::{debug, info};

use storage_api::{
    config::{Environment, Layout},
    constants::ENVIRONMENT_CONFIG_PATH,
    error::{InvalidInputError, ReportError, StorageError},
};

/// Loads the environment configuration.
///
/// When no path is given, the default location is used if it exists and the
/// default environment otherwise. An explicitly given path must exist.
pub fn load_environment(path: Option<&Path>) -> Result<Environment, StorageError> {
    let path = match path {
        Some(path) => path,
        None if Path::new(ENVIRONMENT_CONFIG_PATH).exists() => Path::new(ENVIRONMENT_CONFIG_PATH),
        None => {
            info!("No environment configuration at '{ENVIRONMENT_CONFIG_PATH}', using defaults");
            return Ok(Environment::default());
        }
    };

    debug!("Loading environment configuration from '{}'", path.display());
    let contents = std::fs::read_to_string(path).structured(InvalidInputError::LoadEnvironment {
        path: path.to_string_lossy().into(),
    })?;

    let environment: Environment =
        serde_yaml::from_str(&contents).structured(InvalidInputError::ParseEnvironment)?;
    environment.validate().map_err(StorageError::new)?;
    Ok(environment)
}

/// Loads a layout file.
pub fn load_layout(path: &Path) -> Result<Layout, StorageError> {
    debug!("Loading layout from '{}'", path.display());
    let contents = std::fs::read_to_string(path).structured(InvalidInputError::LoadLayout {
        path: path.to_string_lossy().into(),
    })?;
    serde_yaml::from_str(&contents).structured(InvalidInputError::ParseLayout)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use indoc::indoc;
    use storage_api::{
        config::{ProbeMode, TargetMode},
        error::ErrorKind,
    };
    use tempfile::NamedTempFile;

    use super::*;

    fn temp_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_environment() {
        let file = temp_file(indoc! {"
            read-only: false
            target-mode: image
            root-prefix: /var/lib/image
        "});
        let environment = load_environment(Some(file.path())).unwrap();
        assert!(!environment.read_only());
        assert_eq!(environment.probe_mode(), ProbeMode::None);
        assert_eq!(environment.target_mode(), TargetMode::Image);
        assert_eq!(
            environment.root_prefix(),
            Some(Path::new("/var/lib/image"))
        );
    }

    #[test]
    fn test_load_environment_errors() {
        let err = load_environment(Some(Path::new("/non-existent/environment.yaml"))).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::InvalidInput(InvalidInputError::LoadEnvironment {
                path: "/non-existent/environment.yaml".into()
            })
        );

        let file = temp_file("probe-mode: sometimes");
        assert_eq!(
            load_environment(Some(file.path())).unwrap_err().kind(),
            &ErrorKind::InvalidInput(InvalidInputError::ParseEnvironment)
        );

        let file = temp_file("target-mode: chroot");
        assert!(matches!(
            load_environment(Some(file.path())).unwrap_err().kind(),
            ErrorKind::InvalidInput(InvalidInputError::InvalidEnvironment(_))
        ));
    }

    #[test]
    fn test_load_layout() {
        let file = temp_file(indoc! {"
            disks:
              - name: /dev/sda
                size-k: 1024
        "});
        let layout = load_layout(file.path()).unwrap();
        assert_eq!(layout.disks.len(), 1);
        assert_eq!(layout.disks[0].size_k, 1024);

        let file = temp_file("disks: 3");
        assert_eq!(
            load_layout(file.path()).unwrap_err().kind(),
            &ErrorKind::InvalidInput(InvalidInputError::ParseLayout)
        );
    }
}
