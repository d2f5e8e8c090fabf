use std::collections::BTreeMap;

use log::{debug, info};

use storage_api::{
    config::{Environment, ProbeMode},
    constants::{PROBED_DEVICEGRAPH, STAGING_DEVICEGRAPH},
    error::{ReportError, SessionError, StorageError},
    Devicegraph,
};

/// Populates a devicegraph from the hardware of a system.
pub trait Prober {
    fn probe(&self, environment: &Environment) -> Result<Devicegraph, anyhow::Error>;
}

/// Applies a devicegraph to the hardware of a system.
pub trait Committer {
    fn commit(&self, environment: &Environment, devicegraph: &Devicegraph)
        -> Result<(), anyhow::Error>;
}

/// A storage session.
///
/// The session is configured by an immutable environment and owns a set of
/// named, independent devicegraphs. Two of them have a fixed role: `probed`
/// holds the state of the system and `staging` the state clients want to
/// reach.
pub struct Storage {
    environment: Environment,
    devicegraphs: BTreeMap<String, Devicegraph>,
}

impl Storage {
    /// Starts a new storage session.
    ///
    /// Without probing, the session starts with an empty `probed` devicegraph
    /// and an empty `staging` copy of it. Otherwise both are created by
    /// `probe()`.
    pub fn new(environment: Environment) -> Result<Self, StorageError> {
        environment.validate().map_err(StorageError::new)?;
        debug!("Starting storage session with environment {environment:?}");

        let mut storage = Self {
            environment,
            devicegraphs: BTreeMap::new(),
        };

        if storage.environment.probe_mode() == ProbeMode::None {
            storage.reset(Devicegraph::new());
        }

        Ok(storage)
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Replaces `probed` with the given devicegraph and `staging` with a copy
    /// of it.
    fn reset(&mut self, probed: Devicegraph) {
        self.devicegraphs
            .insert(STAGING_DEVICEGRAPH.into(), probed.clone());
        self.devicegraphs.insert(PROBED_DEVICEGRAPH.into(), probed);
    }

    /// Probes the system with the given prober. `staging` is reset to a copy
    /// of the probed devicegraph.
    pub fn probe(&mut self, prober: &dyn Prober) -> Result<(), StorageError> {
        if self.environment.probe_mode() == ProbeMode::None {
            return Err(StorageError::new(SessionError::ProbeDisabled));
        }

        let probed = prober
            .probe(&self.environment)
            .structured(SessionError::Probe)?;
        info!("Probed {} devices", probed.num_devices());
        tracing::info!(
            metric_name = "devicegraph_loaded",
            device_count = probed.num_devices()
        );
        self.reset(probed);
        Ok(())
    }

    /// Creates a new, empty devicegraph.
    pub fn create_devicegraph(&mut self, name: &str) -> Result<&mut Devicegraph, StorageError> {
        if self.exist_devicegraph(name) {
            return Err(StorageError::new(SessionError::DevicegraphExists {
                name: name.into(),
            }));
        }

        debug!("Creating devicegraph '{name}'");
        Ok(self.devicegraphs.entry(name.into()).or_default())
    }

    pub fn devicegraph(&self, name: &str) -> Result<&Devicegraph, StorageError> {
        self.devicegraphs
            .get(name)
            .structured(SessionError::DevicegraphNotFound { name: name.into() })
    }

    pub fn devicegraph_mut(&mut self, name: &str) -> Result<&mut Devicegraph, StorageError> {
        self.devicegraphs
            .get_mut(name)
            .structured(SessionError::DevicegraphNotFound { name: name.into() })
    }

    /// Copies the devicegraph `source` to `dest`, replacing `dest` if it
    /// exists. Devices keep their storage ids in the copy.
    pub fn copy_devicegraph(&mut self, source: &str, dest: &str) -> Result<(), StorageError> {
        let copy = self.devicegraph(source)?.clone();
        debug!("Copying devicegraph '{source}' to '{dest}'");
        self.devicegraphs.insert(dest.into(), copy);
        Ok(())
    }

    pub fn remove_devicegraph(&mut self, name: &str) -> Result<(), StorageError> {
        self.devicegraphs
            .remove(name)
            .map(|_| debug!("Removed devicegraph '{name}'"))
            .structured(SessionError::DevicegraphNotFound { name: name.into() })
    }

    pub fn exist_devicegraph(&self, name: &str) -> bool {
        self.devicegraphs.contains_key(name)
    }

    /// Returns the names of all devicegraphs in alphabetical order.
    pub fn devicegraph_names(&self) -> Vec<&str> {
        self.devicegraphs.keys().map(String::as_str).collect()
    }

    pub fn probed(&self) -> Result<&Devicegraph, StorageError> {
        self.devicegraph(PROBED_DEVICEGRAPH)
    }

    pub fn staging(&self) -> Result<&Devicegraph, StorageError> {
        self.devicegraph(STAGING_DEVICEGRAPH)
    }

    pub fn staging_mut(&mut self) -> Result<&mut Devicegraph, StorageError> {
        self.devicegraph_mut(STAGING_DEVICEGRAPH)
    }

    /// Hands the `staging` devicegraph to the given committer.
    ///
    /// Fails without calling the committer if the environment is read-only.
    pub fn commit(&self, committer: &dyn Committer) -> Result<(), StorageError> {
        if self.environment.read_only() {
            return Err(StorageError::new(SessionError::ReadOnly));
        }

        let staging = self.staging()?;
        info!("Committing {} devices", staging.num_devices());
        committer
            .commit(&self.environment, staging)
            .structured(SessionError::Commit)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use storage_api::{
        config::TargetMode,
        error::{ErrorKind, InvalidInputError},
        DeviceHandle, PtType,
    };

    use super::*;

    struct TestProber;

    impl Prober for TestProber {
        fn probe(&self, _: &Environment) -> Result<Devicegraph, anyhow::Error> {
            let mut graph = Devicegraph::new();
            let disk = graph.create_disk("/dev/sda");
            disk.set_size_k(&mut graph, 1024)?;
            disk.create_partition_table(&mut graph, PtType::Gpt)?;
            Ok(graph)
        }
    }

    struct FailingProber;

    impl Prober for FailingProber {
        fn probe(&self, _: &Environment) -> Result<Devicegraph, anyhow::Error> {
            anyhow::bail!("no access to /dev")
        }
    }

    #[derive(Default)]
    struct TestCommitter {
        committed: Cell<Option<usize>>,
    }

    impl Committer for TestCommitter {
        fn commit(&self, _: &Environment, devicegraph: &Devicegraph) -> Result<(), anyhow::Error> {
            self.committed.set(Some(devicegraph.num_devices()));
            Ok(())
        }
    }

    fn read_write() -> Environment {
        Environment::new(false, ProbeMode::None, TargetMode::Direct)
    }

    #[test]
    fn test_new_without_probing() {
        let storage = Storage::new(Environment::default()).unwrap();
        assert!(storage.probed().unwrap().is_empty());
        assert!(storage.staging().unwrap().is_empty());
        assert_eq!(storage.devicegraph_names(), vec!["probed", "staging"]);
    }

    #[test]
    fn test_new_invalid_environment() {
        let err = Storage::new(Environment::new(true, ProbeMode::None, TargetMode::Chroot))
            .err()
            .unwrap();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidInput(InvalidInputError::InvalidEnvironment(_))
        ));
    }

    #[test]
    fn test_probe() {
        let mut storage = Storage::new(Environment::default()).unwrap();
        assert_eq!(
            storage.probe(&TestProber).unwrap_err().kind(),
            &ErrorKind::Session(SessionError::ProbeDisabled)
        );

        let mut storage =
            Storage::new(Environment::new(true, ProbeMode::Standard, TargetMode::Direct)).unwrap();
        assert!(storage.devicegraph_names().is_empty());
        assert!(storage.staging().is_err());

        assert_eq!(
            storage.probe(&FailingProber).unwrap_err().kind(),
            &ErrorKind::Session(SessionError::Probe)
        );

        storage.probe(&TestProber).unwrap();
        assert_eq!(storage.probed().unwrap().num_devices(), 2);
        assert_eq!(
            storage.staging().unwrap().devices(),
            storage.probed().unwrap().devices()
        );

        // Staging is a copy, changing it leaves probed alone.
        let disk = storage.staging().unwrap().all_disks()[0];
        disk.set_size_k(storage.staging_mut().unwrap(), 2048)
            .unwrap();
        assert_eq!(disk.size_k(storage.probed().unwrap()).unwrap(), 1024);
        assert_eq!(disk.size_k(storage.staging().unwrap()).unwrap(), 2048);
        assert!(disk.sid().value() >= storage_api::constants::FIRST_SID);
    }

    #[test]
    fn test_devicegraph_management() {
        let mut storage = Storage::new(Environment::default()).unwrap();

        storage
            .create_devicegraph("backup")
            .unwrap()
            .create_disk("/dev/sdb");
        assert!(storage.exist_devicegraph("backup"));
        assert_eq!(
            storage.create_devicegraph("backup").unwrap_err().kind(),
            &ErrorKind::Session(SessionError::DevicegraphExists {
                name: "backup".into()
            })
        );

        storage.copy_devicegraph("backup", "staging").unwrap();
        assert_eq!(storage.staging().unwrap().num_devices(), 1);
        assert_eq!(
            storage.staging().unwrap().devices(),
            storage.devicegraph("backup").unwrap().devices()
        );

        storage.remove_devicegraph("backup").unwrap();
        assert!(!storage.exist_devicegraph("backup"));
        assert_eq!(
            storage.remove_devicegraph("backup").unwrap_err().kind(),
            &ErrorKind::Session(SessionError::DevicegraphNotFound {
                name: "backup".into()
            })
        );
        assert!(storage.devicegraph_mut("backup").is_err());
        assert!(storage.copy_devicegraph("backup", "other").is_err());
        assert!(!storage.exist_devicegraph("other"));
    }

    #[test]
    fn test_commit_read_only() {
        let storage = Storage::new(Environment::default()).unwrap();
        let committer = TestCommitter::default();
        assert_eq!(
            storage.commit(&committer).unwrap_err().kind(),
            &ErrorKind::Session(SessionError::ReadOnly)
        );
        assert_eq!(committer.committed.get(), None);
    }

    #[test]
    fn test_commit() {
        let mut storage = Storage::new(read_write()).unwrap();
        storage.staging_mut().unwrap().create_disk("/dev/sda");

        let committer = TestCommitter::default();
        storage.commit(&committer).unwrap();
        assert_eq!(committer.committed.get(), Some(1));
    }
}
