use std::fmt::{Debug, Write};
use std::{borrow::Cow, panic::Location};

use serde::{ser::SerializeStruct, Deserialize, Serialize};
use strum_macros::IntoStaticStr;

use crate::devicegraph::types::{DeviceKind, Sid};

/// An operation on a devicegraph or one of its devices failed.
///
/// Every devicegraph operation reports its failure synchronously with one of
/// these variants and leaves the graph exactly as it was before the call.
#[derive(Debug, Clone, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum DevicegraphError {
    #[error("Invalid region: {reason}")]
    InvalidRegion { reason: String },

    #[error("Regions have different block sizes ({lhs} B and {rhs} B)")]
    DifferentBlockSizes { lhs: u32, rhs: u32 },

    #[error("Disk '{name}' already has a partition table")]
    DuplicatePartitionTable { name: String },

    #[error("Block device '{name}' already has a filesystem")]
    DuplicateFilesystem { name: String },

    #[error("Block device '{name}' is already used by a {user}")]
    DeviceInUse { name: String, user: DeviceKind },

    #[error("Device {sid} has been removed from the devicegraph")]
    StaleHandle { sid: Sid },

    #[error("No device matching {0} in the devicegraph")]
    NotFound(String),

    #[error("Device {sid} is a {actual}, expected a {expected}")]
    WrongDeviceType {
        sid: Sid,
        expected: DeviceKind,
        actual: DeviceKind,
    },
}

/// The environment or layout provided by the user was invalid.
#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidInputError {
    #[error("Failed to load environment configuration from '{path}'")]
    LoadEnvironment { path: String },
    #[error("Failed to parse environment configuration")]
    ParseEnvironment,
    #[error("Invalid environment configuration: {0}")]
    InvalidEnvironment(String),
    #[error("Failed to load layout from '{path}'")]
    LoadLayout { path: String },
    #[error("Failed to parse layout")]
    ParseLayout,
}

/// A storage session operation was refused or its collaborator failed.
#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum SessionError {
    #[error("Storage session is read-only, committing is not permitted")]
    ReadOnly,
    #[error("Probing is disabled by the environment")]
    ProbeDisabled,
    #[error("Failed to probe the system")]
    Probe,
    #[error("Failed to commit the staging devicegraph")]
    Commit,
    #[error("Devicegraph '{name}' does not exist")]
    DevicegraphNotFound { name: String },
    #[error("Devicegraph '{name}' already exists")]
    DevicegraphExists { name: String },
}

/// Reporting a failure failed.
#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum InternalError {
    #[error("Failed to serialize error report")]
    SerializeErrorReport,
    #[error("Failed to write error report to '{path}'")]
    WriteErrorReport { path: String },
}

/// Each variant of `ErrorKind` corresponds to a different category of error.
#[derive(Debug, Eq, thiserror::Error, IntoStaticStr, PartialEq)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    /// A devicegraph operation failed.
    #[error(transparent)]
    Devicegraph(#[from] DevicegraphError),

    /// The user provided invalid input.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    /// The storage session refused an operation or a collaborator failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An error report could not be produced.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug)]
struct StorageErrorInner {
    kind: ErrorKind,
    location: &'static Location<'static>,
    source: Option<anyhow::Error>,
    context: Vec<(Cow<'static, str>, &'static Location<'static>)>,
}

/// Structured error returned by the storage session layer.
///
/// Carries the error category, where it was raised, an optional underlying
/// cause and the context messages attached while it propagated.
pub struct StorageError(Box<StorageErrorInner>);
impl StorageError {
    #[track_caller]
    pub fn new(kind: impl Into<ErrorKind>) -> Self {
        StorageError(Box::new(StorageErrorInner {
            kind: kind.into(),
            location: Location::caller(),
            source: None,
            context: Vec::new(),
        }))
    }

    /// Returns a reference to the inner ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }
}

impl From<DevicegraphError> for StorageError {
    #[track_caller]
    fn from(e: DevicegraphError) -> Self {
        Self::new(e)
    }
}

pub trait ReportError<T, K> {
    /// Convert this error into a structured StorageError.
    fn structured(self, kind: K) -> Result<T, StorageError>;
}

impl<T, K> ReportError<T, K> for Option<T>
where
    K: Into<ErrorKind>,
{
    #[track_caller]
    fn structured(self, kind: K) -> Result<T, StorageError> {
        match self {
            Some(t) => Ok(t),
            None => Err(StorageError(Box::new(StorageErrorInner {
                kind: kind.into(),
                location: Location::caller(),
                source: None,
                context: Vec::new(),
            }))),
        }
    }
}

impl<T, E, K> ReportError<T, K> for Result<T, E>
where
    E: Into<anyhow::Error>,
    K: Into<ErrorKind>,
{
    #[track_caller]
    fn structured(self, kind: K) -> Result<T, StorageError> {
        match self {
            Ok(o) => Ok(o),
            Err(e) => Err(StorageError(Box::new(StorageErrorInner {
                kind: kind.into(),
                location: Location::caller(),
                source: Some(e.into()),
                context: Vec::new(),
            }))),
        }
    }
}

pub trait StorageResultExt<T> {
    /// Attach a context message to the error.
    fn message(self, context: impl Into<Cow<'static, str>>) -> Result<T, StorageError>;
}

impl<T> StorageResultExt<T> for Result<T, StorageError> {
    #[track_caller]
    fn message(mut self, context: impl Into<Cow<'static, str>>) -> Result<T, StorageError> {
        if let Err(ref mut e) = self {
            e.0.context.push((context.into(), Location::caller()));
        }
        self
    }
}

impl Serialize for StorageError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("storage-error", 5)?;
        state.serialize_field("message", &self.0.kind.to_string())?;
        match self.0.kind {
            ErrorKind::Devicegraph(ref e) => state.serialize_field("error", e)?,
            ErrorKind::InvalidInput(ref e) => state.serialize_field("error", e)?,
            ErrorKind::Session(ref e) => state.serialize_field("error", e)?,
            ErrorKind::Internal(ref e) => state.serialize_field("error", e)?,
        }
        state.serialize_field("category", <&str>::from(&self.0.kind))?;
        state.serialize_field(
            "location",
            &format!("{}:{}", self.0.location.file(), self.0.location.line()),
        )?;
        match self.0.source {
            Some(ref e) => state.serialize_field("cause", &Some(format!("{:?}", e)))?,
            None => state.serialize_field("cause", &None::<String>)?,
        }
        state.end()
    }
}

impl Debug for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.0.kind,
            self.0.location.file(),
            self.0.location.line()
        )?;

        if !self.0.context.is_empty() {
            writeln!(f, "\n\nContext:")?;
            for (i, (context, location)) in self.0.context.iter().enumerate() {
                for (j, line) in context.split('\n').enumerate() {
                    if j == 0 {
                        write!(f, "{: >5}: ", i)?;
                    } else {
                        f.write_str("\n       ")?;
                    }
                    f.write_str(line)?;
                }
                writeln!(f, " at {}:{}", location.file(), location.line())?;
            }
        }

        if let Some(ref source) = self.0.source {
            writeln!(f, "\n\nCaused by:")?;
            let mut index = 0;
            let mut source: Option<&dyn std::error::Error> = Some(source.as_ref());
            while let Some(e) = source {
                for (i, line) in e.to_string().split('\n').enumerate() {
                    if i == 0 {
                        write!(f, "{: >5}: ", index)?;
                    } else {
                        f.write_str("\n       ")?;
                    }
                    f.write_str(line)?;
                }
                f.write_char('\n')?;
                source = e.source();
                index += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use serde_yaml::Value;

    use super::*;

    #[test]
    fn test_error_serialize() {
        let e = StorageError(Box::new(StorageErrorInner {
            kind: ErrorKind::InvalidInput(InvalidInputError::ParseEnvironment),
            location: Location::caller(),
            source: Some(
                std::fs::read("/non-existant-file")
                    .context("failed to read file")
                    .unwrap_err(),
            ),
            context: Vec::new(),
        }));
        match serde_yaml::to_value(e).unwrap() {
            Value::Mapping(m) => {
                assert_eq!(m.len(), 5);
                assert_eq!(m["error"], Value::String("parse-environment".into()));
                assert_eq!(m["category"], Value::String("invalid-input".into()));
                assert!(matches!(m["cause"], Value::String(_)));
                assert_eq!(
                    m["message"],
                    Value::String("Failed to parse environment configuration".into())
                );
                match m["location"] {
                    Value::String(ref s) => assert!(s.contains("error.rs:")),
                    _ => panic!("location isn't string"),
                }
            }
            _ => panic!("value isn't mapping"),
        }
    }

    #[test]
    fn test_devicegraph_error_serialize() {
        let e = StorageError::from(DevicegraphError::DuplicatePartitionTable {
            name: "/dev/sda".into(),
        });
        match serde_yaml::to_value(e).unwrap() {
            Value::Mapping(m) => {
                assert_eq!(m["category"], Value::String("devicegraph".into()));
                assert_eq!(
                    m["message"],
                    Value::String("Disk '/dev/sda' already has a partition table".into())
                );
                assert_eq!(m["cause"], Value::Null);
            }
            _ => panic!("value isn't mapping"),
        }
    }

    #[test]
    fn test_error_debug() {
        let error = Err::<(), _>(anyhow::anyhow!("z"))
            .context("x\ny")
            .structured(SessionError::Probe)
            .unwrap_err();
        assert_eq!(
            format!("{:?}", error),
            format!(
                "Failed to probe the system at {}:{}\n\nCaused by:\n    0: x\n       y\n    1: z\n",
                error.0.location.file(),
                error.0.location.line(),
            ),
        );
    }

    #[test]
    fn test_error_message_context() {
        let error = Err::<(), _>(StorageError::new(SessionError::ReadOnly))
            .message("Failed to commit")
            .unwrap_err();
        assert_eq!(error.kind(), &ErrorKind::Session(SessionError::ReadOnly));
        assert!(format!("{:?}", error).contains("Context:\n    0: Failed to commit at "));
    }
}
