use serde::{Deserialize, Serialize};

pub(super) mod file_log;
pub(super) mod multilog;

/// A single log record as written by the file sink.
///
/// Location fields are omitted when the record does not carry them.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct LogEntry {
    level: Level,
    target: String,
    message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    module: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Level {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<log::Level> for Level {
    fn from(value: log::Level) -> Self {
        match value {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warn,
            log::Level::Info => Level::Info,
            log::Level::Debug => Level::Debug,
            log::Level::Trace => Level::Trace,
        }
    }
}

impl From<&log::Record<'_>> for LogEntry {
    fn from(value: &log::Record) -> Self {
        Self {
            level: value.level().into(),
            target: value.target().to_string(),
            message: value.args().to_string(),
            module: value.module_path().unwrap_or_default().to_string(),
            file: value.file().unwrap_or_default().to_string(),
            line: value.line(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry() {
        let entry = LogEntry::from(
            &log::Record::builder()
                .args(format_args!("Creating disk '/dev/sda' with sid 42"))
                .level(log::Level::Debug)
                .target("storage_api::devicegraph::graph")
                .module_path(Some("storage_api::devicegraph::graph"))
                .file(Some("graph.rs"))
                .line(Some(7))
                .build(),
        );

        assert_eq!(entry.level, Level::Debug);
        assert_eq!(entry.message, "Creating disk '/dev/sda' with sid 42");
        assert_eq!(entry.target, "storage_api::devicegraph::graph");
        assert_eq!(entry.module, "storage_api::devicegraph::graph");
        assert_eq!(entry.file, "graph.rs");
        assert_eq!(entry.line, Some(7));
    }

    #[test]
    fn test_log_entry_without_location() {
        let entry = LogEntry::from(
            &log::Record::builder()
                .args(format_args!("message"))
                .level(log::Level::Info)
                .build(),
        );

        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"level":"info","target":"","message":"message"}"#
        );
    }
}
