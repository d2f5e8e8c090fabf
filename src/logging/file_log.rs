use std::{fs::File, io::Write, path::Path, sync::Mutex};

use log::{LevelFilter, Log, Metadata, Record};

use super::LogEntry;

/// Log sink writing each record as one line of JSON to a file.
///
/// The file is truncated when the sink is created. If it cannot be created,
/// the sink stays disabled instead of failing the program.
pub struct FileLog {
    target: Option<Mutex<File>>,
    max_level: LevelFilter,
}

impl FileLog {
    pub fn new(target: impl AsRef<Path>) -> Self {
        let file = match File::create(target.as_ref()) {
            Ok(f) => Some(Mutex::new(f)),
            Err(err) => {
                eprintln!(
                    "Logging setup error: failed to create log file '{}': {err}",
                    target.as_ref().display()
                );
                None
            }
        };

        Self {
            max_level: LevelFilter::Trace,
            target: file,
        }
    }

    pub fn with_max_level(self, max_level: LevelFilter) -> Self {
        Self { max_level, ..self }
    }

    pub fn into_logger(self) -> Box<dyn Log> {
        Box::new(self)
    }

    /// Best effort attempt to write the log entry to the file
    fn write_entry(&self, record: &Record) -> Result<(), Box<dyn std::error::Error + '_>> {
        if let Some(file) = self.target.as_ref() {
            let mut serialized = serde_json::to_string(&LogEntry::from(record))?;
            serialized.push('\n');

            let mut file_lock = file.lock()?;
            file_lock.write_all(serialized.as_bytes())?;
        }

        Ok(())
    }
}

impl Log for FileLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.target.is_some() && metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        let _ = self.write_entry(record);
    }

    fn flush(&self) {
        if let Some(Ok(mut file)) = self.target.as_ref().map(|f| f.lock()) {
            let _ = file.flush();
        }
    }
}
