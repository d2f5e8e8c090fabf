use log::{LevelFilter, Log, Metadata, Record};

/// A `log::Log` implementation fanning records out to several sinks.
///
/// Per-target filters apply to every sink, so noisy modules can be silenced
/// regardless of the sink's own level.
pub struct MultiLogger {
    loggers: Vec<Box<dyn Log>>,
    global_filters: Vec<(String, LevelFilter)>,
    max_level: LevelFilter,
}

impl Default for MultiLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiLogger {
    pub fn new() -> Self {
        Self {
            loggers: Vec::new(),
            global_filters: Vec::new(),
            max_level: LevelFilter::Trace,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn Log>) -> Self {
        self.loggers.push(logger);
        self
    }

    pub fn with_max_level(mut self, max_level: LevelFilter) -> Self {
        self.max_level = max_level;
        self
    }

    /// Limits records whose target starts with `target` to `level`.
    pub fn with_global_filter(mut self, target: impl Into<String>, level: LevelFilter) -> Self {
        self.global_filters.push((target.into(), level));
        self
    }

    pub fn add_logger(&mut self, logger: Box<dyn Log>) {
        self.loggers.push(logger);
    }

    pub fn init(self) -> Result<(), log::SetLoggerError> {
        log::set_max_level(self.max_level);
        log::set_boxed_logger(Box::new(self))
    }

    /// Returns whether the per-target filters let the record through.
    fn passes_global_filters(&self, metadata: &Metadata) -> bool {
        self.global_filters
            .iter()
            .filter(|(target, _)| metadata.target().starts_with(target.as_str()))
            .all(|(_, level)| metadata.level() <= *level)
    }
}

impl Log for MultiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
            && self.passes_global_filters(metadata)
            && self.loggers.iter().any(|l| l.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        if record.level() > self.max_level || !self.passes_global_filters(record.metadata()) {
            return;
        }

        self.loggers
            .iter()
            .filter(|l| l.enabled(record.metadata()))
            .for_each(|l| l.log(record));
    }

    fn flush(&self) {
        self.loggers.iter().for_each(|l| l.flush());
    }
}
