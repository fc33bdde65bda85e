use std::io::IsTerminal;

use crate::logger::{format::LoggerFormat, level::LoggerLevel};

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: LoggerLevel,
    /// Print the emitting module (`thoth_clients::graph`) on each line.
    pub with_targets: bool,
    /// ANSI colors; only honoured by the text format.
    pub use_color: bool,
}

impl LoggerConfig {
    pub fn new(format: LoggerFormat, level: LoggerLevel) -> Self {
        Self {
            format,
            level,
            with_targets: true,
            use_color: format == LoggerFormat::Text && std::io::stdout().is_terminal(),
        }
    }

    pub fn with_targets(mut self, on: bool) -> Self {
        self.with_targets = on;
        self
    }

    pub fn with_color(mut self, on: bool) -> Self {
        self.use_color = on && self.format == LoggerFormat::Text;
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new(LoggerFormat::default(), LoggerLevel::default())
    }
}
