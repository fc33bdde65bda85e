use std::{fmt, str::FromStr};

use crate::logger::error::LoggerError;

/// Output encoding of exporter logs.
///
/// `Json` suits log shipping from the cluster. `Journald` is only
/// selectable when the crate is built with the `journald` feature on linux.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoggerFormat {
    #[default]
    Text,
    Json,
    Journald,
}

impl LoggerFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LoggerFormat::Text => "text",
            LoggerFormat::Json => "json",
            LoggerFormat::Journald => "journald",
        }
    }

    /// Whether this format writes through the `fmt` layer to stdout.
    pub fn is_stdout(self) -> bool {
        !matches!(self, LoggerFormat::Journald)
    }
}

impl fmt::Display for LoggerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoggerFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => LoggerFormat::Text,
            "json" => LoggerFormat::Json,
            "journald" => LoggerFormat::Journald,
            _ => return Err(LoggerError::InvalidFormat(s.trim().to_string())),
        };
        if format == LoggerFormat::Journald && !cfg!(all(target_os = "linux", feature = "journald"))
        {
            return Err(LoggerError::JournaldUnavailable);
        }
        Ok(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats() {
        assert_eq!("text".parse::<LoggerFormat>().unwrap(), LoggerFormat::Text);
        assert_eq!("plain".parse::<LoggerFormat>().unwrap(), LoggerFormat::Text);
        assert_eq!(" JSON ".parse::<LoggerFormat>().unwrap(), LoggerFormat::Json);
        assert_eq!(LoggerFormat::default(), LoggerFormat::Text);
    }

    #[test]
    fn rejects_unknown_format() {
        let err = " yaml ".parse::<LoggerFormat>().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidFormat(f) if f == "yaml"));
    }

    #[test]
    fn display_matches_parse() {
        for format in [LoggerFormat::Text, LoggerFormat::Json] {
            assert_eq!(format.to_string().parse::<LoggerFormat>().unwrap(), format);
            assert!(format.is_stdout());
        }
        assert!(!LoggerFormat::Journald.is_stdout());
    }

    #[cfg(not(feature = "journald"))]
    #[test]
    fn journald_requires_feature() {
        assert!(matches!(
            "journald".parse::<LoggerFormat>(),
            Err(LoggerError::JournaldUnavailable)
        ));
    }
}
