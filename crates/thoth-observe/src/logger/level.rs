use std::{fmt, str::FromStr};

use tracing_subscriber::EnvFilter;

use crate::logger::error::LoggerError;

/// Filter directive for the global subscriber.
///
/// Accepts a bare level (`debug`) or full `EnvFilter` directives
/// (`info,thoth_clients=trace`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerLevel(String);

impl LoggerLevel {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn filter(&self) -> Result<EnvFilter, LoggerError> {
        EnvFilter::try_new(&self.0).map_err(|e| LoggerError::InvalidLevel {
            directive: self.0.clone(),
            reason: e.to_string(),
        })
    }
}

impl Default for LoggerLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl FromStr for LoggerLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = Self(s.trim().to_string());
        if level.0.is_empty() {
            return Err(LoggerError::InvalidLevel {
                directive: s.to_string(),
                reason: "empty filter".into(),
            });
        }
        level.filter()?;
        Ok(level)
    }
}

impl fmt::Display for LoggerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_levels_and_directives() {
        assert_eq!("debug".parse::<LoggerLevel>().unwrap().as_str(), "debug");
        assert!("info,thoth_clients=trace".parse::<LoggerLevel>().is_ok());
        assert_eq!(LoggerLevel::default().to_string(), "info");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            "".parse::<LoggerLevel>(),
            Err(LoggerError::InvalidLevel { .. })
        ));
        assert!(matches!(
            "info,=[".parse::<LoggerLevel>(),
            Err(LoggerError::InvalidLevel { .. })
        ));
    }
}
