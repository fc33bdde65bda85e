use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    Layer, Registry,
    fmt::{self, MakeWriter, time::OffsetTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

type Output = Box<dyn Layer<Registry> + Send + Sync>;

/// One output layer for `cfg.format`, gated by the level filter.
pub(crate) fn subscriber<W>(
    cfg: &LoggerConfig,
    writer: W,
) -> Result<impl Subscriber + Send + Sync + 'static, LoggerError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = cfg.level.filter()?;
    let output: Output = match cfg.format {
        LoggerFormat::Text => fmt::layer()
            .with_writer(writer)
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_timer(timer())
            .boxed(),
        LoggerFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(cfg.with_targets)
            .with_timer(timer())
            .boxed(),
        LoggerFormat::Journald => journald()?,
    };
    Ok(tracing_subscriber::registry().with(output).with(filter))
}

pub(crate) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    subscriber(cfg, std::io::stdout)?
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}

fn timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald() -> Result<Output, LoggerError> {
    Ok(tracing_journald::layer()
        .map_err(LoggerError::Journald)?
        .boxed())
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald() -> Result<Output, LoggerError> {
    Err(LoggerError::JournaldUnavailable)
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use super::*;
    use crate::logger::level::LoggerLevel;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn emit(cfg: &LoggerConfig) -> String {
        let out = Capture::default();
        let subscriber = subscriber(cfg, out.clone()).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "thoth_exporterd", job = "solver_count", "cycle finished");
            tracing::debug!(target: "thoth_exporterd", "gauge written");
        });
        let bytes = out.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn targets_follow_config() {
        let cfg = LoggerConfig::new(LoggerFormat::Text, LoggerLevel::default()).with_color(false);

        let with = emit(&cfg);
        assert!(with.contains("thoth_exporterd:"));
        assert!(with.contains("cycle finished"));
        assert!(!with.contains("gauge written"));

        let without = emit(&cfg.with_targets(false));
        assert!(without.contains("cycle finished"));
        assert!(!without.contains("thoth_exporterd"));
    }

    #[test]
    fn json_lines_carry_fields() {
        let cfg = LoggerConfig::new(LoggerFormat::Json, "debug".parse().unwrap()).with_targets(false);
        let out = emit(&cfg);

        assert_eq!(out.lines().count(), 2);
        assert!(out.contains(r#""job":"solver_count""#));
        assert!(out.contains("gauge written"));
        assert!(!out.contains(r#""target""#));
    }

    #[cfg(not(feature = "journald"))]
    #[test]
    fn journald_output_needs_feature() {
        let cfg = LoggerConfig {
            format: LoggerFormat::Journald,
            ..LoggerConfig::default()
        };
        assert!(matches!(
            subscriber(&cfg, Capture::default()).map(|_| ()),
            Err(LoggerError::JournaldUnavailable)
        ));
    }

    #[test]
    fn second_install_is_rejected() {
        let cfg = LoggerConfig::default().with_color(false);
        let _ = install(&cfg);
        assert!(matches!(install(&cfg), Err(LoggerError::AlreadyInitialized)));
    }
}
