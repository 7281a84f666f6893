//! Subscriber setup for applications embedding the engine
//!
//! The engine only emits `tracing` events. State transitions log at `info`,
//! parse diagnostics at `debug` and failed operations at `warn`; install a
//! subscriber with [`setup_logging`] to see them.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Error, Result};

/// How [`setup_logging`] builds the global subscriber
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level applied to every target without its own directive
    pub level: Level,
    /// Extra `target=level` filter directives, e.g. `jsep_core::session=trace`
    pub directives: Vec<String>,
    /// Emit one JSON object per event
    pub json: bool,
    /// Include source file and line
    pub file_info: bool,
    /// Log span enter/exit
    pub log_spans: bool,
    /// Reported in the first event after setup
    pub app_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: Level::INFO,
            directives: Vec::new(),
            json: false,
            file_info: false,
            log_spans: false,
            app_name: "jsep".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn new(level: Level, app_name: impl Into<String>) -> Self {
        LoggingConfig {
            level,
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    /// Add a `target=level` directive
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    pub fn with_spans(mut self) -> Self {
        self.log_spans = true;
        self
    }

    /// `RUST_LOG` first, then the configured level and directives
    fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::from_default_env().add_directive(self.level.into());
        for directive in &self.directives {
            let parsed = Directive::from_str(directive)
                .map_err(|e| Error::Config(format!("Invalid log directive {:?}: {}", directive, e)))?;
            filter = filter.add_directive(parsed);
        }
        Ok(filter)
    }
}

/// Install the process-wide subscriber
///
/// Only one global subscriber can exist; calling this again returns
/// [`Error::Config`].
pub fn setup_logging(config: LoggingConfig) -> Result<()> {
    let filter = config.env_filter()?;
    let span_events = if config.log_spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = if config.json {
        builder.with_writer(std::io::stdout).json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| Error::Config(format!("Logging already initialized: {}", e)))?;

    tracing::info!(app = %config.app_name, level = %config.level, "Logging initialized");
    Ok(())
}

/// Level from a config or command-line string, case-insensitive
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level.trim()).map_err(|_| Error::Config(format!("Invalid log level: {:?}", level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level(" WARN ").unwrap(), Level::WARN);
        assert!(matches!(parse_log_level("loud"), Err(Error::Config(_))));
    }

    #[test]
    fn test_directives_are_validated() {
        let config = LoggingConfig::new(Level::WARN, "test").with_directive("jsep_core::session=trace");
        assert!(config.env_filter().is_ok());

        let broken = LoggingConfig::default().with_directive("jsep_core=notalevel");
        assert!(matches!(broken.env_filter(), Err(Error::Config(_))));
    }
}
