use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use color_eyre::eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::LoggingConfig;

/// Overrides the configured level when set.
pub const LOG_ENV_VAR: &str = "COREMON_LOG";

/// Where log output goes for a given run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File,
    Disabled,
}

/// The dashboard owns the terminal, so it only logs to a file.
pub fn log_target(config: &LoggingConfig, dashboard: bool) -> LogTarget {
    match (&config.file, dashboard) {
        (Some(_), _) => LogTarget::File,
        (None, false) => LogTarget::Stderr,
        (None, true) => LogTarget::Disabled,
    }
}

pub fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV_VAR) {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| eyre!("invalid log level `{level}`: {e}"))
}

pub fn init_tracing(config: &LoggingConfig, dashboard: bool) -> Result<()> {
    let writer = match log_target(config, dashboard) {
        LogTarget::Disabled => return Ok(()),
        LogTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogTarget::File => {
            let path = config
                .file
                .as_deref()
                .ok_or_else(|| eyre!("log file target without a path"))?;
            ensure_parent_dir(path)?;
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
    };
    let filter = build_filter(&config.level)?;
    let ansi = log_target(config, dashboard) == LogTarget::Stderr;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi);
    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if config.json {
        Box::new(builder.json().finish())
    } else {
        Box::new(builder.finish())
    };

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| eyre!("failed to set tracing subscriber: {e}"))?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
