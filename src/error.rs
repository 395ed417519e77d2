use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonitorError>;

/// Conditions that end a sampling cycle.
///
/// Counter wraparound and zero-length windows are not represented here: the
/// utilization engine absorbs them as 0% readings.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("failed to read {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed {source_name}: {detail}")]
    Malformed {
        source_name: &'static str,
        detail: String,
    },

    #[error("core count changed from {previous} to {current} between samples")]
    TopologyChanged { previous: usize, current: usize },

    #[error("no per-core counters found")]
    NoCores,

    #[error("sample region {}: {source}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("render failed: {0}")]
    Render(String),
}

impl MonitorError {
    pub fn malformed(source_name: &'static str, detail: impl Into<String>) -> Self {
        MonitorError::Malformed {
            source_name,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_source() {
        let err = MonitorError::malformed("/proc/stat", "line 3: expected 9 fields, got 4");
        assert_eq!(
            err.to_string(),
            "malformed /proc/stat: line 3: expected 9 fields, got 4"
        );

        let err = MonitorError::TopologyChanged {
            previous: 8,
            current: 4,
        };
        assert_eq!(
            err.to_string(),
            "core count changed from 8 to 4 between samples"
        );
    }
}
