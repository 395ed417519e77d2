use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::counters::{CpuCounterRecord, GpuCounterRecord, MemoryCounterRecord};
use super::{gpu, meminfo, stat};
use crate::config::SourcesConfig;
use crate::error::{MonitorError, Result};

#[derive(Debug)]
pub struct BoundedText {
    pub text: String,
    /// The read filled the limit; `text` was cut back to the last full line.
    pub truncated: bool,
}

/// Reads at most `limit` bytes from `path` in one pass.
pub fn read_bounded(path: &Path, limit: usize) -> Result<BoundedText> {
    let unavailable = |source| MonitorError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(unavailable)?;
    let mut buf = Vec::with_capacity(limit.min(16 * 1024));
    file.take(limit as u64)
        .read_to_end(&mut buf)
        .map_err(unavailable)?;

    if buf.is_empty() {
        return Err(MonitorError::malformed(
            "counter source",
            format!("{} is empty", path.display()),
        ));
    }

    let truncated = buf.len() >= limit;
    if truncated {
        let keep = buf.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        buf.truncate(keep);
    }

    let text = String::from_utf8(buf).map_err(|e| {
        MonitorError::malformed(
            "counter source",
            format!("{} is not valid UTF-8: {e}", path.display()),
        )
    })?;
    Ok(BoundedText { text, truncated })
}

/// Where the three counter reads come from.
#[derive(Debug, Clone)]
pub struct CounterSources {
    pub stat_path: PathBuf,
    pub meminfo_path: PathBuf,
    pub gpu: gpu::GpuQuery,
}

impl CounterSources {
    pub fn from_config(config: &SourcesConfig) -> Self {
        Self {
            stat_path: config.stat_path.clone(),
            meminfo_path: config.meminfo_path.clone(),
            gpu: gpu::GpuQuery {
                enabled: config.gpu_enabled,
                command: config.gpu_command.clone(),
                max_gpus: config.max_gpus,
            },
        }
    }

    pub fn read_cpu_counters(&self) -> Result<CpuCounterRecord> {
        stat::read_cpu_counters(&self.stat_path)
    }

    pub fn read_memory_counters(&self) -> Result<MemoryCounterRecord> {
        meminfo::read_memory_counters(&self.meminfo_path)
    }

    pub fn read_gpu_counters(&self) -> Result<GpuCounterRecord> {
        gpu::read_gpu_counters(&self.gpu)
    }
}
