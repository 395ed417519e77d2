use std::process::{Command, Stdio};
use std::str::FromStr;

use super::counters::{GpuCounterRecord, GpuEntry};
use super::platform;
use crate::error::{MonitorError, Result};

const SOURCE: &str = "gpu query output";

const QUERY_FIELDS: &str = "--query-gpu=name,\
utilization.gpu,\
utilization.memory,\
memory.total,\
memory.used,\
memory.free,\
clocks.current.graphics,\
clocks.current.memory,\
clocks.current.video,\
power.draw,\
temperature.gpu";

const QUERY_FORMAT: &str = "--format=csv,noheader,nounits";

const FIELD_COUNT: usize = 11;

/// Values the vendor tool prints for readings a board does not expose.
const UNAVAILABLE: [&str; 4] = ["[N/A]", "N/A", "[Not Supported]", "[Unknown Error]"];

#[derive(Debug, Clone)]
pub struct GpuQuery {
    pub enabled: bool,
    pub command: String,
    pub max_gpus: usize,
}

/// Reads GPU counters from the native source and the vendor query command,
/// native boards first. No GPU is an empty record, not an error.
pub fn read_gpu_counters(query: &GpuQuery) -> Result<GpuCounterRecord> {
    if !query.enabled || query.max_gpus == 0 {
        return Ok(GpuCounterRecord::default());
    }

    let native = platform::native_gpus().unwrap_or_default();
    let vendor = run_vendor_query(&query.command);
    merge_sources(native, vendor.as_deref(), query.max_gpus)
}

fn merge_sources(
    mut gpus: Vec<GpuEntry>,
    vendor_output: Option<&str>,
    max_gpus: usize,
) -> Result<GpuCounterRecord> {
    if !gpus.is_empty() {
        tracing::debug!(count = gpus.len(), "native gpu source");
    }
    if let Some(output) = vendor_output {
        gpus.extend(parse_vendor_csv(output)?);
    }
    Ok(GpuCounterRecord {
        gpus: cap_gpu_count(gpus, max_gpus),
    })
}

fn run_vendor_query(command: &str) -> Option<String> {
    let output = match Command::new(command)
        .args([QUERY_FIELDS, QUERY_FORMAT])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!(command, error = %e, "gpu query unavailable");
            return None;
        }
    };

    if !output.status.success() {
        tracing::debug!(command, status = %output.status, "gpu query failed");
        return None;
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    if text.trim().is_empty() {
        return None;
    }
    Some(text)
}

fn cap_gpu_count(mut gpus: Vec<GpuEntry>, max_gpus: usize) -> Vec<GpuEntry> {
    if gpus.len() > max_gpus {
        tracing::warn!(
            found = gpus.len(),
            max_gpus,
            "more gpus than configured maximum, ignoring the rest"
        );
        gpus.truncate(max_gpus);
    }
    gpus
}

/// Parses `noheader,nounits` CSV output, one line per GPU.
pub fn parse_vendor_csv(output: &str) -> Result<Vec<GpuEntry>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| parse_vendor_line(line, index + 1))
        .collect()
}

fn parse_vendor_line(line: &str, line_no: usize) -> Result<GpuEntry> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != FIELD_COUNT {
        return Err(MonitorError::malformed(
            SOURCE,
            format!(
                "line {line_no}: expected {FIELD_COUNT} fields, got {}",
                fields.len()
            ),
        ));
    }

    let field = |i: usize, name: &str| parse_optional(fields[i], name, line_no);
    Ok(GpuEntry {
        name: fields[0].to_string(),
        sm_utilization: field(1, "utilization.gpu")?,
        mem_bandwidth_utilization: field(2, "utilization.memory")?,
        mem_total: parse_optional(fields[3], "memory.total", line_no)?,
        mem_used: parse_optional(fields[4], "memory.used", line_no)?,
        mem_free: parse_optional(fields[5], "memory.free", line_no)?,
        graphics_clock: field(6, "clocks.current.graphics")?,
        mem_clock: field(7, "clocks.current.memory")?,
        video_clock: field(8, "clocks.current.video")?,
        power_draw: parse_optional(fields[9], "power.draw", line_no)?,
        temperature: field(10, "temperature.gpu")?,
    })
}

fn parse_optional<T>(raw: &str, name: &str, line_no: usize) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if raw.is_empty() || UNAVAILABLE.iter().any(|marker| *marker == raw) {
        return Ok(None);
    }
    raw.parse::<T>().map(Some).map_err(|e| {
        MonitorError::malformed(
            SOURCE,
            format!("line {line_no}: invalid {name} value `{raw}`: {e}"),
        )
    })
}
