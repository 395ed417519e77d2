use std::path::Path;

use super::counters::MemoryCounterRecord;
use super::source::read_bounded;
use crate::error::{MonitorError, Result};

const SOURCE: &str = "meminfo";

pub const MEMINFO_READ_LIMIT: usize = 16 * 1024;

pub fn read_memory_counters(path: &Path) -> Result<MemoryCounterRecord> {
    let contents = read_bounded(path, MEMINFO_READ_LIMIT)?;
    parse_memory_counters(&contents.text)
}

/// Picks `MemTotal`, `MemAvailable`, `SwapTotal` and `SwapFree` out of the
/// `Field: value kB` lines, in any order.
///
/// The two memory fields are required. Absent swap fields count as zero.
pub fn parse_memory_counters(contents: &str) -> Result<MemoryCounterRecord> {
    let mut mem_total = None;
    let mut mem_available = None;
    let mut swap_total = None;
    let mut swap_free = None;

    for line in contents.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let slot = match key.trim() {
            "MemTotal" => &mut mem_total,
            "MemAvailable" => &mut mem_available,
            "SwapTotal" => &mut swap_total,
            "SwapFree" => &mut swap_free,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(parse_value(key.trim(), rest)?);
        }
        if mem_total.is_some()
            && mem_available.is_some()
            && swap_total.is_some()
            && swap_free.is_some()
        {
            break;
        }
    }

    let mem_total =
        mem_total.ok_or_else(|| MonitorError::malformed(SOURCE, "MemTotal not found"))?;
    let mem_available =
        mem_available.ok_or_else(|| MonitorError::malformed(SOURCE, "MemAvailable not found"))?;

    Ok(MemoryCounterRecord::from_totals(
        mem_total,
        mem_available,
        swap_total.unwrap_or(0),
        swap_free.unwrap_or(0),
    ))
}

fn parse_value(key: &str, rest: &str) -> Result<u64> {
    let raw = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| MonitorError::malformed(SOURCE, format!("{key}: missing value")))?;
    raw.parse::<u64>().map_err(|e| {
        MonitorError::malformed(SOURCE, format!("{key}: invalid value `{raw}`: {e}"))
    })
}
